//! IBM Quantum Platform pilot: drives the Qiskit Runtime Sampler primitive
//! over IBM's REST API, in both its legacy direct-token form and the newer
//! IBM Cloud API-key/Service-CRN form.

mod api;
mod error;
mod pilot;
mod qasm;

pub use error::{IbmError, IbmResult};
pub use pilot::IbmPilot;
