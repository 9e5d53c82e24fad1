//! Rigetti pilot: a local QVM-style simulator bound to a single fixed
//! device (`"9q-qvm"`). Rigetti's own integration never had a working
//! remote-execution path to carry forward, so this drives the shared
//! statevector engine directly rather than a network client.

mod error;
mod pilot;

pub use error::{RigettiError, RigettiResult};
pub use pilot::{RigettiPilot, DEVICE_NAME};
