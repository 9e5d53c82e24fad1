//! IonQ pilot: drives IonQ's native REST API (`api.ionq.co/v0.3`), whose
//! circuit submissions use IonQ's own gate-list JSON rather than a textual
//! IR, and whose results are a probability histogram over decimal qubit
//! states rather than bitstring counts.

mod api;
mod circuit;
mod error;
mod pilot;

pub use error::{IonqError, IonqResult};
pub use pilot::{IonqPilot, LOCAL_SIMULATOR};
