//! The job orchestrator (spec §4.5/§5): queue, worker pool, state machine,
//! and persistence boundary atop [`qrelay_pilot::Pilot`] and
//! [`qrelay_transpile::TranspileGraph`].

pub mod config;
pub mod dispatch;
pub mod error;
pub mod orchestrator;
pub mod storage;

pub use config::OrchestratorConfig;
pub use dispatch::{dispatch, PilotRegistry};
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::Orchestrator;
pub use storage::{JobFilter, Store};

#[cfg(feature = "sqlite")]
pub use storage::SqliteStore;
pub use storage::InMemoryStore;
