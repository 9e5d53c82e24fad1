//! Entity model, circuit IR, and lifecycle rules for the quantum job control
//! plane.
//!
//! This crate owns the data every other crate in the workspace shares:
//! `qrelay-format` and `qrelay-transpile` produce/consume [`PreparedCircuit`],
//! `qrelay-pilot` and `qrelay-orchestrator` operate on [`Job`]/[`Device`]/
//! [`Provider`], and the error taxonomy in [`error`] is the common vocabulary
//! every crate's own error enum maps onto.

pub mod circuit;
pub mod entity;
pub mod error;
pub mod format;
pub mod ids;

pub use circuit::{ClbitId, Instruction, InstructionKind, PreparedCircuit, QubitId};
pub use entity::{
    Deployment, Device, Job, JobState, JobType, Provider, QuantumProgram, ProgramSource,
    ResultKind, ResultRow,
};
pub use error::{DomainError, StatusHint};
pub use format::FormatId;
pub use ids::{DeploymentId, JobId, ProgramId, ResultId, UserId};
