//! Format registry and source-text pre-processors (spec §4.1).
//!
//! This crate owns the seam between "circuit text in whatever format a
//! deployment declares" and [`qrelay_domain::PreparedCircuit`], the single
//! native object the rest of the workspace operates on.

mod dsl;
mod error;
mod registry;

pub use error::FormatError;
pub use registry::{FormatRegistry, Preprocessor};
