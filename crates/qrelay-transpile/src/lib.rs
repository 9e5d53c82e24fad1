//! The transpiler graph (spec §4.2): a labelled directed multigraph over
//! circuit formats, with shortest-path planning and left-fold compilation.

mod error;
mod graph;

pub use error::TranspileError;
pub use graph::{EdgeFn, Plan, TranspileGraph};
