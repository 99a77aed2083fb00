//! Water Quality Index scoring: per-parameter sub-indices, weighted
//! aggregation and quality-band classification.

pub mod aggregate;
pub mod batch;
pub mod classify;
pub mod error;
pub mod model;
pub mod subindex;

pub use aggregate::*;
pub use batch::*;
pub use classify::*;
pub use error::{ModelError, ScoreError};
pub use model::*;
pub use subindex::*;
