use thiserror::Error;

/// Raised when a sample cannot be scored at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScoreError {
    /// No parameter had both a usable value and a matching spec.
    #[error("No valid data provided")]
    NoValidData,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("parameter set `{set}` has a parameter with an empty name")]
    EmptyName { set: String },

    #[error("parameter set `{set}` defines `{parameter}` more than once")]
    DuplicateParameter { set: String, parameter: String },

    #[error("parameter set name cannot be empty")]
    EmptySetName,
}
