// Error taxonomy for the plot composition engine

/// Errors surfaced by the engine.
///
/// `UnknownColumn` and `EmptySelection` describe a malformed request and abort
/// the whole composition. `SingularSmoothingSystem` is recovered per group by
/// the trace builder and never escapes [`crate::runtime::compose`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Column '{0}' not found")]
    UnknownColumn(String),

    #[error("Invalid bound for '{field}': {bound}")]
    InvalidBound { field: String, bound: String },

    #[error("No {0} variables selected")]
    EmptySelection(&'static str),

    #[error("Smoothing system is singular for {points} point(s)")]
    SingularSmoothingSystem { points: usize },

    #[error("Invalid smoothing configuration: {0}")]
    InvalidSmoothing(String),

    #[error("Data error: {0}")]
    Data(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
