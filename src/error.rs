use thiserror::Error;

/// Errors raised by the episode statistics core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("cannot build statistics from an empty sample")]
    EmptySample,

    #[error("accumulator needs at least one environment")]
    NoEnvironments,

    #[error("step expects {expected} values per vector, got reward={reward}, done={done}")]
    LengthMismatch {
        expected: usize,
        reward: usize,
        done: usize,
    },

    #[error("report window size must not be zero (use a negative size to disable reporting)")]
    ZeroWindow,

    #[error("invalid configuration for {field}: {message}")]
    InvalidConfig { field: String, message: String },
}
