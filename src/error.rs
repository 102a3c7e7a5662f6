use thiserror::Error;

/// Fatal conditions raised by the solver core.
///
/// Non-convergence is deliberately absent: the run loop simply keeps going.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown emissions pollutant `{0}`")]
    UnknownEmission(String),

    #[error("emissions for {pollutant} have {found} values, expected one per cell ({expected})")]
    EmissionsLength {
        pollutant: String,
        expected: usize,
        found: usize,
    },

    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("operator `{operator}` failed on cell {cell}: {message}")]
    OperatorFailed {
        operator: &'static str,
        cell: usize,
        message: String,
    },

    #[error("worker {worker} panicked while applying an operator")]
    WorkerPanicked { worker: usize },
}

pub type Result<T> = std::result::Result<T, ModelError>;
