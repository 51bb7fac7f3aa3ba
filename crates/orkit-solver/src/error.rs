use thiserror::Error;

/// Errors raised while building a [`crate::Problem`].
///
/// These are programmer errors and are reported before any solve attempt.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    #[error("Invalid bounds on {name}: [{lower}, {upper}]")]
    InvalidBounds { name: String, lower: f64, upper: f64 },
    #[error("Unknown variable index: {0}")]
    UnknownVariable(usize),
    #[error("Unknown constraint index: {0}")]
    UnknownConstraint(usize),
    #[error("Non-finite coefficient {value} in {name}")]
    NonFiniteCoefficient { name: String, value: f64 },
}

/// Errors raised while building or solving an assignment instance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssignmentError {
    #[error("Row {row} has {found} costs, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },
    #[error("Non-finite cost for worker {worker}, task {task}")]
    NonFiniteCost { worker: usize, task: usize },
    #[error("{workers} workers cannot be matched to {tasks} tasks; transpose or pad the matrix")]
    TooManyWorkers { workers: usize, tasks: usize },
}
