//! Error types for fem-io

use fem_solver::FemError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IoError>;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unknown manufactured solution: {0}")]
    UnknownSolution(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Solver error: {0}")]
    Solver(#[from] FemError),
}
