//! Error types for fem-solver

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FemError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FemError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("Element {element} has {found} nodes but the basis expects {expected}")]
    ElementSizeMismatch {
        element: usize,
        expected: usize,
        found: usize,
    },

    #[error("Basis function index {index} (axis {axis:?}) out of range for basis of size {size}")]
    BasisIndexOutOfRange {
        index: usize,
        axis: Option<usize>,
        size: usize,
    },

    #[error("Dimension mismatch: expected {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("No slot ({row}, {col}) in the matrix portrait")]
    MissingMatrixSlot { row: usize, col: usize },

    #[error("Degenerate element {element}: Jacobian determinant {determinant:e}")]
    DegenerateElement { element: usize, determinant: f64 },

    #[error("Singular Jacobian: zero pivot in column {column}")]
    SingularJacobian { column: usize },

    #[error("Zero pivot {value:e} in row {row} of the preconditioner")]
    ZeroPivot { row: usize, value: f64 },

    #[error("Matrix is not positive definite (pivot {value:e} in row {row})")]
    NotPositiveDefinite { row: usize, value: f64 },

    #[error("Factorization failed: {0}")]
    Factorization(String),

    #[error("Conjugate gradient breakdown at iteration {iteration} (p.Ap = {value:e})")]
    SolverBreakdown { iteration: usize, value: f64 },

    #[error("Point ({x}, {y}) is outside the mesh")]
    PointOutsideMesh { x: f64, y: f64 },
}
