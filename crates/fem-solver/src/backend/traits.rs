//! Backend trait definitions for linear solvers.
//!
//! A solver is configured in three steps (`set_matrix`, `set_vector`,
//! `compute`) and then holds its solution until it is given a new matrix.

use crate::error::{FemError, Result};
use crate::observer::SolveObserver;
use crate::sparse::SymmetricSparseMatrix;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// How a solve ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    /// Relative residual dropped below the tolerance
    Converged,
    /// Iteration limit hit; the last iterate is kept as the solution
    MaxIterationsReached,
}

/// Solver convergence and diagnostic info.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveInfo {
    /// Number of iterations (1 for direct solvers)
    pub iterations: usize,
    /// Final relative residual `||b - A x|| / ||b||`
    pub residual_ratio: f64,
    pub status: SolverStatus,
    /// Human-readable solver name (e.g., "cg-ic0", "nalgebra-Cholesky")
    pub solver_name: String,
}

impl SolveInfo {
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }
}

/// Available linear solvers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// Conjugate gradients preconditioned with incomplete Cholesky
    #[default]
    CgCholesky,
    /// Dense Cholesky factorization
    DenseCholesky,
}

/// Linear solver settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub kind: SolverKind,
    /// Iteration limit of iterative solvers
    pub max_iterations: usize,
    /// Relative residual tolerance
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            kind: SolverKind::CgCholesky,
            max_iterations: 1000,
            tolerance: 1e-14,
        }
    }
}

impl SolverConfig {
    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(FemError::Config(format!(
                "Solver tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(FemError::Config(
                "Solver max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for a linear solver backend.
///
/// Implementations solve `A x = b` for a symmetric positive definite `A`.
pub trait LinearSolver {
    /// Human-readable name of this solver
    fn name(&self) -> &str;

    /// Take ownership of the system matrix, discarding any previous solution
    fn set_matrix(&mut self, matrix: SymmetricSparseMatrix);

    /// Set the right-hand side, discarding any previous solution
    fn set_vector(&mut self, rhs: DVector<f64>);

    /// Solve the system, reporting progress to `observer`
    fn compute(&mut self, observer: &mut dyn SolveObserver) -> Result<SolveInfo>;

    /// Solution of the last `compute()`
    fn solution(&self) -> Option<&DVector<f64>>;
}

/// Matrix and right-hand side of a solver, checked for consistency
pub(crate) fn checked_system<'a>(
    matrix: Option<&'a SymmetricSparseMatrix>,
    rhs: Option<&'a DVector<f64>>,
) -> Result<(&'a SymmetricSparseMatrix, &'a DVector<f64>)> {
    let matrix = matrix.ok_or_else(|| FemError::Config("Solver matrix not set".to_string()))?;
    let rhs = rhs.ok_or_else(|| FemError::Config("Solver right-hand side not set".to_string()))?;
    if rhs.len() != matrix.size() {
        return Err(FemError::DimensionMismatch {
            expected: matrix.size(),
            found: rhs.len(),
        });
    }
    Ok((matrix, rhs))
}
