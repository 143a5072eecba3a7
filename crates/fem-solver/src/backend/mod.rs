//! Linear solver abstraction layer.
//!
//! The orchestrator assembles a [`crate::sparse::SymmetricSparseMatrix`] and
//! hands it to a [`LinearSolver`] chosen at runtime from [`SolverConfig`].
//!
//! # Solvers
//!
//! - **CG + IC(0)** (default): preconditioned conjugate gradients working
//!   directly on the lower-triangular storage.
//! - **Dense Cholesky**: nalgebra direct factorization, for small problems
//!   and as a reference.
//!
//! # Architecture
//!
//! ```text
//! Local matrices (small dense nalgebra DMatrix)
//!         │
//!         ▼
//! Assembly (symmetric lower CSR + right-hand side)
//!         │
//!         ▼
//! LinearSolver trait
//!    ┌────┴────┐
//!    ▼         ▼
//! CgCholesky  DenseCholesky
//! ```

pub mod cg_cholesky;
pub mod dense;
pub mod traits;

pub use cg_cholesky::{CgCholesky, SolverState};
pub use dense::DenseCholesky;
pub use traits::*;

/// Create the solver selected by `config`
pub fn build_solver(config: &SolverConfig) -> Box<dyn LinearSolver> {
    match config.kind {
        SolverKind::CgCholesky => Box::new(CgCholesky::new(config.max_iterations, config.tolerance)),
        SolverKind::DenseCholesky => Box::new(DenseCholesky::new()),
    }
}
