//! I/O support for the FEM solver.
//!
//! This crate provides:
//! - **JSON problem files** (mesh, boundary flags, manufactured solution,
//!   solver settings)
//! - **Nodal tables** comparing the solution with the exact one
//! - **JSON run reports** persistence/loading
//! - **Dense matrix dumps** of the assembled system

pub mod error;
mod output;
pub mod params;
mod report;

pub use error::{IoError, Result};
pub use output::{write_dense_matrix, write_nodal_table};
pub use params::{load_json, load_problem, ManufacturedSolution, MeshSpec, ProblemFile};
pub use report::{ErrorSummary, MeshSummary, RunReport, load_report, save_report};
