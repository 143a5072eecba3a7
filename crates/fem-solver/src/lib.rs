//! 2D finite element solver for Poisson-type problems on quadrilateral meshes.
//!
//! The pipeline solves `-div(lambda grad u) = f` with Dirichlet conditions:
//!
//! 1. Build a mesh ([`mesh_builder`]) of 4-node or 9-node quadrilaterals
//! 2. Assemble local stiffness/mass matrices into a symmetric sparse matrix
//!    ([`assembly`], [`sparse`], [`portrait`])
//! 3. Condense the prescribed nodes out of the system ([`boundary_conditions`])
//! 4. Solve with preconditioned conjugate gradients ([`backend`])
//! 5. Post-process: nodal errors, point evaluation, error integral
//!    ([`postprocess`], [`newton`])

pub mod analysis;
pub mod assembly;
pub mod backend;
pub mod basis;
pub mod boundary_conditions;
pub mod dense;
pub mod error;
pub mod geometry;
pub mod mapping;
pub mod mesh;
pub mod mesh_builder;
pub mod newton;
pub mod observer;
pub mod portrait;
pub mod postprocess;
pub mod quadrature;
pub mod sparse;

pub use analysis::{FemConfig, FemSolver, FnTest, SolvedField, TestFunction};
pub use assembly::{
    build_assembler, AssemblerKind, CurvilinearAssembler, GlobalSystem, MatrixAssembler,
    StraightAssembler,
};
pub use backend::{
    build_solver, CgCholesky, DenseCholesky, LinearSolver, SolveInfo, SolverConfig, SolverKind,
    SolverStatus,
};
pub use basis::{Basis, BasisValues};
pub use boundary_conditions::{BoundaryHandler, BoundaryParameters, DirichletBoundary};
pub use error::{FemError, Result};
pub use geometry::{Interval, Point2D, Rectangle};
pub use mapping::ElementMap;
pub use mesh::{FiniteElement, Mesh, MeshStatistics};
pub use mesh_builder::{
    CurveMeshBuilder, CurveMeshParameters, ElementOrder, GridLayout, MeshParameters,
    RegularMeshBuilder, StructuredMesh,
};
pub use newton::{InverseMapping, InverseMappingResult};
pub use observer::{RecordingObserver, SolveObserver, TracingObserver};
pub use portrait::Portrait;
pub use postprocess::ErrorReport;
pub use quadrature::{GaussOrder, Integrator};
pub use sparse::SymmetricSparseMatrix;
