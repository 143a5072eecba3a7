//! Analysis pipeline: assemble, constrain, solve.
//!
//! [`FemSolver`] borrows a mesh and a manufactured solution, runs the whole
//! pipeline in [`FemSolver::compute`] and returns a read-only
//! [`SolvedField`] for post-processing.

use crate::assembly::{build_assembler, AssemblerKind, GlobalSystem};
use crate::backend::{build_solver, SolveInfo, SolverConfig};
use crate::basis::Basis;
use crate::boundary_conditions::{deduplicate, eliminate, resolve};
use crate::error::{FemError, Result};
use crate::geometry::Point2D;
use crate::mesh::Mesh;
use crate::observer::{SolveObserver, TracingObserver};
use crate::postprocess::{self, ErrorReport};
use crate::quadrature::{GaussOrder, Integrator};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Exact solution `U` and source `f` of `-div(lambda grad u) = f`
pub trait TestFunction {
    fn u(&self, point: Point2D) -> f64;
    fn f(&self, point: Point2D) -> f64;
}

/// [`TestFunction`] built from two closures
#[derive(Clone, Copy)]
pub struct FnTest<U, F> {
    u: U,
    f: F,
}

impl<U, F> FnTest<U, F>
where
    U: Fn(Point2D) -> f64,
    F: Fn(Point2D) -> f64,
{
    pub fn new(u: U, f: F) -> Self {
        Self { u, f }
    }
}

impl<U, F> TestFunction for FnTest<U, F>
where
    U: Fn(Point2D) -> f64,
    F: Fn(Point2D) -> f64,
{
    fn u(&self, point: Point2D) -> f64 {
        (self.u)(point)
    }

    fn f(&self, point: Point2D) -> f64 {
        (self.f)(point)
    }
}

/// Discretization and solver settings
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FemConfig {
    pub basis: Basis,
    pub assembler: AssemblerKind,
    pub quadrature: GaussOrder,
    pub solver: SolverConfig,
}

impl FemConfig {
    pub fn validate(&self) -> Result<()> {
        self.solver.validate()
    }
}

/// Finite element solver for one mesh and one manufactured solution
pub struct FemSolver<'a> {
    mesh: &'a Mesh,
    test: &'a dyn TestFunction,
    config: FemConfig,
    boundary_nodes: Vec<usize>,
}

impl<'a> FemSolver<'a> {
    /// `boundary_nodes` may contain duplicates; the first occurrence is kept
    pub fn new(
        mesh: &'a Mesh,
        test: &'a dyn TestFunction,
        config: FemConfig,
        boundary_nodes: Vec<usize>,
    ) -> Self {
        Self {
            mesh,
            test,
            config,
            boundary_nodes,
        }
    }

    /// Check the configuration against the mesh
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        if self.mesh.num_elements() == 0 {
            return Err(FemError::Config("Mesh has no elements".to_string()));
        }
        let expected = self.config.basis.size();
        if let Some((ielem, element)) = self
            .mesh
            .elements()
            .iter()
            .enumerate()
            .find(|(_, element)| element.num_nodes() != expected)
        {
            return Err(FemError::ElementSizeMismatch {
                element: ielem,
                expected,
                found: element.num_nodes(),
            });
        }
        Ok(())
    }

    /// Assemble the global system and apply the Dirichlet conditions
    pub fn assemble(&self) -> Result<GlobalSystem> {
        self.validate()?;

        let integrator = Integrator::new(self.config.quadrature);
        let mut assembler = build_assembler(self.config.assembler, self.config.basis, integrator);
        let mut system = GlobalSystem::assemble(self.mesh, assembler.as_mut(), self.test)?;
        debug!(
            unknowns = system.num_dofs(),
            nnz = system.matrix.nnz(),
            assembler = ?self.config.assembler,
            "global system assembled"
        );

        let nodes = deduplicate(&self.boundary_nodes);
        let boundary = resolve(&nodes, self.mesh, self.test)?;
        eliminate(&mut system.matrix, &mut system.rhs, &boundary)?;
        Ok(system)
    }

    /// Run the full pipeline, logging solver progress through `tracing`
    pub fn compute(&self) -> Result<SolvedField<'a>> {
        self.compute_with_observer(&mut TracingObserver)
    }

    /// Run the full pipeline, reporting solver progress to `observer`
    pub fn compute_with_observer(
        &self,
        observer: &mut dyn SolveObserver,
    ) -> Result<SolvedField<'a>> {
        let system = self.assemble()?;

        let mut solver = build_solver(&self.config.solver);
        solver.set_matrix(system.matrix);
        solver.set_vector(system.rhs);
        let solve_info = solver.compute(observer)?;
        let values = solver
            .solution()
            .cloned()
            .ok_or_else(|| FemError::Config("Solver produced no solution".to_string()))?;

        info!(
            nodes = self.mesh.num_nodes(),
            elements = self.mesh.num_elements(),
            basis = ?self.config.basis,
            solver = %solve_info.solver_name,
            iterations = solve_info.iterations,
            residual_ratio = solve_info.residual_ratio,
            "FEM solve finished"
        );

        Ok(SolvedField {
            mesh: self.mesh,
            test: self.test,
            basis: self.config.basis,
            quadrature: self.config.quadrature,
            values,
            solve_info,
        })
    }
}

/// Nodal solution with the context needed to post-process it
pub struct SolvedField<'a> {
    mesh: &'a Mesh,
    test: &'a dyn TestFunction,
    basis: Basis,
    quadrature: GaussOrder,
    values: DVector<f64>,
    solve_info: SolveInfo,
}

impl<'a> SolvedField<'a> {
    /// Nodal values `u_h`
    pub fn values(&self) -> &DVector<f64> {
        &self.values
    }

    pub fn solve_info(&self) -> &SolveInfo {
        &self.solve_info
    }

    pub fn mesh(&self) -> &'a Mesh {
        self.mesh
    }

    pub fn basis(&self) -> Basis {
        self.basis
    }

    /// Nodal error against the exact solution
    pub fn error(&self) -> Result<ErrorReport> {
        postprocess::nodal_error(&self.values, self.mesh, self.test)
    }

    /// Value of `u_h` at a physical point
    pub fn calculate_at_point(&self, point: Point2D) -> Result<f64> {
        postprocess::calculate_at_point(self.mesh, self.basis, &self.values, point)
    }

    /// `∫ |u_h - U|` over the domain
    pub fn integrate(&self) -> Result<f64> {
        let integrator = Integrator::new(self.quadrature);
        postprocess::integrate_error(self.mesh, self.basis, &self.values, self.test, &integrator)
    }
}
