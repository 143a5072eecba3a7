//! Local matrix construction and global system assembly.
//!
//! ## Assembly Process
//!
//! 1. Build the portrait and allocate the symmetric sparse matrix
//! 2. Loop over all elements:
//!    - Compute local stiffness and mass matrices
//!    - Build the local load vector `b = M f(x_nodes)`
//!    - Scatter both into the global system
//!
//! Two assemblers are provided:
//! - [`StraightAssembler`]: axis-aligned rectangles. The reference matrices
//!   on the unit square are integrated once at construction; every element is
//!   then a rescaling by its width and height.
//! - [`CurvilinearAssembler`]: general (isoparametric) quadrilaterals. The
//!   Jacobian is evaluated at every quadrature point of every element.

use crate::analysis::TestFunction;
use crate::basis::Basis;
use crate::dense::symmetric_from_lower;
use crate::error::{FemError, Result};
use crate::geometry::Rectangle;
use crate::mapping::{physical_gradient, ElementMap};
use crate::mesh::{FiniteElement, Mesh};
use crate::portrait::Portrait;
use crate::quadrature::Integrator;
use crate::sparse::SymmetricSparseMatrix;
use nalgebra::{DMatrix, DVector, Vector2};
use serde::{Deserialize, Serialize};

/// Smallest Jacobian determinant accepted for an element
pub const DEGENERATE_EPS: f64 = 1e-14;

/// Which assembler to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssemblerKind {
    /// Axis-aligned rectangular elements
    #[default]
    Straight,
    /// Isoparametric elements
    Curvilinear {
        /// Compute the Jacobian from the four corner nodes with the linear
        /// basis, whatever the interpolation basis
        #[serde(default)]
        linear_jacobian: bool,
    },
}

/// Builds the local matrices of one element at a time
pub trait MatrixAssembler {
    /// Interpolation basis
    fn basis(&self) -> Basis;

    /// Compute the local stiffness and mass matrices of element `ielem`
    fn build_local_matrices(&mut self, mesh: &Mesh, ielem: usize) -> Result<()>;

    /// Local stiffness matrix of the last built element
    fn stiffness(&self) -> &DMatrix<f64>;

    /// Local mass matrix of the last built element
    fn mass(&self) -> &DMatrix<f64>;

    /// Scatter the current local stiffness matrix into the global matrix
    fn fill_global_matrix(
        &self,
        global: &mut SymmetricSparseMatrix,
        element: &FiniteElement,
    ) -> Result<()> {
        let stiffness = self.stiffness();
        for (i, &gi) in element.nodes.iter().enumerate() {
            for (j, &gj) in element.nodes.iter().enumerate() {
                global.add(gi, gj, stiffness[(i, j)])?;
            }
        }
        Ok(())
    }
}

/// Create the assembler selected by `kind`
pub fn build_assembler(
    kind: AssemblerKind,
    basis: Basis,
    integrator: Integrator,
) -> Box<dyn MatrixAssembler> {
    match kind {
        AssemblerKind::Straight => Box::new(StraightAssembler::new(basis, integrator)),
        AssemblerKind::Curvilinear { linear_jacobian } => Box::new(CurvilinearAssembler::new(
            basis,
            integrator,
            linear_jacobian,
        )),
    }
}

fn check_element_size(mesh: &Mesh, basis: Basis, ielem: usize) -> Result<()> {
    let found = mesh.element(ielem).num_nodes();
    if found != basis.size() {
        return Err(FemError::ElementSizeMismatch {
            element: ielem,
            expected: basis.size(),
            found,
        });
    }
    Ok(())
}

/// Assembler for axis-aligned rectangles.
///
/// For an element of width `hx` and height `hy`:
///
/// ```text
/// K = lambda * (hy/hx * Kx + hx/hy * Ky)
/// M = hx * hy * M0
/// ```
///
/// where `Kx`, `Ky`, `M0` are integrated once on the unit square.
#[derive(Debug, Clone)]
pub struct StraightAssembler {
    basis: Basis,
    base_stiffness: [DMatrix<f64>; 2],
    base_mass: DMatrix<f64>,
    stiffness: DMatrix<f64>,
    mass: DMatrix<f64>,
}

impl StraightAssembler {
    pub fn new(basis: Basis, integrator: Integrator) -> Self {
        let size = basis.size();
        let unit = Rectangle::unit();

        let base_stiffness = [0, 1].map(|axis| {
            symmetric_from_lower(size, |i, j| {
                integrator.gauss_2d(
                    |p| {
                        let values = basis.tabulate(p);
                        values.dpsi[axis][i] * values.dpsi[axis][j]
                    },
                    &unit,
                )
            })
        });
        let base_mass = symmetric_from_lower(size, |i, j| {
            integrator.gauss_2d(
                |p| {
                    let values = basis.tabulate(p);
                    values.psi[i] * values.psi[j]
                },
                &unit,
            )
        });

        Self {
            basis,
            base_stiffness,
            base_mass,
            stiffness: DMatrix::zeros(size, size),
            mass: DMatrix::zeros(size, size),
        }
    }
}

impl MatrixAssembler for StraightAssembler {
    fn basis(&self) -> Basis {
        self.basis
    }

    fn build_local_matrices(&mut self, mesh: &Mesh, ielem: usize) -> Result<()> {
        check_element_size(mesh, self.basis, ielem)?;
        let element = mesh.element(ielem);
        let (Some(first), Some(last)) = (element.first(), element.last()) else {
            return Err(FemError::InvalidMesh(format!("Element {} has no nodes", ielem)));
        };
        let diagonal = mesh.point(last) - mesh.point(first);
        let (hx, hy) = (diagonal.x, diagonal.y);
        if hx * hy < DEGENERATE_EPS {
            return Err(FemError::DegenerateElement {
                element: ielem,
                determinant: hx * hy,
            });
        }

        let kx = hy / hx * element.lambda;
        let ky = hx / hy * element.lambda;
        self.stiffness = &self.base_stiffness[0] * kx + &self.base_stiffness[1] * ky;
        self.mass = &self.base_mass * (hx * hy);
        Ok(())
    }

    fn stiffness(&self) -> &DMatrix<f64> {
        &self.stiffness
    }

    fn mass(&self) -> &DMatrix<f64> {
        &self.mass
    }
}

/// Isoparametric assembler for curved or skewed quadrilaterals.
///
/// At each quadrature point the Jacobian `J` of the element map gives the
/// physical gradients `J^{-T} grad_ref`:
///
/// ```text
/// K_ij = lambda * sum_q grad psi_i . grad psi_j |det J| w_q
/// M_ij =          sum_q psi_i psi_j |det J| w_q
/// ```
///
/// With `linear_jacobian` the map is the bilinear one through the four
/// corner nodes, which is only exact when the element geometry is itself
/// bilinear (straight edges, midside nodes at the edge midpoints).
#[derive(Debug, Clone)]
pub struct CurvilinearAssembler {
    basis: Basis,
    integrator: Integrator,
    linear_jacobian: bool,
    stiffness: DMatrix<f64>,
    mass: DMatrix<f64>,
}

impl CurvilinearAssembler {
    pub fn new(basis: Basis, integrator: Integrator, linear_jacobian: bool) -> Self {
        let size = basis.size();
        Self {
            basis,
            integrator,
            linear_jacobian,
            stiffness: DMatrix::zeros(size, size),
            mass: DMatrix::zeros(size, size),
        }
    }

    pub fn linear_jacobian(&self) -> bool {
        self.linear_jacobian
    }
}

impl MatrixAssembler for CurvilinearAssembler {
    fn basis(&self) -> Basis {
        self.basis
    }

    fn build_local_matrices(&mut self, mesh: &Mesh, ielem: usize) -> Result<()> {
        check_element_size(mesh, self.basis, ielem)?;
        let geometry = if self.linear_jacobian {
            ElementMap::corners_of_element(mesh, self.basis, ielem)?
        } else {
            ElementMap::for_element(mesh, self.basis, ielem)?
        };

        let basis = self.basis;
        let size = basis.size();
        let lambda = mesh.element(ielem).lambda;
        let mut stiffness = DMatrix::zeros(size, size);
        let mut mass = DMatrix::zeros(size, size);
        let mut degenerate = None;

        self.integrator
            .for_each_point(&Rectangle::unit(), |point, weight| {
                if degenerate.is_some() {
                    return;
                }
                let jacobian = geometry.jacobian(point);
                let determinant = jacobian.determinant();
                if determinant.abs() < DEGENERATE_EPS {
                    degenerate = Some(determinant);
                    return;
                }

                let values = basis.tabulate(point);
                let gradients: Vec<Vector2<f64>> = (0..size)
                    .map(|i| {
                        let reference = Vector2::new(values.dpsi[0][i], values.dpsi[1][i]);
                        physical_gradient(&jacobian, determinant, reference)
                    })
                    .collect();

                let scale = determinant.abs() * weight;
                for i in 0..size {
                    for j in 0..=i {
                        stiffness[(i, j)] += lambda * gradients[i].dot(&gradients[j]) * scale;
                        mass[(i, j)] += values.psi[i] * values.psi[j] * scale;
                    }
                }
            });

        if let Some(determinant) = degenerate {
            return Err(FemError::DegenerateElement {
                element: ielem,
                determinant,
            });
        }

        stiffness.fill_upper_triangle_with_lower_triangle();
        mass.fill_upper_triangle_with_lower_triangle();
        self.stiffness = stiffness;
        self.mass = mass;
        Ok(())
    }

    fn stiffness(&self) -> &DMatrix<f64> {
        &self.stiffness
    }

    fn mass(&self) -> &DMatrix<f64> {
        &self.mass
    }
}

/// Assembled global system `A u = b`
#[derive(Debug, Clone)]
pub struct GlobalSystem {
    /// Global symmetric matrix
    pub matrix: SymmetricSparseMatrix,
    /// Right-hand side
    pub rhs: DVector<f64>,
}

impl GlobalSystem {
    /// Allocate a zero system with the portrait of `mesh`
    pub fn new(mesh: &Mesh) -> Self {
        let matrix = SymmetricSparseMatrix::from_portrait(Portrait::build(mesh));
        let rhs = DVector::zeros(matrix.size());
        Self { matrix, rhs }
    }

    /// Number of unknowns
    pub fn num_dofs(&self) -> usize {
        self.rhs.len()
    }

    /// Assemble the stiffness matrix and the load vector of `-div(lambda grad u) = f`
    pub fn assemble(
        mesh: &Mesh,
        assembler: &mut dyn MatrixAssembler,
        test: &dyn TestFunction,
    ) -> Result<Self> {
        let mut system = Self::new(mesh);
        let size = assembler.basis().size();
        let mut local_vector = DVector::zeros(size);

        for (ielem, element) in mesh.elements().iter().enumerate() {
            assembler.build_local_matrices(mesh, ielem)?;

            let source = DVector::from_iterator(
                size,
                element.nodes.iter().map(|&node| test.f(mesh.point(node))),
            );
            assembler.mass().mul_to(&source, &mut local_vector);

            for (i, &node) in element.nodes.iter().enumerate() {
                system.rhs[node] += local_vector[i];
            }
            assembler.fill_global_matrix(&mut system.matrix, element)?;
        }

        Ok(system)
    }
}
