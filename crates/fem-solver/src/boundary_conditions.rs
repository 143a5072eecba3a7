//! Dirichlet boundary conditions.
//!
//! This module handles:
//! - Selecting boundary nodes of structured meshes from per-border flags
//! - Resolving prescribed values from the exact solution
//! - Static condensation of the prescribed nodes out of the global system

use crate::analysis::TestFunction;
use crate::error::{FemError, Result};
use crate::mesh::Mesh;
use crate::mesh_builder::GridLayout;
use crate::sparse::SymmetricSparseMatrix;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// A prescribed value on one global node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirichletBoundary {
    /// Global node index
    pub node: usize,
    /// Prescribed value
    pub value: f64,
}

impl DirichletBoundary {
    pub fn new(node: usize, value: f64) -> Self {
        Self { node, value }
    }
}

/// Remove repeated node indices, keeping the first occurrence
pub fn deduplicate(nodes: &[usize]) -> Vec<usize> {
    let mut seen = HashSet::with_capacity(nodes.len());
    nodes.iter().copied().filter(|&node| seen.insert(node)).collect()
}

/// Prescribe the exact solution `U` on every node of `nodes`
pub fn resolve(
    nodes: &[usize],
    mesh: &Mesh,
    test: &dyn TestFunction,
) -> Result<Vec<DirichletBoundary>> {
    nodes
        .iter()
        .map(|&node| {
            if node >= mesh.num_nodes() {
                return Err(FemError::Config(format!(
                    "Boundary node {} does not exist (mesh has {} nodes)",
                    node,
                    mesh.num_nodes()
                )));
            }
            Ok(DirichletBoundary::new(node, test.u(mesh.point(node))))
        })
        .collect()
}

/// Eliminate prescribed nodes from `A u = b` by static condensation.
///
/// For a prescribed row `i`: `A_ii = 1`, `b_i = g_i` and the off-diagonal
/// entries are zeroed after moving `A_ij g_i` to `b_j` of free columns. For a
/// free row, every entry coupling it to a prescribed column is moved to the
/// right-hand side and zeroed. The resulting matrix stays symmetric, and
/// applying the same boundary twice changes nothing.
pub fn eliminate(
    matrix: &mut SymmetricSparseMatrix,
    rhs: &mut DVector<f64>,
    boundary: &[DirichletBoundary],
) -> Result<()> {
    let n = matrix.size();
    if rhs.len() != n {
        return Err(FemError::DimensionMismatch {
            expected: n,
            found: rhs.len(),
        });
    }

    let mut prescribed: Vec<Option<f64>> = vec![None; n];
    for bc in boundary {
        if bc.node >= n {
            return Err(FemError::Config(format!(
                "Boundary node {} does not exist (system has {} unknowns)",
                bc.node, n
            )));
        }
        prescribed[bc.node].get_or_insert(bc.value);
    }

    for i in 0..n {
        let range = matrix.row_range(i);
        match prescribed[i] {
            Some(value) => {
                matrix.di_mut()[i] = 1.0;
                rhs[i] = value;
                for k in range {
                    let j = matrix.jg()[k];
                    if prescribed[j].is_none() {
                        rhs[j] -= matrix.gg()[k] * value;
                    }
                    matrix.gg_mut()[k] = 0.0;
                }
            }
            None => {
                for k in range {
                    let j = matrix.jg()[k];
                    if let Some(value) = prescribed[j] {
                        rhs[i] -= matrix.gg()[k] * value;
                        matrix.gg_mut()[k] = 0.0;
                    }
                }
            }
        }
    }

    debug!(prescribed = boundary.len(), unknowns = n, "Dirichlet conditions applied");
    Ok(())
}

/// Which borders of a structured mesh carry a Dirichlet condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryParameters {
    pub left: bool,
    pub right: bool,
    pub bottom: bool,
    pub top: bool,
}

impl BoundaryParameters {
    /// Every border prescribed
    pub fn all() -> Self {
        Self {
            left: true,
            right: true,
            bottom: true,
            top: true,
        }
    }
}

/// Border node lists of a structured mesh.
///
/// Node `(i, j)` of the grid has global index `i + nodes_x * j`. For the
/// curvilinear builder `i` runs along the radius (left = inner, right = outer
/// arc) and `j` along the angle.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryHandler {
    layout: GridLayout,
}

impl BoundaryHandler {
    pub fn new(layout: GridLayout) -> Self {
        Self { layout }
    }

    pub fn left(&self) -> Vec<usize> {
        (0..self.layout.nodes_y)
            .map(|j| self.layout.index(0, j))
            .collect()
    }

    pub fn right(&self) -> Vec<usize> {
        let last = self.layout.nodes_x - 1;
        (0..self.layout.nodes_y)
            .map(|j| self.layout.index(last, j))
            .collect()
    }

    pub fn bottom(&self) -> Vec<usize> {
        if self.layout.periodic {
            return Vec::new();
        }
        (0..self.layout.nodes_x)
            .map(|i| self.layout.index(i, 0))
            .collect()
    }

    pub fn top(&self) -> Vec<usize> {
        if self.layout.periodic {
            return Vec::new();
        }
        let last = self.layout.nodes_y - 1;
        (0..self.layout.nodes_x)
            .map(|i| self.layout.index(i, last))
            .collect()
    }

    /// Nodes of every flagged border. Corners shared by two borders appear twice.
    pub fn boundary_nodes(&self, params: &BoundaryParameters) -> Vec<usize> {
        if self.layout.periodic && (params.bottom || params.top) {
            warn!("bottom/top boundary flags ignored on a periodic mesh");
        }

        let mut nodes = Vec::new();
        if params.left {
            nodes.extend(self.left());
        }
        if params.right {
            nodes.extend(self.right());
        }
        if params.bottom {
            nodes.extend(self.bottom());
        }
        if params.top {
            nodes.extend(self.top());
        }
        nodes
    }
}
