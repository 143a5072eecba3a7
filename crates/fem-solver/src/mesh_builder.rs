//! Structured mesh builders.
//!
//! Both builders lay nodes out on a logical `nodes_x x nodes_y` grid, global
//! index `i + nodes_x * j`, and cut it into elements of one (linear) or two
//! (quadratic) grid steps per side. Element nodes follow the tensor-product
//! order of [`crate::basis`].

use crate::basis::Basis;
use crate::error::{FemError, Result};
use crate::geometry::{Interval, Point2D};
use crate::mesh::{FiniteElement, Mesh};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::debug;

/// Interpolation order of generated elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementOrder {
    /// 4-node elements
    #[default]
    Linear,
    /// 9-node elements
    Quadratic,
}

impl ElementOrder {
    /// Basis matching the element node layout
    pub fn basis(&self) -> Basis {
        match self {
            ElementOrder::Linear => Basis::Linear,
            ElementOrder::Quadratic => Basis::Quadratic,
        }
    }

    /// Grid steps per element side
    fn steps(&self) -> usize {
        match self {
            ElementOrder::Linear => 1,
            ElementOrder::Quadratic => 2,
        }
    }
}

/// Axis-aligned rectangular domain split uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshParameters {
    pub interval_x: Interval,
    pub splits_x: usize,
    pub interval_y: Interval,
    pub splits_y: usize,
}

impl MeshParameters {
    pub fn validate(&self) -> Result<()> {
        if self.splits_x == 0 || self.splits_y == 0 {
            return Err(FemError::Config(format!(
                "Mesh splits must be at least 1, got {} x {}",
                self.splits_x, self.splits_y
            )));
        }
        for (name, interval) in [("x", self.interval_x), ("y", self.interval_y)] {
            if !(interval.right > interval.left) {
                return Err(FemError::Config(format!(
                    "Interval {} must satisfy left < right, got [{}, {}]",
                    name, interval.left, interval.right
                )));
            }
        }
        Ok(())
    }
}

/// Annular sector around `center`, angles measured from the positive x axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveMeshParameters {
    pub center: Point2D,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub radial_splits: usize,
    pub angular_splits: usize,
    /// Opening angle in radians; a full turn closes the ring
    #[serde(default = "full_turn")]
    pub sweep: f64,
}

fn full_turn() -> f64 {
    TAU
}

impl CurveMeshParameters {
    /// Whether the sector is a full ring
    pub fn is_periodic(&self) -> bool {
        (self.sweep - TAU).abs() < 1e-12
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.inner_radius > 0.0 && self.outer_radius > self.inner_radius) {
            return Err(FemError::Config(format!(
                "Radii must satisfy 0 < inner < outer, got {} and {}",
                self.inner_radius, self.outer_radius
            )));
        }
        if !(self.sweep > 0.0 && self.sweep <= TAU + 1e-12) {
            return Err(FemError::Config(format!(
                "Sweep must lie in (0, 2*pi], got {}",
                self.sweep
            )));
        }
        if self.radial_splits == 0 || self.angular_splits == 0 {
            return Err(FemError::Config(format!(
                "Mesh splits must be at least 1, got {} x {}",
                self.radial_splits, self.angular_splits
            )));
        }
        if self.is_periodic() && self.angular_splits < 3 {
            return Err(FemError::Config(format!(
                "A full ring needs at least 3 angular splits, got {}",
                self.angular_splits
            )));
        }
        Ok(())
    }
}

/// Logical node grid of a structured mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub nodes_x: usize,
    pub nodes_y: usize,
    /// Row `nodes_y` is row 0 again (closed ring)
    pub periodic: bool,
}

impl GridLayout {
    /// Global index of grid node `(i, j)`
    pub fn index(&self, i: usize, j: usize) -> usize {
        let j = if self.periodic { j % self.nodes_y } else { j };
        i + self.nodes_x * j
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes_x * self.nodes_y
    }

    /// Elements of `steps` grid steps per side covering the grid
    fn elements(&self, splits_x: usize, splits_y: usize, steps: usize) -> Vec<FiniteElement> {
        let mut elements = Vec::with_capacity(splits_x * splits_y);
        for ey in 0..splits_y {
            for ex in 0..splits_x {
                let mut nodes = Vec::with_capacity((steps + 1) * (steps + 1));
                for b in 0..=steps {
                    for a in 0..=steps {
                        nodes.push(self.index(ex * steps + a, ey * steps + b));
                    }
                }
                elements.push(FiniteElement::new(nodes));
            }
        }
        elements
    }
}

/// A mesh together with its node grid
#[derive(Debug, Clone)]
pub struct StructuredMesh {
    pub mesh: Mesh,
    pub layout: GridLayout,
}

/// Uniform grid over a rectangle
pub struct RegularMeshBuilder;

impl RegularMeshBuilder {
    pub fn build(params: &MeshParameters, order: ElementOrder) -> Result<StructuredMesh> {
        params.validate()?;
        let steps = order.steps();
        let layout = GridLayout {
            nodes_x: params.splits_x * steps + 1,
            nodes_y: params.splits_y * steps + 1,
            periodic: false,
        };

        let hx = params.interval_x.length() / (layout.nodes_x - 1) as f64;
        let hy = params.interval_y.length() / (layout.nodes_y - 1) as f64;
        let mut points = Vec::with_capacity(layout.num_nodes());
        for j in 0..layout.nodes_y {
            for i in 0..layout.nodes_x {
                points.push(Point2D::new(
                    params.interval_x.left + i as f64 * hx,
                    params.interval_y.left + j as f64 * hy,
                ));
            }
        }

        let elements = layout.elements(params.splits_x, params.splits_y, steps);
        let mesh = Mesh::new(points, elements)?;
        debug!(
            nodes = mesh.num_nodes(),
            elements = mesh.num_elements(),
            ?order,
            "regular mesh built"
        );
        Ok(StructuredMesh { mesh, layout })
    }
}

/// Annular sector in polar coordinates.
///
/// Local `xi` runs along the radius and `eta` along the angle, so every
/// element has a positive Jacobian. Quadratic elements place their extra
/// nodes on the arcs and rays, giving curved element edges.
pub struct CurveMeshBuilder;

impl CurveMeshBuilder {
    pub fn build(params: &CurveMeshParameters, order: ElementOrder) -> Result<StructuredMesh> {
        params.validate()?;
        let steps = order.steps();
        let periodic = params.is_periodic();
        let radial_steps = params.radial_splits * steps;
        let angular_steps = params.angular_splits * steps;
        let layout = GridLayout {
            nodes_x: radial_steps + 1,
            nodes_y: if periodic { angular_steps } else { angular_steps + 1 },
            periodic,
        };

        let dr = (params.outer_radius - params.inner_radius) / radial_steps as f64;
        let dtheta = params.sweep / angular_steps as f64;
        let mut points = Vec::with_capacity(layout.num_nodes());
        for j in 0..layout.nodes_y {
            let (sin, cos) = (j as f64 * dtheta).sin_cos();
            for i in 0..layout.nodes_x {
                let r = params.inner_radius + i as f64 * dr;
                points.push(params.center + Point2D::new(r * cos, r * sin));
            }
        }

        let elements = layout.elements(params.radial_splits, params.angular_splits, steps);
        let mesh = Mesh::new(points, elements)?;
        debug!(
            nodes = mesh.num_nodes(),
            elements = mesh.num_elements(),
            periodic,
            ?order,
            "curvilinear mesh built"
        );
        Ok(StructuredMesh { mesh, layout })
    }
}
