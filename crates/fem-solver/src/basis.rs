//! Lagrange basis functions on the reference square [0,1]x[0,1].
//!
//! Both bases are tensor products of 1D Lagrange polynomials. Local nodes are
//! numbered lexicographically, x fastest:
//!
//! ```text
//! Linear (4 nodes)        Quadratic (9 nodes)
//!
//!   2-------3               6----7----8
//!   |       |               |         |
//!   |       |               3    4    5
//!   |       |               |         |
//!   0-------1               0----1----2
//! ```
//!
//! Node 0 is always the left-bottom corner and the last node the right-top
//! corner of the element.

use crate::error::{FemError, Result};
use crate::geometry::Point2D;
use serde::{Deserialize, Serialize};

/// Closed set of supported bases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Basis {
    /// 4-node bilinear basis
    #[default]
    Linear,
    /// 9-node biquadratic basis
    Quadratic,
}

/// All basis values and reference derivatives at one point
#[derive(Debug, Clone, PartialEq)]
pub struct BasisValues {
    /// psi_i(p)
    pub psi: Vec<f64>,
    /// [d psi_i / d xi, d psi_i / d eta]
    pub dpsi: [Vec<f64>; 2],
}

impl Basis {
    /// Number of local degrees of freedom
    pub fn size(&self) -> usize {
        match self {
            Basis::Linear => 4,
            Basis::Quadratic => 9,
        }
    }

    /// Nodes per reference axis
    fn nodes_per_axis(&self) -> usize {
        match self {
            Basis::Linear => 2,
            Basis::Quadratic => 3,
        }
    }

    /// Value of shape function `index` at a reference point
    pub fn psi(&self, index: usize, point: Point2D) -> Result<f64> {
        self.check_index(index, None)?;
        Ok(self.psi_unchecked(index, point))
    }

    /// Derivative of shape function `index` along `axis` (0 = xi, 1 = eta)
    pub fn dpsi(&self, index: usize, axis: usize, point: Point2D) -> Result<f64> {
        self.check_index(index, Some(axis))?;
        Ok(self.dpsi_unchecked(index, axis, point))
    }

    /// Evaluate every shape function and both derivatives at once
    pub fn tabulate(&self, point: Point2D) -> BasisValues {
        let size = self.size();
        let mut values = BasisValues {
            psi: Vec::with_capacity(size),
            dpsi: [Vec::with_capacity(size), Vec::with_capacity(size)],
        };
        for i in 0..size {
            values.psi.push(self.psi_unchecked(i, point));
            values.dpsi[0].push(self.dpsi_unchecked(i, 0, point));
            values.dpsi[1].push(self.dpsi_unchecked(i, 1, point));
        }
        values
    }

    /// Reference coordinates of local node `index`
    pub fn node(&self, index: usize) -> Result<Point2D> {
        self.check_index(index, None)?;
        let n = self.nodes_per_axis();
        let step = 1.0 / (n - 1) as f64;
        Ok(Point2D::new(
            (index % n) as f64 * step,
            (index / n) as f64 * step,
        ))
    }

    /// Local indices of the four corners, in linear-basis order
    pub fn corner_nodes(&self) -> [usize; 4] {
        match self {
            Basis::Linear => [0, 1, 2, 3],
            Basis::Quadratic => [0, 2, 6, 8],
        }
    }

    /// Local nodes on the element boundary, counter-clockwise from node 0
    pub fn boundary_cycle(&self) -> &'static [usize] {
        match self {
            Basis::Linear => &[0, 1, 3, 2],
            Basis::Quadratic => &[0, 1, 2, 5, 8, 7, 6, 3],
        }
    }

    fn check_index(&self, index: usize, axis: Option<usize>) -> Result<()> {
        let axis_ok = axis.is_none_or(|a| a < 2);
        if index >= self.size() || !axis_ok {
            return Err(FemError::BasisIndexOutOfRange {
                index,
                axis,
                size: self.size(),
            });
        }
        Ok(())
    }

    fn psi_unchecked(&self, index: usize, point: Point2D) -> f64 {
        let n = self.nodes_per_axis();
        self.lagrange(index % n, point.x) * self.lagrange(index / n, point.y)
    }

    fn dpsi_unchecked(&self, index: usize, axis: usize, point: Point2D) -> f64 {
        let n = self.nodes_per_axis();
        let (ix, iy) = (index % n, index / n);
        if axis == 0 {
            self.lagrange_derivative(ix, point.x) * self.lagrange(iy, point.y)
        } else {
            self.lagrange(ix, point.x) * self.lagrange_derivative(iy, point.y)
        }
    }

    /// 1D Lagrange polynomial `k` on [0,1]
    fn lagrange(&self, k: usize, t: f64) -> f64 {
        match (self, k) {
            (Basis::Linear, 0) => 1.0 - t,
            (Basis::Linear, _) => t,
            (Basis::Quadratic, 0) => 2.0 * (t - 0.5) * (t - 1.0),
            (Basis::Quadratic, 1) => -4.0 * t * (t - 1.0),
            (Basis::Quadratic, _) => 2.0 * t * (t - 0.5),
        }
    }

    fn lagrange_derivative(&self, k: usize, t: f64) -> f64 {
        match (self, k) {
            (Basis::Linear, 0) => -1.0,
            (Basis::Linear, _) => 1.0,
            (Basis::Quadratic, 0) => 4.0 * t - 3.0,
            (Basis::Quadratic, 1) => -8.0 * t + 4.0,
            (Basis::Quadratic, _) => 4.0 * t - 1.0,
        }
    }
}
