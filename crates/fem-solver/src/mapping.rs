//! Isoparametric map from the reference square to a physical element.
//!
//! `x(xi, eta) = sum_i psi_i(xi, eta) * x_i`, with the Jacobian
//!
//! ```text
//! J = [dx/dxi  dx/deta]
//!     [dy/dxi  dy/deta]
//! ```

use crate::basis::Basis;
use crate::error::{FemError, Result};
use crate::geometry::Point2D;
use crate::mesh::Mesh;
use nalgebra::{Matrix2, Vector2};

/// Geometry of one element: a basis and the node coordinates it interpolates
#[derive(Debug, Clone)]
pub struct ElementMap {
    basis: Basis,
    coords: Vec<Point2D>,
}

impl ElementMap {
    pub fn new(basis: Basis, coords: Vec<Point2D>) -> Result<Self> {
        if coords.len() != basis.size() {
            return Err(FemError::DimensionMismatch {
                expected: basis.size(),
                found: coords.len(),
            });
        }
        Ok(Self { basis, coords })
    }

    /// Map of element `ielem` using every node of the element
    pub fn for_element(mesh: &Mesh, basis: Basis, ielem: usize) -> Result<Self> {
        let found = mesh.element(ielem).num_nodes();
        if found != basis.size() {
            return Err(FemError::ElementSizeMismatch {
                element: ielem,
                expected: basis.size(),
                found,
            });
        }
        Self::new(basis, mesh.element_points(ielem))
    }

    /// Bilinear map through the four corners of element `ielem` only
    pub fn corners_of_element(mesh: &Mesh, basis: Basis, ielem: usize) -> Result<Self> {
        let full = Self::for_element(mesh, basis, ielem)?;
        let coords = basis
            .corner_nodes()
            .iter()
            .map(|&local| full.coords[local])
            .collect();
        Self::new(Basis::Linear, coords)
    }

    pub fn basis(&self) -> Basis {
        self.basis
    }

    /// Physical image of a reference point
    pub fn map(&self, reference: Point2D) -> Point2D {
        let values = self.basis.tabulate(reference);
        self.coords
            .iter()
            .zip(&values.psi)
            .fold(Point2D::default(), |acc, (&c, &psi)| acc + c * psi)
    }

    /// Jacobian of the map at a reference point
    pub fn jacobian(&self, reference: Point2D) -> Matrix2<f64> {
        let values = self.basis.tabulate(reference);
        let mut jacobian = Matrix2::zeros();
        for (i, c) in self.coords.iter().enumerate() {
            for axis in 0..2 {
                let d = values.dpsi[axis][i];
                jacobian[(0, axis)] += d * c.x;
                jacobian[(1, axis)] += d * c.y;
            }
        }
        jacobian
    }
}

/// Transform reference derivatives into physical ones, `grad = J^{-T} grad_ref`.
///
/// `determinant` must be the (non-zero) determinant of `jacobian`.
pub fn physical_gradient(
    jacobian: &Matrix2<f64>,
    determinant: f64,
    reference_gradient: Vector2<f64>,
) -> Vector2<f64> {
    let (a, b) = (jacobian[(0, 0)], jacobian[(0, 1)]);
    let (c, d) = (jacobian[(1, 0)], jacobian[(1, 1)]);
    let (dxi, deta) = (reference_gradient[0], reference_gradient[1]);
    Vector2::new(
        (d * dxi - c * deta) / determinant,
        (-b * dxi + a * deta) / determinant,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rectangle_map() -> ElementMap {
        // [1, 3] x [2, 2.5]
        ElementMap::new(
            Basis::Linear,
            vec![
                Point2D::new(1.0, 2.0),
                Point2D::new(3.0, 2.0),
                Point2D::new(1.0, 2.5),
                Point2D::new(3.0, 2.5),
            ],
        )
        .unwrap()
    }

    #[test]
    fn map_interpolates_corners() {
        let map = rectangle_map();
        assert_eq!(map.map(Point2D::new(0.0, 0.0)), Point2D::new(1.0, 2.0));
        assert_eq!(map.map(Point2D::new(1.0, 1.0)), Point2D::new(3.0, 2.5));
        let mid = map.map(Point2D::new(0.5, 0.5));
        assert!((mid.x - 2.0).abs() < 1e-15 && (mid.y - 2.25).abs() < 1e-15);
    }

    #[test]
    fn jacobian_of_rectangle_is_diagonal() {
        let j = rectangle_map().jacobian(Point2D::new(0.3, 0.8));
        assert!((j[(0, 0)] - 2.0).abs() < 1e-15);
        assert!((j[(1, 1)] - 0.5).abs() < 1e-15);
        assert!(j[(0, 1)].abs() < 1e-15 && j[(1, 0)].abs() < 1e-15);
    }

    #[test]
    fn physical_gradient_of_linear_field() {
        // u = 2x - 3y on a skewed parallelogram
        let coords = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(2.0, 0.5),
            Point2D::new(0.5, 1.0),
            Point2D::new(2.5, 1.5),
        ];
        let map = ElementMap::new(Basis::Linear, coords.clone()).unwrap();
        let u: Vec<f64> = coords.iter().map(|p| 2.0 * p.x - 3.0 * p.y).collect();

        let reference = Point2D::new(0.4, 0.7);
        let jacobian = map.jacobian(reference);
        let values = Basis::Linear.tabulate(reference);
        let grad_ref: Vector2<f64> = Vector2::new(
            (0..4).map(|i| values.dpsi[0][i] * u[i]).sum(),
            (0..4).map(|i| values.dpsi[1][i] * u[i]).sum(),
        );
        let grad = physical_gradient(&jacobian, jacobian.determinant(), grad_ref);
        assert!((grad[0] - 2.0).abs() < 1e-13);
        assert!((grad[1] + 3.0).abs() < 1e-13);
    }

    #[test]
    fn coordinate_count_must_match_basis() {
        let err = ElementMap::new(Basis::Quadratic, vec![Point2D::default(); 4]).unwrap_err();
        assert_eq!(
            err,
            FemError::DimensionMismatch {
                expected: 9,
                found: 4
            }
        );
    }
}
