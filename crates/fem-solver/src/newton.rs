//! Inverse isoparametric mapping by Newton's method.
//!
//! Finds the reference point `xi` of element `ielem` with `x(xi) = target`
//! by solving `F(xi) = x(xi) - target = 0`. Each step solves `J dxi = -F`
//! with the Jacobian at the current iterate and damps the step by halving
//! until the residual no longer grows.

use crate::basis::Basis;
use crate::dense::gauss_solve;
use crate::error::Result;
use crate::geometry::Point2D;
use crate::mapping::ElementMap;
use crate::mesh::Mesh;
use nalgebra::{Matrix2, Vector2};
use tracing::trace;

/// Iteration limit
pub const MAX_ITERATIONS: usize = 1000;
/// Relative residual at which the iteration stops
pub const TOLERANCE: f64 = 1e-12;
/// Smallest damping factor of the line search
pub const MIN_STEP: f64 = 1e-12;

/// Outcome of an inverse mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseMappingResult {
    /// Reference coordinates of the target
    pub point: Point2D,
    pub iterations: usize,
    /// Step halvings of the line search, over all iterations
    pub backtracks: usize,
    /// `||F|| / ||F0||`
    pub residual_ratio: f64,
    pub converged: bool,
}

#[derive(Debug, Clone)]
pub struct InverseMapping<'a> {
    basis: Basis,
    mesh: &'a Mesh,
    target: Point2D,
    ielem: usize,
}

impl<'a> InverseMapping<'a> {
    pub fn new(basis: Basis, mesh: &'a Mesh, target: Point2D, ielem: usize) -> Self {
        Self {
            basis,
            mesh,
            target,
            ielem,
        }
    }

    pub fn compute(&self) -> Result<InverseMappingResult> {
        let geometry = ElementMap::for_element(self.mesh, self.basis, self.ielem)?;
        let residual = |xi: Vector2<f64>| {
            let mapped = geometry.map(Point2D::new(xi[0], xi[1]));
            Vector2::new(mapped.x - self.target.x, mapped.y - self.target.y)
        };

        let mut xi = Vector2::new(0.5, 0.5);
        let mut f = residual(xi);
        let initial_norm = f.norm();
        if initial_norm == 0.0 {
            return Ok(InverseMappingResult {
                point: Point2D::new(xi[0], xi[1]),
                iterations: 0,
                backtracks: 0,
                residual_ratio: 0.0,
                converged: true,
            });
        }

        let mut norm = initial_norm;
        let mut iterations = 0;
        let mut backtracks = 0;
        while iterations < MAX_ITERATIONS && norm / initial_norm >= TOLERANCE {
            let jacobian: Matrix2<f64> = geometry.jacobian(Point2D::new(xi[0], xi[1]));
            let step = gauss_solve(jacobian, -f)?;

            let mut beta = 1.0;
            let (candidate, f_candidate) = loop {
                let candidate = xi + step * beta;
                let f_candidate = residual(candidate);
                if f_candidate.norm() <= norm || beta <= MIN_STEP {
                    break (candidate, f_candidate);
                }
                beta /= 2.0;
                backtracks += 1;
            };

            xi = candidate;
            f = f_candidate;
            norm = f.norm();
            iterations += 1;
            trace!(iteration = iterations, residual = norm, beta, "newton step");
        }

        let residual_ratio = norm / initial_norm;
        Ok(InverseMappingResult {
            point: Point2D::new(xi[0], xi[1]),
            iterations,
            backtracks,
            residual_ratio,
            converged: residual_ratio < TOLERANCE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FemError;
    use crate::mesh::FiniteElement;

    fn quadratic_sector() -> Mesh {
        // quarter annulus between r = 1 and r = 2, xi radial, eta angular
        let mut points = Vec::new();
        for j in 0..3 {
            let theta = std::f64::consts::FRAC_PI_2 * j as f64 / 2.0;
            for i in 0..3 {
                let r = 1.0 + i as f64 / 2.0;
                points.push(Point2D::new(r * theta.cos(), r * theta.sin()));
            }
        }
        Mesh::new(points, vec![FiniteElement::new((0..9).collect())]).unwrap()
    }

    #[test]
    fn round_trip_on_bilinear_element() {
        let points = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(2.0, 0.2),
            Point2D::new(0.3, 1.0),
            Point2D::new(2.5, 1.8),
        ];
        let mesh = Mesh::new(points, vec![FiniteElement::new(vec![0, 1, 2, 3])]).unwrap();
        let geometry = ElementMap::for_element(&mesh, Basis::Linear, 0).unwrap();

        for reference in [
            Point2D::new(0.1, 0.9),
            Point2D::new(0.75, 0.25),
            Point2D::new(1.0, 1.0),
            Point2D::new(0.0, 0.3),
        ] {
            let target = geometry.map(reference);
            let result = InverseMapping::new(Basis::Linear, &mesh, target, 0)
                .compute()
                .unwrap();
            assert!(result.converged);
            assert!(
                result.point.distance(reference) < 1e-8,
                "{:?} -> {:?}",
                reference,
                result.point
            );
        }
    }

    #[test]
    fn round_trip_on_curved_quadratic_element() {
        let mesh = quadratic_sector();
        let geometry = ElementMap::for_element(&mesh, Basis::Quadratic, 0).unwrap();
        for reference in [Point2D::new(0.2, 0.7), Point2D::new(0.9, 0.1), Point2D::new(0.5, 1.0)] {
            let target = geometry.map(reference);
            let result = InverseMapping::new(Basis::Quadratic, &mesh, target, 0)
                .compute()
                .unwrap();
            assert!(result.converged, "{:?}", result);
            assert!(result.point.distance(reference) < 1e-8);
            assert!(result.iterations < 50);
        }
    }

    #[test]
    fn damped_steps_on_a_stretched_element() {
        // convex, but the far corner pulls the full Newton step off target
        let points = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(-2.9, 0.1),
            Point2D::new(1.5, 0.8),
        ];
        let mesh = Mesh::new(points, vec![FiniteElement::new(vec![0, 1, 2, 3])]).unwrap();
        let geometry = ElementMap::for_element(&mesh, Basis::Linear, 0).unwrap();

        for reference in [Point2D::new(0.98, 0.02), Point2D::new(0.98, 0.98)] {
            let target = geometry.map(reference);
            let result = InverseMapping::new(Basis::Linear, &mesh, target, 0)
                .compute()
                .unwrap();
            assert!(result.backtracks > 0, "{:?}", result);
            assert!(result.converged, "{:?}", result);
            assert!(result.point.distance(reference) < 1e-10, "{:?}", result);
        }
    }

    #[test]
    fn unreachable_target_stops_at_iteration_limit() {
        // non-convex element whose map never reaches the target
        let points = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(4.0, 0.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(0.3, 0.3),
        ];
        let mesh = Mesh::new(points, vec![FiniteElement::new(vec![0, 1, 2, 3])]).unwrap();
        let result = InverseMapping::new(Basis::Linear, &mesh, Point2D::new(10.0, 10.0), 0)
            .compute()
            .unwrap();

        assert!(!result.converged);
        assert_eq!(result.iterations, MAX_ITERATIONS);
        assert!(result.residual_ratio > 0.5, "{:?}", result);
        assert!(result.backtracks > 0);
    }

    #[test]
    fn centre_target_returns_immediately() {
        let mesh = quadratic_sector();
        let geometry = ElementMap::for_element(&mesh, Basis::Quadratic, 0).unwrap();
        let target = geometry.map(Point2D::new(0.5, 0.5));
        let result = InverseMapping::new(Basis::Quadratic, &mesh, target, 0)
            .compute()
            .unwrap();
        assert_eq!(result.iterations, 0);
        assert_eq!(result.backtracks, 0);
        assert_eq!(result.point, Point2D::new(0.5, 0.5));
    }

    #[test]
    fn collapsed_element_is_singular() {
        let mesh = Mesh::new(
            vec![Point2D::new(1.0, 1.0); 4],
            vec![FiniteElement::new(vec![0, 1, 2, 3])],
        )
        .unwrap();
        let err = InverseMapping::new(Basis::Linear, &mesh, Point2D::new(0.0, 0.0), 0)
            .compute()
            .unwrap_err();
        assert!(matches!(err, FemError::SingularJacobian { .. }));
    }

    #[test]
    fn wrong_basis_is_rejected() {
        let mesh = quadratic_sector();
        let err = InverseMapping::new(Basis::Linear, &mesh, Point2D::new(1.0, 1.0), 0)
            .compute()
            .unwrap_err();
        assert!(matches!(err, FemError::ElementSizeMismatch { .. }));
    }
}
