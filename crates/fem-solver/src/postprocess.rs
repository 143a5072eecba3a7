//! Post-processing of a nodal solution.
//!
//! - Nodal error against the exact solution
//! - Point location and evaluation through the inverse isoparametric map
//! - Domain integral of `|u_h - U|` with successive refinement of the
//!   quadrature cells

use crate::analysis::TestFunction;
use crate::basis::Basis;
use crate::error::{FemError, Result};
use crate::geometry::{Point2D, Rectangle};
use crate::mapping::ElementMap;
use crate::mesh::Mesh;
use crate::newton::InverseMapping;
use crate::quadrature::Integrator;
use nalgebra::DVector;
use tracing::{debug, trace};

/// Cell counts per reference axis tried by [`integrate_error`]
pub const SUBDIVISIONS: [usize; 6] = [1, 2, 4, 8, 16, 32];
/// Relative change between two subdivisions at which integration stops
pub const INTEGRATION_TOLERANCE: f64 = 1e-10;
/// Slack allowed around the reference square when accepting a located point
const REFERENCE_SLACK: f64 = 1e-8;
/// Growth of an element's node bounding box when searching past its polygon
const BOX_MARGIN: f64 = 0.25;

/// Nodal error statistics
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    /// `|u_h - U|` at every node
    pub nodal: Vec<f64>,
    /// Largest nodal error
    pub max: f64,
    /// Root mean square of the nodal errors
    pub rms: f64,
    /// `||u_h - U|| / ||U||` over the nodes (absolute when `U` vanishes)
    pub relative_rms: f64,
}

impl ErrorReport {
    /// Format as a human-readable string
    pub fn format(&self) -> String {
        format!(
            "max |u_h - u| = {:.6e}, rms = {:.6e}, relative = {:.6e}",
            self.max, self.rms, self.relative_rms
        )
    }
}

/// Compare nodal values with the exact solution
pub fn nodal_error(
    values: &DVector<f64>,
    mesh: &Mesh,
    test: &dyn TestFunction,
) -> Result<ErrorReport> {
    if values.len() != mesh.num_nodes() {
        return Err(FemError::DimensionMismatch {
            expected: mesh.num_nodes(),
            found: values.len(),
        });
    }

    let exact: Vec<f64> = mesh.points().iter().map(|&p| test.u(p)).collect();
    let nodal: Vec<f64> = values
        .iter()
        .zip(&exact)
        .map(|(u_h, u)| (u_h - u).abs())
        .collect();

    let max = nodal.iter().copied().fold(0.0, f64::max);
    let sum_sq: f64 = nodal.iter().map(|e| e * e).sum();
    let exact_sq: f64 = exact.iter().map(|u| u * u).sum();
    let rms = if nodal.is_empty() {
        0.0
    } else {
        (sum_sq / nodal.len() as f64).sqrt()
    };
    let relative_rms = if exact_sq > 0.0 {
        (sum_sq / exact_sq).sqrt()
    } else {
        sum_sq.sqrt()
    };

    Ok(ErrorReport {
        nodal,
        max,
        rms,
        relative_rms,
    })
}

fn on_segment(p: Point2D, a: Point2D, b: Point2D) -> bool {
    let ab = b - a;
    let ap = p - a;
    let scale = ab.norm().max(1e-300);
    let cross = ab.x * ap.y - ab.y * ap.x;
    if cross.abs() > 1e-12 * scale * scale.max(ap.norm()) {
        return false;
    }
    let dot = ab.x * ap.x + ab.y * ap.y;
    dot >= -1e-12 * scale * scale && dot <= (1.0 + 1e-12) * scale * scale
}

/// Point-in-polygon by counting crossings of a horizontal ray.
/// Points on an edge count as inside.
fn polygon_contains(polygon: &[Point2D], p: Point2D) -> bool {
    let n = polygon.len();
    let mut inside = false;
    for k in 0..n {
        let a = polygon[k];
        let b = polygon[(k + 1) % n];
        if on_segment(p, a, b) {
            return true;
        }
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

/// Elements whose boundary polygon contains `point`
pub fn locate_element(mesh: &Mesh, basis: Basis, point: Point2D) -> Vec<usize> {
    let cycle = basis.boundary_cycle();
    mesh.elements()
        .iter()
        .enumerate()
        .filter(|(_, element)| element.num_nodes() == basis.size())
        .filter(|(_, element)| {
            let polygon: Vec<Point2D> = cycle
                .iter()
                .map(|&local| mesh.point(element.nodes[local]))
                .collect();
            polygon_contains(&polygon, point)
        })
        .map(|(ielem, _)| ielem)
        .collect()
}

fn inside_reference(point: Point2D) -> bool {
    let range = -REFERENCE_SLACK..=1.0 + REFERENCE_SLACK;
    range.contains(&point.x) && range.contains(&point.y)
}

/// Value of `u_h` at `point` if it maps inside element `ielem`
fn evaluate_in_element(
    mesh: &Mesh,
    basis: Basis,
    values: &DVector<f64>,
    point: Point2D,
    ielem: usize,
) -> Option<f64> {
    let result = match InverseMapping::new(basis, mesh, point, ielem).compute() {
        Ok(result) => result,
        Err(err) => {
            debug!(element = ielem, %err, "inverse mapping failed, trying next candidate");
            return None;
        }
    };
    if !result.converged || !inside_reference(result.point) {
        trace!(element = ielem, ?result, "point not inside candidate element");
        return None;
    }

    let shape = basis.tabulate(result.point);
    Some(
        mesh.element(ielem)
            .nodes
            .iter()
            .zip(&shape.psi)
            .map(|(&node, psi)| values[node] * psi)
            .sum(),
    )
}

/// Whether `point` lies in the node bounding box of element `ielem`, grown
/// by [`BOX_MARGIN`] of its larger side
fn near_element(mesh: &Mesh, ielem: usize, point: Point2D) -> bool {
    let (min, max) = mesh.element(ielem).nodes.iter().fold(
        (
            Point2D::new(f64::INFINITY, f64::INFINITY),
            Point2D::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        ),
        |(min, max), &node| {
            let p = mesh.point(node);
            (
                Point2D::new(min.x.min(p.x), min.y.min(p.y)),
                Point2D::new(max.x.max(p.x), max.y.max(p.y)),
            )
        },
    );
    let margin = BOX_MARGIN * (max.x - min.x).max(max.y - min.y);
    point.x >= min.x - margin
        && point.x <= max.x + margin
        && point.y >= min.y - margin
        && point.y <= max.y + margin
}

/// Value of the finite element solution at a physical point
pub fn calculate_at_point(
    mesh: &Mesh,
    basis: Basis,
    values: &DVector<f64>,
    point: Point2D,
) -> Result<f64> {
    let candidates = locate_element(mesh, basis, point);
    for &ielem in &candidates {
        if let Some(value) = evaluate_in_element(mesh, basis, values, point, ielem) {
            return Ok(value);
        }
    }

    // curved edges bulge past the polygon through their boundary nodes
    for ielem in 0..mesh.num_elements() {
        if candidates.contains(&ielem)
            || mesh.element(ielem).num_nodes() != basis.size()
            || !near_element(mesh, ielem, point)
        {
            continue;
        }
        if let Some(value) = evaluate_in_element(mesh, basis, values, point, ielem) {
            debug!(element = ielem, "point found outside the element boundary polygon");
            return Ok(value);
        }
    }

    Err(FemError::PointOutsideMesh {
        x: point.x,
        y: point.y,
    })
}

/// `∫ |u_h - U|` over element `ielem` with the reference square split into
/// `k x k` cells
fn element_error_integral(
    geometry: &ElementMap,
    local_values: &[f64],
    test: &dyn TestFunction,
    integrator: &Integrator,
    k: usize,
) -> f64 {
    let basis = geometry.basis();
    let h = 1.0 / k as f64;
    let mut total = 0.0;
    for cj in 0..k {
        for ci in 0..k {
            let cell = Rectangle::new(
                Point2D::new(ci as f64 * h, cj as f64 * h),
                Point2D::new((ci + 1) as f64 * h, (cj + 1) as f64 * h),
            );
            total += integrator.gauss_2d(
                |reference| {
                    let shape = basis.tabulate(reference);
                    let u_h: f64 = local_values.iter().zip(&shape.psi).map(|(u, psi)| u * psi).sum();
                    let exact = test.u(geometry.map(reference));
                    let det = geometry.jacobian(reference).determinant();
                    (u_h - exact).abs() * det.abs()
                },
                &cell,
            );
        }
    }
    total
}

/// `∫ |u_h - U|` over the whole mesh
pub fn integrate_error(
    mesh: &Mesh,
    basis: Basis,
    values: &DVector<f64>,
    test: &dyn TestFunction,
    integrator: &Integrator,
) -> Result<f64> {
    if values.len() != mesh.num_nodes() {
        return Err(FemError::DimensionMismatch {
            expected: mesh.num_nodes(),
            found: values.len(),
        });
    }

    let mut total = 0.0;
    for (ielem, element) in mesh.elements().iter().enumerate() {
        let geometry = ElementMap::for_element(mesh, basis, ielem)?;
        let local_values: Vec<f64> = element.nodes.iter().map(|&node| values[node]).collect();

        let mut previous = element_error_integral(&geometry, &local_values, test, integrator, 1);
        let mut current = previous;
        for &k in &SUBDIVISIONS[1..] {
            current = element_error_integral(&geometry, &local_values, test, integrator, k);
            let change = (current - previous).abs();
            if change == 0.0 || change < INTEGRATION_TOLERANCE * current.abs() {
                break;
            }
            previous = current;
        }
        total += current;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FnTest;
    use crate::geometry::Interval;
    use crate::mesh_builder::{
        CurveMeshBuilder, CurveMeshParameters, ElementOrder, MeshParameters, RegularMeshBuilder,
    };
    use std::f64::consts::TAU;

    fn square_mesh(order: ElementOrder, splits: usize) -> Mesh {
        let params = MeshParameters {
            interval_x: Interval::new(0.0, 2.0),
            splits_x: splits,
            interval_y: Interval::new(0.0, 1.0),
            splits_y: splits,
        };
        RegularMeshBuilder::build(&params, order).unwrap().mesh
    }

    fn interpolate(mesh: &Mesh, u: impl Fn(Point2D) -> f64) -> DVector<f64> {
        DVector::from_iterator(mesh.num_nodes(), mesh.points().iter().map(|&p| u(p)))
    }

    #[test]
    fn nodal_error_statistics() {
        let mesh = square_mesh(ElementOrder::Linear, 1);
        let test = FnTest::new(|p| p.x, |_| 0.0);
        // exact: [0, 2, 0, 2]
        let values = DVector::from_vec(vec![0.0, 2.0, 1.0, 2.0]);
        let report = nodal_error(&values, &mesh, &test).unwrap();
        assert_eq!(report.nodal, vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(report.max, 1.0);
        assert!((report.rms - 0.5).abs() < 1e-15);
        assert!((report.relative_rms - 1.0 / 8.0_f64.sqrt()).abs() < 1e-15);
        assert!(report.format().contains("max"));

        let short = DVector::zeros(3);
        assert!(nodal_error(&short, &mesh, &test).is_err());
    }

    #[test]
    fn polygon_test_counts_edges_as_inside() {
        let square = [
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(0.0, 1.0),
        ];
        assert!(polygon_contains(&square, Point2D::new(0.5, 0.5)));
        assert!(polygon_contains(&square, Point2D::new(1.0, 0.3)));
        assert!(polygon_contains(&square, Point2D::new(0.0, 0.0)));
        assert!(!polygon_contains(&square, Point2D::new(1.5, 0.5)));
        assert!(!polygon_contains(&square, Point2D::new(0.5, -0.1)));
    }

    #[test]
    fn locate_finds_interior_and_shared_edges() {
        let mesh = square_mesh(ElementOrder::Linear, 2);
        // elements: 0 [0,1]x[0,.5], 1 [1,2]x[0,.5], 2 [0,1]x[.5,1], 3 [1,2]x[.5,1]
        assert_eq!(locate_element(&mesh, Basis::Linear, Point2D::new(0.3, 0.2)), vec![0]);
        assert_eq!(locate_element(&mesh, Basis::Linear, Point2D::new(1.0, 0.2)), vec![0, 1]);
        assert_eq!(
            locate_element(&mesh, Basis::Linear, Point2D::new(1.0, 0.5)),
            vec![0, 1, 2, 3]
        );
        assert!(locate_element(&mesh, Basis::Linear, Point2D::new(3.0, 0.5)).is_empty());
    }

    #[test]
    fn point_values_reproduce_the_interpolated_field() {
        for order in [ElementOrder::Linear, ElementOrder::Quadratic] {
            let mesh = square_mesh(order, 3);
            let values = interpolate(&mesh, |p| 2.0 * p.x - p.y + 0.5);
            for p in [Point2D::new(0.1, 0.9), Point2D::new(1.37, 0.42), Point2D::new(2.0, 1.0)] {
                let value = calculate_at_point(&mesh, order.basis(), &values, p).unwrap();
                assert!((value - (2.0 * p.x - p.y + 0.5)).abs() < 1e-10, "{:?} at {:?}", order, p);
            }
        }
    }

    #[test]
    fn point_under_a_curved_edge_is_found() {
        // quadratic ring, 2 x 8 elements: the outer arc bulges past the
        // chords through its nodes
        let params = CurveMeshParameters {
            center: Point2D::new(0.0, 0.0),
            inner_radius: 1.0,
            outer_radius: 2.0,
            radial_splits: 2,
            angular_splits: 8,
            sweep: TAU,
        };
        let mesh = CurveMeshBuilder::build(&params, ElementOrder::Quadratic)
            .unwrap()
            .mesh;
        let values = interpolate(&mesh, |p| p.x + p.y);
        let at_radius = |r: f64| Point2D::new(r * 0.2_f64.cos(), r * 0.2_f64.sin());

        let p = at_radius(1.99);
        assert!(locate_element(&mesh, Basis::Quadratic, p).is_empty());
        let value = calculate_at_point(&mesh, Basis::Quadratic, &values, p).unwrap();
        assert!((value - (p.x + p.y)).abs() < 1e-10, "{}", value);

        // the interpolated arc meets this ray near r = 1.9989
        let beyond = at_radius(1.999);
        assert!(matches!(
            calculate_at_point(&mesh, Basis::Quadratic, &values, beyond),
            Err(FemError::PointOutsideMesh { .. })
        ));
    }

    #[test]
    fn point_outside_mesh_is_an_error() {
        let mesh = square_mesh(ElementOrder::Linear, 2);
        let values = DVector::zeros(mesh.num_nodes());
        let err = calculate_at_point(&mesh, Basis::Linear, &values, Point2D::new(-1.0, 0.5))
            .unwrap_err();
        assert_eq!(err, FemError::PointOutsideMesh { x: -1.0, y: 0.5 });
    }

    #[test]
    fn integral_vanishes_for_an_exact_interpolant() {
        let mesh = square_mesh(ElementOrder::Quadratic, 2);
        let test = FnTest::new(|p| p.x * p.x + p.y * p.y, |_| -4.0);
        let values = interpolate(&mesh, |p| test.u(p));
        let integral =
            integrate_error(&mesh, Basis::Quadratic, &values, &test, &Integrator::default()).unwrap();
        assert!(integral < 1e-12, "{}", integral);
    }

    #[test]
    fn integral_of_known_difference() {
        // u_h = 0, U = x on [0, 2] x [0, 1]: integral of x is 2
        let mesh = square_mesh(ElementOrder::Linear, 2);
        let test = FnTest::new(|p| p.x, |_| 0.0);
        let values = DVector::zeros(mesh.num_nodes());
        let integral =
            integrate_error(&mesh, Basis::Linear, &values, &test, &Integrator::default()).unwrap();
        assert!((integral - 2.0).abs() < 1e-12, "{}", integral);
    }

    #[test]
    fn integral_converges_for_a_kink() {
        // |u_h - U| has a kink along x = 1 inside the single element
        let mesh = square_mesh(ElementOrder::Linear, 1);
        let test = FnTest::new(|p| p.x, |_| 0.0);
        let values = DVector::from_element(mesh.num_nodes(), 1.0);
        // integral of |1 - x| over [0, 2] x [0, 1]
        let integral =
            integrate_error(&mesh, Basis::Linear, &values, &test, &Integrator::default()).unwrap();
        assert!((integral - 1.0).abs() < 1e-3, "{}", integral);
    }
}
