//! End-to-end tests of the Poisson pipeline on rectangular meshes.
//!
//! Each test:
//! 1. Builds a regular mesh
//! 2. Selects the boundary nodes from border flags
//! 3. Assembles and solves with a manufactured solution
//! 4. Verifies nodal values, point values and the error integral

use fem_solver::{
    BoundaryHandler, BoundaryParameters, ElementOrder, FemConfig, FemSolver, FiniteElement,
    FnTest, Interval, Mesh, MeshParameters, Point2D, RegularMeshBuilder, SolverConfig,
    StructuredMesh, TestFunction,
};

fn square(order: ElementOrder, splits: usize) -> StructuredMesh {
    let params = MeshParameters {
        interval_x: Interval::new(0.0, 1.0),
        splits_x: splits,
        interval_y: Interval::new(0.0, 1.0),
        splits_y: splits,
    };
    RegularMeshBuilder::build(&params, order).expect("Failed to build mesh")
}

fn all_borders(structured: &StructuredMesh) -> Vec<usize> {
    BoundaryHandler::new(structured.layout).boundary_nodes(&BoundaryParameters::all())
}

fn config(order: ElementOrder) -> FemConfig {
    FemConfig {
        basis: order.basis(),
        solver: SolverConfig {
            max_iterations: 2000,
            tolerance: 1e-13,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn max_nodal_error(structured: &StructuredMesh, order: ElementOrder, test: &dyn TestFunction) -> f64 {
    let solver = FemSolver::new(&structured.mesh, test, config(order), all_borders(structured));
    let field = solver.compute().expect("Solve failed");
    field.error().expect("Error report failed").max
}

#[test]
fn linear_field_is_exact_for_both_orders() {
    let test = FnTest::new(|p| p.x + p.y, |_| 0.0);
    for order in [ElementOrder::Linear, ElementOrder::Quadratic] {
        let structured = square(order, 4);
        let error = max_nodal_error(&structured, order, &test);
        assert!(error < 1e-10, "{:?}: max error {}", order, error);
    }
}

#[test]
fn quadratic_field_is_exact_in_the_quadratic_space() {
    let test = FnTest::new(|p| p.x * p.x + p.y * p.y, |_| -4.0);
    let structured = square(ElementOrder::Quadratic, 4);
    let solver = FemSolver::new(
        &structured.mesh,
        &test,
        config(ElementOrder::Quadratic),
        all_borders(&structured),
    );
    let field = solver.compute().expect("Solve failed");

    let report = field.error().unwrap();
    assert!(report.max < 1e-8, "max error {}", report.max);

    let p = Point2D::new(0.33, 0.71);
    let value = field.calculate_at_point(p).unwrap();
    assert!((value - test.u(p)).abs() < 1e-8, "u_h(p) = {}", value);

    let integral = field.integrate().unwrap();
    assert!(integral < 1e-8, "error integral {}", integral);
}

#[test]
fn bilinear_elements_approximate_a_quadratic_field() {
    let test = FnTest::new(|p| p.x * p.x + p.y * p.y, |_| -4.0);
    let structured = square(ElementOrder::Linear, 8);
    let error = max_nodal_error(&structured, ElementOrder::Linear, &test);
    assert!(error < 1e-3, "max error {}", error);
}

#[test]
fn error_decreases_with_refinement() {
    let test = FnTest::new(|p| (p.x + p.y).exp(), |p| -2.0 * (p.x + p.y).exp());

    let coarse = max_nodal_error(&square(ElementOrder::Linear, 4), ElementOrder::Linear, &test);
    let fine = max_nodal_error(&square(ElementOrder::Linear, 8), ElementOrder::Linear, &test);
    assert!(coarse / fine > 3.0, "linear: {} -> {}", coarse, fine);

    let coarse = max_nodal_error(&square(ElementOrder::Quadratic, 2), ElementOrder::Quadratic, &test);
    let fine = max_nodal_error(&square(ElementOrder::Quadratic, 4), ElementOrder::Quadratic, &test);
    assert!(fine < coarse, "quadratic: {} -> {}", coarse, fine);
}

#[test]
fn quadratic_beats_linear_on_the_same_nodes() {
    // 8x8 linear and 4x4 quadratic elements share the same 81 nodes
    let test = FnTest::new(|p| (p.x + p.y).exp(), |p| -2.0 * (p.x + p.y).exp());
    let linear = max_nodal_error(&square(ElementOrder::Linear, 8), ElementOrder::Linear, &test);
    let quadratic =
        max_nodal_error(&square(ElementOrder::Quadratic, 4), ElementOrder::Quadratic, &test);
    assert!(quadratic < linear, "{} vs {}", quadratic, linear);
}

#[test]
fn coefficient_scales_the_operator() {
    // -div(2 grad u) = f with u = x^2 + y^2 gives f = -8
    let lambda = 2.0;
    let structured = square(ElementOrder::Quadratic, 3);
    let elements: Vec<FiniteElement> = structured
        .mesh
        .elements()
        .iter()
        .map(|e| e.clone().with_lambda(lambda))
        .collect();
    let mesh = Mesh::new(structured.mesh.points().to_vec(), elements).unwrap();

    let test = FnTest::new(|p| p.x * p.x + p.y * p.y, move |_| -4.0 * lambda);
    let solver = FemSolver::new(
        &mesh,
        &test,
        config(ElementOrder::Quadratic),
        all_borders(&structured),
    );
    let report = solver.compute().unwrap().error().unwrap();
    assert!(report.max < 1e-8, "max error {}", report.max);
}

#[test]
fn partial_boundary_still_pins_the_solution() {
    // Dirichlet on left and bottom only; the natural condition elsewhere is
    // satisfied by u = 1 + 0 * x
    let test = FnTest::new(|_| 1.0, |_| 0.0);
    let structured = square(ElementOrder::Linear, 3);
    let flags = BoundaryParameters {
        left: true,
        bottom: true,
        ..Default::default()
    };
    let nodes = BoundaryHandler::new(structured.layout).boundary_nodes(&flags);
    let solver = FemSolver::new(&structured.mesh, &test, config(ElementOrder::Linear), nodes);
    let field = solver.compute().unwrap();
    assert!(field.values().iter().all(|v| (v - 1.0).abs() < 1e-10));
}
