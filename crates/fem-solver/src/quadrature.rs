//! Gauss-Legendre quadrature on segments and rectangles.
//!
//! 1D rules live on the reference interval [-1, 1] and are mapped affinely;
//! the 2D rule is the tensor product of the 1D rule with itself.

use crate::geometry::{Point2D, Rectangle};
use serde::{Deserialize, Serialize};

/// A quadrature node with its weight on [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadratureNode {
    pub node: f64,
    pub weight: f64,
}

/// Polynomial order integrated exactly by the 1D rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaussOrder {
    /// 2 points
    Order3,
    /// 3 points
    #[default]
    Order5,
    /// 4 points
    Order7,
}

impl GaussOrder {
    /// 1D Gauss-Legendre nodes and weights on [-1, 1]
    pub fn segment_nodes(&self) -> Vec<QuadratureNode> {
        let pairs: Vec<(f64, f64)> = match self {
            GaussOrder::Order3 => {
                let s = 1.0 / 3.0_f64.sqrt();
                vec![(-s, 1.0), (s, 1.0)]
            }
            GaussOrder::Order5 => {
                let s = (3.0_f64 / 5.0).sqrt();
                vec![(-s, 5.0 / 9.0), (0.0, 8.0 / 9.0), (s, 5.0 / 9.0)]
            }
            GaussOrder::Order7 => vec![
                (-0.861_136_311_594_052_6, 0.347_854_845_137_453_9),
                (-0.339_981_043_584_856_3, 0.652_145_154_862_546_1),
                (0.339_981_043_584_856_3, 0.652_145_154_862_546_1),
                (0.861_136_311_594_052_6, 0.347_854_845_137_453_9),
            ],
        };
        pairs
            .into_iter()
            .map(|(node, weight)| QuadratureNode { node, weight })
            .collect()
    }
}

/// Tensor-product integrator over rectangles
#[derive(Debug, Clone)]
pub struct Integrator {
    nodes: Vec<QuadratureNode>,
}

impl Integrator {
    pub fn new(order: GaussOrder) -> Self {
        Self {
            nodes: order.segment_nodes(),
        }
    }

    /// Integrate `f` over the segment [a, b]
    pub fn gauss_segment<F: FnMut(f64) -> f64>(&self, mut f: F, a: f64, b: f64) -> f64 {
        let h = b - a;
        let center = (a + b) / 2.0;
        let sum: f64 = self
            .nodes
            .iter()
            .map(|q| q.weight * f(center + q.node * h / 2.0))
            .sum();
        sum * h / 2.0
    }

    /// Integrate `f` over an axis-aligned rectangle
    pub fn gauss_2d<F: FnMut(Point2D) -> f64>(&self, mut f: F, rect: &Rectangle) -> f64 {
        let mut result = 0.0;
        self.for_each_point(rect, |point, weight| result += weight * f(point));
        result
    }

    /// Visit every quadrature point of `rect` with its weight, already scaled
    /// by the affine Jacobian `hx * hy / 4`
    pub fn for_each_point<F: FnMut(Point2D, f64)>(&self, rect: &Rectangle, mut f: F) {
        let hx = rect.width();
        let hy = rect.height();
        let lb = rect.left_bottom();
        let rt = rect.right_top();
        let cx = (lb.x + rt.x) / 2.0;
        let cy = (lb.y + rt.y) / 2.0;
        let scale = hx * hy / 4.0;

        for qi in &self.nodes {
            for qj in &self.nodes {
                let point = Point2D::new(cx + qi.node * hx / 2.0, cy + qj.node * hy / 2.0);
                f(point, qi.weight * qj.weight * scale);
            }
        }
    }
}

impl Default for Integrator {
    fn default() -> Self {
        Self::new(GaussOrder::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_interval_length() {
        for order in [GaussOrder::Order3, GaussOrder::Order5, GaussOrder::Order7] {
            let sum: f64 = order.segment_nodes().iter().map(|q| q.weight).sum();
            assert!((sum - 2.0).abs() < 1e-14, "{:?}: {}", order, sum);
        }
    }

    #[test]
    fn segment_rule_is_exact_up_to_its_order() {
        let cases = [(GaussOrder::Order3, 3), (GaussOrder::Order5, 5), (GaussOrder::Order7, 7)];
        for (order, degree) in cases {
            let integrator = Integrator::new(order);
            for k in 0..=degree {
                let value = integrator.gauss_segment(|x| x.powi(k), 0.0, 2.0);
                let exact = 2.0_f64.powi(k + 1) / (k + 1) as f64;
                assert!(
                    (value - exact).abs() < 1e-12 * exact.max(1.0),
                    "{:?} x^{}: {} vs {}",
                    order,
                    k,
                    value,
                    exact
                );
            }
        }
    }

    #[test]
    fn gauss_2d_integrates_biquadratic_products() {
        // degree 4 in each variable: the product of two quadratic shape functions
        let integrator = Integrator::default();
        let rect = Rectangle::new(Point2D::new(1.0, -1.0), Point2D::new(3.0, 2.0));
        let value = integrator.gauss_2d(|p| p.x.powi(4) * p.y.powi(4), &rect);
        let exact = (3.0_f64.powi(5) - 1.0) / 5.0 * (2.0_f64.powi(5) + 1.0) / 5.0;
        assert!((value - exact).abs() < 1e-10 * exact, "{} vs {}", value, exact);
    }

    #[test]
    fn gauss_2d_maps_points_into_rectangle() {
        let integrator = Integrator::default();
        let rect = Rectangle::new(Point2D::new(2.0, 5.0), Point2D::new(4.0, 6.0));
        let mut count = 0;
        integrator.for_each_point(&rect, |p, w| {
            assert!(p.x > 2.0 && p.x < 4.0);
            assert!(p.y > 5.0 && p.y < 6.0);
            assert!(w > 0.0);
            count += 1;
        });
        assert_eq!(count, 9);
        let area = integrator.gauss_2d(|_| 1.0, &rect);
        assert!((area - 2.0).abs() < 1e-14);
    }
}
