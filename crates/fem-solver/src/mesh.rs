//! Mesh data structures for the quadrilateral solver.
//!
//! A mesh is an ordered list of node coordinates and an ordered list of
//! elements referring to them by index. It is built once (usually by a
//! [`crate::mesh_builder`]) and then shared read-only by the assembler, the
//! solver and the post-processing routines.

use crate::error::{FemError, Result};
use crate::geometry::Point2D;
use std::collections::BTreeMap;

/// A quadrilateral element
#[derive(Debug, Clone, PartialEq)]
pub struct FiniteElement {
    /// Global node indices in local (tensor-product) order
    pub nodes: Vec<usize>,
    /// Area / material tag
    pub area: i32,
    /// Diffusion coefficient scaling the local stiffness
    pub lambda: f64,
}

impl FiniteElement {
    /// Create an element with area tag 0 and unit coefficient
    pub fn new(nodes: Vec<usize>) -> Self {
        Self {
            nodes,
            area: 0,
            lambda: 1.0,
        }
    }

    pub fn with_area(mut self, area: i32) -> Self {
        self.area = area;
        self
    }

    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Global index of the first node (left-bottom corner)
    pub fn first(&self) -> Option<usize> {
        self.nodes.first().copied()
    }

    /// Global index of the last node (right-top corner)
    pub fn last(&self) -> Option<usize> {
        self.nodes.last().copied()
    }
}

/// Complete finite element mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    points: Vec<Point2D>,
    elements: Vec<FiniteElement>,
}

impl Mesh {
    /// Create a mesh, checking that every element refers to existing nodes
    pub fn new(points: Vec<Point2D>, elements: Vec<FiniteElement>) -> Result<Self> {
        let mesh = Self { points, elements };
        mesh.validate()?;
        Ok(mesh)
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn elements(&self) -> &[FiniteElement] {
        &self.elements
    }

    pub fn num_nodes(&self) -> usize {
        self.points.len()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn point(&self, index: usize) -> Point2D {
        self.points[index]
    }

    pub fn element(&self, index: usize) -> &FiniteElement {
        &self.elements[index]
    }

    /// Coordinates of the nodes of element `ielem`, in local order
    pub fn element_points(&self, ielem: usize) -> Vec<Point2D> {
        self.elements[ielem]
            .nodes
            .iter()
            .map(|&node| self.points[node])
            .collect()
    }

    /// Validate the mesh
    pub fn validate(&self) -> Result<()> {
        let num_nodes = self.points.len();
        for (ielem, element) in self.elements.iter().enumerate() {
            if element.nodes.is_empty() {
                return Err(FemError::InvalidMesh(format!(
                    "Element {} has no nodes",
                    ielem
                )));
            }
            if let Some(&node) = element.nodes.iter().find(|&&node| node >= num_nodes) {
                return Err(FemError::InvalidMesh(format!(
                    "Element {} references non-existent node {} (mesh has {} nodes)",
                    ielem, node, num_nodes
                )));
            }
        }
        Ok(())
    }

    /// Get mesh statistics
    pub fn statistics(&self) -> MeshStatistics {
        let mut area_counts = BTreeMap::new();
        for element in &self.elements {
            *area_counts.entry(element.area).or_insert(0) += 1;
        }

        let (mut min, mut max) = (
            Point2D::new(f64::INFINITY, f64::INFINITY),
            Point2D::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        );
        for p in &self.points {
            min = Point2D::new(min.x.min(p.x), min.y.min(p.y));
            max = Point2D::new(max.x.max(p.x), max.y.max(p.y));
        }

        MeshStatistics {
            num_nodes: self.points.len(),
            num_elements: self.elements.len(),
            nodes_per_element: self.elements.first().map_or(0, |e| e.nodes.len()),
            bounding_box: (min, max),
            area_counts,
        }
    }
}

/// Mesh statistics for reporting
#[derive(Debug, Clone)]
pub struct MeshStatistics {
    /// Total number of nodes
    pub num_nodes: usize,
    /// Total number of elements
    pub num_elements: usize,
    /// Nodes of the first element (4 or 9 for uniform meshes)
    pub nodes_per_element: usize,
    /// Left-bottom and right-top corners of the node cloud
    pub bounding_box: (Point2D, Point2D),
    /// Number of elements per area tag
    pub area_counts: BTreeMap<i32, usize>,
}

impl MeshStatistics {
    /// Format as a human-readable string
    pub fn format(&self) -> String {
        let (min, max) = self.bounding_box;
        let mut lines = vec![
            format!("Nodes: {}", self.num_nodes),
            format!("Elements: {}", self.num_elements),
            format!("Nodes per element: {}", self.nodes_per_element),
            format!(
                "Bounding box: [{}, {}] x [{}, {}]",
                min.x, max.x, min.y, max.y
            ),
        ];

        if self.area_counts.len() > 1 {
            lines.push("Areas:".to_string());
            for (area, count) in &self.area_counts {
                lines.push(format!("  {}: {}", area, count));
            }
        }

        lines.join("\n")
    }
}
