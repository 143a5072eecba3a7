//! JSON problem files.
//!
//! ```json
//! {
//!   "mesh": { "kind": "regular",
//!             "interval_x": { "left": 0.0, "right": 1.0 }, "splits_x": 8,
//!             "interval_y": { "left": 0.0, "right": 1.0 }, "splits_y": 8 },
//!   "order": "quadratic",
//!   "boundary": { "left": true, "right": true, "bottom": true, "top": true },
//!   "solution": "cubic",
//!   "config": { "solver": { "tolerance": 1e-12 } }
//! }
//! ```

use crate::error::{IoError, Result};
use fem_solver::{
    BoundaryHandler, BoundaryParameters, CurveMeshBuilder, CurveMeshParameters, ElementOrder,
    FemConfig, MeshParameters, Point2D, RegularMeshBuilder, StructuredMesh, TestFunction,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Read and deserialize a JSON file
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Mesh description of a problem file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeshSpec {
    Regular(MeshParameters),
    Curve(CurveMeshParameters),
}

impl MeshSpec {
    pub fn build(&self, order: ElementOrder) -> Result<StructuredMesh> {
        let structured = match self {
            MeshSpec::Regular(params) => RegularMeshBuilder::build(params, order)?,
            MeshSpec::Curve(params) => CurveMeshBuilder::build(params, order)?,
        };
        Ok(structured)
    }
}

/// Built-in exact solutions of `-div(grad u) = f`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManufacturedSolution {
    /// `u = x + y`, `f = 0`
    #[default]
    Linear,
    /// `u = x^2 + y^2`, `f = -4`
    Quadratic,
    /// `u = x^3 + y^2`, `f = -6x - 2`
    Cubic,
}

impl ManufacturedSolution {
    pub const ALL: [ManufacturedSolution; 3] = [
        ManufacturedSolution::Linear,
        ManufacturedSolution::Quadratic,
        ManufacturedSolution::Cubic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ManufacturedSolution::Linear => "linear",
            ManufacturedSolution::Quadratic => "quadratic",
            ManufacturedSolution::Cubic => "cubic",
        }
    }
}

impl TestFunction for ManufacturedSolution {
    fn u(&self, p: Point2D) -> f64 {
        match self {
            ManufacturedSolution::Linear => p.x + p.y,
            ManufacturedSolution::Quadratic => p.x * p.x + p.y * p.y,
            ManufacturedSolution::Cubic => p.x.powi(3) + p.y * p.y,
        }
    }

    fn f(&self, p: Point2D) -> f64 {
        match self {
            ManufacturedSolution::Linear => 0.0,
            ManufacturedSolution::Quadratic => -4.0,
            ManufacturedSolution::Cubic => -6.0 * p.x - 2.0,
        }
    }
}

impl fmt::Display for ManufacturedSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ManufacturedSolution {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|solution| solution.name() == s.trim().to_lowercase())
            .ok_or_else(|| IoError::UnknownSolution(s.to_string()))
    }
}

/// A complete problem: mesh, boundary, exact solution and solver settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProblemFile {
    pub mesh: MeshSpec,
    #[serde(default)]
    pub order: ElementOrder,
    #[serde(default = "BoundaryParameters::all")]
    pub boundary: BoundaryParameters,
    #[serde(default)]
    pub solution: ManufacturedSolution,
    #[serde(default)]
    pub config: FemConfig,
}

impl ProblemFile {
    /// Solver settings; the basis always follows `order`
    pub fn fem_config(&self) -> FemConfig {
        FemConfig {
            basis: self.order.basis(),
            ..self.config
        }
    }

    /// Build the mesh and the Dirichlet node list
    pub fn build(&self) -> Result<(StructuredMesh, Vec<usize>)> {
        let structured = self.mesh.build(self.order)?;
        let nodes = BoundaryHandler::new(structured.layout).boundary_nodes(&self.boundary);
        if nodes.is_empty() {
            return Err(IoError::InvalidData(
                "Problem has no Dirichlet boundary; the system would be singular".to_string(),
            ));
        }
        Ok((structured, nodes))
    }
}

/// Load a problem file
pub fn load_problem(path: impl AsRef<Path>) -> Result<ProblemFile> {
    load_json(path)
}
