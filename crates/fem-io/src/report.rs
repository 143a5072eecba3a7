use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::output::ensure_parent_dir;
use fem_solver::{ErrorReport, MeshStatistics, SolveInfo};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeshSummary {
    pub num_nodes: usize,
    pub num_elements: usize,
    pub nodes_per_element: usize,
}

impl From<&MeshStatistics> for MeshSummary {
    fn from(stats: &MeshStatistics) -> Self {
        Self {
            num_nodes: stats.num_nodes,
            num_elements: stats.num_elements,
            nodes_per_element: stats.nodes_per_element,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorSummary {
    pub max: f64,
    pub rms: f64,
    pub relative_rms: f64,
    /// `∫ |u_h - U|` over the domain, when computed
    pub integral: Option<f64>,
}

impl ErrorSummary {
    pub fn new(report: &ErrorReport, integral: Option<f64>) -> Self {
        Self {
            max: report.max,
            rms: report.rms,
            relative_rms: report.relative_rms,
            integral,
        }
    }
}

/// Summary of one solver run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    pub schema_version: u32,
    pub problem: String,
    pub mesh: MeshSummary,
    pub solve: SolveInfo,
    pub error: ErrorSummary,
    pub metadata: BTreeMap<String, String>,
}

impl RunReport {
    pub fn new(
        problem: impl Into<String>,
        mesh: MeshSummary,
        solve: SolveInfo,
        error: ErrorSummary,
    ) -> Self {
        Self {
            schema_version: 1,
            problem: problem.into(),
            mesh,
            solve,
            error,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

pub fn save_report(path: impl AsRef<Path>, report: &RunReport) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let bytes = serde_json::to_vec_pretty(report)?;
    fs::write(path, bytes)?;
    Ok(())
}

pub fn load_report(path: impl AsRef<Path>) -> Result<RunReport> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
