//! Progress reporting for iterative solvers.
//!
//! Solvers never log directly; they notify a [`SolveObserver`] that the caller
//! passes to `compute()`.

use crate::backend::SolveInfo;
use tracing::{debug, trace, warn};

pub trait SolveObserver {
    /// Called after every iteration with the relative residual `||r|| / ||b||`
    fn on_iteration(&mut self, iteration: usize, residual_ratio: f64);

    /// Called once when the solver stops
    fn on_finished(&mut self, info: &SolveInfo);
}

/// Forwards progress to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SolveObserver for TracingObserver {
    fn on_iteration(&mut self, iteration: usize, residual_ratio: f64) {
        trace!(iteration, residual_ratio, "solver iteration");
    }

    fn on_finished(&mut self, info: &SolveInfo) {
        if info.is_converged() {
            debug!(
                solver = %info.solver_name,
                iterations = info.iterations,
                residual_ratio = info.residual_ratio,
                "linear solve converged"
            );
        } else {
            warn!(
                solver = %info.solver_name,
                iterations = info.iterations,
                residual_ratio = info.residual_ratio,
                "linear solve stopped at the iteration limit"
            );
        }
    }
}

/// Keeps the residual history in memory
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub residuals: Vec<(usize, f64)>,
    pub finished: Option<SolveInfo>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last reported residual ratio
    pub fn last_residual(&self) -> Option<f64> {
        self.residuals.last().map(|&(_, r)| r)
    }
}

impl SolveObserver for RecordingObserver {
    fn on_iteration(&mut self, iteration: usize, residual_ratio: f64) {
        self.residuals.push((iteration, residual_ratio));
    }

    fn on_finished(&mut self, info: &SolveInfo) {
        self.finished = Some(info.clone());
    }
}
