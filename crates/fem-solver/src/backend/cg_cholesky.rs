//! Conjugate gradients with an incomplete Cholesky preconditioner.
//!
//! The preconditioner is IC(0): `L L^T ≈ A` where `L` keeps exactly the
//! sparsity of the lower triangle of `A`. It is stored in the same
//! `di`/`gg` layout as the matrix itself.

use super::traits::*;
use crate::error::{FemError, Result};
use crate::observer::SolveObserver;
use crate::sparse::SymmetricSparseMatrix;
use nalgebra::DVector;
use tracing::debug;

/// Lifecycle of a [`CgCholesky`] solver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    Initialized,
    Iterating,
    Converged,
    MaxIterationsReached,
}

/// IC(0) factor sharing the portrait of the factored matrix
#[derive(Debug, Clone)]
struct IncompleteCholesky {
    di: Vec<f64>,
    gg: Vec<f64>,
}

impl IncompleteCholesky {
    fn factor(a: &SymmetricSparseMatrix) -> Result<Self> {
        let n = a.size();
        let (ig, jg) = (a.ig(), a.jg());
        let mut di = vec![0.0; n];
        let mut gg = vec![0.0; a.nnz()];

        for i in 0..n {
            let row_start = ig[i];
            for k in a.row_range(i) {
                let j = jg[k];
                // sum over common columns c < j of L_ic * L_jc
                let mut sum = 0.0;
                let (mut p, mut q) = (row_start, ig[j]);
                while p < k && q < ig[j + 1] {
                    match jg[p].cmp(&jg[q]) {
                        std::cmp::Ordering::Less => p += 1,
                        std::cmp::Ordering::Greater => q += 1,
                        std::cmp::Ordering::Equal => {
                            sum += gg[p] * gg[q];
                            p += 1;
                            q += 1;
                        }
                    }
                }
                gg[k] = (a.gg()[k] - sum) / di[j];
            }

            let pivot = a.di()[i] - a.row_range(i).map(|k| gg[k] * gg[k]).sum::<f64>();
            if pivot == 0.0 {
                return Err(FemError::ZeroPivot { row: i, value: pivot });
            }
            if !(pivot > 0.0) {
                return Err(FemError::NotPositiveDefinite { row: i, value: pivot });
            }
            di[i] = pivot.sqrt();
        }

        Ok(Self { di, gg })
    }

    /// Solve `L L^T z = r`
    fn apply(&self, a: &SymmetricSparseMatrix, r: &DVector<f64>) -> DVector<f64> {
        let n = self.di.len();
        let jg = a.jg();
        let mut z = r.clone();

        for i in 0..n {
            let mut s = z[i];
            for k in a.row_range(i) {
                s -= self.gg[k] * z[jg[k]];
            }
            z[i] = s / self.di[i];
        }

        for i in (0..n).rev() {
            z[i] /= self.di[i];
            let zi = z[i];
            for k in a.row_range(i) {
                z[jg[k]] -= self.gg[k] * zi;
            }
        }

        z
    }
}

/// Preconditioned conjugate gradient solver
#[derive(Debug, Clone)]
pub struct CgCholesky {
    max_iterations: usize,
    tolerance: f64,
    matrix: Option<SymmetricSparseMatrix>,
    rhs: Option<DVector<f64>>,
    solution: Option<DVector<f64>>,
    state: SolverState,
}

impl CgCholesky {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
            matrix: None,
            rhs: None,
            solution: None,
            state: SolverState::Initialized,
        }
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    fn finish(
        &mut self,
        x: DVector<f64>,
        iterations: usize,
        residual_ratio: f64,
        observer: &mut dyn SolveObserver,
    ) -> SolveInfo {
        let status = if self.state == SolverState::Converged {
            SolverStatus::Converged
        } else {
            SolverStatus::MaxIterationsReached
        };
        self.solution = Some(x);
        let info = SolveInfo {
            iterations,
            residual_ratio,
            status,
            solver_name: self.name().to_string(),
        };
        observer.on_finished(&info);
        info
    }
}

impl LinearSolver for CgCholesky {
    fn name(&self) -> &str {
        "cg-ic0"
    }

    fn set_matrix(&mut self, matrix: SymmetricSparseMatrix) {
        self.matrix = Some(matrix);
        self.solution = None;
        self.state = SolverState::Initialized;
    }

    fn set_vector(&mut self, rhs: DVector<f64>) {
        self.rhs = Some(rhs);
        self.solution = None;
        self.state = SolverState::Initialized;
    }

    fn compute(&mut self, observer: &mut dyn SolveObserver) -> Result<SolveInfo> {
        let (a, b) = checked_system(self.matrix.as_ref(), self.rhs.as_ref())?;
        let n = a.size();

        let b_norm = b.norm();
        if b_norm == 0.0 {
            self.state = SolverState::Converged;
            return Ok(self.finish(DVector::zeros(n), 0, 0.0, observer));
        }

        let preconditioner = IncompleteCholesky::factor(a)?;
        debug!(unknowns = n, nnz = a.nnz(), "IC(0) preconditioner built");

        let mut x = DVector::zeros(n);
        let mut r = b.clone();
        let mut z = preconditioner.apply(a, &r);
        let mut p = z.clone();
        let mut rz = r.dot(&z);
        let mut residual_ratio = 1.0;
        let mut iterations = 0;
        let mut converged = false;

        self.state = SolverState::Iterating;
        while iterations < self.max_iterations {
            let ap = a.mul_vec(&p);
            let pap = p.dot(&ap);
            if !(pap > 0.0 && pap.is_finite()) {
                return Err(FemError::SolverBreakdown {
                    iteration: iterations + 1,
                    value: pap,
                });
            }

            let alpha = rz / pap;
            x.axpy(alpha, &p, 1.0);
            r.axpy(-alpha, &ap, 1.0);
            iterations += 1;

            residual_ratio = r.norm() / b_norm;
            observer.on_iteration(iterations, residual_ratio);
            if residual_ratio < self.tolerance {
                converged = true;
                break;
            }

            z = preconditioner.apply(a, &r);
            let rz_next = r.dot(&z);
            let beta = rz_next / rz;
            rz = rz_next;
            p.axpy(1.0, &z, beta);
        }

        self.state = if converged {
            SolverState::Converged
        } else {
            SolverState::MaxIterationsReached
        };
        Ok(self.finish(x, iterations, residual_ratio, observer))
    }

    fn solution(&self) -> Option<&DVector<f64>> {
        self.solution.as_ref()
    }
}
