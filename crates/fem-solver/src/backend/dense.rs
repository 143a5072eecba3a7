//! Dense direct solver using nalgebra.
//!
//! Expands the symmetric sparse matrix to a dense one and factors it with
//! `Cholesky`. Suitable for small problems (up to a few thousand unknowns)
//! and as a reference for the iterative solver.

use super::traits::*;
use crate::error::{FemError, Result};
use crate::observer::SolveObserver;
use crate::sparse::SymmetricSparseMatrix;
use nalgebra::linalg::Cholesky;
use nalgebra::DVector;

#[derive(Debug, Clone, Default)]
pub struct DenseCholesky {
    matrix: Option<SymmetricSparseMatrix>,
    rhs: Option<DVector<f64>>,
    solution: Option<DVector<f64>>,
}

impl DenseCholesky {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LinearSolver for DenseCholesky {
    fn name(&self) -> &str {
        "nalgebra-Cholesky"
    }

    fn set_matrix(&mut self, matrix: SymmetricSparseMatrix) {
        self.matrix = Some(matrix);
        self.solution = None;
    }

    fn set_vector(&mut self, rhs: DVector<f64>) {
        self.rhs = Some(rhs);
        self.solution = None;
    }

    fn compute(&mut self, observer: &mut dyn SolveObserver) -> Result<SolveInfo> {
        let (a, b) = checked_system(self.matrix.as_ref(), self.rhs.as_ref())?;

        let dense = a.to_dense();
        let cholesky = Cholesky::new(dense).ok_or_else(|| {
            FemError::Factorization("Matrix not positive definite in Cholesky decomposition".into())
        })?;
        let x = cholesky.solve(b);

        let b_norm = b.norm();
        let residual_ratio = if b_norm > 0.0 {
            (b - a.mul_vec(&x)).norm() / b_norm
        } else {
            0.0
        };
        observer.on_iteration(1, residual_ratio);

        let info = SolveInfo {
            iterations: 1,
            residual_ratio,
            status: SolverStatus::Converged,
            solver_name: self.name().to_string(),
        };
        self.solution = Some(x);
        observer.on_finished(&info);
        Ok(info)
    }

    fn solution(&self) -> Option<&DVector<f64>> {
        self.solution.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::RecordingObserver;
    use crate::portrait::Portrait;
    use nalgebra::DMatrix;

    fn full_lower_3x3() -> SymmetricSparseMatrix {
        SymmetricSparseMatrix::from_portrait(Portrait {
            ig: vec![0, 0, 1, 3],
            jg: vec![0, 0, 1],
        })
    }

    #[test]
    fn dense_solve_3x3() {
        // K = [4 -1 0; -1 4 -1; 0 -1 4], F = [1; 2; 1]
        let mut k = full_lower_3x3();
        for i in 0..3 {
            k.add(i, i, 4.0).unwrap();
        }
        k.add(1, 0, -1.0).unwrap();
        k.add(2, 1, -1.0).unwrap();
        let f = DVector::from_vec(vec![1.0, 2.0, 1.0]);

        let mut solver = DenseCholesky::new();
        solver.set_matrix(k);
        solver.set_vector(f.clone());
        let info = solver.compute(&mut RecordingObserver::new()).unwrap();
        assert_eq!(info.solver_name, "nalgebra-Cholesky");
        assert_eq!(info.iterations, 1);
        assert!(info.residual_ratio < 1e-14);

        let u = solver.solution().unwrap();
        let k_dense =
            DMatrix::from_row_slice(3, 3, &[4.0, -1.0, 0.0, -1.0, 4.0, -1.0, 0.0, -1.0, 4.0]);
        let f_check = k_dense * u;
        for i in 0..3 {
            assert!(
                (f_check[i] - f[i]).abs() < 1e-12,
                "Residual too large at unknown {}",
                i
            );
        }
    }

    #[test]
    fn indefinite_matrix_fails() {
        let mut k = full_lower_3x3();
        k.add(0, 0, 1.0).unwrap();
        k.add(1, 1, -1.0).unwrap();
        k.add(2, 2, 1.0).unwrap();
        let mut solver = DenseCholesky::new();
        solver.set_matrix(k);
        solver.set_vector(DVector::from_element(3, 1.0));
        assert!(matches!(
            solver.compute(&mut RecordingObserver::new()),
            Err(FemError::Factorization(_))
        ));
        assert!(solver.solution().is_none());
    }
}
