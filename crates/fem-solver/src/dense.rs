//! Small dense kernels used next to the nalgebra element matrices.

use crate::error::{FemError, Result};
use nalgebra::{DMatrix, SMatrix, SVector};

/// Smallest pivot accepted by [`gauss_solve`]
pub const PIVOT_EPS: f64 = 1e-14;

/// Build a symmetric matrix from its lower triangle, `f(i, j)` with `j <= i`
pub fn symmetric_from_lower<F: FnMut(usize, usize) -> f64>(size: usize, mut f: F) -> DMatrix<f64> {
    let mut matrix = DMatrix::zeros(size, size);
    for i in 0..size {
        for j in 0..=i {
            let value = f(i, j);
            matrix[(i, j)] = value;
            matrix[(j, i)] = value;
        }
    }
    matrix
}

/// Solve `A x = b` by Gaussian elimination with partial pivoting.
///
/// In each column the row with the largest absolute entry is swapped into
/// the pivot position; a pivot below [`PIVOT_EPS`] after the swap means the
/// matrix is singular.
pub fn gauss_solve<const N: usize>(
    mut a: SMatrix<f64, N, N>,
    mut b: SVector<f64, N>,
) -> Result<SVector<f64, N>> {
    for k in 0..N {
        let mut pivot_row = k;
        for i in k + 1..N {
            if a[(i, k)].abs() > a[(pivot_row, k)].abs() {
                pivot_row = i;
            }
        }
        if pivot_row != k {
            a.swap_rows(k, pivot_row);
            b.swap_rows(k, pivot_row);
        }

        let pivot = a[(k, k)];
        if pivot.abs() < PIVOT_EPS {
            return Err(FemError::SingularJacobian { column: k });
        }

        for i in k + 1..N {
            let factor = a[(i, k)] / pivot;
            if factor == 0.0 {
                continue;
            }
            for j in k..N {
                a[(i, j)] -= factor * a[(k, j)];
            }
            b[i] -= factor * b[k];
        }
    }

    let mut x = SVector::<f64, N>::zeros();
    for k in (0..N).rev() {
        let mut sum = b[k];
        for j in k + 1..N {
            sum -= a[(k, j)] * x[j];
        }
        x[k] = sum / a[(k, k)];
    }
    Ok(x)
}
