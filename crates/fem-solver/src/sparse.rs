//! Symmetric sparse matrix in lower-triangular CSR storage.
//!
//! ```text
//!   di[i]            diagonal entry of row i
//!   gg[ig[i]..ig[i+1]]  off-diagonal entries (i, jg[k]) with jg[k] < i
//! ```
//!
//! The upper triangle is never stored; every stored entry stands for both
//! (i, j) and (j, i).

use crate::error::{FemError, Result};
use crate::portrait::Portrait;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::ops::Mul;

#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricSparseMatrix {
    ig: Vec<usize>,
    jg: Vec<usize>,
    di: Vec<f64>,
    gg: Vec<f64>,
}

impl SymmetricSparseMatrix {
    /// Allocate a zero matrix with the given portrait
    pub fn from_portrait(portrait: Portrait) -> Self {
        let n = portrait.size();
        let nnz = portrait.nnz();
        Self {
            ig: portrait.ig,
            jg: portrait.jg,
            di: vec![0.0; n],
            gg: vec![0.0; nnz],
        }
    }

    /// Number of rows (and columns)
    pub fn size(&self) -> usize {
        self.di.len()
    }

    /// Number of stored off-diagonal entries
    pub fn nnz(&self) -> usize {
        self.gg.len()
    }

    pub fn ig(&self) -> &[usize] {
        &self.ig
    }

    pub fn jg(&self) -> &[usize] {
        &self.jg
    }

    pub fn di(&self) -> &[f64] {
        &self.di
    }

    pub fn gg(&self) -> &[f64] {
        &self.gg
    }

    pub fn di_mut(&mut self) -> &mut [f64] {
        &mut self.di
    }

    pub fn gg_mut(&mut self) -> &mut [f64] {
        &mut self.gg
    }

    /// Range of `gg`/`jg` positions holding row `i`
    pub fn row_range(&self, i: usize) -> std::ops::Range<usize> {
        self.ig[i]..self.ig[i + 1]
    }

    /// Position of the (i, j) slot, `j < i`
    fn slot(&self, i: usize, j: usize) -> Option<usize> {
        self.row_range(i).find(|&k| self.jg[k] == j)
    }

    /// Additive scatter of a local contribution.
    ///
    /// Entries above the diagonal are ignored, so callers may scatter a full
    /// symmetric local matrix without skipping anything.
    pub fn add(&mut self, i: usize, j: usize, value: f64) -> Result<()> {
        if i == j {
            self.di[i] += value;
            return Ok(());
        }
        if i < j {
            return Ok(());
        }
        let k = self
            .slot(i, j)
            .ok_or(FemError::MissingMatrixSlot { row: i, col: j })?;
        self.gg[k] += value;
        Ok(())
    }

    /// Entry (i, j) of the full symmetric matrix
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i == j {
            return self.di[i];
        }
        let (row, col) = if i > j { (i, j) } else { (j, i) };
        self.slot(row, col).map_or(0.0, |k| self.gg[k])
    }

    /// Reset all values, keeping the portrait
    pub fn clear(&mut self) {
        self.di.fill(0.0);
        self.gg.fill(0.0);
    }

    /// Symmetric product `y = A x` in a single pass over the stored entries
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        let n = self.size();
        let mut y = DVector::zeros(n);
        for i in 0..n {
            y[i] += self.di[i] * x[i];
            for k in self.row_range(i) {
                let j = self.jg[k];
                y[i] += self.gg[k] * x[j];
                y[j] += self.gg[k] * x[i];
            }
        }
        y
    }

    /// Expand to a dense matrix
    pub fn to_dense(&self) -> DMatrix<f64> {
        let n = self.size();
        let mut dense = DMatrix::zeros(n, n);
        for i in 0..n {
            dense[(i, i)] = self.di[i];
            for k in self.row_range(i) {
                let j = self.jg[k];
                dense[(i, j)] = self.gg[k];
                dense[(j, i)] = self.gg[k];
            }
        }
        dense
    }

    /// Expand to a full (both triangles) nalgebra-sparse CSR matrix
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let n = self.size();
        let mut coo = CooMatrix::new(n, n);
        for i in 0..n {
            coo.push(i, i, self.di[i]);
            for k in self.row_range(i) {
                let j = self.jg[k];
                coo.push(i, j, self.gg[k]);
                coo.push(j, i, self.gg[k]);
            }
        }
        CsrMatrix::from(&coo)
    }
}

impl Mul<&DVector<f64>> for &SymmetricSparseMatrix {
    type Output = DVector<f64>;

    fn mul(self, x: &DVector<f64>) -> DVector<f64> {
        self.mul_vec(x)
    }
}
