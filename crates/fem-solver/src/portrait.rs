//! Sparsity portrait of the global matrix.
//!
//! Only the strict lower triangle is described: for each row `i` the sorted
//! columns `j < i` of every node pair sharing an element. The diagonal is
//! stored densely by [`crate::sparse::SymmetricSparseMatrix`].

use crate::mesh::Mesh;
use std::collections::BTreeSet;

/// Row pointers and column indices of the strict lower triangle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portrait {
    /// Row pointers, `ig[0] = 0`, `ig[n] = nnz`
    pub ig: Vec<usize>,
    /// Column indices, strictly increasing within a row
    pub jg: Vec<usize>,
}

impl Portrait {
    /// Build the portrait from element connectivity
    pub fn build(mesh: &Mesh) -> Self {
        let n = mesh.num_nodes();
        let mut rows: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];

        for element in mesh.elements() {
            for &i in &element.nodes {
                for &j in &element.nodes {
                    if j < i {
                        rows[i].insert(j);
                    }
                }
            }
        }

        let mut ig = Vec::with_capacity(n + 1);
        ig.push(0);
        let mut jg = Vec::with_capacity(rows.iter().map(BTreeSet::len).sum());
        for row in rows {
            jg.extend(row);
            ig.push(jg.len());
        }

        Self { ig, jg }
    }

    /// Number of rows
    pub fn size(&self) -> usize {
        self.ig.len().saturating_sub(1)
    }

    /// Number of stored off-diagonal entries
    pub fn nnz(&self) -> usize {
        self.jg.len()
    }

    /// Columns of row `i`
    pub fn row(&self, i: usize) -> &[usize] {
        &self.jg[self.ig[i]..self.ig[i + 1]]
    }
}
