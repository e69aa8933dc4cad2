//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
//! Compressed sparse row storage for the document-term matrix.

use ndarray::{Array, Array2, ArrayBase, Data, Ix2, Zip};

/// A row-major sparse matrix of `f64`.
///
/// Row `i` occupies `indices[indptr[i]..indptr[i + 1]]` (column numbers,
/// strictly increasing) and the matching slice of `data`. Explicit zeros are
/// never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    nrows: usize,
    ncols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl SparseMatrix {
    /// Build a matrix from per-row `(column, value)` entries.
    ///
    /// Entries may come in any order; duplicate columns are summed and zero
    /// values dropped. Panics if a column is out of range.
    pub fn from_rows(ncols: usize, rows: Vec<Vec<(usize, f64)>>) -> Self {
        let nrows = rows.len();
        let mut indptr = Vec::with_capacity(nrows + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);

        for mut row in rows {
            row.sort_by_key(|&(j, _)| j);
            let start = indices.len();
            for (j, v) in row {
                assert!(j < ncols, "column {} out of range for {} columns", j, ncols);
                if indices.len() > start && indices[indices.len() - 1] == j {
                    let last = data.len() - 1;
                    data[last] += v;
                } else {
                    indices.push(j);
                    data.push(v);
                }
            }
            // drop entries that are (or summed to) zero
            let mut keep = start;
            for k in start..indices.len() {
                if data[k] != 0.0 {
                    indices[keep] = indices[k];
                    data[keep] = data[k];
                    keep += 1;
                }
            }
            indices.truncate(keep);
            data.truncate(keep);
            indptr.push(indices.len());
        }

        SparseMatrix {
            nrows,
            ncols,
            indptr,
            indices,
            data,
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Stored values in row-major order.
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Column indices and values of row `i`.
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let span = self.indptr[i]..self.indptr[i + 1];
        (&self.indices[span.clone()], &self.data[span])
    }

    pub fn row_sum(&self, i: usize) -> f64 {
        self.row(i).1.iter().sum()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        let (cols, vals) = self.row(i);
        match cols.binary_search(&j) {
            Ok(k) => vals[k],
            Err(_) => 0.0,
        }
    }

    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array::zeros((self.nrows, self.ncols));
        for i in 0..self.nrows {
            let (cols, vals) = self.row(i);
            for (&j, &v) in cols.iter().zip(vals) {
                dense[[i, j]] = v;
            }
        }
        dense
    }

    pub fn squared_frobenius_norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum()
    }

    /// Mean over all `nrows * ncols` cells, zeros included.
    pub fn mean(&self) -> f64 {
        let cells = self.nrows * self.ncols;
        if cells == 0 {
            return 0.0;
        }
        self.data.iter().sum::<f64>() / cells as f64
    }

    /// `self · rhs` for a dense `rhs` of shape `[ncols × k]`.
    ///
    /// Output rows are computed in parallel; each row accumulates its terms
    /// in column order, so the result does not depend on the thread count.
    pub fn dot<S>(&self, rhs: &ArrayBase<S, Ix2>) -> Array2<f64>
    where
        S: Data<Elem = f64> + Sync,
    {
        assert_eq!(
            self.ncols,
            rhs.nrows(),
            "inputs {:?} and {:?} are not compatible for matrix multiplication",
            self.shape(),
            rhs.dim()
        );

        let mut out = Array::zeros((self.nrows, rhs.ncols()));
        Zip::indexed(out.rows_mut()).par_for_each(|i, mut out_row| {
            let (cols, vals) = self.row(i);
            for (&j, &v) in cols.iter().zip(vals) {
                out_row.scaled_add(v, &rhs.row(j));
            }
        });
        out
    }

    /// `selfᵗ · rhs` for a dense `rhs` of shape `[nrows × k]`.
    pub fn transpose_dot<S>(&self, rhs: &ArrayBase<S, Ix2>) -> Array2<f64>
    where
        S: Data<Elem = f64>,
    {
        assert_eq!(
            self.nrows,
            rhs.nrows(),
            "inputs {:?}ᵗ and {:?} are not compatible for matrix multiplication",
            self.shape(),
            rhs.dim()
        );

        let mut out = Array::zeros((self.ncols, rhs.ncols()));
        for i in 0..self.nrows {
            let rhs_row = rhs.row(i);
            let (cols, vals) = self.row(i);
            for (&j, &v) in cols.iter().zip(vals) {
                out.row_mut(j).scaled_add(v, &rhs_row);
            }
        }
        out
    }
}
