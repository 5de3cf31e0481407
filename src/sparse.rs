//! Sparse matrix storage and direct LU solver.
//!
//! This module provides a compressed sparse column (CSC) matrix built from
//! triplets and a direct sparse LU factorization with partial pivoting,
//! used to solve the pinned LSCM system. The conformal operator is
//! structurally indefinite before pinning, so the factorization pivots by
//! row rather than assuming positive definiteness.
//!
//! The factorization is the classic left-looking column algorithm: each
//! column of the factors comes from a sparse triangular solve against the
//! columns computed so far, with the nonzero pattern discovered by a
//! depth-first search.

use nalgebra::DVector;

use crate::error::{Result, UnwrapError};

/// Pivots smaller than this in absolute value are treated as singular.
const PIVOT_TOLERANCE: f64 = 1e-14;

/// Compressed Sparse Column (CSC) matrix.
#[derive(Debug, Clone)]
pub struct CscMatrix {
    /// Number of rows.
    nrows: usize,
    /// Number of columns.
    ncols: usize,
    /// Column pointers: `col_ptr[j]..col_ptr[j+1]` spans column j.
    col_ptr: Vec<usize>,
    /// Row index of each stored entry.
    row_idx: Vec<usize>,
    /// Stored values.
    values: Vec<f64>,
}

impl CscMatrix {
    /// Create a CSC matrix from `(row, col, value)` triplets.
    ///
    /// Duplicate entries at the same position are summed. Triplets are
    /// sorted during construction, so the result is deterministic
    /// regardless of input order.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        mut triplets: Vec<(usize, usize, f64)>,
    ) -> Self {
        triplets.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

        let mut col_counts = vec![0usize; ncols];
        let mut row_idx = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());
        let mut prev: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            debug_assert!(row < nrows && col < ncols);
            if prev == Some((col, row)) {
                *values.last_mut().unwrap() += val;
            } else {
                row_idx.push(row);
                values.push(val);
                col_counts[col] += 1;
                prev = Some((col, row));
            }
        }

        let mut col_ptr = vec![0usize; ncols + 1];
        for j in 0..ncols {
            col_ptr[j + 1] = col_ptr[j] + col_counts[j];
        }

        Self {
            nrows,
            ncols,
            col_ptr,
            row_idx,
            values,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate over the `(row, value)` entries of a column.
    #[inline]
    pub fn col(&self, j: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.col_ptr[j]..self.col_ptr[j + 1];
        self.row_idx[range.clone()]
            .iter()
            .zip(&self.values[range])
            .map(|(&r, &v)| (r, v))
    }

    /// Multiply matrix by vector: `y = A * x`.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        assert_eq!(x.len(), self.ncols, "vector dimension mismatch");

        let mut y = DVector::zeros(self.nrows);
        for j in 0..self.ncols {
            let xj = x[j];
            if xj == 0.0 {
                continue;
            }
            for (r, v) in self.col(j) {
                y[r] += v * xj;
            }
        }
        y
    }
}

/// Sparse LU factorization `P·A = L·U` with partial pivoting.
///
/// `L` is unit lower triangular and `U` upper triangular, both stored
/// column-wise in pivot coordinates. Produced by [`SparseLu::factor`],
/// consumed by [`SparseLu::solve`].
#[derive(Debug, Clone)]
pub struct SparseLu {
    /// System size.
    n: usize,
    /// L column pointers (unit diagonal stored first in each column).
    l_colptr: Vec<usize>,
    /// L row indices, in pivot coordinates.
    l_rows: Vec<usize>,
    /// L values.
    l_vals: Vec<f64>,
    /// U column pointers.
    u_colptr: Vec<usize>,
    /// U row indices.
    u_rows: Vec<usize>,
    /// U values.
    u_vals: Vec<f64>,
    /// Row permutation: original row i holds pivot position `pinv[i]`.
    pinv: Vec<usize>,
}

impl SparseLu {
    /// Factor a square sparse matrix.
    ///
    /// # Errors
    ///
    /// Returns [`UnwrapError::SolverFailed`] if the matrix is not square
    /// or a pivot below tolerance makes it numerically singular.
    pub fn factor(a: &CscMatrix) -> Result<Self> {
        let n = a.ncols();
        if a.nrows() != n {
            return Err(UnwrapError::SolverFailed {
                detail: format!("matrix is {}x{}, expected square", a.nrows(), n),
            });
        }

        let mut l_colptr = Vec::with_capacity(n + 1);
        let mut l_rows: Vec<usize> = Vec::with_capacity(4 * a.nnz());
        let mut l_vals: Vec<f64> = Vec::with_capacity(4 * a.nnz());
        let mut u_colptr = Vec::with_capacity(n + 1);
        let mut u_rows: Vec<usize> = Vec::with_capacity(4 * a.nnz());
        let mut u_vals: Vec<f64> = Vec::with_capacity(4 * a.nnz());
        l_colptr.push(0);
        u_colptr.push(0);

        // pinv[i] = pivot position of original row i, or NONE while the
        // row is unpivoted.
        const NONE: usize = usize::MAX;
        let mut pinv = vec![NONE; n];

        // Dense scratch for the current column and DFS bookkeeping.
        let mut x = vec![0.0f64; n];
        let mut visited = vec![false; n];
        let mut post: Vec<usize> = Vec::with_capacity(n);
        let mut stack: Vec<(usize, usize)> = Vec::with_capacity(n);

        for k in 0..n {
            // Symbolic step: pattern of x = L \ A(:,k), as the set of rows
            // reachable from the nonzeros of A(:,k) through the columns of
            // L computed so far. `post` collects a postorder.
            post.clear();
            for (i, _) in a.col(k) {
                if visited[i] {
                    continue;
                }
                stack.push((i, 0));
                visited[i] = true;
                while let Some(frame) = stack.last_mut() {
                    let node = frame.0;
                    // Children of `node` are the off-diagonal rows of the
                    // L column that eliminated it, if any.
                    let mut next = None;
                    let j = pinv[node];
                    if j != NONE {
                        let lo = l_colptr[j] + 1; // skip unit diagonal
                        let hi = l_colptr[j + 1];
                        while lo + frame.1 < hi {
                            let r = l_rows[lo + frame.1];
                            frame.1 += 1;
                            if !visited[r] {
                                next = Some(r);
                                break;
                            }
                        }
                    }
                    match next {
                        Some(r) => {
                            visited[r] = true;
                            stack.push((r, 0));
                        }
                        None => {
                            post.push(node);
                            stack.pop();
                        }
                    }
                }
            }

            // Numeric step: scatter A(:,k) and eliminate in reverse
            // postorder (each pivotal row before the rows it updates).
            for (i, v) in a.col(k) {
                x[i] = v;
            }
            for idx in (0..post.len()).rev() {
                let i = post[idx];
                let j = pinv[i];
                if j == NONE {
                    continue;
                }
                let xi = x[i];
                if xi == 0.0 {
                    continue;
                }
                for p in l_colptr[j] + 1..l_colptr[j + 1] {
                    x[l_rows[p]] -= l_vals[p] * xi;
                }
            }

            // Partial pivoting: the largest entry among unpivoted rows.
            let mut pivot_row = NONE;
            let mut pivot_abs = 0.0f64;
            for &i in &post {
                if pinv[i] == NONE && x[i].abs() > pivot_abs {
                    pivot_abs = x[i].abs();
                    pivot_row = i;
                }
            }
            if pivot_row == NONE || pivot_abs < PIVOT_TOLERANCE {
                // Reset scratch before bailing out.
                for &i in &post {
                    x[i] = 0.0;
                    visited[i] = false;
                }
                return Err(UnwrapError::SolverFailed {
                    detail: format!("singular pivot at column {}", k),
                });
            }
            let pivot = x[pivot_row];

            // Gather U(:,k): entries in already-pivoted rows, then the
            // diagonal.
            for &i in &post {
                let j = pinv[i];
                if j != NONE && x[i] != 0.0 {
                    u_rows.push(j);
                    u_vals.push(x[i]);
                }
            }
            u_rows.push(k);
            u_vals.push(pivot);
            u_colptr.push(u_rows.len());

            // Gather L(:,k): unit diagonal first, then multipliers for the
            // remaining unpivoted rows (still in original coordinates;
            // remapped once the permutation is complete).
            l_rows.push(pivot_row);
            l_vals.push(1.0);
            for &i in &post {
                if pinv[i] == NONE && i != pivot_row && x[i] != 0.0 {
                    l_rows.push(i);
                    l_vals.push(x[i] / pivot);
                }
            }
            l_colptr.push(l_rows.len());

            pinv[pivot_row] = k;

            // Clear scratch for the next column.
            for &i in &post {
                x[i] = 0.0;
                visited[i] = false;
            }
        }

        // Rewrite L's row indices into pivot coordinates; every row has a
        // pivot position by now.
        for r in &mut l_rows {
            *r = pinv[*r];
        }

        Ok(Self {
            n,
            l_colptr,
            l_rows,
            l_vals,
            u_colptr,
            u_rows,
            u_vals,
            pinv,
        })
    }

    /// Solve `A·x = b` using the computed factorization.
    pub fn solve(&self, b: &DVector<f64>) -> DVector<f64> {
        assert_eq!(b.len(), self.n, "right-hand side dimension mismatch");

        // Apply the row permutation: y = P·b.
        let mut y = DVector::zeros(self.n);
        for i in 0..self.n {
            y[self.pinv[i]] = b[i];
        }

        // Forward substitution with unit lower triangular L.
        for k in 0..self.n {
            let yk = y[k];
            if yk == 0.0 {
                continue;
            }
            for p in self.l_colptr[k] + 1..self.l_colptr[k + 1] {
                y[self.l_rows[p]] -= self.l_vals[p] * yk;
            }
        }

        // Backward substitution with U.
        for k in (0..self.n).rev() {
            let range = self.u_colptr[k]..self.u_colptr[k + 1];
            let mut diag = 0.0;
            for p in range.clone() {
                if self.u_rows[p] == k {
                    diag = self.u_vals[p];
                }
            }
            let xk = y[k] / diag;
            y[k] = xk;
            if xk == 0.0 {
                continue;
            }
            for p in range {
                let r = self.u_rows[p];
                if r != k {
                    y[r] -= self.u_vals[p] * xk;
                }
            }
        }

        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csc_from_triplets() {
        // [ 4  1 ]
        // [ 1  3 ]
        let triplets = vec![(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)];
        let a = CscMatrix::from_triplets(2, 2, triplets);

        assert_eq!(a.nrows(), 2);
        assert_eq!(a.ncols(), 2);
        assert_eq!(a.nnz(), 4);
    }

    #[test]
    fn test_csc_duplicates_summed() {
        let triplets = vec![
            (0, 0, 2.0),
            (0, 0, 2.0), // duplicate: sums to 4.0
            (0, 1, 1.0),
            (1, 0, 1.0),
            (1, 1, 3.0),
        ];
        let a = CscMatrix::from_triplets(2, 2, triplets);
        assert_eq!(a.nnz(), 4);

        let x = DVector::from_vec(vec![1.0, 0.0]);
        let y = a.mul_vec(&x);
        assert!((y[0] - 4.0).abs() < 1e-12);
        assert!((y[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_csc_mul_vec() {
        // [ 4  1 ]   [ 1 ]   [ 5 ]
        // [ 1  3 ] * [ 1 ] = [ 4 ]
        let triplets = vec![(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)];
        let a = CscMatrix::from_triplets(2, 2, triplets);

        let y = a.mul_vec(&DVector::from_vec(vec![1.0, 1.0]));
        assert!((y[0] - 5.0).abs() < 1e-12);
        assert!((y[1] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_lu_simple() {
        // Solution of [4 1; 1 3] x = [1; 2] is x = [1/11, 7/11].
        let triplets = vec![(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)];
        let a = CscMatrix::from_triplets(2, 2, triplets);
        let b = DVector::from_vec(vec![1.0, 2.0]);

        let lu = SparseLu::factor(&a).unwrap();
        let x = lu.solve(&b);

        assert!((x[0] - 1.0 / 11.0).abs() < 1e-12);
        assert!((x[1] - 7.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_lu_requires_pivoting() {
        // Zero diagonal forces a row swap:
        // [ 0  2 ]   [ x ]   [ 2 ]        x = [3, 1]
        // [ 1 -1 ] * [ y ] = [ 2 ]
        let triplets = vec![(0, 1, 2.0), (1, 0, 1.0), (1, 1, -1.0)];
        let a = CscMatrix::from_triplets(2, 2, triplets);
        let b = DVector::from_vec(vec![2.0, 2.0]);

        let lu = SparseLu::factor(&a).unwrap();
        let x = lu.solve(&b);

        assert!((x[0] - 3.0).abs() < 1e-12);
        assert!((x[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_lu_indefinite() {
        // Indefinite but nonsingular system.
        // [ 1  2 ]
        // [ 2  1 ]  has eigenvalues 3 and -1.
        let triplets = vec![(0, 0, 1.0), (0, 1, 2.0), (1, 0, 2.0), (1, 1, 1.0)];
        let a = CscMatrix::from_triplets(2, 2, triplets);
        let b = DVector::from_vec(vec![5.0, 4.0]);

        let lu = SparseLu::factor(&a).unwrap();
        let x = lu.solve(&b);

        let residual = a.mul_vec(&x) - b;
        assert!(residual.norm() < 1e-12);
    }

    #[test]
    fn test_lu_singular_detected() {
        // Second column is a multiple of the first.
        let triplets = vec![(0, 0, 1.0), (1, 0, 2.0), (0, 1, 2.0), (1, 1, 4.0)];
        let a = CscMatrix::from_triplets(2, 2, triplets);

        assert!(matches!(
            SparseLu::factor(&a),
            Err(UnwrapError::SolverFailed { .. })
        ));
    }

    #[test]
    fn test_lu_larger_system() {
        // Diagonally dominant 5x5 with off-diagonal structure; verify by
        // residual.
        let mut triplets = Vec::new();
        for i in 0..5usize {
            triplets.push((i, i, 10.0 + i as f64));
            if i + 1 < 5 {
                triplets.push((i, i + 1, -2.0));
                triplets.push((i + 1, i, 1.5));
            }
        }
        triplets.push((0, 4, 0.5));
        triplets.push((4, 0, -0.75));

        let a = CscMatrix::from_triplets(5, 5, triplets);
        let b = DVector::from_vec(vec![1.0, -2.0, 3.0, -4.0, 5.0]);

        let lu = SparseLu::factor(&a).unwrap();
        let x = lu.solve(&b);

        let residual = a.mul_vec(&x) - b;
        assert!(residual.norm() < 1e-10, "residual {}", residual.norm());
    }

    #[test]
    fn test_lu_identity_rows_mixed_in() {
        // Rows pinned to the identity (the Dirichlet pattern used by the
        // LSCM stage) must pass straight through the solve.
        let triplets = vec![
            (0, 0, 1.0),
            (1, 1, 2.0),
            (1, 2, 1.0),
            (2, 1, 1.0),
            (2, 2, 3.0),
        ];
        let a = CscMatrix::from_triplets(3, 3, triplets);
        let b = DVector::from_vec(vec![7.0, 4.0, 5.0]);

        let lu = SparseLu::factor(&a).unwrap();
        let x = lu.solve(&b);

        assert!((x[0] - 7.0).abs() < 1e-12);
        let residual = a.mul_vec(&x) - b;
        assert!(residual.norm() < 1e-12);
    }
}
