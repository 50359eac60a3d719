//! Compressed sparse row adjacency matrices.
//!
//! [`SparseAdj`] is the single matrix type flowing through the pipeline:
//! raw adjacency, sampled adjacency and normalized propagation operator are
//! all square CSR matrices over `f32`. Within each row the column indices are
//! strictly increasing, which keeps every transformation deterministic and
//! makes structural equality (`==`) meaningful.

use crate::{Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Square sparse matrix in CSR format.
///
/// Deserialization checks the CSR invariants and rejects malformed input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCsr")]
pub struct SparseAdj {
    num_nodes: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f32>,
}

/// Unchecked CSR fields as they appear on the wire.
#[derive(Deserialize)]
struct RawCsr {
    num_nodes: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f32>,
}

impl TryFrom<RawCsr> for SparseAdj {
    type Error = Error;

    fn try_from(raw: RawCsr) -> Result<Self> {
        let RawCsr {
            num_nodes,
            row_ptr,
            col_idx,
            values,
        } = raw;
        if row_ptr.len() != num_nodes + 1 {
            return Err(Error::ShapeMismatch {
                what: "row pointers",
                expected: num_nodes + 1,
                got: row_ptr.len(),
            });
        }
        if col_idx.len() != values.len() {
            return Err(Error::ShapeMismatch {
                what: "column indices vs values",
                expected: values.len(),
                got: col_idx.len(),
            });
        }
        if row_ptr[0] != 0 || row_ptr[num_nodes] != col_idx.len() {
            return Err(Error::ShapeMismatch {
                what: "stored entries",
                expected: col_idx.len(),
                got: row_ptr[num_nodes].saturating_sub(row_ptr[0]),
            });
        }
        // Monotone offsets ending at `col_idx.len()` keep every row slice in range.
        if let Some(w) = row_ptr.windows(2).find(|w| w[0] > w[1]) {
            return Err(Error::IndexOutOfBounds {
                what: "row pointer",
                index: w[0],
                len: w[1],
            });
        }
        for i in 0..num_nodes {
            let cols = &col_idx[row_ptr[i]..row_ptr[i + 1]];
            if let Some(&bad) = cols.iter().find(|&&j| j >= num_nodes) {
                return Err(Error::IndexOutOfBounds {
                    what: "column",
                    index: bad,
                    len: num_nodes,
                });
            }
            if let Some(w) = cols.windows(2).find(|w| w[0] >= w[1]) {
                return Err(Error::IndexOutOfBounds {
                    what: "unsorted column",
                    index: w[1],
                    len: num_nodes,
                });
            }
        }
        Ok(Self {
            num_nodes,
            row_ptr,
            col_idx,
            values,
        })
    }
}

impl SparseAdj {
    /// Empty matrix (no entries) over `num_nodes` nodes.
    pub fn zeros(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            row_ptr: vec![0; num_nodes + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Identity matrix.
    pub fn identity(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            row_ptr: (0..=num_nodes).collect(),
            col_idx: (0..num_nodes).collect(),
            values: vec![1.0; num_nodes],
        }
    }

    /// Build an unweighted adjacency from `(row, col)` pairs.
    ///
    /// Repeated pairs collapse into a single entry of weight 1. No mirroring
    /// is done here; see [`SparseAdj::symmetrize`].
    pub fn from_edges(num_nodes: usize, edges: &[(usize, usize)]) -> Result<Self> {
        let mut sorted = edges.to_vec();
        for &(u, v) in &sorted {
            check_bounds(u, v, num_nodes)?;
        }
        sorted.sort_unstable();
        sorted.dedup();
        Ok(Self::from_sorted(
            num_nodes,
            sorted.into_iter().map(|(u, v)| (u, v, 1.0)),
        ))
    }

    /// Build a weighted matrix from `(row, col, value)` triplets.
    ///
    /// Duplicate coordinates are summed.
    pub fn from_triplets(
        num_nodes: usize,
        triplets: impl IntoIterator<Item = (usize, usize, f32)>,
    ) -> Result<Self> {
        let mut sorted: Vec<(usize, usize, f32)> = triplets.into_iter().collect();
        for &(u, v, _) in &sorted {
            check_bounds(u, v, num_nodes)?;
        }
        sorted.sort_by_key(|&(u, v, _)| (u, v));

        let mut merged: Vec<(usize, usize, f32)> = Vec::with_capacity(sorted.len());
        for (u, v, w) in sorted {
            match merged.last_mut() {
                Some(last) if last.0 == u && last.1 == v => last.2 += w,
                _ => merged.push((u, v, w)),
            }
        }
        Ok(Self::from_sorted(num_nodes, merged))
    }

    /// Assemble from triplets already sorted by `(row, col)` without duplicates.
    pub(crate) fn from_sorted(
        num_nodes: usize,
        triplets: impl IntoIterator<Item = (usize, usize, f32)>,
    ) -> Self {
        let mut row_ptr = vec![0; num_nodes + 1];
        let mut col_idx = Vec::new();
        let mut values = Vec::new();

        for (u, v, w) in triplets {
            row_ptr[u + 1] += 1;
            col_idx.push(v);
            values.push(w);
        }
        for i in 0..num_nodes {
            row_ptr[i + 1] += row_ptr[i];
        }

        Self {
            num_nodes,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Number of rows (and columns).
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of stored entries, diagonal included.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Entries of row `i` as `(col, value)`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let (start, end) = (self.row_ptr[i], self.row_ptr[i + 1]);
        self.col_idx[start..end]
            .iter()
            .copied()
            .zip(self.values[start..end].iter().copied())
    }

    /// All entries as `(row, col, value)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        (0..self.num_nodes).flat_map(move |i| self.row(i).map(move |(j, w)| (i, j, w)))
    }

    /// Stored value at `(i, j)`, if any.
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i >= self.num_nodes {
            return None;
        }
        let (start, end) = (self.row_ptr[i], self.row_ptr[i + 1]);
        self.col_idx[start..end]
            .binary_search(&j)
            .ok()
            .map(|k| self.values[start + k])
    }

    /// Strict upper-triangle entries `(i, j, value)` with `i < j`.
    ///
    /// For an undirected graph this visits every edge exactly once.
    pub fn upper_edges(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        self.iter().filter(|&(i, j, _)| i < j)
    }

    /// Number of undirected edges (strict upper triangle, zero weights skipped).
    pub fn num_undirected_edges(&self) -> usize {
        self.upper_edges().filter(|&(_, _, w)| w != 0.0).count()
    }

    /// Row sums (weighted degrees).
    pub fn row_sums(&self) -> Vec<f32> {
        (0..self.num_nodes)
            .map(|i| self.row(i).map(|(_, w)| w).sum())
            .collect()
    }

    /// Diagonal values; missing entries read as 0.
    pub fn diagonal(&self) -> Vec<f32> {
        (0..self.num_nodes)
            .map(|i| self.get(i, i).unwrap_or(0.0))
            .collect()
    }

    /// Whether `A == Aᵀ` exactly.
    pub fn is_symmetric(&self) -> bool {
        self.iter()
            .all(|(i, j, w)| i == j || self.get(j, i).unwrap_or(0.0) == w)
    }

    /// Transposed copy.
    pub fn transpose(&self) -> Self {
        let mut triplets: Vec<(usize, usize, f32)> = self.iter().map(|(i, j, w)| (j, i, w)).collect();
        triplets.sort_by_key(|&(u, v, _)| (u, v));
        Self::from_sorted(self.num_nodes, triplets)
    }

    /// Element-wise `max(A, Aᵀ)`, turning a directed edge list into an
    /// undirected adjacency.
    pub fn symmetrize(&self) -> Self {
        let mut triplets: Vec<(usize, usize, f32)> = self
            .iter()
            .flat_map(|(i, j, w)| [(i, j, w), (j, i, w)])
            .collect();
        triplets.sort_by_key(|&(u, v, _)| (u, v));

        let mut merged: Vec<(usize, usize, f32)> = Vec::with_capacity(triplets.len());
        for (u, v, w) in triplets {
            match merged.last_mut() {
                Some(last) if last.0 == u && last.1 == v => last.2 = last.2.max(w),
                _ => merged.push((u, v, w)),
            }
        }
        Self::from_sorted(self.num_nodes, merged)
    }

    /// Same sparsity pattern, every value rewritten by `f(row, col, value)`.
    pub fn map_values(&self, f: impl Fn(usize, usize, f32) -> f32) -> Self {
        let mut out = self.clone();
        for i in 0..self.num_nodes {
            for k in self.row_ptr[i]..self.row_ptr[i + 1] {
                out.values[k] = f(i, self.col_idx[k], self.values[k]);
            }
        }
        out
    }

    /// Copy with the diagonal rewritten by `f(i, current)`.
    ///
    /// `current` is `None` when row `i` has no stored diagonal entry; the
    /// result always stores one.
    pub fn with_diagonal(&self, f: impl Fn(usize, Option<f32>) -> f32) -> Self {
        let mut triplets = Vec::with_capacity(self.nnz() + self.num_nodes);
        for i in 0..self.num_nodes {
            let mut placed = false;
            for (j, w) in self.row(i) {
                if j == i {
                    triplets.push((i, i, f(i, Some(w))));
                    placed = true;
                    continue;
                }
                if j > i && !placed {
                    triplets.push((i, i, f(i, None)));
                    placed = true;
                }
                triplets.push((i, j, w));
            }
            if !placed {
                triplets.push((i, i, f(i, None)));
            }
        }
        Self::from_sorted(self.num_nodes, triplets)
    }

    /// Copy with every diagonal entry set to 1.
    ///
    /// Idempotent: adjacency that already carries self-loops is not double
    /// counted.
    pub fn with_unit_diagonal(&self) -> Self {
        self.with_diagonal(|_, _| 1.0)
    }

    /// Sparse-dense product `A · X`.
    pub fn matmul_dense(&self, x: &Array2<f32>) -> Result<Array2<f32>> {
        if x.nrows() != self.num_nodes {
            return Err(Error::ShapeMismatch {
                what: "dense operand rows",
                expected: self.num_nodes,
                got: x.nrows(),
            });
        }
        let mut out = Array2::zeros((self.num_nodes, x.ncols()));
        for i in 0..self.num_nodes {
            let mut out_row = out.row_mut(i);
            for (j, w) in self.row(i) {
                out_row.scaled_add(w, &x.row(j));
            }
        }
        Ok(out)
    }

    /// Dense copy, mostly for inspection and tests.
    pub fn to_dense(&self) -> Array2<f32> {
        let mut dense = Array2::zeros((self.num_nodes, self.num_nodes));
        for (i, j, w) in self.iter() {
            dense[[i, j]] = w;
        }
        dense
    }
}

fn check_bounds(u: usize, v: usize, num_nodes: usize) -> Result<()> {
    let index = u.max(v);
    if index >= num_nodes {
        return Err(Error::IndexOutOfBounds {
            what: "edge",
            index,
            len: num_nodes,
        });
    }
    Ok(())
}
