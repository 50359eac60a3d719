//! Loss and accuracy over a subset of output rows.

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1};

/// Rows of the model output to score and the class expected for each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Targets {
    pub rows: Vec<usize>,
    pub labels: Vec<usize>,
}

impl Targets {
    pub fn new(rows: Vec<usize>, labels: Vec<usize>) -> Result<Self> {
        if rows.len() != labels.len() {
            return Err(Error::Core(edgedrop_core::Error::ShapeMismatch {
                what: "target labels",
                expected: rows.len(),
                got: labels.len(),
            }));
        }
        Ok(Self { rows, labels })
    }

    /// Score `rows` of the output against `all_labels[rows]`.
    pub fn select(rows: &[usize], all_labels: &[usize]) -> Result<Self> {
        let labels = gather(all_labels, rows, "label")?;
        Ok(Self {
            rows: rows.to_vec(),
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().copied().zip(self.labels.iter().copied())
    }
}

pub(crate) fn gather(values: &[usize], idx: &[usize], what: &'static str) -> Result<Vec<usize>> {
    idx.iter()
        .map(|&i| {
            values.get(i).copied().ok_or(Error::Core(edgedrop_core::Error::IndexOutOfBounds {
                what,
                index: i,
                len: values.len(),
            }))
        })
        .collect()
}

fn check(output: &Array2<f32>, targets: &Targets) -> Result<()> {
    let (n, c) = output.dim();
    for (row, label) in targets.pairs() {
        if row >= n {
            return Err(edgedrop_core::Error::IndexOutOfBounds {
                what: "output row",
                index: row,
                len: n,
            }
            .into());
        }
        if label >= c {
            return Err(edgedrop_core::Error::IndexOutOfBounds {
                what: "class",
                index: label,
                len: c,
            }
            .into());
        }
    }
    Ok(())
}

/// Negative log-likelihood of per-node log-probabilities.
///
/// Mean of `-output[row, label]` over the targets; 0 for an empty target set.
pub fn nll_loss(output: &Array2<f32>, targets: &Targets) -> Result<f32> {
    check(output, targets)?;
    if targets.is_empty() {
        return Ok(0.0);
    }
    let total: f32 = targets.pairs().map(|(row, label)| -output[[row, label]]).sum();
    Ok(total / targets.len() as f32)
}

fn argmax(row: ArrayView1<'_, f32>) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, max), (j, &v)| {
            if v > max {
                (j, v)
            } else {
                (best, max)
            }
        })
        .0
}

/// Fraction of targets whose highest-scoring class is the label.
pub fn accuracy(output: &Array2<f32>, targets: &Targets) -> Result<f32> {
    check(output, targets)?;
    if targets.is_empty() {
        return Ok(0.0);
    }
    let correct = targets
        .pairs()
        .filter(|&(row, label)| argmax(output.row(row)) == label)
        .count();
    Ok(correct as f32 / targets.len() as f32)
}
