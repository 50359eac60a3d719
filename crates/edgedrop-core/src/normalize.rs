//! Adjacency normalization schemes.
//!
//! Every scheme turns a raw adjacency `A` into a propagation operator. The
//! schemes are a closed set ([`Normalization`]), each resolving to a
//! [`Recipe`] built from three choices:
//!
//! | Choice | Options |
//! |--------|---------|
//! | self-loops | keep `A`, or force the diagonal to 1 (`A + I` for loop-free `A`) |
//! | propagation | raw, symmetric `D^-1/2 A D^-1/2`, row-stochastic `D^-1 A` |
//! | shift | none, `+ I`, `I - ·`, `D - ·` |
//!
//! ```text
//! AugNormAdj     D'^-1/2 (A + I) D'^-1/2
//! NormAdj        D^-1/2 A D^-1/2
//! BingeNormAdj   D'^-1 (A + I)
//! RWalk          D^-1 A
//! FirstOrderGCN  I + D^-1/2 A D^-1/2
//! NormLap        I - D^-1/2 A D^-1/2
//! RWalkLap       I - D^-1 A
//! Lap            D - A
//! NoNorm         A
//! ```
//!
//! Degrees are the row sums of the matrix being propagated. A zero degree
//! yields a zero inverse, so isolated nodes never produce NaN or Inf.
//!
//! Self-loop augmentation sets the diagonal to 1 rather than adding 1. For
//! the loop-free adjacency of a citation graph this is exactly `A + I`; for
//! a sampled view, which already carries unit self-loops, it does not count
//! them twice.

use crate::{Error, Result, SparseAdj};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named normalization scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Normalization {
    /// Symmetric normalization with self-loops (Kipf & Welling renormalization trick).
    #[default]
    AugNormAdj,
    /// Symmetric normalization without self-loops.
    NormAdj,
    /// Row-stochastic normalization with self-loops.
    BingeNormAdj,
    /// Row-stochastic normalization without self-loops.
    RWalk,
    /// Identity passthrough.
    NoNorm,
    /// `I + D^-1/2 A D^-1/2`.
    #[serde(rename = "FirstOrderGCN")]
    FirstOrderGcn,
    /// Normalized Laplacian.
    NormLap,
    /// Random-walk Laplacian.
    RWalkLap,
    /// Combinatorial Laplacian.
    Lap,
}

impl Normalization {
    /// Every scheme, in declaration order.
    pub const ALL: [Normalization; 9] = [
        Normalization::AugNormAdj,
        Normalization::NormAdj,
        Normalization::BingeNormAdj,
        Normalization::RWalk,
        Normalization::NoNorm,
        Normalization::FirstOrderGcn,
        Normalization::NormLap,
        Normalization::RWalkLap,
        Normalization::Lap,
    ];

    /// Literal scheme name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Normalization::AugNormAdj => "AugNormAdj",
            Normalization::NormAdj => "NormAdj",
            Normalization::BingeNormAdj => "BingeNormAdj",
            Normalization::RWalk => "RWalk",
            Normalization::NoNorm => "NoNorm",
            Normalization::FirstOrderGcn => "FirstOrderGCN",
            Normalization::NormLap => "NormLap",
            Normalization::RWalkLap => "RWalkLap",
            Normalization::Lap => "Lap",
        }
    }

    /// The numeric recipe behind this scheme.
    pub const fn recipe(self) -> Recipe {
        use Propagation::{Raw, RowStochastic, Symmetric};
        let (self_loops, propagation, shift) = match self {
            Normalization::AugNormAdj => (true, Symmetric, Shift::None),
            Normalization::NormAdj => (false, Symmetric, Shift::None),
            Normalization::BingeNormAdj => (true, RowStochastic, Shift::None),
            Normalization::RWalk => (false, RowStochastic, Shift::None),
            Normalization::NoNorm => (false, Raw, Shift::None),
            Normalization::FirstOrderGcn => (false, Symmetric, Shift::AddIdentity),
            Normalization::NormLap => (false, Symmetric, Shift::IdentityMinus),
            Normalization::RWalkLap => (false, RowStochastic, Shift::IdentityMinus),
            Normalization::Lap => (false, Raw, Shift::DegreeMinus),
        };
        Recipe {
            self_loops,
            propagation,
            shift,
        }
    }

    /// Whether the scheme rescales by degree.
    ///
    /// Models built for normalized propagation expect `true`; pairing them
    /// with `NoNorm` or `Lap` is a configuration mistake that is only
    /// reported, never rejected.
    pub fn rescales(self) -> bool {
        !matches!(self.recipe().propagation, Propagation::Raw)
    }

    /// Normalize `adj` under this scheme.
    pub fn apply(self, adj: &SparseAdj) -> SparseAdj {
        self.recipe().apply(adj)
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Normalization {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Normalization::ALL
            .into_iter()
            .find(|scheme| scheme.name() == s)
            .ok_or_else(|| Error::UnknownScheme(s.to_string()))
    }
}

/// How degrees rescale the (possibly loop-augmented) adjacency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Propagation {
    /// No rescaling.
    Raw,
    /// `D^-1/2 A D^-1/2`.
    Symmetric,
    /// `D^-1 A`.
    RowStochastic,
}

/// Identity or degree term combined with the propagated matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shift {
    /// `P`.
    None,
    /// `I + P`.
    AddIdentity,
    /// `I - P`.
    IdentityMinus,
    /// `D - P`.
    DegreeMinus,
}

/// A normalization recipe. Public so callers can run variants outside the
/// named set, e.g. a symmetric operator over a graph that keeps its own
/// weighted self-loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipe {
    pub self_loops: bool,
    pub propagation: Propagation,
    pub shift: Shift,
}

impl Recipe {
    /// Apply the recipe. Pure and deterministic.
    pub fn apply(&self, adj: &SparseAdj) -> SparseAdj {
        let base = if self.self_loops {
            adj.with_unit_diagonal()
        } else {
            adj.clone()
        };
        let degrees = base.row_sums();

        let propagated = match self.propagation {
            Propagation::Raw => base,
            Propagation::Symmetric => {
                let inv = inverse(&degrees, |d| d.sqrt().recip());
                // inv[i] * inv[j] commutes exactly, so symmetric input stays symmetric.
                base.map_values(|i, j, w| w * (inv[i] * inv[j]))
            }
            Propagation::RowStochastic => {
                let inv = inverse(&degrees, f32::recip);
                base.map_values(|i, _, w| w * inv[i])
            }
        };

        match self.shift {
            Shift::None => propagated,
            Shift::AddIdentity => propagated.with_diagonal(|_, cur| 1.0 + cur.unwrap_or(0.0)),
            Shift::IdentityMinus => propagated
                .map_values(|_, _, w| -w)
                .with_diagonal(|_, cur| 1.0 + cur.unwrap_or(0.0)),
            Shift::DegreeMinus => propagated
                .map_values(|_, _, w| -w)
                .with_diagonal(|i, cur| degrees[i] + cur.unwrap_or(0.0)),
        }
    }
}

/// Degree inverse with zero (or otherwise unusable) degrees mapped to 0.
fn inverse(degrees: &[f32], f: impl Fn(f32) -> f32) -> Vec<f32> {
    degrees
        .iter()
        .map(|&d| {
            if d > 0.0 {
                let v = f(d);
                if v.is_finite() {
                    v
                } else {
                    0.0
                }
            } else {
                0.0
            }
        })
        .collect()
}

/// Something that turns an adjacency into a propagation operator.
///
/// [`StandardNormalizer`] is the production implementation; the seam exists
/// so caches and samplers can be exercised with counting doubles.
pub trait Normalizer {
    fn normalize(&self, adj: &SparseAdj, scheme: Normalization) -> SparseAdj;
}

/// Applies [`Normalization::recipe`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardNormalizer;

impl Normalizer for StandardNormalizer {
    fn normalize(&self, adj: &SparseAdj, scheme: Normalization) -> SparseAdj {
        scheme.apply(adj)
    }
}

/// Normalize `adj` under `scheme`.
pub fn normalize(adj: &SparseAdj, scheme: Normalization) -> SparseAdj {
    scheme.apply(adj)
}
