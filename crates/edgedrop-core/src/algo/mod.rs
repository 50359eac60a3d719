//! Graph algorithms.

pub mod sampling;
