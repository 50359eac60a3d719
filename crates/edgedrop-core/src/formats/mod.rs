//! Dataset serialization formats.

pub mod json;

pub use json::{DatasetRecord, GraphRecord, JsonDataset};
