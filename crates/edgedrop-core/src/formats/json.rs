//! JSON dataset interchange.
//!
//! A dataset file holds one graph (transductive) or two (inductive) plus the
//! split. Edges are read as given and symmetrized, so either one or both
//! directions of an undirected edge may be listed.
//!
//! ```json
//! {
//!   "learning_type": "transductive",
//!   "graph": {
//!     "num_nodes": 3,
//!     "edges": [[0, 1], [1, 2]],
//!     "features": [[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
//!     "labels": [0, 1, 0]
//!   },
//!   "split": { "train": [0], "val": [1], "test": [2] }
//! }
//! ```

use crate::{Error, Graph, GraphStore, Result, SparseAdj, Split};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

/// One graph as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    pub num_nodes: usize,
    pub edges: Vec<(usize, usize)>,
    pub features: Vec<Vec<f32>>,
    pub labels: Vec<usize>,
}

impl GraphRecord {
    /// Build the validated [`Graph`].
    pub fn into_graph(self) -> Result<Graph> {
        let adjacency = SparseAdj::from_edges(self.num_nodes, &self.edges)?.symmetrize();

        let nfeat = self.features.first().map_or(0, Vec::len);
        if let Some(bad) = self.features.iter().find(|row| row.len() != nfeat) {
            return Err(Error::ShapeMismatch {
                what: "feature columns",
                expected: nfeat,
                got: bad.len(),
            });
        }
        let rows = self.features.len();
        let flat: Vec<f32> = self.features.into_iter().flatten().collect();
        let got = flat.len();
        let features = Array2::from_shape_vec((rows, nfeat), flat).map_err(|_| {
            Error::ShapeMismatch {
                what: "feature matrix",
                expected: rows * nfeat,
                got,
            }
        })?;

        Graph::new(adjacency, features, self.labels)
    }

    /// Record for `graph`, listing each undirected edge once.
    pub fn from_graph(graph: &Graph) -> Self {
        Self {
            num_nodes: graph.num_nodes(),
            edges: graph
                .adjacency()
                .iter()
                .filter(|&(i, j, w)| i <= j && w != 0.0)
                .map(|(i, j, _)| (i, j))
                .collect(),
            features: graph.features().rows().into_iter().map(|r| r.to_vec()).collect(),
            labels: graph.labels().to_vec(),
        }
    }
}

/// Whole dataset as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "learning_type", rename_all = "lowercase")]
pub enum DatasetRecord {
    Transductive {
        graph: GraphRecord,
        split: Split,
    },
    Inductive {
        train: GraphRecord,
        eval: GraphRecord,
        split: Split,
    },
}

impl DatasetRecord {
    pub fn into_store(self) -> Result<GraphStore> {
        match self {
            DatasetRecord::Transductive { graph, split } => {
                GraphStore::transductive(graph.into_graph()?, split)
            }
            DatasetRecord::Inductive { train, eval, split } => {
                GraphStore::inductive(train.into_graph()?, eval.into_graph()?, split)
            }
        }
    }

    pub fn from_store(store: &GraphStore) -> Self {
        match store {
            GraphStore::Transductive { graph, split } => DatasetRecord::Transductive {
                graph: GraphRecord::from_graph(graph),
                split: split.clone(),
            },
            GraphStore::Inductive { train, eval, split } => DatasetRecord::Inductive {
                train: GraphRecord::from_graph(train),
                eval: GraphRecord::from_graph(eval),
                split: split.clone(),
            },
        }
    }
}

/// JSON dataset format handler.
pub struct JsonDataset;

impl JsonDataset {
    /// Read and validate a dataset.
    pub fn read<R: Read>(reader: R) -> Result<GraphStore> {
        let record: DatasetRecord = serde_json::from_reader(reader)?;
        record.into_store()
    }

    /// Read a dataset file.
    pub fn read_file(path: impl AsRef<Path>) -> Result<GraphStore> {
        let file = std::fs::File::open(path)?;
        Self::read(std::io::BufReader::new(file))
    }

    /// Write a dataset.
    pub fn write<W: Write>(store: &GraphStore, mut writer: W) -> Result<()> {
        let json = Self::to_string(store)?;
        writer.write_all(json.as_bytes())?;
        Ok(())
    }

    pub fn to_string(store: &GraphStore) -> Result<String> {
        Ok(serde_json::to_string_pretty(&DatasetRecord::from_store(store))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LearningType;

    const TRANSDUCTIVE: &str = r#"{
        "learning_type": "transductive",
        "graph": {
            "num_nodes": 3,
            "edges": [[0, 1], [1, 2]],
            "features": [[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
            "labels": [0, 1, 0]
        },
        "split": { "train": [0], "val": [1], "test": [2] }
    }"#;

    #[test]
    fn test_read_transductive() {
        let store = JsonDataset::read(TRANSDUCTIVE.as_bytes()).unwrap();
        assert_eq!(store.learning_type(), LearningType::Transductive);
        let graph = store.train_graph();
        assert!(graph.adjacency().is_symmetric());
        assert_eq!(graph.adjacency().num_undirected_edges(), 2);
        assert_eq!(graph.num_features(), 2);
    }

    #[test]
    fn test_write_then_read() {
        let store = JsonDataset::read(TRANSDUCTIVE.as_bytes()).unwrap();
        let text = JsonDataset::to_string(&store).unwrap();
        let again = JsonDataset::read(text.as_bytes()).unwrap();
        assert_eq!(again.train_graph().adjacency(), store.train_graph().adjacency());
        assert_eq!(again.split(), store.split());
    }

    #[test]
    fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.json");
        let store = JsonDataset::read(TRANSDUCTIVE.as_bytes()).unwrap();
        JsonDataset::write(&store, std::fs::File::create(&path).unwrap()).unwrap();

        let again = JsonDataset::read_file(&path).unwrap();
        assert_eq!(again.split().test, vec![2]);
        assert!(matches!(
            JsonDataset::read_file(dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_ragged_features() {
        let text = TRANSDUCTIVE.replace("[1.0, 1.0]", "[1.0]");
        let err = JsonDataset::read(text.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { what: "feature columns", .. }));
    }

    #[test]
    fn test_edge_out_of_range() {
        let text = TRANSDUCTIVE.replace("[1, 2]]", "[1, 7]]");
        let err = JsonDataset::read(text.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfBounds { index: 7, .. }));
    }

    #[test]
    fn test_read_inductive() {
        let text = r#"{
            "learning_type": "inductive",
            "train": { "num_nodes": 2, "edges": [[0, 1]], "features": [[1.0], [2.0]], "labels": [0, 1] },
            "eval": { "num_nodes": 4, "edges": [[0, 1], [2, 3]], "features": [[1.0], [2.0], [3.0], [4.0]], "labels": [0, 1, 0, 1] },
            "split": { "train": [0, 1], "val": [2], "test": [3] }
        }"#;
        let store = JsonDataset::read(text.as_bytes()).unwrap();
        assert_eq!(store.learning_type(), LearningType::Inductive);
        assert_eq!(store.eval_graph().num_nodes(), 4);
    }
}
