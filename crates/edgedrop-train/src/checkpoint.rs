//! Parameter persistence.
//!
//! Early stopping snapshots the best parameters seen so far. Where they go
//! is up to a [`CheckpointStore`]: [`JsonCheckpointStore`] writes one file
//! per run, [`MemoryCheckpointStore`] keeps them in process.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Saves and loads model parameters by location.
pub trait CheckpointStore<P> {
    /// Persist `params`, returning where they went.
    fn save(&mut self, params: &P) -> Result<PathBuf>;

    /// Load parameters previously written to `location`.
    fn load(&self, location: &Path) -> Result<P>;
}

/// Writes parameters as JSON to `<dir>/<run_name>.json`.
///
/// Each save overwrites the previous snapshot for the run.
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    dir: PathBuf,
    run_name: String,
}

impl JsonCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>, run_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            run_name: run_name.into(),
        }
    }

    /// Where this run's snapshot lives.
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.run_name))
    }
}

impl<P: Serialize + DeserializeOwned> CheckpointStore<P> for JsonCheckpointStore {
    fn save(&mut self, params: &P) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path();
        let file = fs::File::create(&path)?;
        serde_json::to_writer(std::io::BufWriter::new(file), params)?;
        Ok(path)
    }

    fn load(&self, location: &Path) -> Result<P> {
        if !location.exists() {
            return Err(Error::NotFound(format!("checkpoint {}", location.display())));
        }
        let file = fs::File::open(location)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

/// In-process store, keyed by synthetic paths.
#[derive(Debug, Clone)]
pub struct MemoryCheckpointStore<P> {
    snapshots: HashMap<PathBuf, P>,
    saves: usize,
}

impl<P> MemoryCheckpointStore<P> {
    pub fn new() -> Self {
        Self {
            snapshots: HashMap::new(),
            saves: 0,
        }
    }

    /// Number of `save` calls so far.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl<P> Default for MemoryCheckpointStore<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Clone> CheckpointStore<P> for MemoryCheckpointStore<P> {
    fn save(&mut self, params: &P) -> Result<PathBuf> {
        let location = PathBuf::from("memory://best");
        self.snapshots.insert(location.clone(), params.clone());
        self.saves += 1;
        Ok(location)
    }

    fn load(&self, location: &Path) -> Result<P> {
        self.snapshots
            .get(location)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("checkpoint {}", location.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonCheckpointStore::new(dir.path(), "cora-run");
        let params = vec![1.0f32, 2.5, -3.0];

        let location = store.save(&params).unwrap();
        assert_eq!(location, dir.path().join("cora-run.json"));

        let loaded: Vec<f32> = store.load(&location).unwrap();
        assert_eq!(loaded, params);
    }

    #[test]
    fn test_json_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonCheckpointStore::new(dir.path(), "run");
        store.save(&vec![1u32]).unwrap();
        let location = store.save(&vec![2u32]).unwrap();
        let loaded: Vec<u32> = store.load(&location).unwrap();
        assert_eq!(loaded, vec![2]);
    }

    #[test]
    fn test_json_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCheckpointStore::new(dir.path(), "run");
        let err = CheckpointStore::<Vec<f32>>::load(&store, &store.path()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryCheckpointStore::new();
        let location = store.save(&"weights".to_string()).unwrap();
        assert_eq!(store.load(&location).unwrap(), "weights");
        assert_eq!(store.saves(), 1);
        assert!(store.load(Path::new("elsewhere")).is_err());
    }
}
