//! Last-known anchoring references and their persistence.

use dashmap::DashMap;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::blockchain::types::AnchorReference;

/// A thread-safe cache of references keyed by id.
#[derive(Debug, Clone, Default)]
pub struct AnchorCache {
    inner: Arc<DashMap<String, AnchorReference>>,
    persistence_path: Option<PathBuf>,
}

impl AnchorCache {
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
        }
    }

    /// Load from file if it exists; the file becomes the save target.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let cache = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let map: HashMap<String, AnchorReference> = serde_json::from_reader(reader)?;
            for (id, reference) in map {
                cache.inner.insert(id, reference);
            }
            tracing::debug!(count = cache.inner.len(), path = %path.display(), "Loaded anchor cache");
        }
        Ok(cache)
    }

    /// Write all entries to the persistence path, if any.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let map: HashMap<String, AnchorReference> = self
            .inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &map)?;
        Ok(())
    }

    /// Store a freshly created reference.
    pub fn record(&self, reference: AnchorReference) {
        self.inner.insert(reference.id.clone(), reference);
        self.persist();
    }

    pub fn get(&self, id: &str) -> Option<AnchorReference> {
        self.inner.get(id).map(|r| r.value().clone())
    }

    /// Merge an observation into the cached entry, or insert it when the
    /// id is unknown. Returns the resulting entry.
    pub fn refine_or_insert(&self, observed: AnchorReference) -> AnchorReference {
        let merged = {
            let mut entry = self
                .inner
                .entry(observed.id.clone())
                .or_insert_with(|| observed.clone());
            entry.refine(&observed);
            entry.clone()
        };
        self.persist();
        merged
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn persist(&self) {
        if let Err(e) = self.save_to_file() {
            tracing::warn!(error = %e, "Failed to save anchor cache");
        }
    }
}
