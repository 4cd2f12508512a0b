use crate::csv;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Stored runs of one participant, keyed by record name.
pub type ResultsMap = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed data in {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("cannot encode data for {path}: {source}")]
    Encode {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Persistence collaborator for serialized runs and CSV exports.
pub trait SessionStore {
    fn load(&self, path: &Path) -> Result<ResultsMap, StoreError>;
    fn save(&self, path: &Path, data: &ResultsMap) -> Result<(), StoreError>;
    fn write_rows(&self, path: &Path, rows: &[Vec<String>]) -> Result<(), StoreError>;

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Keeps the results map as a JSON object on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFileStore;

impl JsonFileStore {
    pub fn new() -> Self {
        Self
    }
}

/// Replaces `path` with `bytes` via a sibling temp file, so readers never see a partial file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

impl SessionStore for JsonFileStore {
    fn load(&self, path: &Path) -> Result<ResultsMap, StoreError> {
        let text = fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if text.trim().is_empty() {
            debug!(path = %path.display(), "empty data file");
            return Ok(ResultsMap::new());
        }
        let map: ResultsMap = serde_json::from_str(&text).map_err(|source| StoreError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), records = map.len(), "loaded results");
        Ok(map)
    }

    fn save(&self, path: &Path, data: &ResultsMap) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(data).map_err(|source| StoreError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        write_atomic(path, &bytes)?;
        info!(path = %path.display(), records = data.len(), "saved results");
        Ok(())
    }

    fn write_rows(&self, path: &Path, rows: &[Vec<String>]) -> Result<(), StoreError> {
        let text = csv::to_csv(rows);
        if let Err(e) = write_atomic(path, text.as_bytes()) {
            warn!(path = %path.display(), error = %e, "csv export failed");
            return Err(e);
        }
        info!(path = %path.display(), rows = rows.len(), "exported csv");
        Ok(())
    }
}

/// In-memory store, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RefCell<HashMap<PathBuf, ResultsMap>>,
    exports: RefCell<HashMap<PathBuf, Vec<Vec<String>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, data: ResultsMap) {
        self.files.borrow_mut().insert(path.into(), data);
    }

    pub fn saved(&self, path: &Path) -> Option<ResultsMap> {
        self.files.borrow().get(path).cloned()
    }

    pub fn exported(&self, path: &Path) -> Option<Vec<Vec<String>>> {
        self.exports.borrow().get(path).cloned()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self, path: &Path) -> Result<ResultsMap, StoreError> {
        Ok(self.files.borrow().get(path).cloned().unwrap_or_default())
    }

    fn save(&self, path: &Path, data: &ResultsMap) -> Result<(), StoreError> {
        self.insert(path, data.clone());
        Ok(())
    }

    fn write_rows(&self, path: &Path, rows: &[Vec<String>]) -> Result<(), StoreError> {
        self.exports
            .borrow_mut()
            .insert(path.to_path_buf(), rows.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path)
    }
}
