use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use forceadmin_core::errors::StoreError;
use forceadmin_core::traits::{KvStore, WriteBatch};
use serde::{Deserialize, Serialize};

use super::atomic::{atomic_write, StoreLock};

const DOC_VERSION: u32 = 1;

/// On-disk document: hex key → hex value.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDoc {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// JSON-file-backed store.
///
/// Holds the state file's lock for its whole life. Each batch is written
/// to a fresh copy and atomically renamed over the file; the in-memory view
/// only advances after the rename succeeds.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    _lock: StoreLock,
}

impl FileStore {
    /// Lock and load `path`. A missing file opens as an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let lock = StoreLock::acquire(&path)?;

        let entries = load_entries(&path)?;
        tracing::debug!(path = %path.display(), entries = entries.len(), "store loaded");

        Ok(Self {
            path,
            entries,
            _lock: lock,
        })
    }

    /// Write the current contents to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        persist(&self.path, &self.entries)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    /// Refuses to commit if the file no longer matches the view loaded at
    /// `open`, so a stale handle can never overwrite someone else's commit.
    fn write_batch(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        if load_entries(&self.path)? != self.entries {
            tracing::error!(path = %self.path.display(), "state file changed under open store");
            return Err(StoreError::Stale(self.path.display().to_string()));
        }
        let ops = batch.len();
        let mut next = self.entries.clone();
        for (k, v) in batch {
            next.insert(k, v);
        }
        persist(&self.path, &next)?;
        self.entries = next;
        tracing::debug!(path = %self.path.display(), ops, "store batch committed");
        Ok(())
    }
}

fn persist(path: &Path, entries: &BTreeMap<Vec<u8>, Vec<u8>>) -> Result<(), StoreError> {
    let doc = StoreDoc {
        version: DOC_VERSION,
        entries: entries
            .iter()
            .map(|(k, v)| (hex::encode(k), hex::encode(v)))
            .collect(),
    };
    let json =
        serde_json::to_string_pretty(&doc).map_err(|e| StoreError::Encoding(e.to_string()))?;
    atomic_write(path, json.as_bytes())
}

/// Current on-disk contents. A missing file reads as empty.
fn load_entries(path: &Path) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, StoreError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| StoreError::Io(format!("cannot read state {}: {e}", path.display())))?;
    decode_doc(&content).map_err(|e| StoreError::Encoding(format!("{}: {e}", path.display())))
}

fn decode_doc(content: &str) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, String> {
    let doc: StoreDoc =
        serde_json::from_str(content).map_err(|e| format!("invalid state JSON: {e}"))?;
    if doc.version != DOC_VERSION {
        return Err(format!("unsupported state version {}", doc.version));
    }
    doc.entries
        .iter()
        .map(|(k, v)| {
            let key = hex::decode(k).map_err(|e| format!("bad key {k}: {e}"))?;
            let value = hex::decode(v).map_err(|e| format!("bad value for {k}: {e}"))?;
            Ok((key, value))
        })
        .collect()
}
