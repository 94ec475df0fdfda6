use std::collections::BTreeMap;

use forceadmin_core::errors::StoreError;
use forceadmin_core::traits::{KvStore, WriteBatch};

/// In-memory store. Batches apply in full; writes cannot fail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every entry, for byte-for-byte comparisons.
    pub fn snapshot(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn write_batch(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        for (k, v) in batch {
            self.entries.insert(k, v);
        }
        Ok(())
    }
}
