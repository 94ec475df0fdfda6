//! Collaborator seams. Each is supplied by the surrounding execution context.

use crate::address::Address;
use crate::errors::StoreError;
use crate::events::AuditEvent;

/// Supplies the single designated governance authority.
pub trait AuthorityProvider {
    fn governance_authority(&self) -> &Address;
}

/// Answers whether a contract is registered.
pub trait ContractRegistry {
    fn contract_exists(&self, contract: &Address) -> bool;
}

/// Supplies the current block height, used only as audit metadata.
pub trait HeightSource {
    fn current_height(&self) -> i64;
}

/// Accepts audit events. Fire-and-forget: no acknowledgment is returned.
pub trait EventSink {
    fn emit(&mut self, event: &AuditEvent);
}

/// Staged writes applied as one unit by [`KvStore::write_batch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<(Vec<u8>, Vec<u8>)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &[u8], value: &[u8]) {
        self.ops.push((key.to_vec(), value.to_vec()));
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.ops.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}

impl IntoIterator for WriteBatch {
    type Item = (Vec<u8>, Vec<u8>);
    type IntoIter = std::vec::IntoIter<(Vec<u8>, Vec<u8>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

/// Transactional key-value store.
///
/// Reads never fail; writes may fail for infrastructure reasons.
/// `write_batch` must apply every staged write or none of them.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.set(key, value);
        self.write_batch(batch)
    }

    fn write_batch(&mut self, batch: WriteBatch) -> Result<(), StoreError>;
}
