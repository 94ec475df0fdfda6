//! Contract registration. Stands in for the wasm module that owns contracts;
//! the override itself never creates or deletes these records.

use forceadmin_core::address::Address;
use forceadmin_core::errors::StoreError;
use forceadmin_core::keys::{admin_key, contract_key};
use forceadmin_core::traits::{KvStore, WriteBatch};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEntry {
    pub contract: Address,
    pub admin: Address,
}

/// Register a contract with its initial admin in one batch.
pub fn register_contract<S: KvStore + ?Sized>(
    store: &mut S,
    contract: &Address,
    admin: &Address,
) -> Result<(), StoreError> {
    let mut batch = WriteBatch::new();
    batch.set(&contract_key(contract), contract.as_str().as_bytes());
    batch.set(&admin_key(contract), admin.as_bytes());
    store.write_batch(batch)
}

/// Register many contracts at once.
pub fn init_contracts<S: KvStore + ?Sized>(
    store: &mut S,
    entries: &[ContractEntry],
) -> Result<(), StoreError> {
    let mut batch = WriteBatch::new();
    for entry in entries {
        batch.set(&contract_key(&entry.contract), entry.contract.as_str().as_bytes());
        batch.set(&admin_key(&entry.contract), entry.admin.as_bytes());
    }
    store.write_batch(batch)
}
