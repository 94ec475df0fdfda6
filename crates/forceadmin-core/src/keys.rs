//! Store key layout.

use crate::address::Address;

/// Sentinel marking the override as consumed. Global, never per contract.
pub const FORCE_CHANGE_ADMIN_USED_KEY: &[u8] = b"force_change_admin_used";

/// Prefix for administrator records, followed by the raw contract bytes.
pub const ADMIN_PREFIX: &[u8] = b"wasm/admin/";

/// Prefix for contract registration markers, followed by the raw contract bytes.
pub const CONTRACT_PREFIX: &[u8] = b"wasm/contract/";

pub fn admin_key(contract: &Address) -> Vec<u8> {
    prefixed(ADMIN_PREFIX, contract)
}

pub fn contract_key(contract: &Address) -> Vec<u8> {
    prefixed(CONTRACT_PREFIX, contract)
}

fn prefixed(prefix: &[u8], contract: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + contract.as_bytes().len());
    key.extend_from_slice(prefix);
    key.extend_from_slice(contract.as_bytes());
    key
}
