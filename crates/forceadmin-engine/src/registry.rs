use std::collections::BTreeSet;

use forceadmin_core::address::Address;
use forceadmin_core::keys::contract_key;
use forceadmin_core::traits::{ContractRegistry, KvStore};

/// Registry view over contract markers in a store.
pub struct StoreRegistry<'s, S: KvStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: KvStore + ?Sized> StoreRegistry<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }
}

impl<S: KvStore + ?Sized> ContractRegistry for StoreRegistry<'_, S> {
    fn contract_exists(&self, contract: &Address) -> bool {
        self.store.has(&contract_key(contract))
    }
}

/// Fixed set of known contracts.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    contracts: BTreeSet<Address>,
}

impl StaticRegistry {
    pub fn new(contracts: impl IntoIterator<Item = Address>) -> Self {
        Self {
            contracts: contracts.into_iter().collect(),
        }
    }
}

impl ContractRegistry for StaticRegistry {
    fn contract_exists(&self, contract: &Address) -> bool {
        self.contracts.contains(contract)
    }
}
