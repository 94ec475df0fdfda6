use forceadmin_core::address::Address;
use forceadmin_core::config::Params;
use forceadmin_core::errors::ForceAdminError;
use forceadmin_core::events::AuditEvent;
use forceadmin_core::keys::{admin_key, FORCE_CHANGE_ADMIN_USED_KEY};
use forceadmin_core::msg::ForceChangeAdminMsg;
use forceadmin_core::state::OverrideState;
use forceadmin_core::traits::{EventSink, HeightSource, KvStore};

use crate::executor::Executor;
use crate::guard::{Guard, GuardDecision};
use crate::registry::StoreRegistry;

/// Owns the store and module params; runs guard then executor.
///
/// Mutating calls take `&mut self`, so one keeper handles one request at a
/// time and the replay read shares the commit's exclusive borrow.
pub struct Keeper<S: KvStore> {
    store: S,
    params: Params,
}

impl<S: KvStore> Keeper<S> {
    pub fn new(store: S, params: Params) -> Self {
        Self { store, params }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct store access for collaborators (contract registration).
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Run the guard without executing. Registry lookups go to the store.
    pub fn authorize(&self, msg: &ForceChangeAdminMsg) -> GuardDecision {
        let registry = StoreRegistry::new(&self.store);
        let guard = Guard::new(&self.params, self.params.bech32_prefix());
        guard.authorize(&self.store, &registry, msg)
    }

    /// Handle a force-change-admin request end to end.
    pub fn handle_force_change_admin(
        &mut self,
        heights: &dyn HeightSource,
        sink: &mut dyn EventSink,
        msg: &ForceChangeAdminMsg,
    ) -> Result<AuditEvent, ForceAdminError> {
        match self.authorize(msg) {
            GuardDecision::Approved(approval) => {
                Executor::new(heights).execute(&mut self.store, sink, approval)
            }
            GuardDecision::Denied(denial) => {
                tracing::warn!(
                    reason = denial.code(),
                    authority = %msg.authority,
                    contract = %msg.contract_addr,
                    "force admin change denied"
                );
                Err(ForceAdminError::Denied(denial))
            }
        }
    }

    /// Current admin of a contract, if one is recorded.
    pub fn admin_of(&self, contract: &Address) -> Option<Address> {
        let raw = self.store.get(&admin_key(contract))?;
        Address::from_bytes(self.params.bech32_prefix(), &raw).ok()
    }

    pub fn override_state(&self) -> OverrideState {
        OverrideState::from_flag(self.store.get(FORCE_CHANGE_ADMIN_USED_KEY).as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::sink::MemorySink;
    use crate::executor::FixedHeight;
    use crate::genesis::register_contract;
    use crate::store::file::FileStore;
    use crate::store::memory::MemoryStore;
    use forceadmin_core::config::ModuleConfig;
    use forceadmin_core::errors::{Denial, StoreError};

    fn addr(seed: u8) -> Address {
        Address::from_bytes("terra", &[seed; 20]).unwrap()
    }

    fn contract(seed: u8) -> Address {
        Address::from_bytes("terra", &[seed; 32]).unwrap()
    }

    // A1 = authority, R1 = registered contract with admin M0.
    fn a1() -> Address {
        addr(0xA1)
    }
    fn r1() -> Address {
        contract(0x01)
    }
    fn m0() -> Address {
        addr(0x30)
    }
    fn m1() -> Address {
        addr(0x31)
    }

    fn params() -> Params {
        ModuleConfig::new(a1().to_string(), "terra").validate().unwrap()
    }

    fn keeper() -> Keeper<MemoryStore> {
        let mut store = MemoryStore::new();
        register_contract(&mut store, &r1(), &m0()).unwrap();
        Keeper::new(store, params())
    }

    fn msg(authority: &str, contract: &str, new_admin: &str) -> ForceChangeAdminMsg {
        ForceChangeAdminMsg::new(authority, contract, new_admin)
    }

    #[test]
    fn scenario_a_first_override_succeeds() {
        let mut k = keeper();
        let mut sink = MemorySink::default();
        assert_eq!(k.override_state(), OverrideState::Unused);
        assert_eq!(k.admin_of(&r1()), Some(m0()));

        let event = k
            .handle_force_change_admin(
                &FixedHeight(100),
                &mut sink,
                &msg(a1().as_str(), r1().as_str(), m1().as_str()),
            )
            .unwrap();

        assert_eq!(k.admin_of(&r1()), Some(m1()));
        assert_eq!(k.override_state(), OverrideState::Used { height: Some(100) });
        assert_eq!(sink.events(), &[event]);
    }

    #[test]
    fn scenario_b_identical_replay_is_denied() {
        let mut k = keeper();
        let mut sink = MemorySink::default();
        let m = msg(a1().as_str(), r1().as_str(), m1().as_str());
        k.handle_force_change_admin(&FixedHeight(100), &mut sink, &m)
            .unwrap();
        let before = k.store().snapshot();

        let err = k
            .handle_force_change_admin(&FixedHeight(101), &mut sink, &m)
            .unwrap_err();
        assert_eq!(err.denial(), Some(Denial::AlreadyUsed));
        assert!(err
            .to_string()
            .contains("force change admin can only be used once"));
        assert_eq!(k.admin_of(&r1()), Some(m1()));
        assert_eq!(k.store().snapshot(), before);
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn scenario_c_non_authority_is_unauthorized() {
        let mut k = keeper();
        let mut sink = MemorySink::default();
        let before = k.store().snapshot();
        let err = k
            .handle_force_change_admin(
                &FixedHeight(1),
                &mut sink,
                &msg(addr(0xA2).as_str(), r1().as_str(), addr(0x32).as_str()),
            )
            .unwrap_err();
        assert_eq!(err.denial(), Some(Denial::Unauthorized));
        assert_eq!(k.store().snapshot(), before);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn scenario_d_empty_new_admin_is_invalid() {
        let mut k = keeper();
        let mut sink = MemorySink::default();
        let before = k.store().snapshot();
        let err = k
            .handle_force_change_admin(
                &FixedHeight(1),
                &mut sink,
                &msg(a1().as_str(), r1().as_str(), ""),
            )
            .unwrap_err();
        assert_eq!(err.denial(), Some(Denial::InvalidNewAdmin));
        assert_eq!(k.store().snapshot(), before);
        assert_eq!(k.override_state(), OverrideState::Unused);
    }

    #[test]
    fn scenario_e_unknown_contract() {
        let mut k = keeper();
        let mut sink = MemorySink::default();
        let before = k.store().snapshot();
        let err = k
            .handle_force_change_admin(
                &FixedHeight(1),
                &mut sink,
                &msg(a1().as_str(), contract(0x99).as_str(), m1().as_str()),
            )
            .unwrap_err();
        assert_eq!(err.denial(), Some(Denial::UnknownResource));
        assert_eq!(k.store().snapshot(), before);
    }

    #[test]
    fn failed_attempt_does_not_consume_the_override() {
        let mut k = keeper();
        let mut sink = MemorySink::default();
        let _ = k.handle_force_change_admin(
            &FixedHeight(1),
            &mut sink,
            &msg(a1().as_str(), r1().as_str(), ""),
        );
        k.handle_force_change_admin(
            &FixedHeight(2),
            &mut sink,
            &msg(a1().as_str(), r1().as_str(), m1().as_str()),
        )
        .unwrap();
        assert_eq!(k.override_state(), OverrideState::Used { height: Some(2) });
    }

    #[test]
    fn flag_is_global_not_per_contract() {
        let mut k = keeper();
        let r2 = contract(0x02);
        register_contract(k.store_mut(), &r2, &m0()).unwrap();
        let mut sink = MemorySink::default();

        k.handle_force_change_admin(
            &FixedHeight(1),
            &mut sink,
            &msg(a1().as_str(), r1().as_str(), m1().as_str()),
        )
        .unwrap();
        let err = k
            .handle_force_change_admin(
                &FixedHeight(2),
                &mut sink,
                &msg(a1().as_str(), r2.as_str(), m1().as_str()),
            )
            .unwrap_err();
        assert_eq!(err.denial(), Some(Denial::AlreadyUsed));
        assert_eq!(k.admin_of(&r2), Some(m0()));
    }

    #[test]
    fn used_flag_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gov.state.json");
        let m = msg(a1().as_str(), r1().as_str(), m1().as_str());
        {
            let mut store = FileStore::open(&path).unwrap();
            register_contract(&mut store, &r1(), &m0()).unwrap();
            let mut k = Keeper::new(store, params());
            k.handle_force_change_admin(&FixedHeight(10), &mut MemorySink::default(), &m)
                .unwrap();
        }
        let mut k = Keeper::new(FileStore::open(&path).unwrap(), params());
        assert_eq!(k.override_state(), OverrideState::Used { height: Some(10) });
        assert_eq!(k.admin_of(&r1()), Some(m1()));
        let err = k
            .handle_force_change_admin(&FixedHeight(11), &mut MemorySink::default(), &m)
            .unwrap_err();
        assert_eq!(err.denial(), Some(Denial::AlreadyUsed));
    }

    #[test]
    fn long_lived_file_handle_stays_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gov.state.json");
        let mut store = FileStore::open(&path).unwrap();
        register_contract(&mut store, &r1(), &m0()).unwrap();
        let mut k1 = Keeper::new(store, params());

        // Backdate k1's lock by an hour: a second handle is still refused.
        let old = chrono::Utc::now().timestamp() - 3600;
        let lock = dir.path().join("gov.state.json.lock");
        std::fs::write(&lock, format!("{}\n{old}\n", std::process::id())).unwrap();
        assert!(matches!(FileStore::open(&path), Err(StoreError::Locked(_))));

        // A flag that reaches the file some other way is never overwritten.
        let raw = std::fs::read_to_string(&path).unwrap();
        let mut doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        doc["entries"][hex::encode(FORCE_CHANGE_ADMIN_USED_KEY)] =
            serde_json::Value::String(hex::encode(b"used_at_height_1"));
        std::fs::write(&path, doc.to_string()).unwrap();

        let mut sink = MemorySink::default();
        let m = msg(a1().as_str(), r1().as_str(), m1().as_str());
        let err = k1
            .handle_force_change_admin(&FixedHeight(2), &mut sink, &m)
            .unwrap_err();
        assert!(matches!(
            err,
            ForceAdminError::ExecutionFailed(StoreError::Stale(_))
        ));
        assert!(sink.events().is_empty());

        drop(k1);
        let k2 = Keeper::new(FileStore::open(&path).unwrap(), params());
        assert_eq!(k2.override_state(), OverrideState::Used { height: Some(1) });
        assert_eq!(k2.admin_of(&r1()), Some(m0()));
    }

    #[test]
    fn admin_of_unregistered_is_none() {
        assert_eq!(keeper().admin_of(&contract(0x42)), None);
    }
}
