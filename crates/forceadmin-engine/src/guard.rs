use forceadmin_core::address::Address;
use forceadmin_core::errors::Denial;
use forceadmin_core::keys::FORCE_CHANGE_ADMIN_USED_KEY;
use forceadmin_core::msg::ForceChangeAdminMsg;
use forceadmin_core::traits::{AuthorityProvider, ContractRegistry, KvStore};

/// Proof that a request passed every guard check.
///
/// Only [`Guard::authorize`] can build one, and the executor accepts nothing
/// else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    authority: Address,
    contract: Address,
    new_admin: Address,
}

impl Approval {
    pub fn authority(&self) -> &Address {
        &self.authority
    }

    pub fn contract(&self) -> &Address {
        &self.contract
    }

    pub fn new_admin(&self) -> &Address {
        &self.new_admin
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Approved(Approval),
    Denied(Denial),
}

/// Eligibility checks for a force-change-admin request.
///
/// Evaluation order (first failure wins, nothing is written):
/// 1. Replay: the global usage flag must be absent
/// 2. Authority: caller must be the governance authority
/// 3. New admin: non-empty, well-formed, configured prefix
/// 4. Contract: well-formed and registered
pub struct Guard<'a> {
    authority: &'a dyn AuthorityProvider,
    prefix: &'a str,
}

impl<'a> Guard<'a> {
    pub fn new(authority: &'a dyn AuthorityProvider, prefix: &'a str) -> Self {
        Self { authority, prefix }
    }

    pub fn authorize<S: KvStore + ?Sized>(
        &self,
        store: &S,
        registry: &dyn ContractRegistry,
        msg: &ForceChangeAdminMsg,
    ) -> GuardDecision {
        // 1. Replay. Read fresh every call; the store is the only truth.
        if store.has(FORCE_CHANGE_ADMIN_USED_KEY) {
            return GuardDecision::Denied(Denial::AlreadyUsed);
        }

        // 2. Authority
        let governance = self.authority.governance_authority();
        if !is_governance_authority(governance, &msg.authority) {
            return GuardDecision::Denied(Denial::Unauthorized);
        }

        // 3. New admin
        let Ok(new_admin) = Address::parse_with_prefix(&msg.new_admin, self.prefix) else {
            return GuardDecision::Denied(Denial::InvalidNewAdmin);
        };

        // 4. Contract
        let contract = match Address::parse_with_prefix(&msg.contract_addr, self.prefix) {
            Ok(c) if registry.contract_exists(&c) => c,
            _ => return GuardDecision::Denied(Denial::UnknownResource),
        };

        GuardDecision::Approved(Approval {
            authority: governance.clone(),
            contract,
            new_admin,
        })
    }
}

/// True if `claimed` names the governance authority. Malformed input never
/// matches.
pub fn is_governance_authority(governance: &Address, claimed: &str) -> bool {
    Address::parse(claimed).is_ok_and(|a| &a == governance)
}
