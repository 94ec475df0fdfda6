use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::errors::MsgError;

pub const ROUTE: &str = "gov";
pub const MSG_TYPE: &str = "force_change_admin";

/// Request to forcibly reassign a contract's admin.
///
/// Transient: it exists for one call and is never persisted as-is. Fields
/// stay raw strings so the guard decides how malformed input is classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceChangeAdminMsg {
    pub authority: String,
    pub contract_addr: String,
    pub new_admin: String,
}

impl ForceChangeAdminMsg {
    pub fn new(
        authority: impl Into<String>,
        contract_addr: impl Into<String>,
        new_admin: impl Into<String>,
    ) -> Self {
        Self {
            authority: authority.into(),
            contract_addr: contract_addr.into(),
            new_admin: new_admin.into(),
        }
    }

    pub fn route(&self) -> &'static str {
        ROUTE
    }

    pub fn msg_type(&self) -> &'static str {
        MSG_TYPE
    }

    /// Stateless format check of all three addresses.
    ///
    /// A client-side pre-check only; the guard never calls it, so its own
    /// check order stays authoritative.
    pub fn validate_basic(&self, prefix: &str) -> Result<(), MsgError> {
        for (field, value) in [
            ("authority", &self.authority),
            ("contract", &self.contract_addr),
            ("new admin", &self.new_admin),
        ] {
            Address::parse_with_prefix(value, prefix)
                .map_err(|source| MsgError::InvalidAddress { field, source })?;
        }
        Ok(())
    }

    /// Accounts whose signature the request requires.
    pub fn signers(&self, prefix: &str) -> Result<Vec<Address>, MsgError> {
        let authority = Address::parse_with_prefix(&self.authority, prefix).map_err(|source| {
            MsgError::InvalidAddress {
                field: "authority",
                source,
            }
        })?;
        Ok(vec![authority])
    }
}
