use serde::{Deserialize, Serialize};

use crate::address::Address;

pub const EVENT_FORCE_ADMIN_CHANGE: &str = "force_admin_change";

/// Append-only record of a successful override. Write-once; never read back
/// by the keeper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: String,
    pub contract: Address,
    pub new_admin: Address,
    pub executed_at_height: i64,
}

impl AuditEvent {
    pub fn force_admin_change(contract: Address, new_admin: Address, height: i64) -> Self {
        Self {
            event_type: EVENT_FORCE_ADMIN_CHANGE.to_string(),
            contract,
            new_admin,
            executed_at_height: height,
        }
    }
}
