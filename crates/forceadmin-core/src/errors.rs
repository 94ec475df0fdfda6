use std::fmt;

use serde::Serialize;

/// Reason the guard refused an override request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Denial {
    /// The one-time override has already been consumed.
    AlreadyUsed,
    /// The caller is not the governance authority.
    Unauthorized,
    /// The new admin is empty or not a valid account address.
    InvalidNewAdmin,
    /// The target contract is malformed or not registered.
    UnknownResource,
}

impl Denial {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            Denial::AlreadyUsed => "already_used",
            Denial::Unauthorized => "unauthorized",
            Denial::InvalidNewAdmin => "invalid_new_admin",
            Denial::UnknownResource => "unknown_resource",
        }
    }

    /// Whether a corrected resubmission could still succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, Denial::InvalidNewAdmin | Denial::UnknownResource)
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denial::AlreadyUsed => write!(f, "force change admin can only be used once"),
            Denial::Unauthorized => write!(f, "only governance can perform this action"),
            Denial::InvalidNewAdmin => write!(f, "new admin address is empty or invalid"),
            Denial::UnknownResource => write!(f, "contract does not exist"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,
    #[error("address prefix is empty")]
    MissingPrefix,
    #[error("address too long: {0} bytes")]
    TooLong(usize),
    #[error("invalid bech32: {0}")]
    Bech32(String),
    #[error("wrong address prefix: expected {expected}, got {found}")]
    WrongPrefix { expected: String, found: String },
}

/// Stateless message validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MsgError {
    #[error("invalid {field} address: {source}")]
    InvalidAddress {
        field: &'static str,
        #[source]
        source: AddressError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store i/o failure: {0}")]
    Io(String),
    #[error("store encoding failure: {0}")]
    Encoding(String),
    #[error("store is locked: {0}")]
    Locked(String),
    #[error("store changed on disk since it was opened: {0}")]
    Stale(String),
}

/// Outcome of a rejected or failed override.
#[derive(Debug, thiserror::Error)]
pub enum ForceAdminError {
    #[error("denied: {0}")]
    Denied(Denial),
    #[error("execution failed: {0}")]
    ExecutionFailed(#[source] StoreError),
}

impl ForceAdminError {
    pub fn denial(&self) -> Option<Denial> {
        match self {
            ForceAdminError::Denied(d) => Some(*d),
            ForceAdminError::ExecutionFailed(_) => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("governance_authority is not a valid address: {0}")]
    InvalidAuthority(#[source] AddressError),
    #[error("bech32_prefix must be non-empty lowercase ascii, got {0:?}")]
    InvalidPrefix(String),
    #[error("governance_pubkey must be 32 hex-encoded bytes: {0}")]
    InvalidPubkey(String),
}
