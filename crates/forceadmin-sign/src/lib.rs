#![forbid(unsafe_code)]

pub mod canonical;
pub mod sign;
pub mod verify;

use forceadmin_core::msg::ForceChangeAdminMsg;
use serde::{Deserialize, Serialize};

pub const ALGORITHM: &str = "ed25519";
pub const CANONICALIZATION: &str = "JCS-RFC8785";

/// Detached signature over a request's canonical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBlock {
    pub algorithm: String,
    pub key_id: String,
    pub canonicalization: String,
    pub digest: String,
    pub value: String,
    pub created_at: String,
}

/// Request envelope as exchanged on disk: the message fields plus an
/// optional signature block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRequest {
    #[serde(flatten)]
    pub msg: ForceChangeAdminMsg,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureBlock>,
}

impl SignedRequest {
    pub fn unsigned(msg: ForceChangeAdminMsg) -> Self {
        Self {
            msg,
            signature: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("request carries no signature block")]
    MissingSignature,
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("unsupported canonicalization: {0}")]
    UnsupportedCanonicalization(String),
    #[error("digest does not match request contents")]
    DigestMismatch,
    #[error("malformed signature: {0}")]
    Malformed(String),
}
