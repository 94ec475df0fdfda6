use base64::Engine;
use ed25519_dalek::{Signer, SigningKey};
use forceadmin_core::msg::ForceChangeAdminMsg;

use crate::canonical::{canonical_request, request_digest};
use crate::{SignatureBlock, SignedRequest, ALGORITHM, CANONICALIZATION};

/// Sign a request's canonical bytes.
pub fn sign_request(msg: &ForceChangeAdminMsg, key: &SigningKey, key_id: &str) -> SignedRequest {
    let signature = key.sign(&canonical_request(msg));
    SignedRequest {
        msg: msg.clone(),
        signature: Some(SignatureBlock {
            algorithm: ALGORITHM.to_string(),
            key_id: key_id.to_string(),
            canonicalization: CANONICALIZATION.to_string(),
            digest: request_digest(msg),
            value: base64::engine::general_purpose::STANDARD.encode(signature.to_bytes()),
            created_at: chrono::Utc::now().to_rfc3339(),
        }),
    }
}
