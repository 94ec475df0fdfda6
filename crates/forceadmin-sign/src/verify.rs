use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::canonical::{canonical_request, request_digest};
use crate::{SignError, SignedRequest, ALGORITHM, CANONICALIZATION};

/// Check a signed request against a public key.
///
/// `Ok(false)` means well-formed but not signed by this key; structural
/// problems are errors.
pub fn verify_request(req: &SignedRequest, key: &VerifyingKey) -> Result<bool, SignError> {
    let block = req.signature.as_ref().ok_or(SignError::MissingSignature)?;

    if block.algorithm != ALGORITHM {
        return Err(SignError::UnsupportedAlgorithm(block.algorithm.clone()));
    }
    if block.canonicalization != CANONICALIZATION {
        return Err(SignError::UnsupportedCanonicalization(
            block.canonicalization.clone(),
        ));
    }
    if block.digest != request_digest(&req.msg) {
        return Err(SignError::DigestMismatch);
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&block.value)
        .map_err(|e| SignError::Malformed(format!("invalid base64: {e}")))?;
    let signature =
        Signature::from_slice(&bytes).map_err(|e| SignError::Malformed(e.to_string()))?;

    Ok(key.verify(&canonical_request(&req.msg), &signature).is_ok())
}
