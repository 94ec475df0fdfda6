#![no_main]
use ed25519_dalek::SigningKey;
use forceadmin_sign::SignedRequest;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(req) = serde_json::from_slice::<SignedRequest>(data) {
        let key = SigningKey::from_bytes(&[7u8; 32]).verifying_key();
        let _ = forceadmin_sign::verify::verify_request(&req, &key);
    }
});
