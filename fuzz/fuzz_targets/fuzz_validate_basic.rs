#![no_main]
use forceadmin_core::msg::ForceChangeAdminMsg;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(msg) = serde_json::from_slice::<ForceChangeAdminMsg>(data) {
        let _ = msg.validate_basic("terra");
        let _ = msg.signers("terra");
    }
});
