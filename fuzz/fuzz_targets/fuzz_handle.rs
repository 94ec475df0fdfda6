#![no_main]
use forceadmin_core::address::Address;
use forceadmin_core::config::ModuleConfig;
use forceadmin_core::msg::ForceChangeAdminMsg;
use forceadmin_engine::audit::sink::MemorySink;
use forceadmin_engine::executor::FixedHeight;
use forceadmin_engine::genesis::register_contract;
use forceadmin_engine::keeper::Keeper;
use forceadmin_engine::store::memory::MemoryStore;
use libfuzzer_sys::fuzz_target;

// Input: a JSON array of requests, handled in order against one keeper.
fuzz_target!(|data: &[u8]| {
    let Ok(msgs) = serde_json::from_slice::<Vec<ForceChangeAdminMsg>>(data) else {
        return;
    };
    let gov = Address::from_bytes("terra", &[0xA1; 20]).unwrap();
    let contract = Address::from_bytes("terra", &[0xC1; 20]).unwrap();
    let admin = Address::from_bytes("terra", &[0xB1; 20]).unwrap();
    let params = ModuleConfig::new(gov.to_string(), "terra").validate().unwrap();

    let mut store = MemoryStore::new();
    register_contract(&mut store, &contract, &admin).unwrap();
    let mut keeper = Keeper::new(store, params);
    let mut sink = MemorySink::default();

    let mut successes = 0;
    for (i, msg) in msgs.iter().enumerate() {
        if keeper
            .handle_force_change_admin(&FixedHeight(i as i64), &mut sink, msg)
            .is_ok()
        {
            successes += 1;
        }
    }
    assert!(successes <= 1);
    assert_eq!(sink.events().len(), successes);
    assert_eq!(keeper.override_state().is_used(), successes == 1);
});
