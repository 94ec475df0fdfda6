#![no_main]
use forceadmin_core::address::Address;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(addr) = Address::parse(s) {
            let again = Address::parse(addr.as_str()).expect("canonical form must parse");
            assert_eq!(again, addr);
        }
    }
});
