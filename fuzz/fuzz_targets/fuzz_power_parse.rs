#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Errors are fine, panics are bugs.
        if let Ok(kva) = kilowatt::core::parse_power_kva(s) {
            assert!(kva > rust_decimal::Decimal::ZERO);
        }
    }
});
