#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = privscan::extract_blob(data, &privscan::LocatorConfig::default());
});
