#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(pe) = privscan::formats::pe::PeParser::new(data) {
        for section in pe.sections() {
            let _ = section.data(data);
            let _ = pe.offset_to_rva(section.data.start);
        }
    }
});
