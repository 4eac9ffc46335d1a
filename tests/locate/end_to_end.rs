use privscan::verify::crc32;
use privscan::{
    extract_blob, locate_offset, locate_offset_with, locate_sections, ChecksumStatus, DataRange,
    LocatorConfig,
};

use crate::common::*;

#[test]
fn resolves_offset_five_into_rdata() {
    let image = signature_image(5);
    assert_eq!(locate_offset(&image).unwrap(), RDATA_OFFSET + 5);
}

#[test]
fn locator_reports_default_layout() {
    let image = signature_image(5);
    let s = locate_sections(&image, &LocatorConfig::default()).unwrap();
    assert_eq!(s.code.file_offset, TEXT_OFFSET);
    assert_eq!(s.code.base, BASE);
    assert_eq!(s.code.bytes.len(), matching_code(0).len());
    assert_eq!(
        s.data,
        DataRange::new(RDATA_OFFSET, RDATA_OFFSET + FILE_ALIGN as u64)
    );
}

#[test]
fn extract_blob_slices_and_checks() {
    let image = signature_image(0x20);
    let cfg = LocatorConfig::default();
    let ex = extract_blob(&image, &cfg).unwrap();
    assert_eq!(ex.offset, RDATA_OFFSET + 0x20);
    assert_eq!(ex.data, BLOB);
    assert_eq!(ex.hex(), "30313233343536373839616263646566");
    assert_eq!(ex.crc32, crc32(&BLOB));
    // The synthetic blob is not the real one
    assert!(matches!(ex.checksum, ChecksumStatus::Invalid { .. }));
    assert!(ex.require_valid(cfg.signature.expected_crc32).is_err());

    let mut cfg = LocatorConfig::default();
    cfg.signature.expected_crc32 = Some(crc32(&BLOB));
    let ex = extract_blob(&image, &cfg).unwrap();
    assert_eq!(ex.checksum, ChecksumStatus::Valid);
    assert!(ex.require_valid(cfg.signature.expected_crc32).is_ok());

    cfg.signature.expected_crc32 = None;
    assert_eq!(
        extract_blob(&image, &cfg).unwrap().checksum,
        ChecksumStatus::Unchecked
    );
}

#[test]
fn scan_report_describes_match() {
    let image = signature_image(5);
    let ex = extract_blob(&image, &LocatorConfig::default()).unwrap();
    let r = &ex.scan;
    let pointer_at = (PROLOGUE.len() + 10) as u64;
    assert_eq!(r.pointer_store_offset, TEXT_OFFSET + pointer_at);
    assert_eq!(r.code_offset, TEXT_OFFSET);
    assert_eq!(r.base, BASE);
    assert_eq!(r.decode_failures, 0);
    // push, mov, sub, store, store, store
    assert_eq!(r.instructions, 6);
    // .rdata is the second section, mapped at RVA 0x2000
    assert_eq!(r.rva, Some(0x2005));
    assert!(r.pointer_store.contains("mov [ebp-0x24]"));
    assert!(r.size_store.ends_with("mov [ebp-0x20], 0x10"));

    let json = serde_json::to_value(&ex).unwrap();
    assert_eq!(json["offset"], RDATA_OFFSET + 5);
    assert_eq!(json["scan"]["data_range"]["start"], RDATA_OFFSET);
}

#[test]
fn amd64_code_is_decoded_64_bit() {
    let image = PeBuilder::new()
        .machine(MACHINE_AMD64)
        .section(".text", matching_code(RDATA_OFFSET + 9))
        .section(".rdata", rdata_with_blob(0x100, 9, &BLOB))
        .build();
    assert_eq!(locate_offset(&image).unwrap(), RDATA_OFFSET + 9);
}

#[test]
fn rdata_before_text_still_resolves() {
    // .rdata first at 0x400, .text second at 0x600
    let target = TEXT_OFFSET + 3;
    let text_offset = RDATA_OFFSET;
    let base = IMAGE_BASE as u64 + BASE_OF_DATA as u64 - FILE_ALIGN as u64 - text_offset;
    let mut code = PROLOGUE.to_vec();
    code.extend(store(-0x24, (target + base) as u32));
    code.extend(store(-0x20, 16));
    code.extend(EPILOGUE);

    let image = PeBuilder::new()
        .section(".rdata", rdata_with_blob(0x100, 3, &BLOB))
        .section(".text", code)
        .build();
    assert_eq!(locate_offset(&image).unwrap(), target);
}

#[test]
fn custom_section_names() {
    let image = PeBuilder::new()
        .section("CODE", matching_code(RDATA_OFFSET + 5))
        .section("DATA", rdata_with_blob(0x100, 5, &BLOB))
        .build();
    assert!(locate_offset(&image).is_err());

    let cfg = LocatorConfig {
        code_section: "CODE".into(),
        data_section: "DATA".into(),
        ..LocatorConfig::default()
    };
    assert_eq!(locate_offset_with(&image, &cfg).unwrap(), RDATA_OFFSET + 5);
}

#[test]
fn determinism() {
    let image = signature_image(0x40);
    let first = locate_offset(&image).unwrap();
    for _ in 0..5 {
        assert_eq!(locate_offset(&image).unwrap(), first);
    }

    let broken = PeBuilder::new().section(".text", vec![0x90; 32]).build();
    let kinds: Vec<_> = (0..3)
        .map(|_| locate_offset(&broken).unwrap_err().kind())
        .collect();
    assert!(kinds.windows(2).all(|w| w[0] == w[1]));
}
