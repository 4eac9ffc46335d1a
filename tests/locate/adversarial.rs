use privscan::{extract_blob, locate_offset, ErrorKind, LocatorConfig, ScanError};

use crate::common::*;

#[test]
fn unsupported_machine_is_reported() {
    let image = PeBuilder::new()
        .machine(MACHINE_ARM)
        .section(".text", matching_code(RDATA_OFFSET + 5))
        .section(".rdata", vec![0; 0x100])
        .build();
    let err = locate_offset(&image).unwrap_err();
    assert!(matches!(
        err,
        ScanError::UnsupportedArchitecture { machine: MACHINE_ARM }
    ));
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[test]
fn pe32_plus_layout_is_unsupported() {
    let image = PeBuilder::new()
        .machine(MACHINE_AMD64)
        .magic(PE32PLUS_MAGIC)
        .section(".text", matching_code(RDATA_OFFSET + 5))
        .section(".rdata", vec![0; 0x100])
        .build();
    let err = locate_offset(&image).unwrap_err();
    assert!(matches!(
        err,
        ScanError::UnsupportedHeaderLayout {
            magic: PE32PLUS_MAGIC
        }
    ));
}

#[test]
fn missing_text_is_structural() {
    let image = PeBuilder::new()
        .section(".rdata", rdata_with_blob(0x100, 5, &BLOB))
        .build();
    let err = locate_offset(&image).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(err.to_string(), "Could not find section .text");
}

#[test]
fn missing_rdata_never_matches() {
    let image = PeBuilder::new()
        .section(".text", matching_code(RDATA_OFFSET + 5))
        .build();
    let err = locate_offset(&image).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn near_misses_are_rejected() {
    for code in [
        // size field one byte further away
        store_pair(-0x24, RDATA_OFFSET + 5, 5, 16),
        // size 17
        store_pair(-0x24, RDATA_OFFSET + 5, 4, 17),
        // pointer one byte before .rdata
        store_pair(-0x24, RDATA_OFFSET - 1, 4, 16),
        // pointer one byte past the inclusive end
        store_pair(-0x24, RDATA_OFFSET + FILE_ALIGN as u64 + 1, 4, 16),
    ] {
        let image = PeBuilder::new()
            .section(".text", code)
            .section(".rdata", vec![0; 0x100])
            .build();
        assert_eq!(locate_offset(&image).unwrap_err().kind(), ErrorKind::NotFound);
    }
}

#[test]
fn disp8_encoding_is_a_different_opcode() {
    // mov dword ptr [ebp-0x24], imm32 with an 8-bit displacement
    let ptr = ((RDATA_OFFSET + 5 + BASE) as u32).to_le_bytes();
    let mut code = vec![0xC7, 0x45, 0xDC];
    code.extend_from_slice(&ptr);
    code.extend_from_slice(&[0xC7, 0x45, 0xE0, 0x10, 0x00, 0x00, 0x00]);
    let image = PeBuilder::new()
        .section(".text", code)
        .section(".rdata", vec![0; 0x100])
        .build();
    assert!(locate_offset(&image).is_err());
}

#[test]
fn decode_errors_before_match_are_skipped() {
    // push es / pop es / daa do not exist in 64-bit mode
    let mut code = vec![0x06, 0x07, 0x27, 0x06];
    code.extend(store_pair(-0x24, RDATA_OFFSET + 7, 4, 16));
    code.push(0xC3);
    let image = PeBuilder::new()
        .machine(MACHINE_AMD64)
        .section(".text", code)
        .section(".rdata", rdata_with_blob(0x100, 7, &BLOB))
        .build();

    let ex = extract_blob(&image, &LocatorConfig::default()).unwrap();
    assert_eq!(ex.offset, RDATA_OFFSET + 7);
    assert_eq!(ex.scan.decode_failures, 4);
    assert_eq!(ex.data, BLOB);
}

#[test]
fn stray_byte_before_pointer_store_resyncs() {
    // F0 and C4 each make iced consume part of the pointer store as one invalid instruction
    for junk in [0xF0u8, 0xC4] {
        let mut code = PROLOGUE.to_vec();
        code.push(junk);
        code.extend(store_pair(-0x24, RDATA_OFFSET + 5, 4, 16));
        code.extend(EPILOGUE);
        let image = PeBuilder::new()
            .section(".text", code)
            .section(".rdata", rdata_with_blob(0x100, 5, &BLOB))
            .build();

        let ex = extract_blob(&image, &LocatorConfig::default()).unwrap();
        assert_eq!(ex.offset, RDATA_OFFSET + 5, "junk byte {:#04x}", junk);
        assert_eq!(ex.scan.decode_failures, 1);
        assert_eq!(
            ex.scan.pointer_store_offset,
            TEXT_OFFSET + PROLOGUE.len() as u64 + 1
        );
        assert_eq!(ex.data, BLOB);
    }
}

#[test]
fn all_undecodable_code_terminates() {
    let image = PeBuilder::new()
        .machine(MACHINE_AMD64)
        .section(".text", vec![0x06; 0x180])
        .section(".rdata", vec![0; 0x100])
        .build();
    match locate_offset(&image) {
        Err(ScanError::PatternNotFound {
            instructions,
            decode_failures,
        }) => {
            assert_eq!(instructions, 0);
            assert_eq!(decode_failures, 0x180);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn match_in_alignment_padding_is_ignored() {
    // Virtual size stops right before the pair
    let mut code = PROLOGUE.to_vec();
    let vsize = code.len() as u32;
    code.extend(store_pair(-0x24, RDATA_OFFSET + 5, 4, 16));
    let image = PeBuilder::new()
        .section_with_vsize(".text", code.clone(), vsize)
        .section(".rdata", vec![0; 0x100])
        .build();
    assert_eq!(locate_offset(&image).unwrap_err().kind(), ErrorKind::NotFound);

    let image = PeBuilder::new()
        .section_with_vsize(".text", code, 0x1000)
        .section(".rdata", vec![0; 0x100])
        .build();
    assert_eq!(locate_offset(&image).unwrap(), RDATA_OFFSET + 5);
}

#[test]
fn blob_running_past_eof_is_an_error() {
    // .rdata is the last section and the pointer targets its inclusive end
    let end = RDATA_OFFSET + FILE_ALIGN as u64;
    let image = PeBuilder::new()
        .section(".text", matching_code(end))
        .section(".rdata", vec![0; 0x100])
        .build();
    assert_eq!(image.len() as u64, end);
    assert_eq!(locate_offset(&image).unwrap(), end);

    let err = extract_blob(&image, &LocatorConfig::default()).unwrap_err();
    assert!(matches!(err, ScanError::BlobOutOfBounds { len: 16, .. }));
}

#[test]
fn truncated_images_never_panic() {
    let image = signature_image(5);
    for cut in (0..image.len()).step_by(7) {
        let _ = locate_offset(&image[..cut]);
        let _ = extract_blob(&image[..cut], &LocatorConfig::default());
    }
}

#[test]
fn section_past_eof_is_structural() {
    let mut image = signature_image(5);
    image.truncate(TEXT_OFFSET as usize + 0x10);
    let err = locate_offset(&image).unwrap_err();
    assert!(matches!(err, ScanError::SectionOutOfBounds { .. }));
}
