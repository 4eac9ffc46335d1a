use privscan::io::error::IoError;
use privscan::io::{IOLimits, ImageFile};
use privscan::{extract_blob, locate_offset, LocatorConfig, ScanError};

use crate::common::test_utils::create_temp_file;
use crate::common::*;

#[test]
fn scan_memory_mapped_image() {
    let file = create_temp_file(&signature_image(0x18));
    let image = ImageFile::open(file.path(), IOLimits::default()).unwrap();
    assert_eq!(locate_offset(image.bytes()).unwrap(), RDATA_OFFSET + 0x18);
}

#[test]
fn extract_blob_from_mapped_file() {
    let file = create_temp_file(&signature_image(0x18));
    let image = ImageFile::open(file.path(), IOLimits::default()).unwrap();
    let ex = extract_blob(image.bytes(), &LocatorConfig::default()).unwrap();
    assert_eq!(ex.offset, RDATA_OFFSET + 0x18);
    assert_eq!(ex.data, BLOB);
}

#[test]
fn oversized_image_is_refused() {
    let file = create_temp_file(&signature_image(5));
    let mut cfg = LocatorConfig::default();
    cfg.io.max_file_size = 0x100;
    let err = ImageFile::open(file.path(), cfg.io_limits()).unwrap_err();
    assert!(matches!(err, IoError::FileTooLarge { limit: 0x100, .. }));
    assert!(matches!(ScanError::from(err), ScanError::Io(_)));
}

#[test]
fn empty_file_is_a_format_error() {
    let file = create_temp_file(b"");
    let image = ImageFile::open(file.path(), IOLimits::default()).unwrap();
    let err = extract_blob(image.bytes(), &LocatorConfig::default()).unwrap_err();
    assert!(matches!(err, ScanError::Format(_)));
}
