//! Integrity checks on either side of the scan: size and SHA-256 of a
//! supplied image, CRC32 of the extracted blob.

use flate2::Crc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Result, ScanError};

/// CRC32 (IEEE 802.3) of `data`.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(data);
    crc.sum()
}

/// Outcome of comparing a blob's CRC32 against a known value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChecksumStatus {
    Valid,
    Invalid { actual: u32 },
    /// No expected value was configured
    Unchecked,
}

pub fn check_blob(blob: &[u8], expected: Option<u32>) -> ChecksumStatus {
    let Some(expected) = expected else {
        return ChecksumStatus::Unchecked;
    };
    let actual = crc32(blob);
    debug!(
        expected = format_args!("{:#010x}", expected),
        actual = format_args!("{:#010x}", actual),
        "Blob checksum"
    );
    if actual == expected {
        ChecksumStatus::Valid
    } else {
        ChecksumStatus::Invalid { actual }
    }
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Check an image against an expected size and/or SHA-256 (hex, any case).
/// Either check is skipped when its expectation is `None`.
pub fn verify_image(
    data: &[u8],
    expected_size: Option<u64>,
    expected_sha256: Option<&str>,
) -> Result<()> {
    if let Some(size) = expected_size {
        if data.len() as u64 != size {
            return Err(ScanError::IntegrityMismatch(format!(
                "size is {} bytes, expected {}",
                data.len(),
                size
            )));
        }
    }
    if let Some(expected) = expected_sha256 {
        let actual = sha256_hex(data);
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            return Err(ScanError::IntegrityMismatch(format!(
                "sha256 is {}, expected {}",
                actual,
                expected.trim()
            )));
        }
    }
    Ok(())
}
