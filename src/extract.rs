//! Entry points: resolve the blob offset in an in-memory image, slice the
//! blob out, or do either for many images at once.

use rayon::prelude::*;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::config::LocatorConfig;
use crate::core::disassembler::Architecture;
use crate::disasm::registry;
use crate::error::{Result, ScanError};
use crate::formats::pe::PeParser;
use crate::locator::{locate_sections, DataRange, LocatedSections};
use crate::scanner::{ScanMatch, SignatureScanner};
use crate::verify::{check_blob, crc32, ChecksumStatus};

/// Where the Steam client keeps the module on a default Windows install.
pub const DEFAULT_IMAGE_PATH: &str = r"C:\Program Files (x86)\Steam\SteamUI.dll";

/// Locate the blob offset using the default configuration.
pub fn locate_offset(image: &[u8]) -> Result<u64> {
    locate_offset_with(image, &LocatorConfig::default())
}

pub fn locate_offset_with(image: &[u8], config: &LocatorConfig) -> Result<u64> {
    scan_image(image, config).map(|(found, _)| found.offset)
}

fn scan_image<'a>(
    image: &'a [u8],
    config: &LocatorConfig,
) -> Result<(ScanMatch, LocatedSections<'a>)> {
    let sections = locate_sections(image, config)?;
    let scanner = SignatureScanner::new(
        registry::for_arch(sections.code.arch),
        config.signature.clone(),
    );
    let found = scanner.scan(&sections.code, &sections.data)?;
    Ok((found, sections))
}

/// Scan many images in parallel. Results are in input order.
pub fn locate_many<I>(images: &[I], config: &LocatorConfig) -> Vec<Result<u64>>
where
    I: AsRef<[u8]> + Sync,
{
    images
        .par_iter()
        .map(|image| locate_offset_with(image.as_ref(), config))
        .collect()
}

/// How the offset was found.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub arch: Architecture,
    pub code_offset: u64,
    pub code_len: usize,
    #[serde(serialize_with = "as_hex")]
    pub base: u64,
    pub data_range: DataRange,
    /// File offset of the pointer store
    pub pointer_store_offset: u64,
    pub pointer_store: String,
    pub size_store: String,
    /// RVA of the blob, when it falls inside a mapped section
    pub rva: Option<u32>,
    pub instructions: usize,
    pub decode_failures: usize,
}

/// The extracted blob and what is known about it.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub offset: u64,
    #[serde(serialize_with = "bytes_as_hex")]
    pub data: Vec<u8>,
    #[serde(serialize_with = "crc_as_hex")]
    pub crc32: u32,
    pub checksum: ChecksumStatus,
    pub scan: ScanReport,
}

impl Extraction {
    pub fn hex(&self) -> String {
        hex::encode(&self.data)
    }

    /// Fail unless the checksum was configured and matched.
    pub fn require_valid(&self, expected: Option<u32>) -> Result<()> {
        match (self.checksum, expected) {
            (ChecksumStatus::Valid, _) | (ChecksumStatus::Unchecked, None) => Ok(()),
            (_, expected) => Err(ScanError::ChecksumMismatch {
                expected: expected.unwrap_or_default(),
                actual: self.crc32,
            }),
        }
    }
}

fn as_hex<S: Serializer>(v: &u64, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{:#x}", v))
}

fn crc_as_hex<S: Serializer>(v: &u32, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{:08x}", v))
}

fn bytes_as_hex<S: Serializer>(v: &[u8], s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(v))
}

/// Locate the blob and copy `signature.blob_len` bytes out of `image`.
///
/// # Errors
///
/// Everything `locate_offset_with` returns, plus `BlobOutOfBounds` when the
/// blob would run past the end of the image.
pub fn extract_blob(image: &[u8], config: &LocatorConfig) -> Result<Extraction> {
    let (found, sections) = scan_image(image, config)?;
    let len = config.signature.blob_len;

    let data = usize::try_from(found.offset)
        .ok()
        .and_then(|start| image.get(start..start.checked_add(len)?))
        .ok_or(ScanError::BlobOutOfBounds {
            offset: found.offset,
            len,
            file_len: image.len(),
        })?
        .to_vec();

    let crc32 = crc32(&data);
    let checksum = check_blob(&data, config.signature.expected_crc32);
    let rva = PeParser::new(image)
        .ok()
        .and_then(|pe| pe.offset_to_rva(found.offset));

    debug!(
        offset = found.offset,
        blob = %hex::encode(&data),
        ?checksum,
        "Extracted blob"
    );

    let code = &sections.code;
    Ok(Extraction {
        offset: found.offset,
        data,
        crc32,
        checksum,
        scan: ScanReport {
            arch: code.arch,
            code_offset: code.file_offset,
            code_len: code.bytes.len(),
            base: code.base,
            data_range: sections.data,
            pointer_store_offset: code.file_offset.wrapping_add(found.pointer_store.offset),
            pointer_store: found.pointer_store.to_string(),
            size_store: found.size_store.to_string(),
            rva,
            instructions: found.instructions,
            decode_failures: found.decode_failures,
        },
    })
}
