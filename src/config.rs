//! Configuration for the locator, the signature scanner and image I/O.
//!
//! Every constant the scan depends on lives here, so tests and callers can
//! run the same machinery against other signatures.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::io::IOLimits;

/// The instruction-pair signature and the blob it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureConfig {
    /// Packed opcode+ModR/M identifier both stores must carry.
    /// `0xC785_0000` is `mov dword ptr [ebp+disp32], imm32`.
    pub opcode: u32,
    /// Second store's displacement minus the first store's.
    pub displacement_delta: i64,
    /// Immediate written by the second store.
    pub size_immediate: u64,
    /// Bytes to slice at the resolved offset.
    pub blob_len: usize,
    /// CRC32 (IEEE) of a known-good blob; `None` skips the check.
    pub expected_crc32: Option<u32>,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            opcode: 0xC785_0000,
            displacement_delta: 4,
            size_immediate: 16,
            blob_len: 16,
            expected_crc32: Some(0x85AC_72FB),
        }
    }
}

/// I/O limits for reading images from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IOConfig {
    /// Largest image that will be opened.
    pub max_file_size: u64,
}

impl Default for IOConfig {
    fn default() -> Self {
        Self {
            max_file_size: 512 * 1024 * 1024,
        }
    }
}

impl From<&IOConfig> for IOLimits {
    fn from(cfg: &IOConfig) -> Self {
        IOLimits {
            max_file_size: cfg.max_file_size,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Section that is disassembled.
    pub code_section: String,
    /// Section whose file range pointer immediates must land in.
    pub data_section: String,
    pub signature: SignatureConfig,
    pub io: IOConfig,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            code_section: ".text".to_string(),
            data_section: ".rdata".to_string(),
            signature: SignatureConfig::default(),
            io: IOConfig::default(),
        }
    }
}

impl LocatorConfig {
    /// Read a JSON config. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref()).map_err(crate::io::error::IoError::from)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Write this config as pretty JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), text).map_err(crate::io::error::IoError::from)?;
        Ok(())
    }

    pub fn io_limits(&self) -> IOLimits {
        IOLimits::from(&self.io)
    }
}
