//! Locate the 16-byte private data blob in a PE32 image by signature
//! scanning its code section.
//!
//! ```no_run
//! let image = std::fs::read("SteamUI.dll")?;
//! let offset = privscan::locate_offset(&image)?;
//! println!("{:x?}", &image[offset as usize..offset as usize + 16]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Configuration types
pub mod config;
/// Core instruction model and disassembler trait
pub mod core;
/// Disassembler backends
pub mod disasm;
pub mod error;
pub mod extract;
/// Executable format parsers
pub mod formats;
/// Memory-mapped image access
pub mod io;
pub mod locator;
pub mod logging;
pub mod scanner;
pub mod verify;

pub use config::{IOConfig, LocatorConfig, SignatureConfig};
pub use error::{ErrorKind, Result, ScanError};
pub use extract::{
    extract_blob, locate_many, locate_offset, locate_offset_with, Extraction, ScanReport,
    DEFAULT_IMAGE_PATH,
};
pub use locator::{locate_sections, CodeSection, DataRange};
pub use scanner::{match_pair, ScanMatch, SignatureScanner};
pub use verify::ChecksumStatus;
