//! Error types for the privscan locator.
//!
//! Every failure that escapes `locate_offset` or `extract_blob` is a
//! `ScanError`. Per-instruction decode failures never show up here; the
//! scanner absorbs them and keeps walking.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::formats::pe::PeError;
use crate::io::error::IoError;

/// Main error type for privscan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The image could not be parsed as a PE file at all
    #[error("Invalid binary format: {0}")]
    Format(#[from] PeError),

    /// Machine type other than i386 or AMD64
    #[error("Unsupported architecture: machine type {machine:#06x}")]
    UnsupportedArchitecture { machine: u16 },

    /// Optional header is not in the PE32 layout
    #[error("Unsupported optional header layout: magic {magic:#06x}")]
    UnsupportedHeaderLayout { magic: u16 },

    /// A required section is absent from the section table
    #[error("Could not find section {name}")]
    MissingSection { name: String },

    /// Section raw data lies (partly) outside the image
    #[error("Section {name} raw data {start:#x}..{end:#x} exceeds image size {file_len:#x}")]
    SectionOutOfBounds {
        name: String,
        start: u64,
        end: u64,
        file_len: usize,
    },

    /// The code section was scanned completely without a match
    #[error(
        "Could not find offset in image ({instructions} instructions decoded, {decode_failures} decode failures)"
    )]
    PatternNotFound {
        instructions: usize,
        decode_failures: usize,
    },

    /// The resolved offset does not leave room for the blob
    #[error("Blob at {offset:#x} (+{len}) exceeds image size {file_len:#x}")]
    BlobOutOfBounds {
        offset: u64,
        len: usize,
        file_len: usize,
    },

    /// Extracted blob failed its checksum
    #[error("Checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// Image failed the size/hash integrity gate
    #[error("Integrity check failed: {0}")]
    IntegrityMismatch(String),

    /// File access errors
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Configuration (de)serialization errors
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Coarse classification of a `ScanError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    Format,
    Unsupported,
    Structural,
    NotFound,
    Integrity,
    Io,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Format => "format",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::Structural => "structural",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Integrity => "integrity",
            ErrorKind::Io => "io",
            ErrorKind::Config => "config",
        };
        f.write_str(s)
    }
}

impl ScanError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::Format(_) => ErrorKind::Format,
            ScanError::UnsupportedArchitecture { .. } | ScanError::UnsupportedHeaderLayout { .. } => {
                ErrorKind::Unsupported
            }
            ScanError::MissingSection { .. }
            | ScanError::SectionOutOfBounds { .. }
            | ScanError::BlobOutOfBounds { .. } => ErrorKind::Structural,
            ScanError::PatternNotFound { .. } => ErrorKind::NotFound,
            ScanError::ChecksumMismatch { .. } | ScanError::IntegrityMismatch(_) => {
                ErrorKind::Integrity
            }
            ScanError::Io(_) => ErrorKind::Io,
            ScanError::Config(_) => ErrorKind::Config,
        }
    }
}

/// Result type alias for privscan operations
pub type Result<T> = std::result::Result<T, ScanError>;
