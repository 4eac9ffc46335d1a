//! PE header and section types, limited to what the locator reads.

use std::fmt;
use std::ops::Range;

pub const DOS_SIGNATURE: u16 = 0x5A4D; // MZ
pub const PE_SIGNATURE: [u8; 4] = *b"PE\0\0";
pub const PE32_MAGIC: u16 = 0x10B;
pub const PE32PLUS_MAGIC: u16 = 0x20B;

pub const DOS_HEADER_SIZE: usize = 64;
pub const COFF_HEADER_SIZE: usize = 20;
pub const SECTION_HEADER_SIZE: usize = 40;
/// Smallest optional header we accept (fields up to NumberOfRvaAndSizes)
pub const PE32_OPTIONAL_MIN: usize = 96;
pub const PE32PLUS_OPTIONAL_MIN: usize = 112;

/// Errors from header and section-table parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeError {
    InvalidDosSignature,
    InvalidPeSignature,
    InvalidMagic(u16),
    MissingOptionalHeader,
    TruncatedHeader { expected: usize, actual: usize },
    InvalidOffset { offset: usize },
}

impl fmt::Display for PeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDosSignature => write!(f, "Invalid DOS signature"),
            Self::InvalidPeSignature => write!(f, "Invalid PE signature"),
            Self::InvalidMagic(m) => write!(f, "Invalid optional header magic: 0x{:04x}", m),
            Self::MissingOptionalHeader => write!(f, "Image has no optional header"),
            Self::TruncatedHeader { expected, actual } => {
                write!(f, "Truncated header: need {} bytes, have {}", expected, actual)
            }
            Self::InvalidOffset { offset } => write!(f, "Header offset overflows: 0x{:x}", offset),
        }
    }
}

impl std::error::Error for PeError {}

pub type Result<T> = std::result::Result<T, PeError>;

/// `IMAGE_FILE_MACHINE_*`; only the two x86 widths are ever decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Machine {
    Unknown,
    I386,
    X86_64,
    Arm64,
    Other(u16),
}

impl From<u16> for Machine {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Unknown,
            0x014c => Self::I386,
            0x8664 => Self::X86_64,
            0xaa64 => Self::Arm64,
            raw => Self::Other(raw),
        }
    }
}

impl Machine {
    pub fn raw(&self) -> u16 {
        match self {
            Self::Unknown => 0,
            Self::I386 => 0x014c,
            Self::X86_64 => 0x8664,
            Self::Arm64 => 0xaa64,
            Self::Other(v) => *v,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DosHeader {
    /// File offset of the NT headers
    pub e_lfanew: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct CoffHeader {
    pub machine: Machine,
    pub number_of_sections: u16,
    pub size_of_optional_header: u16,
}

/// PE32 optional header, address translation fields only
#[derive(Debug, Clone)]
pub struct OptionalHeader32 {
    pub magic: u16,
    pub base_of_data: u32,
    pub image_base: u32,
}

/// PE32+ optional header. There is no BaseOfData; ImageBase is 64-bit and
/// starts where BaseOfData would be.
#[derive(Debug, Clone)]
pub struct OptionalHeader64 {
    pub magic: u16,
    pub image_base: u64,
}

#[derive(Debug, Clone)]
pub enum OptionalHeader {
    Pe32(OptionalHeader32),
    Pe32Plus(OptionalHeader64),
}

impl OptionalHeader {
    pub fn magic(&self) -> u16 {
        match self {
            Self::Pe32(h) => h.magic,
            Self::Pe32Plus(h) => h.magic,
        }
    }

    pub fn image_base(&self) -> u64 {
        match self {
            Self::Pe32(h) => h.image_base as u64,
            Self::Pe32Plus(h) => h.image_base,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NtHeaders {
    pub file_header: CoffHeader,
    pub optional_header: OptionalHeader,
}

#[derive(Debug, Clone)]
pub struct SectionHeader {
    pub name: [u8; 8],
    pub virtual_size: u32,
    pub virtual_address: u32,
    pub size_of_raw_data: u32,
    pub pointer_to_raw_data: u32,
}

impl SectionHeader {
    /// Name up to the first NUL; all 8 bytes when there is none
    pub fn name(&self) -> String {
        crate::formats::pe::utils::section_name_to_string(&self.name)
    }

    /// File range of the raw data as declared by the header
    pub fn raw_range(&self) -> Range<u64> {
        let start = self.pointer_to_raw_data as u64;
        start..start + self.size_of_raw_data as u64
    }
}

/// Section header plus its declared file range
#[derive(Debug, Clone)]
pub struct Section {
    pub header: SectionHeader,
    /// Not bounds-checked against the image; see `Section::data`
    pub data: Range<u64>,
}
