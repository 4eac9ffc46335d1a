//! Section locator: finds the code section to disassemble, the data section
//! range pointer immediates must land in, and the translation base between
//! the two.

use serde::Serialize;
use tracing::debug;

use crate::config::LocatorConfig;
use crate::core::disassembler::Architecture;
use crate::error::{Result, ScanError};
use crate::formats::pe::{Machine, OptionalHeader, PeParser, Section};

/// The code section, trimmed to its virtual size.
#[derive(Debug, Clone, Copy)]
pub struct CodeSection<'a> {
    /// Raw bytes, `min(virtual_size, size_of_raw_data)` long
    pub bytes: &'a [u8],
    pub virtual_size: u32,
    /// File offset of the first byte
    pub file_offset: u64,
    pub arch: Architecture,
    /// `image_base + base_of_data - size_of_raw_data - pointer_to_raw_data`,
    /// wrapping. Subtracted from a pointer immediate it yields a file offset.
    pub base: u64,
}

/// File offsets `[start, end]` of the data section. Membership is inclusive
/// at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DataRange {
    pub start: u64,
    pub end: u64,
}

impl DataRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, offset: u64) -> bool {
        self.start <= offset && offset <= self.end
    }
}

/// Everything the scanner needs from an image.
#[derive(Debug, Clone, Copy)]
pub struct LocatedSections<'a> {
    pub code: CodeSection<'a>,
    pub data: DataRange,
}

fn architecture_for(machine: Machine) -> Option<Architecture> {
    match machine {
        Machine::I386 => Some(Architecture::X86),
        Machine::X86_64 => Some(Architecture::X86_64),
        _ => None,
    }
}

/// Resolve the configured code and data sections of a PE32 image.
///
/// Sections are matched by exact name. When a name occurs more than once the
/// last header wins. A missing data section yields the empty range `[0, 0]`
/// and is not an error.
pub fn locate_sections<'a>(image: &'a [u8], config: &LocatorConfig) -> Result<LocatedSections<'a>> {
    let pe = PeParser::new(image)?;

    let machine = pe.machine();
    let arch = architecture_for(machine).ok_or(ScanError::UnsupportedArchitecture {
        machine: machine.raw(),
    })?;

    let base_of_data = match pe.optional_header() {
        OptionalHeader::Pe32(h) => h.base_of_data,
        other => {
            return Err(ScanError::UnsupportedHeaderLayout {
                magic: other.magic(),
            })
        }
    };

    let mut code: Option<&Section> = None;
    let mut data = DataRange::default();
    for section in pe.sections() {
        let name = section.header.name();
        if name == config.code_section {
            code = Some(section);
        }
        if name == config.data_section {
            data = DataRange::new(section.data.start, section.data.end);
        }
    }

    let text = code.ok_or_else(|| ScanError::MissingSection {
        name: config.code_section.clone(),
    })?;

    let raw = text.data(image).ok_or_else(|| ScanError::SectionOutOfBounds {
        name: config.code_section.clone(),
        start: text.data.start,
        end: text.data.end,
        file_len: image.len(),
    })?;
    let virtual_size = text.header.virtual_size;
    let bytes = match usize::try_from(virtual_size) {
        Ok(v) if v < raw.len() => &raw[..v],
        _ => raw,
    };

    let base = pe
        .image_base()
        .wrapping_add(base_of_data as u64)
        .wrapping_sub(text.header.size_of_raw_data as u64)
        .wrapping_sub(text.header.pointer_to_raw_data as u64);

    debug!(
        arch = %arch,
        code_offset = text.data.start,
        code_len = bytes.len(),
        virtual_size,
        data_start = data.start,
        data_end = data.end,
        base = format_args!("{:#x}", base),
        "Located sections"
    );

    Ok(LocatedSections {
        code: CodeSection {
            bytes,
            virtual_size,
            file_offset: text.data.start,
            arch,
            base,
        },
        data,
    })
}
