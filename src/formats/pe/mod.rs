//! PE parser: DOS header, NT headers and the section table.
//!
//! Only what the locator needs is decoded; data directories, imports and
//! resources are never touched.

pub mod headers;
pub mod sections;
pub mod types;
pub mod utils;

use headers::*;
use sections::*;
pub use types::*;
use utils::offset_add;

/// Main PE parser
pub struct PeParser {
    nt_headers: NtHeaders,
    section_table: SectionTable,
}

impl PeParser {
    pub fn new(data: &[u8]) -> Result<Self> {
        let dos_header = parse_dos_header(data)?;

        let nt_offset = dos_header.e_lfanew as usize;
        let nt_headers = parse_nt_headers(data, nt_offset)?;

        // signature (4) + COFF (20) + optional header
        let section_offset = offset_add(
            nt_offset,
            4 + COFF_HEADER_SIZE + nt_headers.file_header.size_of_optional_header as usize,
        )?;
        let section_headers = parse_section_headers(
            data,
            section_offset,
            nt_headers.file_header.number_of_sections,
        )?;

        let section_table = SectionTable::new(create_sections(section_headers));

        Ok(Self {
            nt_headers,
            section_table,
        })
    }

    pub fn optional_header(&self) -> &OptionalHeader {
        &self.nt_headers.optional_header
    }

    pub fn machine(&self) -> Machine {
        self.nt_headers.file_header.machine
    }

    pub fn image_base(&self) -> u64 {
        self.nt_headers.optional_header.image_base()
    }

    /// All sections, in file order
    pub fn sections(&self) -> &[Section] {
        self.section_table.sections()
    }

    /// Convert file offset to RVA
    pub fn offset_to_rva(&self, offset: u64) -> Option<u32> {
        self.section_table.offset_to_rva(offset)
    }
}
