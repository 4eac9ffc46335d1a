//! Section table parsing for PE files

use crate::formats::pe::types::*;
use crate::formats::pe::utils::{field_u32, offset_add, ReadExt};

/// Section table in file order.
///
/// Order matters: when two headers carry the same name, callers that walk the
/// table see them exactly as the linker wrote them.
#[derive(Debug, Clone)]
pub struct SectionTable {
    sections: Vec<Section>,
}

impl SectionTable {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// Get all sections
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Convert file offset to RVA
    pub fn offset_to_rva(&self, offset: u64) -> Option<u32> {
        self.sections.iter().find_map(|section| {
            if section.data.contains(&offset) {
                let delta = offset - section.data.start;
                section.header.virtual_address.checked_add(delta as u32)
            } else {
                None
            }
        })
    }
}

/// Parse section headers from data
pub fn parse_section_headers(data: &[u8], offset: usize, count: u16) -> Result<Vec<SectionHeader>> {
    let mut sections = Vec::with_capacity(count as usize);

    for i in 0..count as usize {
        let section_offset = offset_add(offset, i * SECTION_HEADER_SIZE)?;
        let raw = data
            .read_slice_at(section_offset, SECTION_HEADER_SIZE)
            .ok_or(PeError::TruncatedHeader {
                expected: section_offset.saturating_add(SECTION_HEADER_SIZE),
                actual: data.len(),
            })?;

        let mut name = [0u8; 8];
        name.copy_from_slice(&raw[..8]);

        sections.push(SectionHeader {
            name,
            virtual_size: field_u32(raw, 8)?,
            virtual_address: field_u32(raw, 12)?,
            size_of_raw_data: field_u32(raw, 16)?,
            pointer_to_raw_data: field_u32(raw, 20)?,
        });
    }

    Ok(sections)
}

/// Create section objects with data ranges
pub fn create_sections(headers: Vec<SectionHeader>) -> Vec<Section> {
    headers
        .into_iter()
        .map(|header| {
            let data = header.raw_range();
            Section { header, data }
        })
        .collect()
}

impl Section {
    /// Get section raw data from the file, `None` if it runs past the end
    pub fn data<'a>(&self, file_data: &'a [u8]) -> Option<&'a [u8]> {
        let start = usize::try_from(self.data.start).ok()?;
        let end = usize::try_from(self.data.end).ok()?;
        file_data.get(start..end)
    }
}
