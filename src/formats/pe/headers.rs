//! PE header parsing

use crate::formats::pe::types::*;
use crate::formats::pe::utils::{field_u16, field_u32, field_u64, offset_add};

/// Parse DOS header from data
pub fn parse_dos_header(data: &[u8]) -> Result<DosHeader> {
    if data.len() < DOS_HEADER_SIZE {
        return Err(PeError::TruncatedHeader {
            expected: DOS_HEADER_SIZE,
            actual: data.len(),
        });
    }

    let e_magic = field_u16(data, 0)?;
    if e_magic != DOS_SIGNATURE {
        return Err(PeError::InvalidDosSignature);
    }

    Ok(DosHeader {
        e_lfanew: field_u32(data, 60)?,
    })
}

/// Parse COFF header from data at offset
pub fn parse_coff_header(data: &[u8], offset: usize) -> Result<CoffHeader> {
    let end = offset_add(offset, COFF_HEADER_SIZE)?;
    if end > data.len() {
        return Err(PeError::TruncatedHeader {
            expected: end,
            actual: data.len(),
        });
    }

    Ok(CoffHeader {
        machine: Machine::from(field_u16(data, offset)?),
        number_of_sections: field_u16(data, offset + 2)?,
        size_of_optional_header: field_u16(data, offset + 16)?,
    })
}

/// Parse optional header from data at offset
pub fn parse_optional_header(data: &[u8], offset: usize, size: u16) -> Result<OptionalHeader> {
    if size == 0 {
        return Err(PeError::MissingOptionalHeader);
    }
    if size < 2 {
        return Err(PeError::TruncatedHeader {
            expected: 2,
            actual: size as usize,
        });
    }

    let end = offset_add(offset, size as usize)?;
    if end > data.len() {
        return Err(PeError::TruncatedHeader {
            expected: end,
            actual: data.len(),
        });
    }

    let magic = field_u16(data, offset)?;

    match magic {
        PE32_MAGIC => parse_optional_header32(data, offset, size),
        PE32PLUS_MAGIC => parse_optional_header64(data, offset, size),
        _ => Err(PeError::InvalidMagic(magic)),
    }
}

fn parse_optional_header32(data: &[u8], offset: usize, size: u16) -> Result<OptionalHeader> {
    if (size as usize) < PE32_OPTIONAL_MIN {
        return Err(PeError::TruncatedHeader {
            expected: offset + PE32_OPTIONAL_MIN,
            actual: offset + size as usize,
        });
    }

    Ok(OptionalHeader::Pe32(OptionalHeader32 {
        magic: field_u16(data, offset)?,
        base_of_data: field_u32(data, offset + 24)?,
        image_base: field_u32(data, offset + 28)?,
    }))
}

fn parse_optional_header64(data: &[u8], offset: usize, size: u16) -> Result<OptionalHeader> {
    if (size as usize) < PE32PLUS_OPTIONAL_MIN {
        return Err(PeError::TruncatedHeader {
            expected: offset + PE32PLUS_OPTIONAL_MIN,
            actual: offset + size as usize,
        });
    }

    Ok(OptionalHeader::Pe32Plus(OptionalHeader64 {
        magic: field_u16(data, offset)?,
        image_base: field_u64(data, offset + 24)?,
    }))
}

/// Parse NT headers (PE signature + COFF + Optional)
pub fn parse_nt_headers(data: &[u8], offset: usize) -> Result<NtHeaders> {
    let sig_end = offset_add(offset, 4)?;
    let signature: [u8; 4] = data
        .get(offset..sig_end)
        .and_then(|s| s.try_into().ok())
        .ok_or(PeError::TruncatedHeader {
            expected: sig_end,
            actual: data.len(),
        })?;

    if signature != PE_SIGNATURE {
        return Err(PeError::InvalidPeSignature);
    }

    let coff_header = parse_coff_header(data, offset + 4)?;

    // 4 (signature) + 20 (COFF)
    let opt_offset = offset_add(offset, 4 + COFF_HEADER_SIZE)?;
    let optional_header =
        parse_optional_header(data, opt_offset, coff_header.size_of_optional_header)?;

    Ok(NtHeaders {
        file_header: coff_header,
        optional_header,
    })
}
