//! Utility functions for PE parsing

use crate::formats::pe::types::{PeError, Result};

/// Extension trait for reading primitive types from byte slices
pub trait ReadExt {
    fn read_u16_le_at(&self, offset: usize) -> Option<u16>;
    fn read_u32_le_at(&self, offset: usize) -> Option<u32>;
    fn read_u64_le_at(&self, offset: usize) -> Option<u64>;
    fn read_slice_at(&self, offset: usize, len: usize) -> Option<&[u8]>;
}

impl ReadExt for [u8] {
    #[inline(always)]
    fn read_u16_le_at(&self, offset: usize) -> Option<u16> {
        self.get(offset..offset.checked_add(2)?)
            .and_then(|b| b.try_into().ok())
            .map(u16::from_le_bytes)
    }

    #[inline(always)]
    fn read_u32_le_at(&self, offset: usize) -> Option<u32> {
        self.get(offset..offset.checked_add(4)?)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_le_bytes)
    }

    #[inline(always)]
    fn read_u64_le_at(&self, offset: usize) -> Option<u64> {
        self.get(offset..offset.checked_add(8)?)
            .and_then(|b| b.try_into().ok())
            .map(u64::from_le_bytes)
    }

    #[inline(always)]
    fn read_slice_at(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.get(offset..offset.checked_add(len)?)
    }
}

fn truncated(data: &[u8], offset: usize, width: usize) -> PeError {
    PeError::TruncatedHeader {
        expected: offset.saturating_add(width),
        actual: data.len(),
    }
}

/// Header field readers: like `ReadExt`, but a short buffer is a parse error.
pub fn field_u16(data: &[u8], offset: usize) -> Result<u16> {
    data.read_u16_le_at(offset)
        .ok_or_else(|| truncated(data, offset, 2))
}

pub fn field_u32(data: &[u8], offset: usize) -> Result<u32> {
    data.read_u32_le_at(offset)
        .ok_or_else(|| truncated(data, offset, 4))
}

pub fn field_u64(data: &[u8], offset: usize) -> Result<u64> {
    data.read_u64_le_at(offset)
        .ok_or_else(|| truncated(data, offset, 8))
}

/// `base + delta` without wrapping; overflow means the header points nowhere.
#[inline(always)]
pub fn offset_add(base: usize, delta: usize) -> Result<usize> {
    base.checked_add(delta)
        .ok_or(PeError::InvalidOffset { offset: base })
}

/// Convert a section name array to a string
pub fn section_name_to_string(name: &[u8; 8]) -> String {
    let end = name.iter().position(|&b| b == 0).unwrap_or(8);
    String::from_utf8_lossy(&name[..end]).to_string()
}
