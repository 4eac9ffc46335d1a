//! Disassembler trait and error types for instruction decoding.
//!
//! The scanner is written against `Disassembler` only, so a backend for
//! another decoder (or another width) slots in without touching it.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::core::instruction::Instruction;

/// Errors that can occur while decoding a single instruction
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DisassemblerError {
    /// Invalid instruction bytes; `length` is what the backend consumed (may be 0).
    /// Reported for diagnostics only, see `skip_len`.
    #[error("InvalidInstruction ({length} bytes)")]
    InvalidInstruction { length: usize },
    /// Insufficient bytes for complete instruction
    #[error("InsufficientBytes")]
    InsufficientBytes,
}

impl DisassemblerError {
    /// Bytes the caller should skip past this failure: exactly one.
    ///
    /// Backends may fold a stray byte and the valid instruction behind it
    /// into one invalid instruction (iced reports `F0 C7 85 ..` as 11 invalid
    /// bytes), so the reported length is never trusted for resync.
    pub fn skip_len(&self) -> usize {
        1
    }
}

/// Result type for disassembly operations
pub type DisassemblerResult<T> = Result<T, DisassemblerError>;

/// Instruction set widths this crate decodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Architecture {
    /// x86 (32-bit)
    X86,
    /// x86-64 (64-bit)
    X86_64,
}

impl Architecture {
    /// Address size in bits
    pub fn address_bits(&self) -> u32 {
        match self {
            Architecture::X86 => 32,
            Architecture::X86_64 => 64,
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Architecture::X86 => write!(f, "x86"),
            Architecture::X86_64 => write!(f, "x86_64"),
        }
    }
}

/// Core disassembler trait that provides a common interface for instruction decoding
pub trait Disassembler {
    /// Decode one instruction from the start of `bytes`.
    ///
    /// `offset` is recorded on the returned instruction and used as the
    /// instruction pointer for relative operands.
    fn disassemble_instruction(&self, offset: u64, bytes: &[u8])
        -> DisassemblerResult<Instruction>;

    /// Longest instruction this backend decodes; callers never pass it more bytes
    fn max_instruction_length(&self) -> usize;

    /// Get the architecture this disassembler supports
    fn architecture(&self) -> Architecture;

    /// Get a human-readable name for this disassembler
    fn name(&self) -> &str {
        "Generic Disassembler"
    }
}
