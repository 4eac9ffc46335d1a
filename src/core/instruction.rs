//! Instruction and Operand types for decoded machine code.
//!
//! These are backend-neutral: a disassembler adapter fills them in, and the
//! signature scanner only ever looks at these types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Memory reference operand, `[base + index*scale + displacement]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryOperand {
    /// Base register name, lowercase (`ebp`, `rsp`, ...)
    pub base: Option<String>,
    /// Index register name, lowercase
    pub index: Option<String>,
    /// Index scale factor (1 when there is no index)
    pub scale: u8,
    /// Signed displacement
    pub displacement: i64,
}

/// Immediate operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Immediate {
    /// Value as encoded; fixed-width kinds are zero-extended
    pub value: u64,
    /// Encoded width in bits
    pub size: u8,
}

/// Structured operand representation for instructions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    Memory(MemoryOperand),
    Immediate(Immediate),
    Register(String),
    /// Branch targets, far pointers and anything else not modelled
    Other,
}

impl Operand {
    pub fn memory(displacement: i64, base: Option<String>) -> Self {
        Operand::Memory(MemoryOperand {
            base,
            index: None,
            scale: 1,
            displacement,
        })
    }

    pub fn immediate(value: u64, size: u8) -> Self {
        Operand::Immediate(Immediate { value, size })
    }

    pub fn as_memory(&self) -> Option<&MemoryOperand> {
        match self {
            Operand::Memory(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_immediate(&self) -> Option<&Immediate> {
        match self {
            Operand::Immediate(i) => Some(i),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Memory(m) => {
                write!(f, "[")?;
                let mut wrote = false;
                if let Some(base) = &m.base {
                    write!(f, "{}", base)?;
                    wrote = true;
                }
                if let Some(index) = &m.index {
                    if wrote {
                        write!(f, "+")?;
                    }
                    write!(f, "{}*{}", index, m.scale)?;
                    wrote = true;
                }
                if !wrote {
                    write!(f, "{:#x}", m.displacement as u64)?;
                } else if m.displacement < 0 {
                    write!(f, "-{:#x}", m.displacement.unsigned_abs())?;
                } else if m.displacement > 0 {
                    write!(f, "+{:#x}", m.displacement)?;
                }
                write!(f, "]")
            }
            Operand::Immediate(i) => write!(f, "{:#x}", i.value),
            Operand::Register(r) => write!(f, "{}", r),
            Operand::Other => write!(f, "?"),
        }
    }
}

/// One decoded instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Offset of the first byte, relative to the start of the decoded buffer
    pub offset: u64,
    /// Opcode identifier: opcode bytes plus ModR/M, packed big-endian and
    /// left-aligned (`C7 85` is `0xC785_0000`)
    pub opcode: u32,
    /// Lowercase mnemonic
    pub mnemonic: String,
    pub operands: Vec<Operand>,
    /// Encoded length in bytes, never zero
    pub length: u16,
}

impl Instruction {
    pub fn operand(&self, index: usize) -> Option<&Operand> {
        self.operands.get(index)
    }

    /// `(memory, immediate)` when operand 0 is a memory reference and
    /// operand 1 an immediate, the shape of a store of a constant
    pub fn store_immediate(&self) -> Option<(&MemoryOperand, &Immediate)> {
        let mem = self.operand(0)?.as_memory()?;
        let imm = self.operand(1)?.as_immediate()?;
        Some((mem, imm))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}: {}", self.offset, self.mnemonic)?;
        for (i, op) in self.operands.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{}", sep, op)?;
        }
        Ok(())
    }
}
