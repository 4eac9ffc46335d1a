//! Backend-neutral instruction model and the disassembler seam.

pub mod disassembler;
pub mod instruction;
