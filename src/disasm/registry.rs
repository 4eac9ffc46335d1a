use crate::core::disassembler::{Architecture, Disassembler, DisassemblerResult};
use crate::core::instruction::Instruction;

pub enum Backend {
    Iced(super::iced::IcedDisassembler),
}

impl Disassembler for Backend {
    fn disassemble_instruction(
        &self,
        offset: u64,
        bytes: &[u8],
    ) -> DisassemblerResult<Instruction> {
        match self {
            Backend::Iced(d) => d.disassemble_instruction(offset, bytes),
        }
    }

    fn max_instruction_length(&self) -> usize {
        match self {
            Backend::Iced(d) => d.max_instruction_length(),
        }
    }

    fn architecture(&self) -> Architecture {
        match self {
            Backend::Iced(d) => d.architecture(),
        }
    }

    fn name(&self) -> &str {
        match self {
            Backend::Iced(d) => d.name(),
        }
    }
}

/// Select a disassembler backend for the given architecture.
pub fn for_arch(arch: Architecture) -> Backend {
    match arch {
        Architecture::X86 | Architecture::X86_64 => {
            Backend::Iced(super::iced::IcedDisassembler::new(arch))
        }
    }
}
