use crate::core::disassembler::{
    Architecture, Disassembler, DisassemblerError, DisassemblerResult,
};
use crate::core::instruction::{Instruction, MemoryOperand, Operand};

pub struct IcedDisassembler {
    bits: u32,
    arch: Architecture,
}

/// Legacy prefix bytes; REX (0x40-0x4F) counts too, but only in 64-bit mode.
fn is_prefix(byte: u8, bits: u32) -> bool {
    match byte {
        0x26 | 0x2E | 0x36 | 0x3E | 0x64 | 0x65 | 0x66 | 0x67 | 0xF0 | 0xF2 | 0xF3 => true,
        0x40..=0x4F => bits == 64,
        _ => false,
    }
}

fn register_name(reg: iced_x86::Register) -> Option<String> {
    if reg == iced_x86::Register::None {
        None
    } else {
        Some(format!("{:?}", reg).to_ascii_lowercase())
    }
}

impl IcedDisassembler {
    pub fn new(arch: Architecture) -> Self {
        Self {
            bits: arch.address_bits(),
            arch,
        }
    }

    /// Opcode bytes and ModR/M (plus SIB when present), after prefixes and
    /// before any displacement or immediate, left-aligned in a u32.
    fn opcode_key(
        bytes: &[u8],
        instr: &iced_x86::Instruction,
        offsets: &iced_x86::ConstantOffsets,
        bits: u32,
    ) -> u32 {
        let len = instr.len().min(bytes.len());
        let mut start = 0usize;
        if instr.encoding() == iced_x86::EncodingKind::Legacy {
            while start < len && is_prefix(bytes[start], bits) {
                start += 1;
            }
        }
        let mut end = len;
        if offsets.has_displacement() {
            end = end.min(offsets.displacement_offset());
        }
        if offsets.has_immediate() {
            end = end.min(offsets.immediate_offset());
        }
        let end = end.max(start);

        bytes[start..end]
            .iter()
            .take(4)
            .enumerate()
            .fold(0u32, |key, (i, &b)| key | (b as u32) << (24 - 8 * i))
    }

    fn iced_operands(instr: &iced_x86::Instruction, bits: u32) -> Vec<Operand> {
        use iced_x86::OpKind;
        let mut out = Vec::with_capacity(instr.op_count() as usize);
        for i in 0..instr.op_count() {
            let op = match instr.op_kind(i) {
                OpKind::Register => register_name(instr.op_register(i))
                    .map(Operand::Register)
                    .unwrap_or(Operand::Other),
                OpKind::Memory => {
                    let displacement = if bits == 64 {
                        instr.memory_displacement64() as i64
                    } else {
                        instr.memory_displacement32() as i32 as i64
                    };
                    let scale = instr.memory_index_scale();
                    Operand::Memory(MemoryOperand {
                        base: register_name(instr.memory_base()),
                        index: register_name(instr.memory_index()),
                        scale: if scale > 0 { scale as u8 } else { 1 },
                        displacement,
                    })
                }
                OpKind::Immediate8 => Operand::immediate(instr.immediate8() as u64, 8),
                OpKind::Immediate8_2nd => Operand::immediate(instr.immediate8_2nd() as u64, 8),
                OpKind::Immediate16 => Operand::immediate(instr.immediate16() as u64, 16),
                OpKind::Immediate32 => Operand::immediate(instr.immediate32() as u64, 32),
                OpKind::Immediate64 => Operand::immediate(instr.immediate64(), 64),
                OpKind::Immediate8to16 => {
                    Operand::immediate(instr.immediate8to16() as u16 as u64, 16)
                }
                OpKind::Immediate8to32 => {
                    Operand::immediate(instr.immediate8to32() as u32 as u64, 32)
                }
                OpKind::Immediate8to64 => Operand::immediate(instr.immediate8to64() as u64, 64),
                OpKind::Immediate32to64 => Operand::immediate(instr.immediate32to64() as u64, 64),
                // Branch targets and string-op memory forms are not modelled
                _ => Operand::Other,
            };
            out.push(op);
        }
        out
    }
}

impl Disassembler for IcedDisassembler {
    fn disassemble_instruction(
        &self,
        offset: u64,
        bytes: &[u8],
    ) -> DisassemblerResult<Instruction> {
        use iced_x86::{Decoder, DecoderError, DecoderOptions};

        if bytes.is_empty() {
            return Err(DisassemblerError::InsufficientBytes);
        }

        let mut decoder = Decoder::with_ip(self.bits, bytes, offset, DecoderOptions::NONE);
        let instr = decoder.decode();
        if instr.is_invalid() {
            return match decoder.last_error() {
                DecoderError::NoMoreBytes => Err(DisassemblerError::InsufficientBytes),
                _ => Err(DisassemblerError::InvalidInstruction { length: instr.len() }),
            };
        }

        let offsets = decoder.get_constant_offsets(&instr);
        let len = instr.len();

        Ok(Instruction {
            offset,
            opcode: Self::opcode_key(bytes, &instr, &offsets, self.bits),
            mnemonic: format!("{:?}", instr.mnemonic()).to_ascii_lowercase(),
            operands: Self::iced_operands(&instr, self.bits),
            length: len.max(1) as u16,
        })
    }

    fn max_instruction_length(&self) -> usize {
        15
    }

    fn architecture(&self) -> Architecture {
        self.arch
    }

    fn name(&self) -> &str {
        "iced-x86"
    }
}
