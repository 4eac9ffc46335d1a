//! Signature scanner.
//!
//! Walks the code section one instruction at a time, keeping only the most
//! recent successfully decoded instruction, and stops at the first pair
//!
//! ```text
//! mov dword ptr [ebp+D],   <pointer into data section + base>
//! mov dword ptr [ebp+D+4], 16
//! ```
//!
//! Decode failures are skipped one byte at a time and leave the lookback
//! slot untouched.

use serde::Serialize;
use tracing::{info, info_span, trace, warn};

use crate::config::SignatureConfig;
use crate::core::disassembler::Disassembler;
use crate::core::instruction::Instruction;
use crate::error::{Result, ScanError};
use crate::locator::{CodeSection, DataRange};

/// A successful scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanMatch {
    /// Resolved file offset of the blob
    pub offset: u64,
    /// Store of the pointer; offsets are relative to the code section
    pub pointer_store: Instruction,
    /// Store of the size constant
    pub size_store: Instruction,
    /// Instructions decoded up to and including the match
    pub instructions: usize,
    pub decode_failures: usize,
}

#[derive(Debug)]
enum ScanState {
    Start,
    HaveCandidate(Instruction),
    Matched(ScanMatch),
    Exhausted,
}

/// Evaluate the signature over `prev` followed by `cur`.
///
/// Returns the resolved file offset (`prev` immediate minus `base`) when both
/// stores carry the configured opcode, the offset lies inside `data`, the
/// displacements differ by exactly `displacement_delta` and `cur` stores
/// exactly `size_immediate`.
pub fn match_pair(
    signature: &SignatureConfig,
    prev: &Instruction,
    cur: &Instruction,
    base: u64,
    data: &DataRange,
) -> Option<u64> {
    if prev.opcode != signature.opcode || cur.opcode != signature.opcode {
        return None;
    }
    let (prev_mem, prev_imm) = prev.store_immediate()?;
    let (cur_mem, cur_imm) = cur.store_immediate()?;

    let rel_addr = prev_imm.value.wrapping_sub(base);
    if !data.contains(rel_addr) {
        return None;
    }

    let diff = cur_mem.displacement.wrapping_sub(prev_mem.displacement);
    if diff != signature.displacement_delta || cur_imm.value != signature.size_immediate {
        return None;
    }

    Some(rel_addr)
}

/// Decode cursor over the code bytes.
struct Walk<'a> {
    bytes: &'a [u8],
    pos: usize,
    instructions: usize,
    decode_failures: usize,
}

impl<'a> Walk<'a> {
    fn done(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Decode at the cursor and step past it. `None` on a decode failure.
    fn step<D: Disassembler>(&mut self, disassembler: &D) -> Option<Instruction> {
        let at = self.pos;
        let end = at
            .saturating_add(disassembler.max_instruction_length())
            .min(self.bytes.len());
        match disassembler.disassemble_instruction(at as u64, &self.bytes[at..end]) {
            Ok(ins) => {
                self.pos = at.saturating_add((ins.length as usize).max(1));
                self.instructions += 1;
                Some(ins)
            }
            Err(e) => {
                self.pos = at.saturating_add(e.skip_len());
                self.decode_failures += 1;
                trace!(offset = at, error = %e, "Decode failure");
                None
            }
        }
    }
}

/// Runs a `SignatureConfig` over a code section with any `Disassembler`.
pub struct SignatureScanner<D: Disassembler> {
    disassembler: D,
    signature: SignatureConfig,
}

impl<D: Disassembler> SignatureScanner<D> {
    pub fn new(disassembler: D, signature: SignatureConfig) -> Self {
        Self {
            disassembler,
            signature,
        }
    }

    pub fn signature(&self) -> &SignatureConfig {
        &self.signature
    }

    pub fn disassembler(&self) -> &D {
        &self.disassembler
    }

    /// Scan `code` for the signature.
    ///
    /// # Errors
    ///
    /// `ScanError::PatternNotFound` once the cursor passes the end of `code`
    /// without a match.
    pub fn scan(&self, code: &CodeSection<'_>, data: &DataRange) -> Result<ScanMatch> {
        let span = info_span!(
            "signature_scan",
            arch = %code.arch,
            decoder = self.disassembler.name(),
            code_len = code.bytes.len()
        );
        let _enter = span.enter();

        let mut walk = Walk {
            bytes: code.bytes,
            pos: 0,
            instructions: 0,
            decode_failures: 0,
        };
        let mut state = ScanState::Start;

        loop {
            state = match state {
                ScanState::Matched(found) => {
                    info!(
                        offset = format_args!("{:#x}", found.offset),
                        at = found.pointer_store.offset,
                        instructions = found.instructions,
                        "Signature matched"
                    );
                    return Ok(found);
                }
                ScanState::Exhausted => {
                    warn!(
                        instructions = walk.instructions,
                        decode_failures = walk.decode_failures,
                        "Signature not found"
                    );
                    return Err(ScanError::PatternNotFound {
                        instructions: walk.instructions,
                        decode_failures: walk.decode_failures,
                    });
                }
                _ if walk.done() => ScanState::Exhausted,
                ScanState::Start => match walk.step(&self.disassembler) {
                    Some(cur) => ScanState::HaveCandidate(cur),
                    None => ScanState::Start,
                },
                ScanState::HaveCandidate(prev) => match walk.step(&self.disassembler) {
                    None => ScanState::HaveCandidate(prev),
                    Some(cur) => {
                        match match_pair(&self.signature, &prev, &cur, code.base, data) {
                            Some(offset) => ScanState::Matched(ScanMatch {
                                offset,
                                pointer_store: prev,
                                size_store: cur,
                                instructions: walk.instructions,
                                decode_failures: walk.decode_failures,
                            }),
                            None => ScanState::HaveCandidate(cur),
                        }
                    }
                },
            };
        }
    }
}
