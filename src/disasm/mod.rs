//! Disassembly engines and registry.
//!
//! iced-x86 covers both widths a PE32 image may carry (I386 and AMD64).

pub mod iced;
pub mod registry;
