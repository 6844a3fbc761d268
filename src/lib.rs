//! rvgen: randomized RISC-V assembly stimulus generation
//!
//! Models the RISC-V register file, an operand-format-keyed instruction
//! catalog, and the CSR namespace, and composes random but format-correct
//! instructions into plain text programs for simulator and core
//! verification flows. rvgen renders mnemonic lines only; it is not an
//! assembler and does no binary encoding or address resolution.

pub mod assembler;
pub mod isa;

pub use assembler::{Assembler, GenError};
