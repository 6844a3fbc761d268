//! RISC-V ISA model
//!
//! Leaf-first: register catalog and pool, operand formats, the instruction
//! catalog with operand validation, plus the CSR and label namespaces the
//! generator draws operands from.

pub mod csr;
pub mod format;
pub mod instruction;
pub mod label;
pub mod register;

pub use csr::{Csr, CsrError, CsrFile};
pub use format::{Format, OperandKind};
pub use instruction::{InstructionDef, InstructionSet, Operand, RenderError};
pub use label::{Label, LabelError};
pub use register::{
    Bank, RegId, Register, RegisterError, RegisterFile, RegisterQuery, SaveClass,
};
