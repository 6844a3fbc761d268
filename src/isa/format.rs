//! Operand kinds and instruction formats
//!
//! A format is a named, ordered sequence of operand kinds. Two formats are
//! equal exactly when their kind sequences are equal, regardless of name, so
//! catalog filters compare structure rather than identity.

use std::fmt;
use std::sync::Arc;

/// The kinds of operand an instruction slot can require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// General-purpose (integer bank) register
    Register,
    /// Floating-point bank register
    FRegister,
    /// Integer literal, rendered in hex
    Immediate,
    /// Symbolic label reference
    Label,
    /// Control/status register reference
    Csr,
    /// Register plus integer offset pair, rendered `offset(base)`
    BaseOffset,
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandKind::Register => write!(f, "REGISTER"),
            OperandKind::FRegister => write!(f, "FREGISTER"),
            OperandKind::Immediate => write!(f, "IMMEDIATE"),
            OperandKind::Label => write!(f, "LABEL"),
            OperandKind::Csr => write!(f, "CSR"),
            OperandKind::BaseOffset => write!(f, "BASE_OFFSET"),
        }
    }
}

const R_KINDS: &[OperandKind] = &[
    OperandKind::Register,
    OperandKind::Register,
    OperandKind::Register,
];
const I_KINDS: &[OperandKind] = &[
    OperandKind::Register,
    OperandKind::Register,
    OperandKind::Immediate,
];
const B_KINDS: &[OperandKind] = &[
    OperandKind::Register,
    OperandKind::Register,
    OperandKind::Label,
];
const U_KINDS: &[OperandKind] = &[OperandKind::Register, OperandKind::Immediate];
const J_KINDS: &[OperandKind] = &[OperandKind::Register, OperandKind::Label];
const FR_KINDS: &[OperandKind] = &[
    OperandKind::FRegister,
    OperandKind::FRegister,
    OperandKind::FRegister,
];
const CSR_R_KINDS: &[OperandKind] = &[
    OperandKind::Register,
    OperandKind::Csr,
    OperandKind::Register,
];
const CSR_I_KINDS: &[OperandKind] = &[
    OperandKind::Register,
    OperandKind::Csr,
    OperandKind::Immediate,
];
const LOAD_STORE_KINDS: &[OperandKind] = &[OperandKind::Register, OperandKind::BaseOffset];

/// A named, ordered sequence of operand kinds
///
/// The kind sequence is immutable and shared; cloning a format is cheap.
/// Equality and hashing consider only the kind sequence.
#[derive(Debug, Clone)]
pub struct Format {
    name: Arc<str>,
    kinds: Arc<[OperandKind]>,
}

impl Format {
    /// Create a custom format from a name and operand-kind sequence
    pub fn new(name: &str, kinds: Vec<OperandKind>) -> Self {
        Format {
            name: Arc::from(name),
            kinds: Arc::from(kinds),
        }
    }

    fn stock(name: &str, kinds: &'static [OperandKind]) -> Self {
        Format {
            name: Arc::from(name),
            kinds: Arc::from(kinds),
        }
    }

    /// R-type: rd, rs1, rs2
    pub fn r() -> Self {
        Self::stock("R", R_KINDS)
    }

    /// I-type: rd, rs1, imm
    pub fn i() -> Self {
        Self::stock("I", I_KINDS)
    }

    /// B-type: rs1, rs2, label
    pub fn b() -> Self {
        Self::stock("B", B_KINDS)
    }

    /// U-type: rd, imm
    pub fn u() -> Self {
        Self::stock("U", U_KINDS)
    }

    /// J-type: rd, label
    pub fn j() -> Self {
        Self::stock("J", J_KINDS)
    }

    /// Float R-type: fd, fs1, fs2
    pub fn fr() -> Self {
        Self::stock("FR", FR_KINDS)
    }

    /// CSR register form: rd, csr, rs1
    pub fn csr_r() -> Self {
        Self::stock("CSR_R", CSR_R_KINDS)
    }

    /// CSR immediate form: rd, csr, imm
    pub fn csr_i() -> Self {
        Self::stock("CSR_I", CSR_I_KINDS)
    }

    /// Load/store form: rd, offset(base)
    pub fn load_store() -> Self {
        Self::stock("LOAD_STORE", LOAD_STORE_KINDS)
    }

    /// Display name of this format
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ordered operand-kind sequence
    pub fn kinds(&self) -> &[OperandKind] {
        &self.kinds
    }

    /// Number of operands this format requires
    pub fn arity(&self) -> usize {
        self.kinds.len()
    }
}

impl PartialEq for Format {
    fn eq(&self, other: &Self) -> bool {
        // Structural: the whole kind sequence, not the name.
        self.kinds == other.kinds
    }
}

impl Eq for Format {}

impl std::hash::Hash for Format {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.kinds.hash(state);
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.name)?;
        for (i, kind) in self.kinds.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", kind)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_format_arity() {
        assert_eq!(Format::r().arity(), 3);
        assert_eq!(Format::i().arity(), 3);
        assert_eq!(Format::u().arity(), 2);
        assert_eq!(Format::j().arity(), 2);
        assert_eq!(Format::load_store().arity(), 2);
    }

    #[test]
    fn test_format_equality_is_structural() {
        let custom = Format::new(
            "THREE_REG",
            vec![
                OperandKind::Register,
                OperandKind::Register,
                OperandKind::Register,
            ],
        );
        assert_eq!(custom, Format::r());
        assert_ne!(Format::r(), Format::i());
        assert_ne!(Format::r(), Format::fr());
    }

    #[test]
    fn test_format_equality_full_sequence() {
        // A prefix of another format's kinds must not compare equal.
        let prefix = Format::new("RR", vec![OperandKind::Register, OperandKind::Register]);
        assert_ne!(prefix, Format::r());
    }

    #[test]
    fn test_format_display() {
        assert_eq!(format!("{}", Format::r()), "R: REGISTER, REGISTER, REGISTER");
        assert_eq!(
            format!("{}", Format::load_store()),
            "LOAD_STORE: REGISTER, BASE_OFFSET"
        );
    }

    #[test]
    fn test_operand_kind_display() {
        assert_eq!(format!("{}", OperandKind::Immediate), "IMMEDIATE");
        assert_eq!(format!("{}", OperandKind::BaseOffset), "BASE_OFFSET");
    }
}
