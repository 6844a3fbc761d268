//! Instruction definitions and the instruction catalog
//!
//! An `InstructionDef` pairs a mnemonic with an operand format and an
//! extension tag, and renders validated operand tuples to assembly text.
//! The `InstructionSet` catalog supports structural filtering and seeded
//! random selection.

use crate::isa::csr::Csr;
use crate::isa::format::{Format, OperandKind};
use crate::isa::label::Label;
use crate::isa::register::{Bank, RegId, RegisterFile};
use rand::Rng;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors from rendering an operand tuple against a format
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("{mnemonic} expects {expected} operands but got {got}")]
    ArityMismatch {
        mnemonic: String,
        expected: usize,
        got: usize,
    },
    #[error("operand {position} of {mnemonic}: expected {expected}, got {found}")]
    OperandTypeMismatch {
        mnemonic: String,
        /// 1-based operand position
        position: usize,
        expected: OperandKind,
        found: String,
    },
}

/// A concrete operand value supplied to `render`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A register drawn from a pool (either bank; render checks the bank)
    Register(RegId),
    /// Integer literal
    Immediate(u32),
    /// Symbolic label reference
    Label(Label),
    /// CSR entry
    Csr(Csr),
    /// Base register plus byte offset
    BaseOffset { base: RegId, offset: u32 },
}

impl Operand {
    fn describe(&self, regs: &RegisterFile) -> String {
        match self {
            Operand::Register(id) => {
                let reg = regs.get(*id);
                match reg.bank() {
                    Bank::Integer => format!("integer register {}", reg.name()),
                    Bank::Float => format!("float register {}", reg.name()),
                }
            }
            Operand::Immediate(v) => format!("immediate {v:#x}"),
            Operand::Label(l) => format!("label {}", l.name()),
            Operand::Csr(c) => format!("csr {}", c.name()),
            Operand::BaseOffset { base, offset } => {
                format!("base/offset {}({})", offset, regs.get(*base).name())
            }
        }
    }
}

/// An immutable instruction definition: mnemonic, format, extension tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionDef {
    mnemonic: String,
    format: Format,
    extension: String,
}

impl InstructionDef {
    pub fn new(mnemonic: &str, format: Format, extension: &str) -> Self {
        InstructionDef {
            mnemonic: mnemonic.to_uppercase(),
            format,
            extension: extension.to_string(),
        }
    }

    /// Mnemonic in canonical (uppercase) form
    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Render an operand tuple as an assembly line
    ///
    /// Every operand is validated in order against the format's kind at that
    /// position; a mismatch never coerces, it fails with the 1-based
    /// position. A failed render leaves no trace anywhere.
    pub fn render(
        &self,
        regs: &RegisterFile,
        operands: &[Operand],
    ) -> Result<String, RenderError> {
        if operands.len() != self.format.arity() {
            return Err(RenderError::ArityMismatch {
                mnemonic: self.mnemonic.clone(),
                expected: self.format.arity(),
                got: operands.len(),
            });
        }
        let mut rendered = Vec::with_capacity(operands.len());
        for (i, (kind, operand)) in self.format.kinds().iter().zip(operands).enumerate() {
            let text = match (kind, operand) {
                (OperandKind::Register, Operand::Register(id))
                    if regs.get(*id).bank() == Bank::Integer =>
                {
                    regs.get(*id).abi_name().to_string()
                }
                (OperandKind::FRegister, Operand::Register(id))
                    if regs.get(*id).bank() == Bank::Float =>
                {
                    regs.get(*id).abi_name().to_string()
                }
                (OperandKind::Csr, Operand::Csr(csr)) => csr.name().to_string(),
                (OperandKind::Label, Operand::Label(label)) => label.name().to_string(),
                (OperandKind::Immediate, Operand::Immediate(value)) => format!("{value:#x}"),
                (OperandKind::BaseOffset, Operand::BaseOffset { base, offset }) => {
                    format!("{}({})", offset, regs.get(*base).abi_name())
                }
                (kind, operand) => {
                    return Err(RenderError::OperandTypeMismatch {
                        mnemonic: self.mnemonic.clone(),
                        position: i + 1,
                        expected: *kind,
                        found: operand.describe(regs),
                    });
                }
            };
            rendered.push(text);
        }
        Ok(format!(
            "{} {}",
            self.mnemonic.to_lowercase(),
            rendered.join(", ")
        ))
    }
}

impl fmt::Display for InstructionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - Format: {} - Extension: {}",
            self.mnemonic, self.format, self.extension
        )
    }
}

/// Catalog of instruction definitions keyed by mnemonic
///
/// Backed by an ordered map so seeded random picks replay identically.
#[derive(Debug, Clone)]
pub struct InstructionSet {
    defs: BTreeMap<String, InstructionDef>,
}

impl InstructionSet {
    pub fn empty() -> Self {
        InstructionSet {
            defs: BTreeMap::new(),
        }
    }

    /// The stock catalog
    pub fn standard() -> Self {
        let mut set = Self::empty();
        set.insert(InstructionDef::new("ADD", Format::r(), "I"));
        set.insert(InstructionDef::new("XOR", Format::r(), "I"));
        set.insert(InstructionDef::new("ADDI", Format::i(), "I"));
        set.insert(InstructionDef::new("SW", Format::load_store(), "I"));
        set.insert(InstructionDef::new("BEQ", Format::b(), "I"));
        set.insert(InstructionDef::new("LUI", Format::u(), "I"));
        set.insert(InstructionDef::new("JAL", Format::j(), "I"));
        set.insert(InstructionDef::new("FADD.S", Format::fr(), "F"));
        set.insert(InstructionDef::new("CSRRW", Format::csr_r(), "I"));
        set.insert(InstructionDef::new("CSRRCI", Format::csr_i(), "I"));
        set.insert(InstructionDef::new("LW", Format::load_store(), "I"));
        set
    }

    pub fn insert(&mut self, def: InstructionDef) {
        self.defs.insert(def.mnemonic().to_string(), def);
    }

    /// Union with another catalog; the other side wins on mnemonic clashes
    pub fn merge(&mut self, other: InstructionSet) {
        self.defs.extend(other.defs);
    }

    /// Case-insensitive lookup by mnemonic
    pub fn get(&self, mnemonic: &str) -> Option<&InstructionDef> {
        self.defs.get(&mnemonic.to_uppercase())
    }

    fn matches(
        def: &InstructionDef,
        extension: Option<&str>,
        mnemonic: Option<&str>,
        format: Option<&Format>,
    ) -> bool {
        extension.is_none_or(|e| def.extension() == e)
            && mnemonic.is_none_or(|m| def.mnemonic() == m.to_uppercase())
            && format.is_none_or(|f| def.format() == f)
    }

    /// Narrow to definitions matching all supplied predicates (ANDed)
    ///
    /// Format comparison is full-sequence structural equality. No predicates
    /// yields an equivalent full copy.
    pub fn filter(
        &self,
        extension: Option<&str>,
        mnemonic: Option<&str>,
        format: Option<&Format>,
    ) -> InstructionSet {
        InstructionSet {
            defs: self
                .defs
                .iter()
                .filter(|(_, def)| Self::matches(def, extension, mnemonic, format))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Pick a uniformly random definition
    ///
    /// An explicit mnemonic list restricts candidates to list entries that
    /// exist in the catalog (absent entries are silently dropped); otherwise
    /// the extension/format predicates apply. An empty candidate set yields
    /// `None`.
    pub fn pick_random<R: Rng>(
        &self,
        rng: &mut R,
        extension: Option<&str>,
        format: Option<&Format>,
        mnemonics: Option<&[&str]>,
    ) -> Option<&InstructionDef> {
        let candidates: Vec<&InstructionDef> = match mnemonics {
            Some(list) => list.iter().filter_map(|m| self.get(m)).collect(),
            None => self
                .defs
                .values()
                .filter(|def| Self::matches(def, extension, None, format))
                .collect(),
        };
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.random_range(0..candidates.len())])
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstructionDef> {
        self.defs.values()
    }
}

impl Default for InstructionSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Display for InstructionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, def) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", def)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::register::{Register, SaveClass};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Pool with raw names and no custom ABI aliases
    fn plain_pool() -> RegisterFile {
        RegisterFile::new(vec![
            Register::new("x10", None, Bank::Integer, SaveClass::CallerSaved).unwrap(),
            Register::new("x11", None, Bank::Integer, SaveClass::CallerSaved).unwrap(),
            Register::new("x12", None, Bank::Integer, SaveClass::CallerSaved).unwrap(),
            Register::new("f1", None, Bank::Float, SaveClass::CallerSaved).unwrap(),
        ])
    }

    fn id(pool: &RegisterFile, name: &str) -> RegId {
        pool.get_by_name(name).unwrap()
    }

    #[test]
    fn test_render_add_plain_names() {
        let pool = plain_pool();
        let add = InstructionSet::standard().get("ADD").cloned().unwrap();
        let line = add
            .render(
                &pool,
                &[
                    Operand::Register(id(&pool, "x10")),
                    Operand::Register(id(&pool, "x11")),
                    Operand::Register(id(&pool, "x10")),
                ],
            )
            .unwrap();
        assert_eq!(line, "add x10, x11, x10");
    }

    #[test]
    fn test_render_addi_hex_immediate() {
        let pool = plain_pool();
        let addi = InstructionSet::standard().get("ADDI").cloned().unwrap();
        let line = addi
            .render(
                &pool,
                &[
                    Operand::Register(id(&pool, "x10")),
                    Operand::Register(id(&pool, "x11")),
                    Operand::Immediate(5),
                ],
            )
            .unwrap();
        assert_eq!(line, "addi x10, x11, 0x5");
    }

    #[test]
    fn test_render_uses_abi_alias() {
        let pool = RegisterFile::standard();
        let add = InstructionSet::standard().get("ADD").cloned().unwrap();
        let line = add
            .render(
                &pool,
                &[
                    Operand::Register(id(&pool, "x10")),
                    Operand::Register(id(&pool, "x11")),
                    Operand::Register(id(&pool, "x10")),
                ],
            )
            .unwrap();
        assert_eq!(line, "add a0, a1, a0");
    }

    #[test]
    fn test_render_immediate_in_register_slot() {
        let pool = plain_pool();
        let add = InstructionSet::standard().get("ADD").cloned().unwrap();
        let err = add
            .render(
                &pool,
                &[
                    Operand::Register(id(&pool, "x10")),
                    Operand::Register(id(&pool, "x11")),
                    Operand::Immediate(5),
                ],
            )
            .unwrap_err();
        match err {
            RenderError::OperandTypeMismatch {
                position, expected, ..
            } => {
                assert_eq!(position, 3);
                assert_eq!(expected, OperandKind::Register);
            }
            other => panic!("expected type mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_render_bank_mismatch() {
        let pool = plain_pool();
        let add = InstructionSet::standard().get("ADD").cloned().unwrap();
        let err = add
            .render(
                &pool,
                &[
                    Operand::Register(id(&pool, "x10")),
                    Operand::Register(id(&pool, "f1")),
                    Operand::Register(id(&pool, "x11")),
                ],
            )
            .unwrap_err();
        match err {
            RenderError::OperandTypeMismatch {
                position, found, ..
            } => {
                assert_eq!(position, 2);
                assert_eq!(found, "float register f1");
            }
            other => panic!("expected type mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_render_arity_mismatch() {
        let pool = plain_pool();
        let add = InstructionSet::standard().get("ADD").cloned().unwrap();
        let err = add
            .render(&pool, &[Operand::Register(id(&pool, "x10"))])
            .unwrap_err();
        assert_eq!(
            err,
            RenderError::ArityMismatch {
                mnemonic: "ADD".to_string(),
                expected: 3,
                got: 1,
            }
        );
    }

    #[test]
    fn test_render_load_store_and_csr() {
        let pool = plain_pool();
        let set = InstructionSet::standard();
        let sw = set.get("sw").cloned().unwrap();
        let line = sw
            .render(
                &pool,
                &[
                    Operand::Register(id(&pool, "x10")),
                    Operand::BaseOffset {
                        base: id(&pool, "x11"),
                        offset: 16,
                    },
                ],
            )
            .unwrap();
        assert_eq!(line, "sw x10, 16(x11)");

        let csrrw = set.get("CSRRW").cloned().unwrap();
        let line = csrrw
            .render(
                &pool,
                &[
                    Operand::Register(id(&pool, "x10")),
                    Operand::Csr(Csr::new("mstatus", "Machine status register", 0x300)),
                    Operand::Register(id(&pool, "x11")),
                ],
            )
            .unwrap();
        assert_eq!(line, "csrrw x10, mstatus, x11");
    }

    #[test]
    fn test_render_label_and_float() {
        let pool = plain_pool();
        let set = InstructionSet::standard();
        let jal = set.get("JAL").cloned().unwrap();
        let line = jal
            .render(
                &pool,
                &[
                    Operand::Register(id(&pool, "x10")),
                    Operand::Label(Label::new("loop_head").unwrap()),
                ],
            )
            .unwrap();
        assert_eq!(line, "jal x10, loop_head");

        let fadd = set.get("FADD.S").cloned().unwrap();
        let f1 = Operand::Register(id(&pool, "f1"));
        let line = fadd.render(&pool, &[f1.clone(), f1.clone(), f1]).unwrap();
        assert_eq!(line, "fadd.s f1, f1, f1");
    }

    #[test]
    fn test_render_is_deterministic() {
        let pool = plain_pool();
        let add = InstructionSet::standard().get("ADD").cloned().unwrap();
        let ops = [
            Operand::Register(id(&pool, "x10")),
            Operand::Register(id(&pool, "x11")),
            Operand::Register(id(&pool, "x12")),
        ];
        assert_eq!(add.render(&pool, &ops), add.render(&pool, &ops));
    }

    #[test]
    fn test_filter_by_extension() {
        let set = InstructionSet::standard();
        let floats = set.filter(Some("F"), None, None);
        assert_eq!(floats.len(), 1);
        assert!(floats.get("FADD.S").is_some());
    }

    #[test]
    fn test_filter_by_format_full_equality() {
        let set = InstructionSet::standard();
        let r_type = set.filter(None, None, Some(&Format::r()));
        let names: Vec<&str> = r_type.iter().map(|d| d.mnemonic()).collect();
        assert_eq!(names, vec!["ADD", "XOR"]);
        // FR has the same arity but different kinds; it must not leak in.
        assert!(r_type.get("FADD.S").is_none());
    }

    #[test]
    fn test_filter_no_predicates_is_full_copy() {
        let set = InstructionSet::standard();
        let copy = set.filter(None, None, None);
        assert_eq!(copy.len(), set.len());
    }

    #[test]
    fn test_filter_by_mnemonic_case_insensitive() {
        let set = InstructionSet::standard();
        let only = set.filter(None, Some("addi"), None);
        assert_eq!(only.len(), 1);
    }

    #[test]
    fn test_pick_random_respects_format() {
        let set = InstructionSet::standard();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..30 {
            let def = set
                .pick_random(&mut rng, None, Some(&Format::load_store()), None)
                .unwrap();
            assert!(def.mnemonic() == "SW" || def.mnemonic() == "LW");
        }
    }

    #[test]
    fn test_pick_random_mnemonic_list_drops_unknown() {
        let set = InstructionSet::standard();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..30 {
            let def = set
                .pick_random(&mut rng, None, None, Some(&["ADD", "NOT_AN_INSTR"]))
                .unwrap();
            assert_eq!(def.mnemonic(), "ADD");
        }
    }

    #[test]
    fn test_pick_random_empty_is_none() {
        let set = InstructionSet::standard();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        assert!(set.pick_random(&mut rng, Some("V"), None, None).is_none());
        assert!(set
            .pick_random(&mut rng, None, None, Some(&["NOT_AN_INSTR"]))
            .is_none());
    }
}
