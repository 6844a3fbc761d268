//! Program-assembly driver
//!
//! Sequences the generation loop: pick a random instruction definition,
//! source one operand of the required kind per slot from the register pool,
//! CSR catalog, label table, or immediate range, render the line, and append
//! it to the program buffer. All randomness flows from a single seeded
//! `ChaCha8Rng`, so a fixed seed reproduces a byte-identical program.

use crate::isa::{
    Bank, CsrError, CsrFile, Format, InstructionDef, InstructionSet, Label, LabelError, Operand,
    OperandKind, RegId, RegisterError, RegisterFile, RegisterQuery, RenderError,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced by the generation driver
#[derive(Debug, Error)]
pub enum GenError {
    #[error("unknown instruction: {0}")]
    UnknownInstruction(String),
    #[error("label {0} already exists")]
    DuplicateLabel(String),
    #[error("no instruction matches the requested criteria")]
    NoInstruction,
    #[error(transparent)]
    Register(#[from] RegisterError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Csr(#[from] CsrError),
    #[error(transparent)]
    Label(#[from] LabelError),
    #[error("failed to write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Assembles randomized stimulus programs line by line
pub struct Assembler {
    rng: ChaCha8Rng,
    isa: InstructionSet,
    registers: RegisterFile,
    csrs: CsrFile,
    labels: BTreeMap<String, Label>,
    code: Vec<String>,
    next_label: u32,
}

impl Assembler {
    /// Create a driver over the standard catalogs
    ///
    /// An explicit seed makes every downstream pick reproducible; without one
    /// the generator is seeded from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        Assembler {
            rng,
            isa: InstructionSet::standard(),
            registers: RegisterFile::standard(),
            csrs: CsrFile::standard(),
            labels: BTreeMap::new(),
            code: Vec::new(),
            next_label: 0,
        }
    }

    pub fn isa(&self) -> &InstructionSet {
        &self.isa
    }

    pub fn isa_mut(&mut self) -> &mut InstructionSet {
        &mut self.isa
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn csrs_mut(&mut self) -> &mut CsrFile {
        &mut self.csrs
    }

    /// Emitted program lines, in emission order
    pub fn lines(&self) -> &[String] {
        &self.code
    }

    /// The whole program as text, one line per entry
    pub fn program(&self) -> String {
        let mut text = String::new();
        for line in &self.code {
            text.push_str(line);
            text.push('\n');
        }
        text
    }

    /// Render a named instruction with the given operands and append it
    pub fn push_instruction(
        &mut self,
        mnemonic: &str,
        operands: &[Operand],
    ) -> Result<(), GenError> {
        let line = self
            .isa
            .get(mnemonic)
            .ok_or_else(|| GenError::UnknownInstruction(mnemonic.to_string()))?
            .render(&self.registers, operands)?;
        self.code.push(line);
        Ok(())
    }

    /// Append a `# `-prefixed comment line
    pub fn push_comment(&mut self, text: &str) {
        self.code.push(format!("# {text}"));
    }

    /// Register a label name without emitting it
    pub fn define_label(&mut self, name: &str) -> Result<Label, GenError> {
        if self.labels.contains_key(name) {
            return Err(GenError::DuplicateLabel(name.to_string()));
        }
        let label = Label::new(name)?;
        self.labels.insert(name.to_string(), label.clone());
        Ok(label)
    }

    /// Emit a label definition line, defining the label first if needed
    pub fn place_label(&mut self, name: &str) -> Result<Label, GenError> {
        let label = match self.labels.get(name) {
            Some(label) => label.clone(),
            None => self.define_label(name)?,
        };
        self.code.push(format!("{label}:"));
        Ok(label)
    }

    /// Pick a register from the pool using the driver's RNG
    pub fn pick_register(
        &mut self,
        query: &RegisterQuery,
        mark_reserved: bool,
    ) -> Result<RegId, GenError> {
        Ok(self.registers.pick(&mut self.rng, query, mark_reserved)?)
    }

    /// Pick a random definition from an external catalog with the driver's RNG
    pub fn pick_from(&mut self, set: &InstructionSet) -> Option<InstructionDef> {
        set.pick_random(&mut self.rng, None, None, None).cloned()
    }

    /// Source one random operand value of the requested kind
    ///
    /// Registers come from the unreserved part of the matching bank, CSRs
    /// from the CSR catalog, immediates and offsets uniformly from the full
    /// unsigned 32-bit span, and labels are freshly defined with generated
    /// names.
    pub fn random_operand(&mut self, kind: OperandKind) -> Result<Operand, GenError> {
        match kind {
            OperandKind::Register => {
                let query = RegisterQuery::new()
                    .with_bank(Bank::Integer)
                    .with_reserved(false);
                Ok(Operand::Register(self.registers.pick(
                    &mut self.rng,
                    &query,
                    false,
                )?))
            }
            OperandKind::FRegister => {
                let query = RegisterQuery::new()
                    .with_bank(Bank::Float)
                    .with_reserved(false);
                Ok(Operand::Register(self.registers.pick(
                    &mut self.rng,
                    &query,
                    false,
                )?))
            }
            OperandKind::Csr => Ok(Operand::Csr(self.csrs.pick_random(&mut self.rng)?.clone())),
            OperandKind::Immediate => Ok(Operand::Immediate(
                self.rng.random_range(0..=u32::MAX),
            )),
            OperandKind::Label => Ok(Operand::Label(self.fresh_label()?)),
            OperandKind::BaseOffset => {
                let query = RegisterQuery::new()
                    .with_bank(Bank::Integer)
                    .with_reserved(false);
                let base = self.registers.pick(&mut self.rng, &query, false)?;
                let offset = self.rng.random_range(0..=u32::MAX);
                Ok(Operand::BaseOffset { base, offset })
            }
        }
    }

    /// Generate `count` random instructions and append them
    ///
    /// The candidate set follows `InstructionSet::pick_random`: an explicit
    /// mnemonic list wins over the extension/format predicates. Returns the
    /// number of lines appended.
    pub fn generate(
        &mut self,
        count: usize,
        extension: Option<&str>,
        format: Option<&Format>,
        mnemonics: Option<&[&str]>,
    ) -> Result<usize, GenError> {
        for _ in 0..count {
            let def = self
                .isa
                .pick_random(&mut self.rng, extension, format, mnemonics)
                .cloned()
                .ok_or(GenError::NoInstruction)?;
            let mut operands = Vec::with_capacity(def.format().arity());
            for kind in def.format().kinds() {
                operands.push(self.random_operand(*kind)?);
            }
            let line = def.render(&self.registers, &operands)?;
            self.code.push(line);
        }
        Ok(count)
    }

    /// Clear allocation state so the pool can serve another pass
    pub fn reset_registers(&self) {
        self.registers.reset_all();
    }

    /// Write the program to a file, one line per entry
    pub fn write_to_file(&self, path: &Path) -> Result<(), GenError> {
        fs::write(path, self.program()).map_err(|source| GenError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn fresh_label(&mut self) -> Result<Label, GenError> {
        // Monotonic names keep seeded runs reproducible and collision-free;
        // skip over names the caller defined by hand.
        loop {
            let name = format!("label_{}", self.next_label);
            self.next_label += 1;
            if !self.labels.contains_key(&name) {
                return self.define_label(&name);
            }
        }
    }
}
