//! RISC-V register catalog and allocation pool
//!
//! A `RegisterFile` is a view over a shared arena of register records.
//! Filtering produces a new view with a narrowed member list over the same
//! arena, so reservation and in-use marks made through any view are visible
//! through every view. Records are addressed by stable `RegId` indices.
//!
//! Single-threaded by construction (`Rc` + `Cell`); a multi-worker consumer
//! builds one file per worker.

use rand::Rng;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Register bank: integer (`x`) or floating-point (`f`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bank {
    Integer,
    Float,
}

impl Bank {
    /// Architectural name prefix for this bank
    pub fn prefix(&self) -> char {
        match self {
            Bank::Integer => 'x',
            Bank::Float => 'f',
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bank::Integer => write!(f, "X"),
            Bank::Float => write!(f, "F"),
        }
    }
}

/// Calling-convention save class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveClass {
    CallerSaved,
    CalleeSaved,
    SystemReserved,
}

impl fmt::Display for SaveClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveClass::CallerSaved => write!(f, "caller"),
            SaveClass::CalleeSaved => write!(f, "callee"),
            SaveClass::SystemReserved => write!(f, "system"),
        }
    }
}

/// Errors from register construction and pool operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// Name does not match `^(x|f)[0-9]+$` or disagrees with the bank
    #[error("invalid register name: {0}")]
    InvalidName(String),
    /// A filter or pick found no eligible register
    #[error("no registers matching the filter were found")]
    NoMatch,
    /// Name-based lookup miss where existence is required
    #[error("unknown register: {0}")]
    Unknown(String),
}

/// Stable index of a register record within its arena
///
/// Two ids obtained from views over the same arena compare equal exactly when
/// they address the same underlying record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegId(usize);

/// A physical register: immutable identity plus mutable allocation flags
#[derive(Debug)]
pub struct Register {
    name: String,
    abi_name: String,
    bank: Bank,
    save_class: SaveClass,
    reserved: Cell<bool>,
    in_use: Cell<bool>,
}

impl Register {
    /// Create a register, validating the architectural name
    ///
    /// The name must be the bank prefix (`x` or `f`) followed by digits.
    /// When `abi_name` is `None` the ABI alias defaults to the architectural
    /// name.
    pub fn new(
        name: &str,
        abi_name: Option<&str>,
        bank: Bank,
        save_class: SaveClass,
    ) -> Result<Self, RegisterError> {
        let digits = match name.strip_prefix(bank.prefix()) {
            Some(rest) => rest,
            None => return Err(RegisterError::InvalidName(name.to_string())),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RegisterError::InvalidName(name.to_string()));
        }
        Ok(Register {
            name: name.to_string(),
            abi_name: abi_name.unwrap_or(name).to_string(),
            bank,
            save_class,
            reserved: Cell::new(false),
            in_use: Cell::new(false),
        })
    }

    fn with_reserved(self, reserved: bool) -> Self {
        self.reserved.set(reserved);
        self
    }

    /// Architectural name, e.g. `x5`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Calling-convention alias, e.g. `t0`
    pub fn abi_name(&self) -> &str {
        &self.abi_name
    }

    pub fn bank(&self) -> Bank {
        self.bank
    }

    pub fn save_class(&self) -> SaveClass {
        self.save_class
    }

    /// Excluded from ordinary allocation by policy
    pub fn is_reserved(&self) -> bool {
        self.reserved.get()
    }

    /// Currently holding a live value in the generated sequence
    pub fn is_in_use(&self) -> bool {
        self.in_use.get()
    }

    fn matches(&self, query: &RegisterQuery) -> bool {
        query.bank.is_none_or(|b| self.bank == b)
            && query.save_class.is_none_or(|s| self.save_class == s)
            && query.reserved.is_none_or(|r| self.reserved.get() == r)
            && query.in_use.is_none_or(|u| self.in_use.get() == u)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}({})  saved-by: {}  reserved: {}  in-use: {}",
            self.bank,
            self.name,
            self.abi_name,
            self.save_class,
            if self.reserved.get() { "yes" } else { "no" },
            if self.in_use.get() { "yes" } else { "no" },
        )
    }
}

/// Filter predicates for pool queries; unset fields match everything,
/// set fields are ANDed
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterQuery {
    bank: Option<Bank>,
    save_class: Option<SaveClass>,
    reserved: Option<bool>,
    in_use: Option<bool>,
}

impl RegisterQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bank(mut self, bank: Bank) -> Self {
        self.bank = Some(bank);
        self
    }

    pub fn with_save_class(mut self, save_class: SaveClass) -> Self {
        self.save_class = Some(save_class);
        self
    }

    pub fn with_reserved(mut self, reserved: bool) -> Self {
        self.reserved = Some(reserved);
        self
    }

    pub fn with_in_use(mut self, in_use: bool) -> Self {
        self.in_use = Some(in_use);
        self
    }
}

/// A view over a shared arena of register records
#[derive(Debug, Clone)]
pub struct RegisterFile {
    arena: Rc<[Register]>,
    members: Vec<RegId>,
}

impl RegisterFile {
    /// Build a file owning a fresh arena
    ///
    /// Later entries replace earlier ones with the same architectural name,
    /// keeping names unique within the pool.
    pub fn new(registers: Vec<Register>) -> Self {
        let mut unique: Vec<Register> = Vec::with_capacity(registers.len());
        for reg in registers {
            if let Some(slot) = unique.iter_mut().find(|r| r.name == reg.name) {
                *slot = reg;
            } else {
                unique.push(reg);
            }
        }
        let members = (0..unique.len()).map(RegId).collect();
        RegisterFile {
            arena: Rc::from(unique),
            members,
        }
    }

    /// The standard RV32I + F register set with psABI aliases
    ///
    /// `x0..x4` (`zero`, `ra`, `sp`, `gp`, `tp`) start reserved so random
    /// allocation never hands them out.
    pub fn standard() -> Self {
        fn reg(name: String, abi: String, bank: Bank, save: SaveClass) -> Register {
            Register::new(&name, Some(&abi), bank, save)
                .expect("standard register table is well-formed")
        }
        use Bank::{Float, Integer};
        use SaveClass::{CalleeSaved, CallerSaved, SystemReserved};

        let mut regs = vec![
            reg("x0".into(), "zero".into(), Integer, CallerSaved).with_reserved(true),
            reg("x1".into(), "ra".into(), Integer, CallerSaved).with_reserved(true),
            reg("x2".into(), "sp".into(), Integer, SystemReserved).with_reserved(true),
            reg("x3".into(), "gp".into(), Integer, SystemReserved).with_reserved(true),
            reg("x4".into(), "tp".into(), Integer, SystemReserved).with_reserved(true),
        ];
        // Integer temporaries
        for i in 5..8 {
            regs.push(reg(format!("x{i}"), format!("t{}", i - 5), Integer, CallerSaved));
        }
        // Integer saved registers
        for i in 8..10 {
            regs.push(reg(format!("x{i}"), format!("s{}", i - 8), Integer, CalleeSaved));
        }
        // Integer arguments / return values
        for i in 10..18 {
            regs.push(reg(format!("x{i}"), format!("a{}", i - 10), Integer, CallerSaved));
        }
        // More integer saved registers
        for i in 18..28 {
            regs.push(reg(format!("x{i}"), format!("s{}", i - 16), Integer, CalleeSaved));
        }
        // More integer temporaries
        for i in 28..32 {
            regs.push(reg(format!("x{i}"), format!("t{}", i - 25), Integer, CallerSaved));
        }
        // Float temporaries
        for i in 0..8 {
            regs.push(reg(format!("f{i}"), format!("ft{i}"), Float, CallerSaved));
        }
        // Float saved registers
        for i in 8..10 {
            regs.push(reg(format!("f{i}"), format!("fs{}", i - 8), Float, CalleeSaved));
        }
        // Float arguments / return values
        for i in 10..18 {
            regs.push(reg(format!("f{i}"), format!("fa{}", i - 10), Float, CallerSaved));
        }
        // More float saved registers
        for i in 18..28 {
            regs.push(reg(format!("f{i}"), format!("fs{}", i - 16), Float, CalleeSaved));
        }
        // More float temporaries
        for i in 28..32 {
            regs.push(reg(format!("f{i}"), format!("ft{}", i - 20), Float, CallerSaved));
        }
        RegisterFile::new(regs)
    }

    fn view(&self, members: Vec<RegId>) -> Self {
        RegisterFile {
            arena: Rc::clone(&self.arena),
            members,
        }
    }

    /// Resolve an id to its record
    pub fn get(&self, id: RegId) -> &Register {
        &self.arena[id.0]
    }

    /// Iterate the members of this view in stable order
    pub fn iter(&self) -> impl Iterator<Item = (RegId, &Register)> {
        self.members.iter().map(move |&id| (id, self.get(id)))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Narrow to the members matching all set predicates
    ///
    /// An empty result is an error, never an empty pool: callers must handle
    /// exhaustion explicitly.
    pub fn filter(&self, query: &RegisterQuery) -> Result<RegisterFile, RegisterError> {
        let members: Vec<RegId> = self
            .members
            .iter()
            .copied()
            .filter(|&id| self.get(id).matches(query))
            .collect();
        if members.is_empty() {
            return Err(RegisterError::NoMatch);
        }
        Ok(self.view(members))
    }

    /// Pick a random matching register and mark it in use
    ///
    /// Prefers registers not currently in use; when every candidate is live,
    /// falls back to recycling one rather than failing. With `mark_reserved`
    /// the pick is also excluded from future allocation.
    pub fn pick<R: Rng>(
        &self,
        rng: &mut R,
        query: &RegisterQuery,
        mark_reserved: bool,
    ) -> Result<RegId, RegisterError> {
        let filtered = self.filter(query)?;
        let unused: Vec<RegId> = filtered
            .members
            .iter()
            .copied()
            .filter(|&id| !self.get(id).is_in_use())
            .collect();
        let candidates = if unused.is_empty() {
            &filtered.members
        } else {
            &unused
        };
        let id = candidates[rng.random_range(0..candidates.len())];
        let reg = self.get(id);
        reg.in_use.set(true);
        if mark_reserved {
            reg.reserved.set(true);
        }
        Ok(id)
    }

    /// Reserve a register by architectural name or ABI alias
    pub fn reserve(&self, name: &str) -> Result<RegId, RegisterError> {
        let id = self
            .get_by_name(name)
            .ok_or_else(|| RegisterError::Unknown(name.to_string()))?;
        self.get(id).reserved.set(true);
        Ok(id)
    }

    /// Look up by architectural name first, then by ABI alias
    pub fn get_by_name(&self, name: &str) -> Option<RegId> {
        self.members
            .iter()
            .copied()
            .find(|&id| self.get(id).name == name)
            .or_else(|| {
                self.members
                    .iter()
                    .copied()
                    .find(|&id| self.get(id).abi_name == name)
            })
    }

    /// Clear both flags on every member, recycling the pool for a new pass
    pub fn reset_all(&self) {
        for (_, reg) in self.iter() {
            reg.reserved.set(false);
            reg.in_use.set(false);
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Display for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (_, reg)) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", reg)?;
        }
        Ok(())
    }
}
