//! Control/status register catalog
//!
//! A static name/address lookup table with add/remove/random-pick
//! operations. Entries are keyed by uppercased name so lookups are
//! case-insensitive; the underlying map is ordered so seeded random picks
//! are reproducible.

use rand::Rng;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors from CSR catalog operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsrError {
    #[error("no CSR named {0} found")]
    Unknown(String),
    #[error("no CSRs available to pick from")]
    Empty,
}

/// A single control/status register entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Csr {
    name: String,
    description: String,
    address: u16,
}

impl Csr {
    pub fn new(name: &str, description: &str, address: u16) -> Self {
        Csr {
            name: name.to_string(),
            description: description.to_string(),
            address,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// 12-bit CSR address
    pub fn address(&self) -> u16 {
        self.address
    }
}

impl fmt::Display for Csr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:03x}): {}", self.name, self.address, self.description)
    }
}

/// The CSR namespace, keyed by uppercased name
#[derive(Debug, Clone)]
pub struct CsrFile {
    csrs: BTreeMap<String, Csr>,
}

impl CsrFile {
    /// An empty catalog
    pub fn empty() -> Self {
        CsrFile {
            csrs: BTreeMap::new(),
        }
    }

    /// The stock machine-mode entries
    pub fn standard() -> Self {
        let mut file = Self::empty();
        file.add("mstatus", "Machine status register", 0x300);
        file.add("mie", "Machine interrupt-enable register", 0x304);
        file.add("mtvec", "Machine trap-handler base address", 0x305);
        file
    }

    pub fn add(&mut self, name: &str, description: &str, address: u16) {
        self.csrs
            .insert(name.to_uppercase(), Csr::new(name, description, address));
    }

    pub fn remove(&mut self, name: &str) -> Result<(), CsrError> {
        self.csrs
            .remove(&name.to_uppercase())
            .map(|_| ())
            .ok_or_else(|| CsrError::Unknown(name.to_string()))
    }

    /// Retrieve an entry by name (case-insensitive)
    pub fn get(&self, name: &str) -> Result<&Csr, CsrError> {
        self.csrs
            .get(&name.to_uppercase())
            .ok_or_else(|| CsrError::Unknown(name.to_string()))
    }

    /// Pick a uniformly random entry
    pub fn pick_random<R: Rng>(&self, rng: &mut R) -> Result<&Csr, CsrError> {
        if self.csrs.is_empty() {
            return Err(CsrError::Empty);
        }
        let idx = rng.random_range(0..self.csrs.len());
        Ok(self.csrs.values().nth(idx).expect("index bounded by len"))
    }

    /// Bulk-load entries from (name, description, address) tuples
    pub fn load(&mut self, entries: &[(&str, &str, u16)]) {
        for &(name, description, address) in entries {
            self.add(name, description, address);
        }
    }

    pub fn len(&self) -> usize {
        self.csrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.csrs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Csr> {
        self.csrs.values()
    }
}

impl Default for CsrFile {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Display for CsrFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, csr) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", csr)?;
        }
        Ok(())
    }
}
