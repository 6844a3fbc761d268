//! Symbolic labels
//!
//! Labels compare and hash by name only; address and comment are carried
//! metadata.

use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Errors from label construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("invalid label name: {0:?}")]
    InvalidName(String),
}

/// A symbolic reference point in the generated program
#[derive(Debug, Clone)]
pub struct Label {
    name: String,
    address: Option<u64>,
    comment: Option<String>,
}

impl Label {
    /// Create a label; the name must be non-empty and must not start with a
    /// digit
    pub fn new(name: &str) -> Result<Self, LabelError> {
        if !Self::is_valid_name(name) {
            return Err(LabelError::InvalidName(name.to_string()));
        }
        Ok(Label {
            name: name.to_string(),
            address: None,
            comment: None,
        })
    }

    /// Name validity check: the first character must not be a digit
    pub fn is_valid_name(name: &str) -> bool {
        match name.chars().next() {
            Some(first) => !first.is_ascii_digit(),
            None => false,
        }
    }

    pub fn with_address(mut self, address: u64) -> Self {
        self.address = Some(address);
        self
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Option<u64> {
        self.address
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(Label::new("loop").is_ok());
        assert!(Label::new("_start").is_ok());
        assert!(Label::new("label_42").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(
            Label::new("1loop"),
            Err(LabelError::InvalidName("1loop".to_string()))
        );
        assert!(Label::new("").is_err());
    }

    #[test]
    fn test_equality_is_name_based() {
        let a = Label::new("target").unwrap().with_address(0x1000);
        let b = Label::new("target").unwrap().with_comment("entry point");
        assert_eq!(a, b);
        assert_ne!(a, Label::new("other").unwrap());
    }

    #[test]
    fn test_display_renders_name() {
        assert_eq!(format!("{}", Label::new("done").unwrap()), "done");
    }
}
