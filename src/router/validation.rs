//! Field validation errors with a fixed hint vocabulary.
//!
//! The rendered form is what clients see on a 400 caused by validation:
//!
//! ```text
//! validation errors found:
//! - field 'name' is left empty
//! - field 'password' should be at least 8 characters long
//! ```

use std::collections::BTreeMap;
use std::fmt;

/// What is wrong with a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    MissingOrZero,
    EmptyString,
    IncorrectFormat,
    MinimumLength8,
}

impl Hint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hint::MissingOrZero => "is missing or zero",
            Hint::EmptyString => "is left empty",
            Hint::IncorrectFormat => "has incorrect format",
            Hint::MinimumLength8 => "should be at least 8 characters long",
        }
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulated validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    hints: BTreeMap<String, Vec<Hint>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed constraint for `field`.
    pub fn hint(&mut self, field: impl Into<String>, hint: Hint) {
        self.hints.entry(field.into()).or_default().push(hint);
    }

    /// Whether any field failed.
    pub fn has_errors(&self) -> bool {
        !self.hints.is_empty()
    }

    /// `Err(self)` if any field failed, otherwise `Ok(())`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.has_errors() {
            Err(self)
        } else {
            Ok(())
        }
    }

    /// Hints recorded for one field.
    pub fn hints_for(&self, field: &str) -> &[Hint] {
        self.hints.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hints.is_empty() {
            return Ok(());
        }
        writeln!(f, "validation errors found:")?;
        for (field, hints) in &self.hints {
            for hint in hints {
                writeln!(f, "- field '{}' {}", field, hint)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
