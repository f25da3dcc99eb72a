// ABOUTME: Validated identifier type for info keys, assignment ids, and category keys
// ABOUTME: Replaces free-form strings so blank identifiers are rejected at construction

use crate::{GradebookError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// A trimmed, non-empty identifier such as `fname`, `hw1`, or `homework`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ident(String);

impl Ident {
    /// Key of the mandatory first-name info column
    pub const FNAME: &'static str = "fname";
    /// Key of the mandatory last-name info column
    pub const LNAME: &'static str = "lname";

    /// Create an identifier from text, trimming surrounding whitespace
    pub fn new(text: impl AsRef<str>) -> Result<Self> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            return Err(GradebookError::Config(
                "identifier must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Identifier of the first-name column
    pub fn fname() -> Self {
        Self(Self::FNAME.to_string())
    }

    /// Identifier of the last-name column
    pub fn lname() -> Self {
        Self(Self::LNAME.to_string())
    }

    /// The identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier contains internal whitespace
    pub fn has_whitespace(&self) -> bool {
        self.0.chars().any(|c| c.is_ascii_whitespace())
    }

    /// Whether the identifier is already lowercase
    pub fn is_lowercase(&self) -> bool {
        self.0 == self.0.to_lowercase()
    }

    /// Short names starting with `x` mark deliberately unused columns
    pub fn is_excluded(&self) -> bool {
        self.0.starts_with('x')
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Ident {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Ident {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Ident {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl TryFrom<String> for Ident {
    type Error = GradebookError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Ident {
    type Error = GradebookError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Ident> for String {
    fn from(value: Ident) -> Self {
        value.0
    }
}
