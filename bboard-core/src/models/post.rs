//! Post text and position validation

use super::ValidationError;

/// Maximum length for post text (64KB)
const MAX_TEXT_LEN: usize = 65536;

/// Validated post text. Kept verbatim; only blank text is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostText(String);

impl PostText {
    /// Create post text.
    ///
    /// # Rules
    /// - Must contain something other than whitespace
    /// - Max 64KB (65536 bytes)
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.trim().is_empty() {
            return Err(ValidationError::Empty { field: "text" });
        }

        if s.len() > MAX_TEXT_LEN {
            return Err(ValidationError::TooLong {
                field: "text",
                max: MAX_TEXT_LEN,
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 1-based position of a post within its topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position(i64);

impl Position {
    pub const FIRST: Self = Self(1);

    pub fn new(position: i64) -> Result<Self, ValidationError> {
        if position < 1 {
            return Err(ValidationError::InvalidPosition { position });
        }
        Ok(Self(position))
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// Zero-based offset for `LIMIT 1 OFFSET n` style lookups.
    pub fn offset(self) -> i64 {
        self.0 - 1
    }
}
