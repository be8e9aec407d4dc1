//! Forum and topic title validation

use super::validation::{bounded_trimmed, ValidationError};

/// Maximum length for forum and topic titles
const MAX_TITLE_LEN: usize = 256;

/// Validated forum title
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForumTitle(String);

impl ForumTitle {
    /// Create a forum title.
    ///
    /// # Rules
    /// - Non-empty (after trimming whitespace)
    /// - Max 256 characters
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        bounded_trimmed(s, "forum title", MAX_TITLE_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated topic title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicTitle(String);

impl TopicTitle {
    /// Create a topic title. Same rules as [`ForumTitle`].
    ///
    /// # Example
    /// ```
    /// use bboard_core::models::TopicTitle;
    ///
    /// assert!(TopicTitle::new("Hello").is_ok());
    /// assert!(TopicTitle::new("   ").is_err());  // whitespace only
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        bounded_trimmed(s, "topic title", MAX_TITLE_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
