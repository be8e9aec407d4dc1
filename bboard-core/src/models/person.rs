//! Person input validation

use super::validation::{bounded_trimmed, ValidationError};

/// Maximum length for names, usernames and student ids
const MAX_PERSON_FIELD_LEN: usize = 64;

/// Validated username (unique handle of a person)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Create a username, trimming surrounding whitespace.
    ///
    /// # Example
    /// ```
    /// use bboard_core::models::Username;
    ///
    /// assert_eq!(Username::new(" ada ").unwrap().as_str(), "ada");
    /// assert!(Username::new("").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        bounded_trimmed(s, "username", MAX_PERSON_FIELD_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Registration request with every field validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    name: String,
    username: Username,
    student_id: Option<String>,
}

impl NewPerson {
    /// Validate a registration.
    ///
    /// # Rules
    /// - Name and username are required (non-blank, max 64 characters)
    /// - Student id is optional, but when given it must not be blank
    pub fn new(
        name: &str,
        username: &str,
        student_id: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let name = bounded_trimmed(name, "name", MAX_PERSON_FIELD_LEN)?;
        let username = Username::new(username)?;
        let student_id = student_id
            .map(|id| bounded_trimmed(id, "student id", MAX_PERSON_FIELD_LEN))
            .transpose()?;

        Ok(Self {
            name,
            username,
            student_id,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn student_id(&self) -> Option<&str> {
        self.student_id.as_deref()
    }
}
