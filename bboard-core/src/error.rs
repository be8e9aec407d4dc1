//! Error taxonomy for board operations.
//!
//! Every operation fails in one of two ways: a domain [`ErrorKind::Failure`]
//! (bad input, missing entity, uniqueness clash) or an [`ErrorKind::Fatal`]
//! store/invariant breakdown. Callers that want the flat three-way result use
//! [`Outcome`].

use thiserror::Error;

use crate::models::{TopicId, ValidationError};
use crate::store::StoreError;

/// Main error type for board operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// Caller input malformed; detected before the store is touched
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Referenced entity does not exist
    #[error("{resource} '{key}' does not exist")]
    NotFound { resource: &'static str, key: String },

    /// Uniqueness rule violated
    #[error("{resource} '{key}' already exists")]
    Conflict { resource: &'static str, key: String },

    /// A topic was found without any posts
    #[error("no posts found in topic {topic_id}")]
    EmptyTopic { topic_id: TopicId },

    /// Store unreachable, unexpected store error, or broken invariant
    #[error("fatal: {message}")]
    Fatal { message: String },
}

/// Result type alias for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Coarse classification of a [`BoardError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Failure,
    Fatal,
}

impl BoardError {
    pub fn not_found(resource: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            resource,
            key: key.to_string(),
        }
    }

    pub fn conflict(resource: &'static str, key: impl ToString) -> Self {
        Self::Conflict {
            resource,
            key: key.to_string(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }

    /// Map a store error raised while writing `resource` identified by `key`.
    ///
    /// Unique violations become conflicts and foreign key violations become
    /// not-found; everything else is fatal.
    pub fn from_store(err: StoreError, resource: &'static str, key: impl ToString) -> Self {
        match err {
            StoreError::UniqueViolation { .. } => Self::conflict(resource, key),
            StoreError::ForeignKeyViolation { .. } => Self::not_found(resource, key),
            other => Self::from(other),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fatal { .. } => ErrorKind::Fatal,
            _ => ErrorKind::Failure,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}

impl From<StoreError> for BoardError {
    fn from(err: StoreError) -> Self {
        Self::fatal(err.to_string())
    }
}

/// Flat three-way result: `success(value)`, `failure(message)`, `fatal(message)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    Failure(String),
    Fatal(String),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Message of a failed outcome.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(message) | Self::Fatal(message) => Some(message),
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err @ BoardError::Fatal { .. }) => Self::Fatal(err.to_string()),
            Err(err) => Self::Failure(err.to_string()),
        }
    }
}
