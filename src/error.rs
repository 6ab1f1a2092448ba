//! Error types for the LMS patron client

use indexmap::IndexMap;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

/// Per-field messages extracted from a server validation response,
/// in the order the server sent them.
pub type FieldErrors = IndexMap<String, Vec<String>>;

/// Main client error type.
///
/// No variant is fatal to the process: each error is scoped to the
/// triggering user action and leaves the application otherwise usable.
#[derive(Error, Debug)]
pub enum ClientError {
    /// No credential is stored. Terminal for the current page; resolved
    /// only by going back through the login flow.
    #[error("Not logged in")]
    Unauthenticated,

    /// The call did not complete (connection, timeout, TLS, ...).
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server rejected the call: `success == false` in the envelope or
    /// a non-2xx status. `message` is the server's own wording when it
    /// provided one; `fields` carries the per-field validation map if the
    /// response included one.
    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
        fields: Option<FieldErrors>,
    },

    /// Local validation failed; no network call was made.
    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),

    /// The response envelope was missing or deviant. Treated like a
    /// transport failure: reported, never unwrapped further.
    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// Configuration could not be loaded (startup only).
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ClientError {
    /// Build a single-field local validation error.
    pub fn required(field: &'static str, message: &'static str) -> Self {
        let mut errors = ValidationErrors::new();
        let mut error = ValidationError::new("required");
        error.message = Some(message.into());
        errors.add(field, error);
        ClientError::Validation(errors)
    }

    /// A server rejection with a known message and no field detail.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        ClientError::Rejected {
            status,
            message: message.into(),
            fields: None,
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ClientError::Unauthenticated)
    }
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;
