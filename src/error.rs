//! Error types for the adviseme library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`AdviseError`] (**fatal**): the caller cannot proceed at all (input file
//!   missing on disk, bad configuration, password hashing failed). Returned as
//!   `Err(AdviseError)` from constructors and file intake.
//!
//! * [`IntakeError`] (**expected**): one of the two documents is absent or is
//!   not a PDF. The web form shows it as a notice and waits for new input; the
//!   CLI treats it as fatal.
//!
//! * [`AdviceFailure`] (**non-fatal**): the remote service rejected the
//!   request, the connection failed, or the reply could not be parsed. Stored
//!   inside [`crate::pipeline::transport::AdviceResult`] so that every user
//!   action ends in a renderable state instead of an unwinding error.

use crate::pipeline::intake::DocumentSlot;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the adviseme library.
#[derive(Debug, Error)]
pub enum AdviseError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("{path} not found. Please add the {slot} file.")]
    FileNotFound { slot: DocumentSlot, path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The path exists but could not be read (a directory, an I/O fault).
    #[error("Failed to read '{path}': {message}")]
    ReadFailed { path: PathBuf, message: String },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The file exists but holds no bytes.
    #[error("{path} is empty. Please provide a non-empty {slot} file.")]
    EmptyFile { slot: DocumentSlot, path: PathBuf },

    // ── Provider errors ───────────────────────────────────────────────────
    /// The chat-completion endpoint is not configured (missing API key etc.).
    #[error("Chat-completion provider is not configured.\n{hint}")]
    ProviderNotConfigured { hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Credential errors ─────────────────────────────────────────────────
    /// Argon2 could not hash or parse a password hash.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// An expected, recoverable problem with the submitted documents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    /// The slot received no file, or a zero-length one.
    #[error("missing {slot} document")]
    Missing { slot: DocumentSlot },

    /// The slot received bytes that do not start with the `%PDF` magic.
    #[error("'{name}' is not a PDF (first bytes: {magic:?})")]
    NotAPdf {
        slot: DocumentSlot,
        name: String,
        magic: Vec<u8>,
    },
}

impl IntakeError {
    /// The slot the problem was found in.
    pub fn slot(&self) -> DocumentSlot {
        match self {
            IntakeError::Missing { slot } | IntakeError::NotAPdf { slot, .. } => *slot,
        }
    }
}

/// A non-fatal failure of one advice request.
///
/// The orchestration always returns to a ready state after one of these; the
/// renderer shows it to the user and the next action starts fresh.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum AdviceFailure {
    /// The service answered with a non-200 status.
    #[error("HTTP {status}: {detail}")]
    Remote { status: u16, detail: String },

    /// The request never produced an HTTP response (DNS, TLS, timeout, …).
    #[error("transport error: {detail}")]
    Transport { detail: String },

    /// The service answered 200 but the body did not have the expected shape.
    #[error("malformed response: {detail}")]
    MalformedResponse { detail: String },
}

impl AdviceFailure {
    /// HTTP status code associated with the failure, when one exists.
    ///
    /// A malformed body arrived with a 200, so it reports 200.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AdviceFailure::Remote { status, .. } => Some(*status),
            AdviceFailure::MalformedResponse { .. } => Some(200),
            AdviceFailure::Transport { .. } => None,
        }
    }

    /// Human-readable detail text (the response body for remote failures).
    pub fn detail(&self) -> &str {
        match self {
            AdviceFailure::Remote { detail, .. }
            | AdviceFailure::Transport { detail }
            | AdviceFailure::MalformedResponse { detail } => detail,
        }
    }

    /// Only connection-level failures are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, AdviceFailure::Transport { .. })
    }
}
