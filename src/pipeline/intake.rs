//! Intake: turn a raw upload or a local file into an [`UploadedDocument`].
//!
//! ## Buffering
//!
//! A read-once upload stream is empty on its second read, so a retry or a
//! second click would send zero bytes. Every document is copied into an
//! immutable [`Bytes`] buffer at the boundary and only non-consuming
//! accessors are exposed. Cloning a document shares the buffer.

use crate::error::{AdviseError, IntakeError};
use bytes::Bytes;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// PDF magic bytes every accepted document must start with.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// The two document positions the advisor expects, in request order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DocumentSlot {
    /// The student's academic progress report. Always sent first.
    Progress,
    /// The semester course schedule. Always sent second.
    Schedule,
}

impl DocumentSlot {
    /// Both slots in the order the prompt refers to them.
    pub const ALL: [DocumentSlot; 2] = [DocumentSlot::Progress, DocumentSlot::Schedule];

    /// Multipart form field name for this slot.
    pub fn field_name(self) -> &'static str {
        match self {
            DocumentSlot::Progress => "progress",
            DocumentSlot::Schedule => "schedule",
        }
    }

    /// Look a slot up by its form field name.
    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.field_name() == name)
    }

    /// Filename the CLI looks for when no path is given.
    pub fn default_path(self) -> &'static str {
        match self {
            DocumentSlot::Progress => "academic_progress.pdf",
            DocumentSlot::Schedule => "spring_schedule.pdf",
        }
    }
}

impl fmt::Display for DocumentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentSlot::Progress => "academic progress",
            DocumentSlot::Schedule => "course schedule",
        })
    }
}

/// A document submitted by the user, held in an immutable buffer.
///
/// Reading the content never changes it: [`content`](Self::content) and
/// [`bytes`](Self::bytes) may be called any number of times, in any order,
/// from any number of threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    slot: DocumentSlot,
    display_name: String,
    content: Bytes,
}

impl UploadedDocument {
    /// Take ownership of uploaded bytes for `slot`.
    ///
    /// Zero-length content counts as absent. Content that is not a PDF is
    /// rejected with [`IntakeError::NotAPdf`].
    pub fn from_bytes(
        slot: DocumentSlot,
        display_name: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Result<Self, IntakeError> {
        let content = content.into();
        let display_name = display_name.into();

        if content.is_empty() {
            return Err(IntakeError::Missing { slot });
        }
        if !content.starts_with(PDF_MAGIC) {
            return Err(IntakeError::NotAPdf {
                slot,
                name: display_name,
                magic: content.iter().take(4).copied().collect(),
            });
        }

        debug!(
            slot = slot.field_name(),
            name = %display_name,
            bytes = content.len(),
            "Document accepted"
        );

        Ok(Self {
            slot,
            display_name,
            content,
        })
    }

    /// Read a local file for `slot`, validating existence and PDF magic bytes.
    ///
    /// The display name is the file name component of `path`.
    pub async fn from_path(slot: DocumentSlot, path: impl AsRef<Path>) -> Result<Self, AdviseError> {
        let path = path.as_ref().to_path_buf();

        let content = match tokio::fs::read(&path).await {
            Ok(c) => c,
            Err(e) => {
                return Err(match e.kind() {
                    std::io::ErrorKind::NotFound => AdviseError::FileNotFound { slot, path },
                    std::io::ErrorKind::PermissionDenied => AdviseError::PermissionDenied { path },
                    _ => AdviseError::ReadFailed {
                        path,
                        message: e.to_string(),
                    },
                });
            }
        };

        let display_name = display_name_for(&path);
        Self::from_bytes(slot, display_name, content).map_err(|e| match e {
            IntakeError::Missing { slot } => AdviseError::EmptyFile { slot, path },
            IntakeError::NotAPdf { magic, .. } => {
                let mut m = [0u8; 4];
                for (dst, src) in m.iter_mut().zip(magic) {
                    *dst = src;
                }
                AdviseError::NotAPdf { path, magic: m }
            }
        })
    }

    /// Which slot the document was submitted for.
    pub fn slot(&self) -> DocumentSlot {
        self.slot
    }

    /// Original filename as shown to the user and sent to the service.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Borrow the full content. Non-consuming.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// A cheap shared handle to the full content. Non-consuming.
    pub fn bytes(&self) -> Bytes {
        self.content.clone()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Pick the filename component of a path, falling back to the full path.
fn display_name_for(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| PathBuf::from(path).display().to_string())
}
