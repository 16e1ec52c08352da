//! Document encoding: raw PDF bytes → base64 data URI wrapped in [`EncodedAttachment`].
//!
//! OpenAI-compatible chat APIs accept files inline as `file` content parts
//! whose `file_data` is a data URI. Encoding is pure: it borrows the document
//! and never consumes or mutates it, so the same document can be encoded on
//! every click.

use crate::pipeline::intake::UploadedDocument;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// MIME type embedded in every attachment data URI.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Base64-encode arbitrary bytes with the standard, padded alphabet.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// A file ready to embed in a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedAttachment {
    /// Original filename shown to the model.
    pub filename: String,
    /// `data:application/pdf;base64,<payload>`
    pub file_data: String,
}

impl EncodedAttachment {
    /// Encode a document without consuming it.
    pub fn from_document(doc: &UploadedDocument) -> Self {
        let payload = encode_base64(doc.content());
        debug!(
            "Encoded '{}' → {} bytes base64",
            doc.display_name(),
            payload.len()
        );

        Self {
            filename: doc.display_name().to_string(),
            file_data: data_uri(PDF_MIME_TYPE, &payload),
        }
    }

    /// The base64 payload after the `base64,` marker.
    pub fn payload(&self) -> &str {
        self.file_data
            .split_once(";base64,")
            .map(|(_, p)| p)
            .unwrap_or("")
    }
}

/// Build a `data:` URI for a base64 payload.
pub fn data_uri(mime_type: &str, payload_b64: &str) -> String {
    format!("data:{mime_type};base64,{payload_b64}")
}
