//! Request building: two documents + the advisor prompt → [`AdviceRequest`].
//!
//! All prompt text lives in [`crate::prompts`]; this module only fixes the
//! order of the parts. The progress report is always attached before the
//! course schedule because the prompt refers to them in that order.

use crate::pipeline::encode::EncodedAttachment;
use crate::pipeline::intake::UploadedDocument;
use crate::pipeline::wire::{ChatCompletionRequest, ChatMessage, ContentPart, FilePart};
use tracing::debug;

/// A single chat request: prompt plus exactly two attachments.
///
/// Built fresh for every user action and never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceRequest {
    pub prompt: String,
    /// `[progress, schedule]`
    pub attachments: [EncodedAttachment; 2],
    pub model: String,
}

impl AdviceRequest {
    pub fn progress(&self) -> &EncodedAttachment {
        &self.attachments[0]
    }

    pub fn schedule(&self) -> &EncodedAttachment {
        &self.attachments[1]
    }

    /// Serialise into the chat-completion body.
    ///
    /// The prompt goes first as a text part, followed by one `file` part per
    /// attachment, all inside a single user message.
    pub fn to_wire(&self, stream: bool) -> ChatCompletionRequest {
        let mut content = Vec::with_capacity(1 + self.attachments.len());
        content.push(ContentPart::Text {
            text: self.prompt.clone(),
        });
        content.extend(self.attachments.iter().map(|a| ContentPart::File {
            file: FilePart {
                filename: a.filename.clone(),
                file_data: a.file_data.clone(),
            },
        }));

        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            stream,
        }
    }
}

/// Encode both documents and assemble the request.
pub fn build_request(
    progress: &UploadedDocument,
    schedule: &UploadedDocument,
    prompt: &str,
    model: &str,
) -> AdviceRequest {
    let attachments = [
        EncodedAttachment::from_document(progress),
        EncodedAttachment::from_document(schedule),
    ];
    debug!(
        model,
        progress = %attachments[0].filename,
        schedule = %attachments[1].filename,
        "Built advice request"
    );

    AdviceRequest {
        prompt: prompt.to_string(),
        attachments,
        model: model.to_string(),
    }
}
