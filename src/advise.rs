//! Orchestration: validate the submission, build the request, call the
//! transport, and settle in a renderable state.
//!
//! ```text
//!                 both documents present
//! AwaitingInputs ───────────────────────▶ Processing ──Success──▶ Displayed
//!       ▲  │                                   │
//!       │  └─ notice (missing / not a PDF)     └──Failure──▶ ErrorDisplayed
//!       └────────────── next user action starts here again ────────────┘
//! ```
//!
//! [`Advisor::advise`] takes `&self` and borrowed documents and keeps no
//! per-call state, so it can be invoked any number of times, sequentially or
//! concurrently, and each call depends only on the inputs it is given and on
//! the remote service.

use crate::config::AdvisorConfig;
use crate::error::{AdviceFailure, AdviseError, IntakeError};
use crate::pipeline::intake::UploadedDocument;
use crate::pipeline::request::build_request;
use crate::pipeline::transport::{AdviceResult, HttpTransport, Transport};
use crate::progress::ProgressCallback;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

/// Notice shown while one or both documents are missing.
pub const MISSING_INPUT_NOTICE: &str = "Please upload both files before generating advice.";

/// Where one user action ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvisorState {
    /// Waiting for a complete submission. `notice` is `None` on first load.
    AwaitingInputs { notice: Option<String> },
    /// Both documents accepted; the request is being built and sent.
    Processing {
        progress_name: String,
        schedule_name: String,
    },
    /// The service produced advice.
    Displayed { text: String },
    /// The request failed; the failure is shown and the form stays usable.
    ErrorDisplayed { failure: AdviceFailure },
}

impl AdvisorState {
    /// Initial state before anything was submitted.
    pub fn ready() -> Self {
        AdvisorState::AwaitingInputs { notice: None }
    }

    /// Stay in `AwaitingInputs` with the standard missing-input notice.
    pub fn missing_input() -> Self {
        AdvisorState::AwaitingInputs {
            notice: Some(MISSING_INPUT_NOTICE.to_string()),
        }
    }

    /// Stay in `AwaitingInputs` because intake rejected a document.
    pub fn rejected(err: &IntakeError) -> Self {
        match err {
            IntakeError::Missing { .. } => Self::missing_input(),
            IntakeError::NotAPdf { slot, name, .. } => AdvisorState::AwaitingInputs {
                notice: Some(format!(
                    "'{name}' is not a PDF. Please upload the {slot} as a PDF file."
                )),
            },
        }
    }

    /// Terminal state for a transport result.
    pub fn from_result(result: AdviceResult) -> Self {
        match result {
            AdviceResult::Success { text } => AdvisorState::Displayed { text },
            AdviceResult::Failure(failure) => AdvisorState::ErrorDisplayed { failure },
        }
    }

    pub fn is_awaiting_inputs(&self) -> bool {
        matches!(self, AdvisorState::AwaitingInputs { .. })
    }

    pub fn notice(&self) -> Option<&str> {
        match self {
            AdvisorState::AwaitingInputs { notice } => notice.as_deref(),
            _ => None,
        }
    }
}

/// The single entry point shared by the web form and the CLI.
pub struct Advisor {
    transport: Arc<dyn Transport>,
    prompt: String,
    model: String,
    max_retries: u32,
    retry_backoff_ms: u64,
    streaming: bool,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for Advisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Advisor")
            .field("model", &self.model)
            .field("max_retries", &self.max_retries)
            .field("streaming", &self.streaming)
            .finish_non_exhaustive()
    }
}

impl Advisor {
    /// Build an advisor from configuration.
    ///
    /// Uses `config.transport` when set, otherwise an [`HttpTransport`]
    /// built from the API key and base URL.
    pub fn new(config: &AdvisorConfig) -> Result<Self, AdviseError> {
        let transport: Arc<dyn Transport> = match config.transport {
            Some(ref t) => Arc::clone(t),
            None => Arc::new(HttpTransport::new(config)?),
        };

        Ok(Self {
            transport,
            prompt: config.prompt_text().to_string(),
            model: config.model.clone(),
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            streaming: false,
            progress: None,
        })
    }

    /// Report progress events to `callback`.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Ask the transport to stream fragments to the progress callback.
    pub fn streaming(mut self, enabled: bool) -> Self {
        self.streaming = enabled;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The validation gate.
    ///
    /// Returns `Processing` only when both documents are present; otherwise
    /// `AwaitingInputs` with the missing-input notice.
    pub fn validate(progress: Option<&UploadedDocument>, schedule: Option<&UploadedDocument>) -> AdvisorState {
        match (progress, schedule) {
            (Some(p), Some(s)) => AdvisorState::Processing {
                progress_name: p.display_name().to_string(),
                schedule_name: s.display_name().to_string(),
            },
            _ => AdvisorState::missing_input(),
        }
    }

    /// Run one user action to completion.
    ///
    /// Never returns `Processing`; the result is `AwaitingInputs`,
    /// `Displayed`, or `ErrorDisplayed`.
    pub async fn advise(
        &self,
        progress: Option<&UploadedDocument>,
        schedule: Option<&UploadedDocument>,
    ) -> AdvisorState {
        let (progress, schedule) = match (progress, schedule) {
            (Some(p), Some(s)) => (p, s),
            _ => {
                info!(
                    progress = progress.is_some(),
                    schedule = schedule.is_some(),
                    "Submission incomplete; waiting for both documents"
                );
                return AdvisorState::missing_input();
            }
        };

        AdvisorState::from_result(self.request_advice(progress, schedule).await)
    }

    /// Build the request from both documents and send it.
    ///
    /// Connection-level failures are retried up to `max_retries` times with
    /// exponential backoff (`retry_backoff_ms * 2^attempt`); everything else
    /// is returned after the first attempt. A streamed attempt that already
    /// delivered text is never retried.
    pub async fn request_advice(&self, progress: &UploadedDocument, schedule: &UploadedDocument) -> AdviceResult {
        if let Some(ref cb) = self.progress {
            cb.on_processing_start(progress.display_name(), schedule.display_name());
        }
        info!(
            progress = progress.display_name(),
            progress_bytes = progress.len(),
            schedule = schedule.display_name(),
            schedule_bytes = schedule.len(),
            "Generating advice"
        );

        let request = build_request(progress, schedule, &self.prompt, &self.model);

        // Once text has reached the callback a retry would repeat it.
        let emitted = AtomicBool::new(false);
        let mut attempt = 0;
        let result = loop {
            let result = if self.streaming {
                let forward = |fragment: &str| {
                    emitted.store(true, Ordering::SeqCst);
                    if let Some(ref cb) = self.progress {
                        cb.on_fragment(fragment);
                    }
                };
                self.transport.complete_streaming(&request, &forward).await
            } else {
                self.transport.complete(&request).await
            };

            match result {
                AdviceResult::Failure(ref f)
                    if f.is_transient() && attempt < self.max_retries && !emitted.load(Ordering::SeqCst) =>
                {
                    let backoff = self.retry_backoff_ms.saturating_mul(2u64.pow(attempt));
                    attempt += 1;
                    warn!(
                        "Attempt {} failed ({}); retry {}/{} after {}ms",
                        attempt, f, attempt, self.max_retries, backoff
                    );
                    if let Some(ref cb) = self.progress {
                        cb.on_retry(attempt, self.max_retries, backoff);
                    }
                    sleep(Duration::from_millis(backoff)).await;
                }
                other => break other,
            }
        };

        match result {
            AdviceResult::Success { ref text } => info!(chars = text.len(), "Advice generated"),
            AdviceResult::Failure(ref f) => warn!("Advice request failed: {f}"),
        }
        if let Some(ref cb) = self.progress {
            cb.on_processing_complete(result.is_success());
        }
        result
    }
}
