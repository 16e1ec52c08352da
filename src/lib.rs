//! # adviseme
//!
//! Academic advising assistant: send a student's progress report and a
//! semester course schedule (both PDFs) to an OpenAI-compatible chat
//! completion endpoint and get back a ready-to-send advising email.
//!
//! ## Pipeline Overview
//!
//! ```text
//! progress.pdf ─┐
//!               ├─ 1. Intake     immutable buffers, readable any number of times
//! schedule.pdf ─┘
//!                  2. Encode     PDF → base64 data URI
//!                  3. Request    advisor prompt + progress + schedule
//!                  4. Transport  POST /chat/completions (bearer auth)
//!                  5. Render     advice text, notice, or error
//! ```
//!
//! The same [`Advisor`] serves the web form (`adviseme-web`), the CLI
//! (`adviseme`), and tests with stub transports.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use adviseme::{Advisor, AdvisorConfig, AdvisorState, DocumentSlot, UploadedDocument};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads POE_API_KEY, ADVISEME_MODEL, ADVISEME_BASE_URL
//!     let config = AdvisorConfig::from_env()?;
//!     let advisor = Advisor::new(&config)?;
//!
//!     let progress = UploadedDocument::from_path(DocumentSlot::Progress, "academic_progress.pdf").await?;
//!     let schedule = UploadedDocument::from_path(DocumentSlot::Schedule, "spring_schedule.pdf").await?;
//!
//!     match advisor.advise(Some(&progress), Some(&schedule)).await {
//!         AdvisorState::Displayed { text } => println!("{text}"),
//!         other => eprintln!("{other:?}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | `adviseme` and `adviseme-hash` binaries (clap + anyhow + tracing-subscriber) |
//! | `web`   | on      | `adviseme-web` binary and the [`web`] module (axum + minijinja) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod advise;
pub mod auth;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
#[cfg(feature = "web")]
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use advise::{Advisor, AdvisorState, MISSING_INPUT_NOTICE};
pub use config::{AdvisorConfig, AdvisorConfigBuilder};
pub use error::{AdviceFailure, AdviseError, IntakeError};
pub use pipeline::encode::{encode_base64, EncodedAttachment};
pub use pipeline::intake::{DocumentSlot, UploadedDocument};
pub use pipeline::render::{Render, TerminalOutput, TerminalRenderer};
pub use pipeline::request::{build_request, AdviceRequest};
pub use pipeline::transport::{AdviceResult, FragmentSink, HttpTransport, Transport};
pub use progress::{AdviceProgressCallback, NoopProgressCallback, ProgressCallback};
