//! Pipeline stages for one advice request.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the web form and CLI share every step except intake and render.
//!
//! ## Data Flow
//!
//! ```text
//! intake ──▶ encode ──▶ request ──▶ transport ──▶ render
//! (bytes)    (base64)   (chat body)  (HTTPS)      (text / HTML)
//! ```
//!
//! 1. [`intake`]   : materialise uploads or local files into immutable buffers
//! 2. [`encode`]   : base64 data URIs for the `file` content parts
//! 3. [`request`]  : prompt + progress + schedule, in that order
//! 4. [`transport`]: the only stage with network I/O
//! 5. [`render`]   : terminal or HTML output for the final state
//!
//! [`wire`] holds the serde types of the chat-completion API.

pub mod encode;
pub mod intake;
pub mod render;
pub mod request;
pub mod transport;
pub mod wire;
