//! Transport: send an [`AdviceRequest`] to the chat-completion service.
//!
//! This is the only stage with network I/O. It never returns `Err`: every
//! outcome, including connection faults and garbage bodies, is folded into an
//! [`AdviceResult`] so the caller always has something to render.
//!
//! ## Status mapping
//!
//! | Response | Result |
//! |----------|--------|
//! | 200, first choice has non-empty content | `Success { text: choices[0].message.content }` |
//! | 200, body unparsable, no choices or empty content | `Failure(MalformedResponse)` |
//! | any other status | `Failure(Remote { status, detail: <body text> })` |
//! | no response (DNS, TLS, timeout, …) | `Failure(Transport)` |
//!
//! Retries are not performed here; see [`crate::advise::Advisor`].

use crate::config::AdvisorConfig;
use crate::error::{AdviceFailure, AdviseError};
use crate::pipeline::request::AdviceRequest;
use crate::pipeline::wire::{ChatCompletionChunk, ChatCompletionResponse};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome of one advice request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdviceResult {
    Success { text: String },
    Failure(AdviceFailure),
}

impl AdviceResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AdviceResult::Success { .. })
    }

    /// The advice text, if the request succeeded.
    pub fn text(&self) -> Option<&str> {
        match self {
            AdviceResult::Success { text } => Some(text),
            AdviceResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&AdviceFailure> {
        match self {
            AdviceResult::Success { .. } => None,
            AdviceResult::Failure(f) => Some(f),
        }
    }
}

impl From<AdviceFailure> for AdviceResult {
    fn from(f: AdviceFailure) -> Self {
        AdviceResult::Failure(f)
    }
}

/// Receives streamed completion text, one fragment at a time.
pub type FragmentSink<'a> = dyn Fn(&str) + Send + Sync + 'a;

/// Sends advice requests somewhere and reports what came back.
///
/// [`HttpTransport`] talks to a real endpoint; tests substitute stubs.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request once and wait for the full completion.
    async fn complete(&self, request: &AdviceRequest) -> AdviceResult;

    /// Send the request once, reporting text fragments as they arrive.
    ///
    /// The default implementation does not stream: it calls
    /// [`complete`](Self::complete) and reports the whole text as one fragment.
    async fn complete_streaming(
        &self,
        request: &AdviceRequest,
        on_fragment: &FragmentSink<'_>,
    ) -> AdviceResult {
        let result = self.complete(request).await;
        if let AdviceResult::Success { text } = &result {
            on_fragment(text);
        }
        result
    }
}

/// reqwest-backed transport for OpenAI-compatible `/chat/completions`.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    api_key: String,
    timeout_secs: u64,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.url)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Build a transport from explicit configuration.
    ///
    /// Fails if no API key is configured.
    pub fn new(config: &AdvisorConfig) -> Result<Self, AdviseError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AdviseError::ProviderNotConfigured {
                hint: format!(
                    "Set {} (or pass --api-key) to the key for {}.",
                    crate::config::API_KEY_ENV,
                    config.base_url
                ),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("adviseme/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AdviseError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.completions_url(),
            api_key,
            timeout_secs: config.request_timeout_secs,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST the request and return the response if it is a 200.
    async fn post(&self, request: &AdviceRequest, stream: bool) -> Result<reqwest::Response, AdviceFailure> {
        info!(
            url = %self.url,
            model = %request.model,
            stream,
            "Sending advice request"
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request.to_wire(stream))
            .send()
            .await
            .map_err(|e| self.transport_failure(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            warn!(status = status.as_u16(), "Advice request rejected");
            return Err(AdviceFailure::Remote {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(response)
    }

    fn transport_failure(&self, e: reqwest::Error) -> AdviceFailure {
        let detail = if e.is_timeout() {
            format!("request timed out after {}s", self.timeout_secs)
        } else if e.is_connect() {
            format!("could not connect to {}: {e}", self.url)
        } else {
            e.to_string()
        };
        warn!("Advice request failed before a response: {detail}");
        AdviceFailure::Transport { detail }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn complete(&self, request: &AdviceRequest) -> AdviceResult {
        let start = Instant::now();
        let response = match self.post(request, false).await {
            Ok(r) => r,
            Err(f) => return f.into(),
        };

        let body = match response.bytes().await {
            Ok(b) => b,
            Err(e) => return self.transport_failure(e).into(),
        };

        let result = parse_completion(&body);
        debug!(
            bytes = body.len(),
            success = result.is_success(),
            "Completion received in {:?}",
            start.elapsed()
        );
        result
    }

    async fn complete_streaming(
        &self,
        request: &AdviceRequest,
        on_fragment: &FragmentSink<'_>,
    ) -> AdviceResult {
        let start = Instant::now();
        let response = match self.post(request, true).await {
            Ok(r) => r,
            Err(f) => return f.into(),
        };

        let mut events = SseLineBuffer::default();
        let mut text = String::new();
        let mut body = response.bytes_stream();

        'outer: while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => return self.transport_failure(e).into(),
            };
            for line in events.push(&chunk) {
                match parse_stream_line(&line) {
                    StreamLine::Ignore => {}
                    StreamLine::Done => break 'outer,
                    StreamLine::Fragment(fragment) => {
                        on_fragment(&fragment);
                        text.push_str(&fragment);
                    }
                    StreamLine::Malformed(detail) => {
                        return AdviceFailure::MalformedResponse { detail }.into();
                    }
                }
            }
        }

        debug!(chars = text.len(), "Stream finished in {:?}", start.elapsed());

        if text.is_empty() {
            return AdviceFailure::MalformedResponse {
                detail: "stream ended without any completion text".into(),
            }
            .into();
        }
        AdviceResult::Success { text }
    }
}

/// Map a 200 response body to a result.
pub fn parse_completion(body: &[u8]) -> AdviceResult {
    match serde_json::from_slice::<ChatCompletionResponse>(body) {
        Ok(resp) => match resp.first_content() {
            Some(text) if !text.is_empty() => AdviceResult::Success { text },
            Some(_) => AdviceFailure::MalformedResponse {
                detail: "response contained an empty completion".into(),
            }
            .into(),
            None => AdviceFailure::MalformedResponse {
                detail: "response contained no completion choices".into(),
            }
            .into(),
        },
        Err(e) => AdviceFailure::MalformedResponse {
            detail: format!("could not parse completion: {e}"),
        }
        .into(),
    }
}

// ── Server-sent events ───────────────────────────────────────────────────

/// Reassemble network chunks into complete lines.
#[derive(Debug, Default)]
struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    /// Append bytes and drain every complete line (without terminators).
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }
}

#[derive(Debug, PartialEq, Eq)]
enum StreamLine {
    Ignore,
    Done,
    Fragment(String),
    Malformed(String),
}

fn parse_stream_line(line: &str) -> StreamLine {
    let Some(data) = line.strip_prefix("data:") else {
        // Comments (": keep-alive"), `event:` and blank separators.
        return StreamLine::Ignore;
    };
    let data = data.trim();
    if data.is_empty() {
        return StreamLine::Ignore;
    }
    if data == "[DONE]" {
        return StreamLine::Done;
    }
    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => match chunk.first_delta() {
            Some(t) => StreamLine::Fragment(t.to_string()),
            None => StreamLine::Ignore,
        },
        Err(e) => StreamLine::Malformed(format!("could not parse stream chunk: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_completion_success() {
        let body = br#"{"choices":[{"message":{"content":"Take BIOL 301 and CHEM 210."}}]}"#;
        assert_eq!(
            parse_completion(body),
            AdviceResult::Success {
                text: "Take BIOL 301 and CHEM 210.".into()
            }
        );
    }

    #[test]
    fn parse_completion_malformed_body() {
        let r = parse_completion(b"<html>oops</html>");
        assert!(matches!(
            r,
            AdviceResult::Failure(AdviceFailure::MalformedResponse { .. })
        ));
    }

    #[test]
    fn parse_completion_empty_choices() {
        let r = parse_completion(br#"{"choices":[]}"#);
        assert_eq!(
            r.failure().map(|f| f.detail()),
            Some("response contained no completion choices")
        );
    }

    #[test]
    fn parse_completion_empty_content_is_malformed() {
        let r = parse_completion(br#"{"choices":[{"message":{"content":""}}]}"#);
        assert_eq!(
            r,
            AdviceResult::Failure(AdviceFailure::MalformedResponse {
                detail: "response contained an empty completion".into()
            })
        );
        assert_eq!(r.failure().and_then(|f| f.status_code()), Some(200));
    }

    #[test]
    fn parse_completion_null_content() {
        let r = parse_completion(br#"{"choices":[{"message":{"content":null}}]}"#);
        assert!(!r.is_success());
    }

    #[test]
    fn sse_buffer_joins_split_lines() {
        let mut buf = SseLineBuffer::default();
        assert!(buf.push(b"data: {\"cho").is_empty());
        let lines = buf.push(b"ices\":[]}\r\n\r\ndata: [DONE]\n");
        assert_eq!(lines, vec!["data: {\"choices\":[]}", "", "data: [DONE]"]);
    }

    #[test]
    fn stream_lines() {
        assert_eq!(parse_stream_line(": keep-alive"), StreamLine::Ignore);
        assert_eq!(parse_stream_line(""), StreamLine::Ignore);
        assert_eq!(parse_stream_line("data: [DONE]"), StreamLine::Done);
        assert_eq!(
            parse_stream_line(r#"data: {"choices":[{"delta":{"content":"Dear"}}]}"#),
            StreamLine::Fragment("Dear".into())
        );
        assert_eq!(
            parse_stream_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            StreamLine::Ignore
        );
        assert!(matches!(parse_stream_line("data: nope"), StreamLine::Malformed(_)));
    }

    #[test]
    fn new_requires_api_key() {
        let config = AdvisorConfig::default();
        let err = HttpTransport::new(&config).unwrap_err();
        assert!(matches!(err, AdviseError::ProviderNotConfigured { .. }));
        assert!(err.to_string().contains("POE_API_KEY"));
    }

    #[test]
    fn new_builds_completions_url() {
        let config = AdvisorConfig::builder()
            .api_key("k")
            .base_url("http://127.0.0.1:9/v1")
            .build()
            .unwrap();
        let t = HttpTransport::new(&config).unwrap();
        assert_eq!(t.url(), "http://127.0.0.1:9/v1/chat/completions");
        assert!(!format!("{t:?}").contains("api_key"));
    }
}
