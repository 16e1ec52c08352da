//! Progress-callback trait for advice requests.
//!
//! Inject an [`Arc<dyn AdviceProgressCallback>`] via
//! [`crate::advise::Advisor::with_progress`] to receive events while a
//! request is in flight. The CLI drives a spinner and prints streamed text
//! from it; the web form does not use one.
//!
//! # Example
//!
//! ```rust
//! use adviseme::AdviceProgressCallback;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     fragments: AtomicUsize,
//! }
//!
//! impl AdviceProgressCallback for CountingCallback {
//!     fn on_fragment(&self, text: &str) {
//!         self.fragments.fetch_add(1, Ordering::SeqCst);
//!         eprint!("{text}");
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { fragments: AtomicUsize::new(0) });
//! # let _ = cb;
//! ```

use std::sync::Arc;

/// Called by the advisor as it processes one request.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because the
/// web server shares one advisor across concurrent requests.
pub trait AdviceProgressCallback: Send + Sync {
    /// Both documents passed validation; the request is about to be sent.
    fn on_processing_start(&self, progress_name: &str, schedule_name: &str) {
        let _ = (progress_name, schedule_name);
    }

    /// A transport attempt failed and will be retried after `backoff_ms`.
    fn on_retry(&self, attempt: u32, max_retries: u32, backoff_ms: u64) {
        let _ = (attempt, max_retries, backoff_ms);
    }

    /// A fragment of streamed completion text arrived.
    ///
    /// Only fired when the transport streams; the concatenation of all
    /// fragments equals the final advice text.
    fn on_fragment(&self, text: &str) {
        let _ = text;
    }

    /// The request finished, successfully or not.
    fn on_processing_complete(&self, success: bool) {
        let _ = success;
    }
}

/// Convenience alias matching the type stored by the advisor.
pub type ProgressCallback = Arc<dyn AdviceProgressCallback>;

/// A no-op implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressCallback;

impl AdviceProgressCallback for NoopProgressCallback {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl AdviceProgressCallback for Recorder {
        fn on_processing_start(&self, p: &str, s: &str) {
            self.events.lock().unwrap().push(format!("start {p} {s}"));
        }
        fn on_processing_complete(&self, success: bool) {
            self.events.lock().unwrap().push(format!("done {success}"));
        }
    }

    #[test]
    fn defaults_are_no_ops_and_overrides_fire() {
        let noop = NoopProgressCallback;
        noop.on_processing_start("a", "b");
        noop.on_fragment("x");
        noop.on_retry(1, 2, 500);
        noop.on_processing_complete(true);

        let rec = Recorder::default();
        rec.on_processing_start("a.pdf", "b.pdf");
        rec.on_fragment("ignored");
        rec.on_processing_complete(false);
        assert_eq!(
            *rec.events.lock().unwrap(),
            vec!["start a.pdf b.pdf".to_string(), "done false".to_string()]
        );
    }
}
