//! Live end-to-end tests against the real chat-completion endpoint.
//!
//! These read real PDFs from `./test_cases/` and spend API credits, so they
//! are gated behind `E2E_ENABLED` and need `POE_API_KEY` (or a `.env`).
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture

use adviseme::{Advisor, AdvisorConfig, AdvisorState, DocumentSlot, UploadedDocument};
use std::path::PathBuf;

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip unless E2E_ENABLED is set and the slot's PDF exists in `test_cases/`.
macro_rules! e2e_skip_unless_ready {
    ($slot:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p = test_cases_dir().join($slot.default_path());
        if !p.exists() {
            println!("SKIP: test file not found: {}", p.display());
            return;
        }
        p
    }};
}

fn live_config() -> AdvisorConfig {
    dotenv::dotenv().ok();
    AdvisorConfig::from_env().expect("valid environment configuration")
}

#[tokio::test]
async fn test_live_advice_from_default_documents() {
    let progress_path = e2e_skip_unless_ready!(DocumentSlot::Progress);
    let schedule_path = e2e_skip_unless_ready!(DocumentSlot::Schedule);

    let progress = UploadedDocument::from_path(DocumentSlot::Progress, &progress_path)
        .await
        .unwrap();
    let schedule = UploadedDocument::from_path(DocumentSlot::Schedule, &schedule_path)
        .await
        .unwrap();

    let advisor = Advisor::new(&live_config()).expect("POE_API_KEY must be set");
    let state = advisor.advise(Some(&progress), Some(&schedule)).await;

    match state {
        AdvisorState::Displayed { ref text } => {
            println!("{text}");
            assert!(!text.trim().is_empty());
        }
        other => panic!("expected advice, got {other:?}"),
    }
}

#[tokio::test]
async fn test_live_streaming_matches_fragments() {
    use adviseme::AdviceProgressCallback;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Collect(Mutex<String>);
    impl AdviceProgressCallback for Collect {
        fn on_fragment(&self, text: &str) {
            self.0.lock().unwrap().push_str(text);
        }
    }

    let progress_path = e2e_skip_unless_ready!(DocumentSlot::Progress);
    let schedule_path = e2e_skip_unless_ready!(DocumentSlot::Schedule);
    let progress = UploadedDocument::from_path(DocumentSlot::Progress, &progress_path)
        .await
        .unwrap();
    let schedule = UploadedDocument::from_path(DocumentSlot::Schedule, &schedule_path)
        .await
        .unwrap();

    let collected = Arc::new(Collect::default());
    let advisor = Advisor::new(&live_config())
        .expect("POE_API_KEY must be set")
        .with_progress(collected.clone())
        .streaming(true);

    let state = advisor.advise(Some(&progress), Some(&schedule)).await;
    let AdvisorState::Displayed { text } = state else {
        panic!("expected advice, got {state:?}");
    };
    assert_eq!(*collected.0.lock().unwrap(), text);
}
