//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use adviseme::{AdviceRequest, AdviceResult, Advisor, AdvisorConfig, DocumentSlot, Transport, UploadedDocument};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Minimal PDF-looking bytes: header, body, trailer.
pub fn pdf_bytes(body: &[u8]) -> Vec<u8> {
    let mut v = b"%PDF-1.4\n".to_vec();
    v.extend_from_slice(body);
    v.extend_from_slice(b"\n%%EOF");
    v
}

/// Deterministic pseudo-random payload so tests cover every byte value.
pub fn noisy_pdf(seed: u8, len: usize) -> Vec<u8> {
    let body: Vec<u8> = (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect();
    pdf_bytes(&body)
}

pub fn progress_doc(content: Vec<u8>) -> UploadedDocument {
    UploadedDocument::from_bytes(DocumentSlot::Progress, "progress.pdf", content).expect("valid progress pdf")
}

pub fn schedule_doc(content: Vec<u8>) -> UploadedDocument {
    UploadedDocument::from_bytes(DocumentSlot::Schedule, "schedule.pdf", content).expect("valid schedule pdf")
}

/// Transport that records every request and answers with a fixed result.
pub struct RecordingTransport {
    pub result: AdviceResult,
    pub requests: Mutex<Vec<AdviceRequest>>,
}

impl RecordingTransport {
    pub fn new(result: AdviceResult) -> Arc<Self> {
        Arc::new(Self {
            result,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn succeeding(text: &str) -> Arc<Self> {
        Self::new(AdviceResult::Success { text: text.to_string() })
    }

    pub fn recorded(&self) -> Vec<AdviceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn complete(&self, request: &AdviceRequest) -> AdviceResult {
        self.requests.lock().unwrap().push(request.clone());
        self.result.clone()
    }
}

pub fn advisor_with(transport: Arc<dyn Transport>) -> Advisor {
    let config = AdvisorConfig::builder()
        .transport(transport)
        .build()
        .expect("valid config");
    Advisor::new(&config).expect("advisor")
}
