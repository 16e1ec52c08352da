//! `HttpTransport` against a local mock of the chat-completion endpoint.

mod common;

use adviseme::{
    AdviceFailure, AdviceResult, Advisor, AdvisorConfig, AdvisorState, HttpTransport, Render,
    TerminalRenderer, Transport,
};
use common::*;
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> AdvisorConfig {
    AdvisorConfig::builder()
        .api_key("test-key")
        .base_url(format!("{}/v1", server.uri()))
        .model("Claude-Sonnet-4")
        .prompt("Advise this student.")
        .build()
        .unwrap()
}

fn request() -> adviseme::AdviceRequest {
    let progress = progress_doc(pdf_bytes(b"progress body"));
    let schedule = schedule_doc(pdf_bytes(b"schedule body"));
    adviseme::build_request(&progress, &schedule, "Advise this student.", "Claude-Sonnet-4")
}

fn completion(text: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_success_returns_text_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Take BIOL 301 and CHEM 210.")))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config_for(&server)).unwrap();
    let result = transport.complete(&request()).await;

    assert_eq!(
        result,
        AdviceResult::Success {
            text: "Take BIOL 301 and CHEM 210.".into()
        }
    );
}

#[tokio::test]
async fn test_request_body_carries_prompt_and_both_files() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
        .mount(&server)
        .await;

    let req = request();
    HttpTransport::new(&config_for(&server)).unwrap().complete(&req).await;

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();

    assert_eq!(body["model"], "Claude-Sonnet-4");
    assert!(body.get("stream").is_none(), "non-streaming requests omit the flag");
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");

    let parts = messages[0]["content"].as_array().unwrap();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0]["type"], "text");
    assert_eq!(parts[0]["text"], "Advise this student.");
    assert_eq!(parts[1]["type"], "file");
    assert_eq!(parts[1]["file"]["filename"], "progress.pdf");
    assert_eq!(parts[2]["file"]["filename"], "schedule.pdf");

    let data = parts[1]["file"]["file_data"].as_str().unwrap();
    assert!(data.starts_with("data:application/pdf;base64,"));
    assert_eq!(data, req.progress().file_data);
}

#[tokio::test]
async fn test_server_error_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("server exploded"))
        .mount(&server)
        .await;

    let result = HttpTransport::new(&config_for(&server)).unwrap().complete(&request()).await;
    assert_eq!(
        result,
        AdviceResult::Failure(AdviceFailure::Remote {
            status: 500,
            detail: "server exploded".into()
        })
    );
}

#[tokio::test]
async fn test_non_200_success_codes_are_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(completion("created?")))
        .mount(&server)
        .await;

    let result = HttpTransport::new(&config_for(&server)).unwrap().complete(&request()).await;
    assert_eq!(result.failure().and_then(|f| f.status_code()), Some(201));
}

#[tokio::test]
async fn test_unauthorized_is_remote_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "bad key"}})))
        .mount(&server)
        .await;

    let result = HttpTransport::new(&config_for(&server)).unwrap().complete(&request()).await;
    let failure = result.failure().unwrap();
    assert_eq!(failure.status_code(), Some(401));
    assert!(failure.detail().contains("bad key"));
    assert!(!failure.is_transient());
}

#[tokio::test]
async fn test_malformed_200_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let result = HttpTransport::new(&config_for(&server)).unwrap().complete(&request()).await;
    assert!(matches!(
        result,
        AdviceResult::Failure(AdviceFailure::MalformedResponse { .. })
    ));
    assert_eq!(result.failure().unwrap().status_code(), Some(200));
}

#[tokio::test]
async fn test_empty_content_is_malformed_in_both_modes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("")))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config_for(&server)).unwrap();
    let whole = transport.complete(&request()).await;
    assert!(matches!(
        whole,
        AdviceResult::Failure(AdviceFailure::MalformedResponse { .. })
    ));

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n\ndata: [DONE]\n\n",
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let streamed = HttpTransport::new(&config_for(&server))
        .unwrap()
        .complete_streaming(&request(), &|_: &str| {})
        .await;
    assert!(matches!(
        streamed,
        AdviceResult::Failure(AdviceFailure::MalformedResponse { .. })
    ));
}

#[tokio::test]
async fn test_timeout_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("too late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = AdvisorConfig::builder()
        .api_key("test-key")
        .base_url(format!("{}/v1", server.uri()))
        .request_timeout_secs(1)
        .build()
        .unwrap();
    let result = HttpTransport::new(&config).unwrap().complete(&request()).await;

    let failure = result.failure().unwrap();
    assert!(matches!(failure, AdviceFailure::Transport { .. }));
    assert_eq!(failure.status_code(), None);
    assert!(failure.detail().contains("timed out"));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_failure() {
    let config = AdvisorConfig::builder()
        .api_key("test-key")
        .base_url("http://127.0.0.1:1/v1")
        .build()
        .unwrap();
    let result = HttpTransport::new(&config).unwrap().complete(&request()).await;
    assert!(result.failure().is_some_and(|f| f.is_transient()));
}

#[tokio::test]
async fn test_streaming_assembles_fragments() {
    let server = MockServer::start().await;
    let sse = concat!(
        ": keep-alive\n\n",
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Dear student,\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\" take BIOL 301.\"}}]}\r\n\r\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .mount(&server)
        .await;

    let seen = Mutex::new(Vec::new());
    let on_fragment = |f: &str| seen.lock().unwrap().push(f.to_string());
    let result = HttpTransport::new(&config_for(&server))
        .unwrap()
        .complete_streaming(&request(), &on_fragment)
        .await;

    assert_eq!(
        result,
        AdviceResult::Success {
            text: "Dear student, take BIOL 301.".into()
        }
    );
    assert_eq!(*seen.lock().unwrap(), vec!["Dear student,", " take BIOL 301."]);

    let received = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["stream"], true);
}

#[tokio::test]
async fn test_streaming_without_text_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("data: [DONE]\n\n", "text/event-stream"))
        .mount(&server)
        .await;

    let result = HttpTransport::new(&config_for(&server))
        .unwrap()
        .complete_streaming(&request(), &|_: &str| {})
        .await;
    assert!(matches!(
        result,
        AdviceResult::Failure(AdviceFailure::MalformedResponse { .. })
    ));
}

#[tokio::test]
async fn test_streaming_error_status_is_remote_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let result = HttpTransport::new(&config_for(&server))
        .unwrap()
        .complete_streaming(&request(), &|_: &str| {})
        .await;
    assert_eq!(result.failure().and_then(|f| f.status_code()), Some(503));
}

#[tokio::test]
async fn test_advisor_error_then_success_through_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("server exploded"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Take BIOL 301 and CHEM 210.")))
        .mount(&server)
        .await;

    let advisor = Advisor::new(&config_for(&server)).unwrap();
    let progress = progress_doc(pdf_bytes(b"p"));
    let schedule = schedule_doc(pdf_bytes(b"s"));

    let first = advisor.advise(Some(&progress), Some(&schedule)).await;
    let out = TerminalRenderer::default().render(&first);
    assert!(out.stderr.contains("500"));
    assert!(out.stderr.contains("server exploded"));

    let second = advisor.advise(Some(&progress), Some(&schedule)).await;
    assert_eq!(
        second,
        AdvisorState::Displayed {
            text: "Take BIOL 301 and CHEM 210.".into()
        }
    );

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].body, received[1].body, "both clicks send identical payloads");
}

#[tokio::test]
async fn test_retries_give_up_on_refused_connections() {
    // Port 1 refuses connections; every attempt fails and is retried.
    let config = AdvisorConfig::builder()
        .api_key("test-key")
        .base_url("http://127.0.0.1:1/v1")
        .max_retries(2)
        .retry_backoff_ms(1)
        .build()
        .unwrap();
    let advisor = Advisor::new(&config).unwrap();
    let progress = progress_doc(pdf_bytes(b"p"));
    let schedule = schedule_doc(pdf_bytes(b"s"));

    let state = advisor.advise(Some(&progress), Some(&schedule)).await;
    let AdvisorState::ErrorDisplayed { failure } = state else {
        panic!("expected a transport failure");
    };
    assert!(failure.is_transient());
}

#[test]
fn test_missing_api_key_is_reported() {
    let config = AdvisorConfig::builder().build().unwrap();
    let err = HttpTransport::new(&config).unwrap_err();
    assert!(err.to_string().contains("POE_API_KEY"));
}
