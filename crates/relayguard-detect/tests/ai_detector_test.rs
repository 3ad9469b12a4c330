//! Integration tests for the AI detector against a mock provider.
//!
//! Each test starts a wiremock server standing in for an OpenAI-compatible
//! endpoint and checks both the outgoing request and the resulting verdict.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use relayguard_core::{
    Attachment, DetectionContext, DetectionMethod, DetectionVerdict, Error, FileFetcher, Message,
    PhotoSize, Result, SpamDetector,
};
use relayguard_detect::ai::{ClassifyError, IMAGE_ONLY_PROMPT};
use relayguard_detect::{AiDetector, AiDetectorConfig};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct StaticFetcher {
    files: HashMap<&'static str, &'static [u8]>,
}

#[async_trait]
impl FileFetcher for StaticFetcher {
    async fn fetch_file(&self, file_id: &str) -> Result<Vec<u8>> {
        self.files
            .get(file_id)
            .map(|data| data.to_vec())
            .ok_or_else(|| Error::FileFetch(format!("no such file: {}", file_id)))
    }
}

fn chat_response(content: Value) -> Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

fn detector_for(server: &MockServer) -> AiDetector {
    let config = AiDetectorConfig {
        model: "test-model".to_string(),
        ..AiDetectorConfig::new(format!("{}/v1", server.uri()), "test-key")
    };
    AiDetector::new(config).expect("Failed to create detector")
}

async fn mount_answer(server: &MockServer, content: Value) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(content)))
        .mount(server)
        .await;
}

async fn sent_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    serde_json::from_slice(&requests[0].body).expect("request body is JSON")
}

#[tokio::test]
async fn test_request_shape_and_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(json!({"model": "test-model", "temperature": 0.0})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_response(json!("{\"spam\": false, \"confidence\": 0.1}"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let verdict = detector_for(&server)
        .detect(&Message::text("hello there"), None)
        .await;
    assert_eq!(verdict, DetectionVerdict::Clean);

    let body = sent_body(&server).await;
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"][0]["type"], "text");
    assert_eq!(
        body["messages"][1],
        json!({"role": "user", "content": [{"type": "text", "text": "hello there"}]})
    );
}

#[tokio::test]
async fn test_spam_at_threshold() {
    let server = MockServer::start().await;
    mount_answer(
        &server,
        json!("{\"spam\": true, \"confidence\": 0.5, \"reason\": \"crypto promo\"}"),
    )
    .await;

    let verdict = detector_for(&server)
        .detect(&Message::text("Join my crypto group"), None)
        .await;

    let evidence = verdict.evidence().expect("expected spam");
    assert_eq!(evidence.method, DetectionMethod::Ai);
    assert_eq!(evidence.detector, "AI Detector");
    assert_eq!(evidence.confidence, Some(0.5));
    assert_eq!(evidence.reason.as_deref(), Some("crypto promo"));
}

#[tokio::test]
async fn test_below_threshold_is_clean() {
    let server = MockServer::start().await;
    mount_answer(&server, json!("{\"spam\": true, \"confidence\": 0.4}")).await;

    let verdict = detector_for(&server)
        .detect(&Message::text("maybe spam"), None)
        .await;
    assert_eq!(verdict, DetectionVerdict::Clean);
}

#[tokio::test]
async fn test_out_of_range_confidence_is_clamped() {
    let server = MockServer::start().await;
    mount_answer(&server, json!("{\"spam\": true, \"confidence\": 97}")).await;

    let verdict = detector_for(&server)
        .detect(&Message::text("buy now"), None)
        .await;
    assert_eq!(verdict.evidence().and_then(|e| e.confidence), Some(1.0));
}

#[tokio::test]
async fn test_fenced_answer() {
    let server = MockServer::start().await;
    mount_answer(
        &server,
        json!("```json\n{\"spam\": true, \"confidence\": 0.9, \"reason\": \"ad\"}\n```"),
    )
    .await;

    let verdict = detector_for(&server)
        .detect(&Message::text("Cheap watches"), None)
        .await;
    assert!(verdict.is_spam());
}

#[tokio::test]
async fn test_gemini_parts_answer() {
    let server = MockServer::start().await;
    mount_answer(
        &server,
        json!([
            {"text": "{\"spam\": true,"},
            {"text": "\"confidence\": 0.8, \"reason\": \"phishing\"}"}
        ]),
    )
    .await;

    let verdict = detector_for(&server)
        .detect(&Message::text("Verify your wallet"), None)
        .await;
    assert_eq!(
        verdict.evidence().and_then(|e| e.reason.as_deref()),
        Some("phishing")
    );
}

#[tokio::test]
async fn test_non_json_answer_fails_open() {
    let server = MockServer::start().await;
    mount_answer(&server, json!("Yes, this looks like spam.")).await;

    let detector = detector_for(&server);
    let message = Message::text("spam?");
    assert!(matches!(
        detector.classify(&message, None).await,
        Err(ClassifyError::InvalidPayload(_))
    ));
    assert_eq!(detector.detect(&message, None).await, DetectionVerdict::Clean);
}

#[tokio::test]
async fn test_server_error_fails_open() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"message": "upstream exploded", "type": "server_error"}
        })))
        .mount(&server)
        .await;

    let detector = detector_for(&server);
    let message = Message::text("hello");
    match detector.classify(&message, None).await {
        Err(ClassifyError::Status {
            status, message, ..
        }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("expected status error, got {:?}", other),
    }
    assert_eq!(detector.detect(&message, None).await, DetectionVerdict::Clean);
}

#[tokio::test]
async fn test_connection_refused_fails_open() {
    // Reserve a port, then release it so nothing is listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let detector = AiDetector::new(AiDetectorConfig::new(
        format!("http://127.0.0.1:{}/v1", port),
        "test-key",
    ))
    .unwrap();
    let message = Message::text("hello");

    assert!(matches!(
        detector.classify(&message, None).await,
        Err(ClassifyError::Transport(_))
    ));
    assert_eq!(detector.detect(&message, None).await, DetectionVerdict::Clean);
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_response(json!("{\"spam\": true, \"confidence\": 1}")))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = AiDetectorConfig {
        timeout_seconds: 1,
        ..AiDetectorConfig::new(format!("{}/v1", server.uri()), "test-key")
    };
    let detector = AiDetector::new(config).unwrap();

    assert!(matches!(
        detector.classify(&Message::text("hello"), None).await,
        Err(ClassifyError::Timeout)
    ));
}

#[tokio::test]
async fn test_empty_message_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let verdict = detector_for(&server)
        .detect(&Message::default(), None)
        .await;
    assert_eq!(verdict, DetectionVerdict::Clean);
}

#[tokio::test]
async fn test_missing_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let detector =
        AiDetector::new(AiDetectorConfig::new(format!("{}/v1", server.uri()), "")).unwrap();
    assert!(!detector.enabled(None));
    assert_eq!(
        detector.detect(&Message::text("free crypto"), None).await,
        DetectionVerdict::Clean
    );
}

#[tokio::test]
async fn test_context_disable_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let detector = detector_for(&server);
    let context = DetectionContext::new().with_ai(false);
    assert!(!detector.enabled(Some(&context)));
    assert_eq!(
        detector.detect(&Message::text("free crypto"), Some(&context)).await,
        DetectionVerdict::Clean
    );
}

#[tokio::test]
async fn test_images_sent_and_failed_download_skipped() {
    let server = MockServer::start().await;
    mount_answer(&server, json!("{\"spam\": true, \"confidence\": 0.95}")).await;

    let fetcher = StaticFetcher {
        files: HashMap::from([("photo-big", b"jpegbytes".as_slice())]),
    };
    let detector = detector_for(&server).with_fetcher(Arc::new(fetcher));

    let message = Message::default()
        .with_attachment(Attachment::photo(vec![
            PhotoSize {
                file_id: "photo-small".to_string(),
                width: 90,
                height: 90,
                file_size: None,
            },
            PhotoSize {
                file_id: "photo-big".to_string(),
                width: 1280,
                height: 720,
                file_size: Some(120_000),
            },
        ]))
        .with_attachment(Attachment::document("missing-doc", Some("image/png")));

    let verdict = detector.detect(&message, None).await;
    assert!(verdict.is_spam());

    let body = sent_body(&server).await;
    let user_content = body["messages"][1]["content"].as_array().unwrap();
    assert_eq!(user_content.len(), 2);
    assert_eq!(user_content[0]["text"], IMAGE_ONLY_PROMPT);
    assert_eq!(user_content[1]["type"], "image_url");
    assert_eq!(
        user_content[1]["image_url"]["url"],
        "data:image/jpeg;base64,anBlZ2J5dGVz"
    );
}

#[tokio::test]
async fn test_caption_used_when_text_missing() {
    let server = MockServer::start().await;
    mount_answer(&server, json!("{\"spam\": false}")).await;

    let message = Message::default().with_caption("caption words");
    detector_for(&server).detect(&message, None).await;

    let body = sent_body(&server).await;
    assert_eq!(body["messages"][1]["content"][0]["text"], "caption words");
}

#[tokio::test]
async fn test_dropped_detect_returns_promptly() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_response(json!("{\"spam\": true, \"confidence\": 1}")))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let detector = detector_for(&server);
    let message = Message::text("buy now");

    let start = std::time::Instant::now();
    let result =
        tokio::time::timeout(Duration::from_millis(200), detector.detect(&message, None)).await;

    assert!(result.is_err(), "caller deadline should win, got {:?}", result);
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_shared_detector_handles_concurrent_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_response(json!("{\"spam\": true, \"confidence\": 0.9}")))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(8)
        .mount(&server)
        .await;

    let detector = Arc::new(detector_for(&server));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let detector = Arc::clone(&detector);
            tokio::spawn(async move {
                detector
                    .detect(&Message::text(format!("promo blast #{}", i)), None)
                    .await
            })
        })
        .collect();

    for handle in handles {
        let verdict = handle.await.expect("detect task panicked");
        assert!(verdict.is_spam());
    }
}
