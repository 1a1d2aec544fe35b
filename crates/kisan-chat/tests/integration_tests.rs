//! HTTP contract tests for the backend transport and full turns over it.

use std::sync::Arc;

use kisan_chat::request::{TextChatBody, VoiceChatBody};
use kisan_chat::{
    fallback_message, AttachmentFile, Backend, ChatError, ChatSurface, HttpBackend,
    OutboundRequest, TurnOrchestrator,
};
use kisan_core::types::Turn;
use kisan_core::KisanConfig;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct NullSurface;

impl ChatSurface for NullSurface {
    fn set_input_enabled(&self, _enabled: bool) {}
    fn set_input_text(&self, _text: &str) {}
    fn set_typing(&self, _typing: bool) {}
    fn set_send_transcript_enabled(&self, _enabled: bool) {}
    fn set_voice_available(&self, _available: bool) {}
    fn set_speech_available(&self, _available: bool) {}
    fn set_listening(&self, _listening: bool) {}
    fn show_attachment(&self, _preview_uri: Option<&str>) {}
    fn show_turn(&self, _turn: &Turn, _markup: Option<&str>) {}
    fn show_notice(&self, _text: &str) {}
}

fn orchestrator_for(server: &MockServer) -> TurnOrchestrator {
    let mut config = KisanConfig::default();
    config.backend.base_url = server.uri();
    let backend = Arc::new(HttpBackend::new(server.uri()));
    TurnOrchestrator::new(config, backend, Arc::new(NullSurface))
}

fn text_request(message: &str) -> OutboundRequest {
    OutboundRequest::Text(TextChatBody {
        message: message.to_string(),
        location: None,
        session_id: None,
        gemini_api_key: None,
        conversation_history: vec![],
    })
}

// ── Config ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_backend_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "has_api_key": true,
            "app_name": "KisanGPT",
            "app_version": "1.0.0"
        })))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(format!("{}/", server.uri()));
    let info = backend.fetch_info().await.unwrap();
    assert!(info.has_api_key);
    assert_eq!(info.app_name.as_deref(), Some("KisanGPT"));
    assert_eq!(info.app_version.as_deref(), Some("1.0.0"));
}

// ── Text chat ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_text_turn_posts_json_with_location() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "message": "What crops should I grow in Punjab?",
            "location": "Punjab",
            "conversation_history": []
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Wheat in rabi, rice in kharif.",
            "session_id": "sess-42"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = orchestrator_for(&server);
    let outcome = orchestrator
        .submit_turn("What crops should I grow in Punjab?")
        .await
        .unwrap()
        .unwrap();

    assert!(!outcome.used_fallback);
    assert_eq!(outcome.assistant_turn.text(), "Wheat in rabi, rice in kharif.");
    assert_eq!(orchestrator.session_id().unwrap().as_deref(), Some("sess-42"));
}

#[tokio::test]
async fn test_second_turn_sends_session_and_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Noted.",
            "session_id": "sess-7"
        })))
        .mount(&server)
        .await;

    let orchestrator = orchestrator_for(&server);
    orchestrator.submit_turn("My farm is in Karnal").await.unwrap();
    orchestrator.submit_turn("What should I sow now?").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let second: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(second["session_id"], "sess-7");
    let history = second["conversation_history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["who"], "user");
    assert_eq!(history[0]["text"], "My farm is in Karnal");
    assert_eq!(history[1]["who"], "assistant");
}

// ── Image chat ────────────────────────────────────────────────────

#[tokio::test]
async fn test_image_turn_posts_multipart_and_clears_attachment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat-with-image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "This looks like yellow rust.",
            "session_id": "sess-img"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = orchestrator_for(&server);
    let image = AttachmentFile::new("leaf.jpg", "image/jpeg", vec![0xD8; 2 * 1024 * 1024]);
    orchestrator.attach(image).await.unwrap();

    let outcome = orchestrator
        .submit_turn("What disease is this?")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.assistant_turn.text(), "This looks like yellow rust.");
    assert!(!orchestrator.has_attachment().unwrap());

    let requests = server.received_requests().await.unwrap();
    let request = &requests[0];
    let content_type = request
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("multipart/form-data"));

    let body = String::from_utf8_lossy(&request.body);
    assert!(body.contains("name=\"message\""));
    assert!(body.contains("What disease is this?"));
    assert!(body.contains("name=\"image\"; filename=\"leaf.jpg\""));
    assert!(body.contains("image/jpeg"));
    assert!(!body.contains("name=\"session_id\""));
}

// ── Voice chat ────────────────────────────────────────────────────

#[tokio::test]
async fn test_voice_request_posts_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/voice-chat"))
        .and(body_partial_json(json!({ "transcript": "gehun ka bhav kya hai" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Wheat is trading near MSP."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let reply = backend
        .send(&OutboundRequest::Voice(VoiceChatBody {
            transcript: "gehun ka bhav kya hai".to_string(),
            session_id: None,
            conversation_history: vec![],
            gemini_api_key: None,
        }))
        .await
        .unwrap();
    assert_eq!(reply.response.as_deref(), Some("Wheat is trading near MSP."));
    assert!(reply.session_id.is_none());
}

// ── Failures ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_server_error_is_backend_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let err = backend.send(&text_request("hello")).await.unwrap_err();
    assert!(matches!(err, ChatError::BackendUnavailable(ref m) if m.contains("500")));

    let orchestrator = orchestrator_for(&server);
    let outcome = orchestrator.submit_turn("hello").await.unwrap().unwrap();
    assert!(outcome.used_fallback);
    assert_eq!(outcome.assistant_turn.text(), fallback_message());
    assert!(!orchestrator.is_turn_pending());
}

#[tokio::test]
async fn test_malformed_body_is_backend_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let err = backend.send(&text_request("hello")).await.unwrap_err();
    assert!(matches!(err, ChatError::BackendUnavailable(_)));
}

#[tokio::test]
async fn test_missing_response_field_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "session_id": "s" })))
        .mount(&server)
        .await;

    let orchestrator = orchestrator_for(&server);
    let outcome = orchestrator.submit_turn("hello").await.unwrap().unwrap();
    assert!(outcome.used_fallback);
}

#[tokio::test]
async fn test_unreachable_backend() {
    let backend = HttpBackend::new("http://127.0.0.1:9");
    let err = backend.send(&text_request("hello")).await.unwrap_err();
    assert!(matches!(err, ChatError::BackendUnavailable(_)));
    assert!(backend.fetch_info().await.is_err());
}
