use helpdesk::configuration::ChatSettings;
use helpdesk::connectors::{
    ChatCompletion, ChatMessage, HttpObjectStorage, LlmClient, LlmError, ObjectStorage,
    StorageError,
};
use helpdesk::models::AiModel;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn model(name: &str, endpoint: Option<String>) -> AiModel {
    AiModel {
        id: Uuid::new_v4(),
        name: name.to_string(),
        api_key: "secret".to_string(),
        endpoint,
        max_tokens: 256,
        system_message: "You are a support assistant".to_string(),
    }
}

fn llm_client(openai_url: String) -> LlmClient {
    LlmClient::new(&ChatSettings {
        request_timeout_secs: 5,
        openai_url,
    })
}

#[tokio::test]
async fn openai_request_carries_system_message_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer secret"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "max_tokens": 256,
            "messages": [
                { "role": "system", "content": "You are a support assistant" },
                { "role": "user", "content": "Where is my invoice?" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Check the billing tab." } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = llm_client(format!("{}/v1/chat/completions", server.uri()));
    let answer = client
        .complete(&model("gpt-4o", None), &[ChatMessage::user("Where is my invoice?")])
        .await
        .unwrap();
    assert_eq!(answer, "Check the billing tab.");
}

#[tokio::test]
async fn compatible_provider_uses_model_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/deepseek/chat"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "Hello from deepseek" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = llm_client("http://127.0.0.1:9/unused".to_string());
    let deepseek = model("deepseek-chat", Some(format!("{}/deepseek/chat", server.uri())));
    let answer = client
        .complete(&deepseek, &[ChatMessage::user("hi")])
        .await
        .unwrap();
    assert_eq!(answer, "Hello from deepseek");

    let missing = client
        .complete(&model("grok-beta", None), &[ChatMessage::user("hi")])
        .await;
    assert!(matches!(missing, Err(LlmError::MissingEndpoint(_))));
}

#[tokio::test]
async fn inference_endpoint_gets_latest_message_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(body_partial_json(json!({
            "inputs": "second question",
            "parameters": { "max_new_tokens": 256 }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "generated_text": "llama says hi" }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = llm_client(String::new());
    let model = model("llama-3-70b", Some(format!("{}/generate", server.uri())));
    let answer = client
        .complete(
            &model,
            &[
                ChatMessage::user("first question"),
                ChatMessage::user("second question"),
            ],
        )
        .await
        .unwrap();
    assert_eq!(answer, "llama says hi");
}

#[tokio::test]
async fn anthropic_request_uses_api_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "secret"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-haiku",
            "system": "You are a support assistant",
            "messages": [{ "role": "user", "content": "hello" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "text", "text": "Hi, how can I help?" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = llm_client(String::new());
    let model = model("claude-3-haiku", Some(format!("{}/v1/messages", server.uri())));
    let answer = client
        .complete(&model, &[ChatMessage::user("hello")])
        .await
        .unwrap();
    assert_eq!(answer, "Hi, how can I help?");
}

#[tokio::test]
async fn provider_failure_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let client = llm_client(format!("{}/v1/chat/completions", server.uri()));
    let err = client
        .complete(&model("gpt-4o", None), &[ChatMessage::user("hi")])
        .await
        .unwrap_err();
    match err {
        LlmError::Status { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "slow down");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let unsupported = client
        .complete(&model("gemini-pro", None), &[ChatMessage::user("hi")])
        .await;
    assert!(matches!(unsupported, Err(LlmError::UnsupportedModel(_))));
}

#[tokio::test]
async fn storage_upload_never_overwrites() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/ticket-attachments/u1/t1/1_a.png"))
        .and(header("authorization", "Bearer service-key"))
        .and(header("x-upsert", "false"))
        .and(header("content-type", "image/png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Key": "ticket-attachments/u1/t1/1_a.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let storage = HttpObjectStorage::new(
        &format!("{}/storage/v1/", server.uri()),
        "service-key",
        "ticket-attachments",
    );
    let stored = storage
        .upload("u1/t1/1_a.png", "image/png", vec![1, 2, 3])
        .await
        .unwrap();
    assert_eq!(stored, "u1/t1/1_a.png");
}

#[tokio::test]
async fn storage_rejection_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(409).set_body_string("The resource already exists"))
        .mount(&server)
        .await;

    let storage = HttpObjectStorage::new(&server.uri(), "service-key", "ticket-attachments");
    let err = storage
        .upload("u1/t1/1_a.png", "image/png", vec![1])
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Rejected { status: 409, .. }));
}

#[tokio::test]
async fn signed_url_is_made_absolute() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/sign/ticket-attachments/u1/t1/1_a.png"))
        .and(body_partial_json(json!({ "expiresIn": 600 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "signedURL": "/object/sign/ticket-attachments/u1/t1/1_a.png?token=abc"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/storage/v1", server.uri());
    let storage = HttpObjectStorage::new(&base, "service-key", "ticket-attachments");
    let url = storage.signed_url("u1/t1/1_a.png", 600).await.unwrap();
    assert_eq!(
        url,
        format!("{base}/object/sign/ticket-attachments/u1/t1/1_a.png?token=abc")
    );
}
