mod common;

use common::{CUSTOMER_TOKEN, ORGANIZATION_ID};
use helpdesk::configuration::get_configuration;
use helpdesk::forms::chat::ChatReply;
use helpdesk::helpers::JsonBody;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn chat_without_any_model_is_rejected() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let response = reqwest::Client::new()
        .post(app.url("/api/chat"))
        .bearer_auth(CUSTOMER_TOKEN)
        .json(&json!({ "messages": [{ "role": "user", "content": "hi" }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let body: JsonBody<()> = response.json().await.unwrap();
    assert_eq!(body.message, "No default model available. Please contact an admin.");
}

#[tokio::test]
async fn chat_uses_organization_default_model() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer org-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "Try restarting the router." } }]
        })))
        .expect(1)
        .mount(&provider)
        .await;

    let mut configuration = get_configuration().expect("Failed to get configuration");
    configuration.chat.openai_url = format!("{}/v1/chat/completions", provider.uri());
    let Some(app) = common::spawn_app_with(configuration).await else {
        return;
    };

    sqlx::query(
        "INSERT INTO ai_models_default (organization_id, name, api_key, system_message) VALUES ($1, 'gpt-4o-mini', 'org-key', 'Be helpful')",
    )
    .bind(ORGANIZATION_ID)
    .execute(&app.db_pool)
    .await
    .unwrap();

    let client = reqwest::Client::new();
    let empty = client
        .post(app.url("/api/chat"))
        .bearer_auth(CUSTOMER_TOKEN)
        .json(&json!({ "messages": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status().as_u16(), 400);

    let body: JsonBody<ChatReply> = client
        .post(app.url("/api/chat"))
        .bearer_auth(CUSTOMER_TOKEN)
        .json(&json!({ "messages": [{ "role": "user", "content": "My internet is down" }] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body.item.unwrap().message, "Try restarting the router.");

    let saved: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM ai_user_settings WHERE user_id = $1 AND selected_model_type = 'default'",
    )
    .bind(common::CUSTOMER_ID)
    .fetch_one(&app.db_pool)
    .await
    .unwrap();
    assert_eq!(saved, 1);
}
