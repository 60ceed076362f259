mod common;

#[tokio::test]
async fn health_check_works() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let response = reqwest::Client::new()
        .get(app.url("/health_check"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    assert_eq!(Some(0), response.content_length());
}

#[tokio::test]
async fn api_requires_bearer_token() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .get(app.url("/api/tickets"))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .get(app.url("/api/tickets"))
        .bearer_auth("unknown-token")
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 401);
}
