mod common;

use chrono::Utc;
use common::{ADMIN_TOKEN, CUSTOMER_TOKEN, ORGANIZATION_ID, OTHER_CUSTOMER_TOKEN};
use helpdesk::client::RealtimeConnection;
use helpdesk::helpers::JsonBody;
use helpdesk::models::Ticket;
use helpdesk::realtime::{ChangeKind, ServerMessage, Topic, TypingPayload, TYPING_EVENT};
use serde_json::json;
use std::time::Duration;

async fn connect(app: &common::TestApp, token: &str) -> RealtimeConnection {
    let url = format!("{}/api/realtime", app.address.replacen("http", "ws", 1));
    RealtimeConnection::connect(&url, token)
        .await
        .expect("Failed to open realtime connection")
}

async fn next_frame(connection: &mut RealtimeConnection) -> ServerMessage {
    tokio::time::timeout(Duration::from_secs(5), connection.next_message())
        .await
        .expect("No realtime frame in time")
        .expect("Realtime connection closed")
        .expect("Unreadable realtime frame")
}

/// Nothing arrives within `millis`.
async fn assert_quiet(connection: &mut RealtimeConnection, millis: u64) {
    let frame = tokio::time::timeout(Duration::from_millis(millis), connection.next_message()).await;
    assert!(frame.is_err(), "unexpected frame: {:?}", frame);
}

fn assert_status(frame: &ServerMessage, expected: &str, expected_topic: &str) {
    match frame {
        ServerMessage::System { status, topic, .. } => {
            assert_eq!(status, expected);
            assert_eq!(topic.as_deref(), Some(expected_topic));
        }
        other => panic!("expected {} status, got {:?}", expected, other),
    }
}

async fn create_ticket(app: &common::TestApp, client: &reqwest::Client) -> Ticket {
    let body: JsonBody<Ticket> = client
        .post(app.url("/api/tickets"))
        .bearer_auth(CUSTOMER_TOKEN)
        .json(&json!({ "subject": "App crashes", "message": "On startup" }))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .unwrap();
    body.item.expect("created ticket")
}

async fn admin_reply(app: &common::TestApp, client: &reqwest::Client, ticket: &Ticket) {
    let response = client
        .post(app.url(&format!("/api/tickets/{}/responses", ticket.id)))
        .bearer_auth(ADMIN_TOKEN)
        .json(&json!({ "message": "Looking into it" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn topics_are_checked_against_the_caller() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let ticket = create_ticket(&app, &client).await;
    let ticket_topic = Topic::Ticket(ticket.id);
    let organization_topic = Topic::Organization(ORGANIZATION_ID);

    let mut stranger = connect(&app, OTHER_CUSTOMER_TOKEN).await;
    stranger.subscribe(ticket_topic).await.unwrap();
    assert_status(&next_frame(&mut stranger).await, "CHANNEL_ERROR", &ticket_topic.to_string());

    let mut customer = connect(&app, CUSTOMER_TOKEN).await;
    customer.subscribe(organization_topic).await.unwrap();
    assert_status(
        &next_frame(&mut customer).await,
        "CHANNEL_ERROR",
        &organization_topic.to_string(),
    );

    let mut admin = connect(&app, ADMIN_TOKEN).await;
    admin.subscribe(organization_topic).await.unwrap();
    assert_status(
        &next_frame(&mut admin).await,
        "SUBSCRIBED",
        &organization_topic.to_string(),
    );

    admin_reply(&app, &client, &ticket).await;
    assert_quiet(&mut stranger, 300).await;
}

#[tokio::test]
async fn subscriber_receives_responses_until_unsubscribed() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let ticket = create_ticket(&app, &client).await;
    let topic = Topic::Ticket(ticket.id);

    let mut customer = connect(&app, CUSTOMER_TOKEN).await;
    customer.subscribe(topic).await.unwrap();
    assert_status(&next_frame(&mut customer).await, "SUBSCRIBED", &topic.to_string());

    admin_reply(&app, &client, &ticket).await;
    match next_frame(&mut customer).await {
        ServerMessage::PostgresChanges {
            table,
            event_type,
            record,
            ..
        } => {
            assert_eq!(table, "ticket_responses");
            assert_eq!(event_type, ChangeKind::Insert);
            assert_eq!(record["ticket_id"], json!(ticket.id));
            assert_eq!(record["message"], "Looking into it");
        }
        other => panic!("expected a response insert, got {:?}", other),
    }

    customer.unsubscribe(topic).await.unwrap();
    assert_status(&next_frame(&mut customer).await, "CLOSED", &topic.to_string());

    admin_reply(&app, &client, &ticket).await;
    assert_quiet(&mut customer, 300).await;
}

#[tokio::test]
async fn unsubscribe_right_after_subscribe_stays_closed() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let ticket = create_ticket(&app, &client).await;
    let topic = Topic::Ticket(ticket.id);

    let mut customer = connect(&app, CUSTOMER_TOKEN).await;
    customer.subscribe(topic).await.unwrap();
    customer.unsubscribe(topic).await.unwrap();

    // the access check may finish either side of the unsubscribe
    loop {
        match next_frame(&mut customer).await {
            ServerMessage::System { status, .. } if status == "CLOSED" => break,
            ServerMessage::System { status, .. } if status == "SUBSCRIBED" => continue,
            other => panic!("unexpected frame before CLOSED: {:?}", other),
        }
    }

    assert_quiet(&mut customer, 300).await;
    admin_reply(&app, &client, &ticket).await;
    assert_quiet(&mut customer, 300).await;
}

#[tokio::test]
async fn typing_carries_the_sender_role() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let ticket = create_ticket(&app, &client).await;
    let topic = Topic::Ticket(ticket.id);

    let mut admin = connect(&app, ADMIN_TOKEN).await;
    admin.subscribe(topic).await.unwrap();
    assert_status(&next_frame(&mut admin).await, "SUBSCRIBED", &topic.to_string());

    let mut customer = connect(&app, CUSTOMER_TOKEN).await;
    customer.subscribe(topic).await.unwrap();
    assert_status(&next_frame(&mut customer).await, "SUBSCRIBED", &topic.to_string());

    customer
        .send_typing(&TypingPayload {
            ticket_id: ticket.id,
            is_admin: true,
            timestamp: Utc::now(),
        })
        .await
        .unwrap();

    match next_frame(&mut admin).await {
        ServerMessage::Broadcast { event, payload, .. } => {
            assert_eq!(event, TYPING_EVENT);
            let payload: TypingPayload = serde_json::from_value(payload).unwrap();
            assert_eq!(payload.ticket_id, ticket.id);
            assert!(!payload.is_admin);
        }
        other => panic!("expected a typing broadcast, got {:?}", other),
    }
}
