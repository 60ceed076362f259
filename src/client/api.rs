//! HTTP access to the desk server.
//!
//! Every `/api` route answers with the `{status, message, code, item?, list?, id?}`
//! envelope. Non-2xx answers become [`ClientError::Api`] carrying the server message.

use super::ClientError;
use crate::connectors::ChatMessage;
use crate::forms::chat::ChatReply;
use crate::forms::ticket::{CreateTicket, NewResponse};
use crate::helpers::JsonBody;
use crate::models::{Ticket, TicketResponse, TicketStatus, User};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Calls the ticket hooks depend on.
#[async_trait]
pub trait DeskApi: Send + Sync {
    async fn list_tickets(
        &self,
        status: TicketStatus,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Ticket>, ClientError>;

    /// Returns the responses that flipped to read.
    async fn mark_read(&self, ticket_id: Uuid) -> Result<Vec<TicketResponse>, ClientError>;

    async fn send_response(
        &self,
        ticket_id: Uuid,
        response: &NewResponse,
    ) -> Result<TicketResponse, ClientError>;
}

#[derive(Debug, Deserialize)]
struct SignedUrl {
    url: String,
}

#[derive(Serialize)]
struct TicketRef {
    ticket_id: Uuid,
}

#[derive(Serialize)]
struct StatusChange {
    ticket_id: Uuid,
    status: TicketStatus,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    messages: &'a [ChatMessage],
}

pub struct DeskClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl DeskClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Websocket endpoint matching the HTTP base url.
    pub fn realtime_url(&self) -> String {
        let base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!("{base}/api/realtime")
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<JsonBody<T>, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<JsonBody<serde_json::Value>>(&body)
                .map(|envelope| envelope.message)
                .unwrap_or(body);
            return Err(ClientError::Api { code, message });
        }
        Ok(response.json::<JsonBody<T>>().await?)
    }

    fn missing(what: &str) -> ClientError {
        ClientError::Api {
            code: 200,
            message: format!("response carried no {what}"),
        }
    }

    async fn item<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, ClientError> {
        Self::envelope::<T>(request.send().await?)
            .await?
            .item
            .ok_or_else(|| Self::missing("item"))
    }

    async fn list<T: DeserializeOwned>(
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<T>, ClientError> {
        Ok(Self::envelope::<T>(request.send().await?)
            .await?
            .list
            .unwrap_or_default())
    }

    pub async fn me(&self) -> Result<User, ClientError> {
        Self::item(self.http.get(self.url("/api/me")).bearer_auth(&self.token)).await
    }

    pub async fn ticket(&self, id: Uuid) -> Result<Ticket, ClientError> {
        Self::item(
            self.http
                .get(self.url(&format!("/api/tickets/{id}")))
                .bearer_auth(&self.token),
        )
        .await
    }

    pub async fn create_ticket(&self, ticket: &CreateTicket) -> Result<Ticket, ClientError> {
        Self::item(
            self.http
                .post(self.url("/api/tickets"))
                .bearer_auth(&self.token)
                .json(ticket),
        )
        .await
    }

    pub async fn update_status(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<Ticket, ClientError> {
        Self::item(
            self.http
                .patch(self.url("/api/tickets/status"))
                .bearer_auth(&self.token)
                .json(&StatusChange { ticket_id, status }),
        )
        .await
    }

    pub async fn attachment_url(&self, attachment_id: Uuid) -> Result<String, ClientError> {
        let signed: SignedUrl = Self::item(
            self.http
                .get(self.url(&format!("/api/tickets/attachments/{attachment_id}/url")))
                .bearer_auth(&self.token),
        )
        .await?;
        Ok(signed.url)
    }

    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ClientError> {
        let reply: ChatReply = Self::item(
            self.http
                .post(self.url("/api/chat"))
                .bearer_auth(&self.token)
                .json(&ChatBody { messages }),
        )
        .await?;
        Ok(reply.message)
    }
}

#[async_trait]
impl DeskApi for DeskClient {
    async fn list_tickets(
        &self,
        status: TicketStatus,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Ticket>, ClientError> {
        let offset = offset.to_string();
        let limit = limit.to_string();
        Self::list(
            self.http
                .get(self.url("/api/tickets"))
                .bearer_auth(&self.token)
                .query(&[
                    ("status", status.as_str()),
                    ("offset", offset.as_str()),
                    ("limit", limit.as_str()),
                ]),
        )
        .await
    }

    async fn mark_read(&self, ticket_id: Uuid) -> Result<Vec<TicketResponse>, ClientError> {
        Self::list(
            self.http
                .post(self.url("/api/tickets/mark-read"))
                .bearer_auth(&self.token)
                .json(&TicketRef { ticket_id }),
        )
        .await
    }

    async fn send_response(
        &self,
        ticket_id: Uuid,
        response: &NewResponse,
    ) -> Result<TicketResponse, ClientError> {
        Self::item(
            self.http
                .post(self.url(&format!("/api/tickets/{ticket_id}/responses")))
                .bearer_auth(&self.token)
                .json(response),
        )
        .await
    }
}
