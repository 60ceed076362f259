use crate::connectors::ChatCompletion;
use crate::forms::chat::{ChatReply, ChatRequest};
use crate::helpers::JsonResponse;
use crate::models;
use crate::services::chat::{self, ChatError};
use actix_web::{post, web, Responder, Result};
use sqlx::PgPool;
use std::sync::Arc;

impl From<ChatError> for actix_web::Error {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::NoMessages
            | ChatError::NoDefaultModel
            | ChatError::ModelNotFound
            | ChatError::UnsupportedModel => JsonResponse::bad_request(err),
            ChatError::Provider(_) => JsonResponse::internal_server_error(err),
            ChatError::Storage(message) => JsonResponse::internal_server_error(message),
        }
    }
}

/// POST /api/chat
/// Forwards the conversation to the caller's model and answers with its reply.
#[tracing::instrument(name = "Chat completion.", skip(pg_pool, provider, form))]
#[post("")]
pub async fn completion(
    user: web::ReqData<Arc<models::User>>,
    form: web::Json<ChatRequest>,
    pg_pool: web::Data<PgPool>,
    provider: web::Data<Arc<dyn ChatCompletion>>,
) -> Result<impl Responder> {
    let message = chat::reply(
        pg_pool.get_ref(),
        provider.get_ref().as_ref(),
        &user,
        &form.messages,
    )
    .await?;

    Ok(JsonResponse::build()
        .set_item(ChatReply { message })
        .ok("OK"))
}
