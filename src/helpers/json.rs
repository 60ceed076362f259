use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{Error, HttpResponse};
use serde::{Deserialize, Serialize};

/// Envelope every `/api` route answers with.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonBody<T> {
    pub status: String,
    pub message: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<T>>,
}

pub struct JsonResponse;

pub struct JsonResponseBuilder<T>
where
    T: Serialize,
{
    id: Option<String>,
    item: Option<T>,
    list: Option<Vec<T>>,
}

impl<T> Default for JsonResponseBuilder<T>
where
    T: Serialize,
{
    fn default() -> Self {
        Self {
            id: None,
            item: None,
            list: None,
        }
    }
}

impl<T> JsonResponseBuilder<T>
where
    T: Serialize,
{
    pub fn set_item(mut self, item: T) -> Self {
        self.item = Some(item);
        self
    }

    pub fn set_list(mut self, list: Vec<T>) -> Self {
        self.list = Some(list);
        self
    }

    pub fn set_id(mut self, id: impl ToString) -> Self {
        self.id = Some(id.to_string());
        self
    }

    fn body(self, code: StatusCode, status: &str, message: &str) -> JsonBody<T> {
        JsonBody {
            status: status.to_string(),
            message: message.to_string(),
            code: code.as_u16(),
            id: self.id,
            item: self.item,
            list: self.list,
        }
    }

    pub fn ok(self, message: &str) -> HttpResponse {
        let msg = if message.trim().is_empty() {
            "Success"
        } else {
            message
        };
        HttpResponse::Ok().json(self.body(StatusCode::OK, "OK", msg))
    }

    pub fn created(self, message: &str) -> HttpResponse {
        HttpResponse::Created().json(self.body(StatusCode::CREATED, "OK", message))
    }
}

impl JsonResponse {
    pub fn build<T>() -> JsonResponseBuilder<T>
    where
        T: Serialize,
    {
        JsonResponseBuilder::default()
    }

    /// Success envelope without payload.
    pub fn ok(message: &str) -> HttpResponse {
        Self::build::<()>().ok(message)
    }

    fn error(code: StatusCode, message: String) -> Error {
        let body = JsonResponseBuilder::<()>::default().body(code, "Error", &message);
        InternalError::from_response(message, HttpResponse::build(code).json(body)).into()
    }

    pub fn bad_request(message: impl ToString) -> Error {
        Self::error(StatusCode::BAD_REQUEST, message.to_string())
    }

    /// 400 for a payload that failed `serde_valid` validation.
    pub fn form_error(errors: impl ToString) -> Error {
        Self::error(
            StatusCode::BAD_REQUEST,
            format!("Invalid data received: {}", errors.to_string()),
        )
    }

    pub fn unauthorized(message: impl ToString) -> Error {
        Self::error(StatusCode::UNAUTHORIZED, message.to_string())
    }

    pub fn forbidden(message: impl ToString) -> Error {
        Self::error(StatusCode::FORBIDDEN, message.to_string())
    }

    pub fn not_found(message: impl ToString) -> Error {
        Self::error(StatusCode::NOT_FOUND, message.to_string())
    }

    pub fn internal_server_error(message: impl ToString) -> Error {
        let message = message.to_string();
        let message = if message.trim().is_empty() {
            "Internal error".to_string()
        } else {
            message
        };
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Error body as a plain string, used where a middleware can only return text.
    pub fn error_text(code: StatusCode, message: &str) -> String {
        serde_json::to_string(&JsonResponseBuilder::<()>::default().body(code, "Error", message))
            .unwrap_or_else(|_| message.to_string())
    }
}
