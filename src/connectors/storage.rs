//! Object storage for ticket attachments.
//!
//! Files go to `{url}/object/{bucket}/{path}` and are read back through signed URLs.
//! Routes and the client only see the [`ObjectStorage`] trait.

use crate::configuration::StorageSettings;
use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use uuid::Uuid;

pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/plain",
    "text/csv",
];

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File size exceeds 10MB limit ({0:.2}MB)")]
    TooLarge(f64),
    #[error("File type not allowed: {0}")]
    TypeNotAllowed(String),
    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("storage rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl From<StorageError> for super::ConnectorError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TooLarge(_) | StorageError::TypeNotAllowed(_) => {
                Self::BadRequest(err.to_string())
            }
            StorageError::Http(err) => err.into(),
            StorageError::Rejected { status: 404, message } => Self::NotFound(message),
            StorageError::Rejected { status: 401 | 403, message } => Self::Unauthorized(message),
            StorageError::Rejected { message, .. } => Self::InvalidResponse(message),
        }
    }
}

/// Reject files the attachment bucket does not accept.
pub fn validate_file(file_size: u64, file_type: &str) -> Result<(), StorageError> {
    if file_size > MAX_FILE_SIZE {
        return Err(StorageError::TooLarge(file_size as f64 / 1024.0 / 1024.0));
    }
    if !ALLOWED_MIME_TYPES.contains(&file_type) {
        return Err(StorageError::TypeNotAllowed(file_type.to_string()));
    }
    Ok(())
}

pub fn sanitize_file_name(name: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let re = UNSAFE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9._-]").expect("valid regex"));
    re.replace_all(name, "_").into_owned()
}

/// `{user_id}/{ticket_id}/{timestamp_ms}_{sanitized name}`
pub fn object_path(user_id: Uuid, ticket_id: Uuid, file_name: &str) -> String {
    format!(
        "{}/{}/{}_{}",
        user_id,
        ticket_id,
        Utc::now().timestamp_millis(),
        sanitize_file_name(file_name)
    )
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `path`. Existing objects are never overwritten.
    async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>)
        -> Result<String, StorageError>;

    /// Time-limited download URL for `path`.
    async fn signed_url(&self, path: &str, expires_in_secs: u64) -> Result<String, StorageError>;
}

#[derive(Debug, Serialize)]
struct SignRequest {
    #[serde(rename = "expiresIn")]
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

#[derive(Clone)]
pub struct HttpObjectStorage {
    http: reqwest::Client,
    base_url: String,
    token: String,
    bucket: String,
}

impl HttpObjectStorage {
    pub fn new(base_url: &str, token: &str, bucket: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            bucket: bucket.to_string(),
        }
    }

    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::new(&settings.url, &settings.service_key, &settings.bucket)
    }

    async fn rejected(response: reqwest::Response) -> StorageError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "no response body".to_string());
        StorageError::Rejected { status, message }
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    #[tracing::instrument(name = "Upload object.", skip(self, bytes))]
    async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        let url = format!("{}/object/{}/{}", self.base_url, self.bucket, path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("Content-Type", content_type)
            .header("cache-control", "3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }
        // the API answers with `{bucket}/{path}`, rows keep the bucket-relative path
        Ok(path.to_string())
    }

    #[tracing::instrument(name = "Sign object url.", skip(self))]
    async fn signed_url(&self, path: &str, expires_in_secs: u64) -> Result<String, StorageError> {
        let url = format!("{}/object/sign/{}/{}", self.base_url, self.bucket, path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&SignRequest {
                expires_in: expires_in_secs,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }
        let signed = response.json::<SignResponse>().await?;
        if signed.signed_url.starts_with("http") {
            Ok(signed.signed_url)
        } else {
            Ok(format!("{}{}", self.base_url, signed.signed_url))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_file_name("my report (v2).pdf"), "my_report__v2_.pdf");
        assert_eq!(sanitize_file_name("ok-name_1.txt"), "ok-name_1.txt");
        assert_eq!(sanitize_file_name("résumé.doc"), "r_sum_.doc");
    }

    #[test]
    fn test_object_path_layout() {
        let user = Uuid::new_v4();
        let ticket = Uuid::new_v4();
        let path = object_path(user, ticket, "a b.png");
        let parts: Vec<&str> = path.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], user.to_string());
        assert_eq!(parts[1], ticket.to_string());
        let (stamp, name) = parts[2].split_once('_').unwrap();
        assert!(stamp.parse::<i64>().is_ok());
        assert_eq!(name, "a_b.png");
    }

    #[test]
    fn test_validate_file_limits() {
        assert!(validate_file(1024, "image/png").is_ok());
        assert!(validate_file(MAX_FILE_SIZE, "text/csv").is_ok());
        assert!(matches!(
            validate_file(MAX_FILE_SIZE + 1, "image/png"),
            Err(StorageError::TooLarge(_))
        ));
        assert!(matches!(
            validate_file(10, "application/x-msdownload"),
            Err(StorageError::TypeNotAllowed(_))
        ));
    }
}
