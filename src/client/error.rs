use crate::connectors::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message} ({code})")]
    Api { code: u16, message: String },
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("realtime connection: {0}")]
    Realtime(String),
    #[error("{0}")]
    Validation(String),
}

impl From<StorageError> for ClientError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TooLarge(_) | StorageError::TypeNotAllowed(_) => {
                ClientError::Validation(err.to_string())
            }
            other => ClientError::Upload(other.to_string()),
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::Realtime(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_validation_stays_validation() {
        let err: ClientError = StorageError::TypeNotAllowed("application/zip".into()).into();
        assert!(matches!(err, ClientError::Validation(_)));

        let err: ClientError = StorageError::Rejected {
            status: 409,
            message: "exists".into(),
        }
        .into();
        assert!(matches!(err, ClientError::Upload(_)));
    }
}
