use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use core_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstructionError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Instruction '{instruction_id}' not found in collection '{collection}'")]
    NotFound {
        collection: String,
        instruction_id: String,
    },

    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type InstructionResult<T> = Result<T, InstructionError>;

impl InstructionError {
    pub fn not_found(collection: &str, instruction_id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            instruction_id: instruction_id.to_string(),
        }
    }
}

impl From<reqwest::Error> for InstructionError {
    fn from(err: reqwest::Error) -> Self {
        InstructionError::Embedding(err.to_string())
    }
}

impl From<ConfigError> for InstructionError {
    fn from(err: ConfigError) -> Self {
        InstructionError::Config(err.to_string())
    }
}

/// Convert InstructionError to AppError for standardized HTTP error responses
impl From<InstructionError> for AppError {
    fn from(err: InstructionError) -> Self {
        let message = err.to_string();
        match err {
            InstructionError::Validation(msg) => AppError::BadRequest(msg),
            InstructionError::NotFound { .. } => AppError::NotFound(message),
            // A collection that was never ensured is a dependency failure, not a missing resource.
            InstructionError::CollectionNotFound(_)
            | InstructionError::Embedding(_)
            | InstructionError::Store(_) => AppError::DependencyFailure(message),
            InstructionError::Config(_) => AppError::InternalServerError(message),
        }
    }
}

impl IntoResponse for InstructionError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn status_of(err: InstructionError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(InstructionError::Validation("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(InstructionError::not_found("docs", "a1")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(InstructionError::CollectionNotFound("docs".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(InstructionError::Embedding("timeout".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(InstructionError::Store("upsert not completed".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(InstructionError::Config("missing".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message_names_both_keys() {
        let message = InstructionError::not_found("docs", "a1").to_string();
        assert!(message.contains("docs"));
        assert!(message.contains("a1"));
    }

    #[test]
    fn test_app_error_keeps_underlying_text() {
        let app: AppError = InstructionError::Embedding("connection refused".into()).into();
        assert!(app.to_string().contains("connection refused"));
    }
}
