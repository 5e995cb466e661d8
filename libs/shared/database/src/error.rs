use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use shared_models::error::AppError;

/// Postgres error codes surfaced through PostgREST error bodies.
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Duplicate value: {0}")]
    UniqueViolation(String),

    #[error("Record is still referenced: {0}")]
    ForeignKeyViolation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DbError {
    /// Classifies a non-success PostgREST response.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let code = parsed.as_ref().and_then(|v| v["code"].as_str());
        let message = parsed
            .as_ref()
            .and_then(|v| v["details"].as_str().or_else(|| v["message"].as_str()))
            .unwrap_or(body)
            .to_string();

        match code {
            Some(UNIQUE_VIOLATION) => return DbError::UniqueViolation(message),
            Some(FOREIGN_KEY_VIOLATION) => return DbError::ForeignKeyViolation(message),
            _ => {}
        }

        match status.as_u16() {
            401 | 403 => DbError::Auth(message),
            404 => DbError::NotFound(message),
            other => DbError::Api { status: other, message },
        }
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation(msg) => AppError::Conflict(msg),
            DbError::ForeignKeyViolation(msg) => AppError::Conflict(msg),
            DbError::NotFound(msg) => AppError::NotFound(msg),
            DbError::Auth(msg) => AppError::Auth(msg),
            other => AppError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_duplicate_key_is_unique_violation() {
        let body = r#"{"code":"23505","details":"Key (room_number)=(101) already exists.","hint":null,"message":"duplicate key value violates unique constraint"}"#;
        let err = DbError::from_response(StatusCode::CONFLICT, body);
        assert_matches!(err, DbError::UniqueViolation(ref msg) if msg.contains("room_number"));
        assert_matches!(AppError::from(err), AppError::Conflict(_));
    }

    #[test]
    fn test_foreign_key_violation() {
        let body = r#"{"code":"23503","details":null,"hint":null,"message":"update or delete violates foreign key constraint"}"#;
        let err = DbError::from_response(StatusCode::CONFLICT, body);
        assert_matches!(err, DbError::ForeignKeyViolation(ref msg) if msg.contains("foreign key"));
    }

    #[test]
    fn test_status_fallbacks() {
        assert_matches!(DbError::from_response(StatusCode::UNAUTHORIZED, "nope"), DbError::Auth(_));
        assert_matches!(
            DbError::from_response(StatusCode::BAD_REQUEST, "bad"),
            DbError::Api { status: 400, .. }
        );
    }
}
