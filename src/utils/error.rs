use axum::http::StatusCode;
use serde_json::json;

/// Result type shared by the service helpers in `db::queries`.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the approval engine and number reservoir.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A referenced flow, step, approval record or reservoir entry is absent.
    #[error("{0}")]
    NotFound(String),

    /// The operation lost to an earlier one: already processed, already
    /// initiated, already verified, number already used.
    #[error("{0}")]
    Conflict(String),

    /// The caller is not the assigned approver, owner or required role holder.
    #[error("{0}")]
    Forbidden(String),

    /// The request is malformed given the branch taken (e.g. a user-specific
    /// flow without an assigned user).
    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored JSON (role lists, conditions) failed to decode.
    #[error("Malformed stored data: {0}")]
    Data(#[from] serde_json::Error),
}

impl ServiceError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        ServiceError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ServiceError::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ServiceError::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ServiceError::Validation(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Database(_) | ServiceError::Data(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Extra payload for the `errors` field of the response envelope.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            ServiceError::Database(e) => Some(json!({ "error": e.to_string() })),
            ServiceError::Data(e) => Some(json!({ "error": e.to_string() })),
            _ => None,
        }
    }
}

/// True when the error is a Postgres unique-constraint violation, used to map
/// insert races onto `Conflict` instead of a 500.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_http_status() {
        assert_eq!(
            ServiceError::not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::conflict("x").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::forbidden("x").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::validation("x").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::Database(sqlx::Error::PoolClosed).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_pass_through() {
        let err = ServiceError::conflict("approval already processed");
        assert_eq!(err.to_string(), "approval already processed");
        assert!(err.details().is_none());
    }
}
