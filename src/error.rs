use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::model::leave_request::LeaveType;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Already checked in today")]
    AlreadyCheckedIn,

    #[error("Not checked in today")]
    NotCheckedIn,

    #[error("Already checked out today")]
    AlreadyCheckedOut,

    #[error("Leave request has already been decided")]
    AlreadyDecided,

    #[error("Insufficient {0} leave balance")]
    InsufficientBalance(LeaveType),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::AlreadyCheckedIn => "ALREADY_CHECKED_IN",
            AppError::NotCheckedIn => "NOT_CHECKED_IN",
            AppError::AlreadyCheckedOut => "ALREADY_CHECKED_OUT",
            AppError::AlreadyDecided => "ALREADY_DECIDED",
            AppError::InsufficientBalance(_) => "INSUFFICIENT_BALANCE",
            AppError::Database(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Internal(_))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_)
            | AppError::AlreadyCheckedIn
            | AppError::NotCheckedIn
            | AppError::AlreadyCheckedOut
            | AppError::AlreadyDecided
            | AppError::InsufficientBalance(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Storage details stay in the log.
        let message = if self.is_internal() {
            error!(error = %self, "Request failed");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": message,
            "code": self.code(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::Validation("bad".into()), 400)]
    #[case(AppError::Unauthorized("no".into()), 401)]
    #[case(AppError::Forbidden("no".into()), 403)]
    #[case(AppError::NotFound("User"), 404)]
    #[case(AppError::AlreadyCheckedIn, 409)]
    #[case(AppError::AlreadyDecided, 409)]
    #[case(AppError::InsufficientBalance(LeaveType::Annual), 409)]
    #[case(AppError::Database(sqlx::Error::PoolTimedOut), 500)]
    fn maps_each_kind_to_its_status(#[case] err: AppError, #[case] status: u16) {
        assert_eq!(err.status_code().as_u16(), status);
    }

    #[actix_web::test]
    async fn internal_errors_are_redacted() {
        let resp = AppError::Database(sqlx::Error::PoolTimedOut).error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "Internal Server Error");
        assert_eq!(value["code"], "INTERNAL_ERROR");
    }

    #[actix_web::test]
    async fn domain_errors_carry_their_message() {
        let resp = AppError::InsufficientBalance(LeaveType::Personal).error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "Insufficient personal leave balance");
    }
}
