use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::{DOCTYPE, html};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Session data could not be encoded.
    #[error("Session encode error: {0}")]
    SessionEncode(#[from] bincode::error::EncodeError),

    /// Session data could not be decoded.
    #[error("Session decode error: {0}")]
    SessionDecode(#[from] bincode::error::DecodeError),

    /// No matching record was found.
    #[error("no matching record found")]
    NoRecord,

    /// The email address is already registered.
    #[error("duplicate email")]
    DuplicateEmail,

    /// The email/password pair did not match a user.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A malformed request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NoRecord | AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::NoRecord | AppError::NotFound => {
                tracing::debug!("Resource not found");
            }
            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
            }
            other => {
                tracing::error!(error = %other, "server error");
            }
        }

        error_page(status)
    }
}

/// A minimal HTML page for `status` that reveals nothing about the cause.
pub fn error_page(status: StatusCode) -> Response {
    let title = status.canonical_reason().unwrap_or("Error");
    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) " - Snippetbox" }
            }
            body {
                h1 { (status.as_u16()) " " (title) }
                a href="/" { "Back to Snippetbox" }
            }
        }
    };

    (status, Html(markup.into_string())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_display() {
        assert_eq!(AppError::NoRecord.to_string(), "no matching record found");
        assert_eq!(AppError::DuplicateEmail.to_string(), "duplicate email");
        assert_eq!(AppError::InvalidCredentials.to_string(), "invalid credentials");
    }

    #[test]
    fn no_record_is_not_found() {
        let response = AppError::NoRecord.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn bad_request_is_400() {
        let response = AppError::BadRequest("bad form".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_errors_hide_detail() {
        let response = AppError::Internal("secret detail".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
