//! HTTP error mapping.
//!
//! Every failure leaves the server as `{"error": {"code", "message"}}` with a
//! stable SCREAMING_SNAKE_CASE code.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use quire_core::{AiError, AiErrorKind};

#[derive(Debug)]
pub enum ApiError {
    /// Storage or other unexpected failure. Details are logged, never returned.
    Internal(quire_core::Error),
    Unauthorized { code: &'static str, message: String },
    NotFound { code: &'static str, message: String },
    BadRequest(String),
    Ai(AiError),
    RateLimited { code: &'static str, retry_after_secs: u64 },
}

/// Wire shape of an error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            code: "UNAUTHORIZED",
            message: message.into(),
        }
    }

    pub fn token_expired() -> Self {
        ApiError::Unauthorized {
            code: "TOKEN_EXPIRED",
            message: "Token has expired".to_string(),
        }
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            code: "INVALID_TOKEN",
            message: message.into(),
        }
    }

    pub fn route_not_found(method: &str, path: &str) -> Self {
        ApiError::NotFound {
            code: "NOT_FOUND",
            message: format!("Route {} {} not found", method, path),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Ai(err) => ai_status(err.kind()),
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::Unauthorized { code, .. } => *code,
            ApiError::NotFound { code, .. } => *code,
            ApiError::BadRequest(_) => "VALIDATION_ERROR",
            ApiError::Ai(err) => err.kind().as_code(),
            ApiError::RateLimited { code, .. } => *code,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Internal(_) => "Internal server error".to_string(),
            ApiError::Unauthorized { message, .. } => message.clone(),
            ApiError::NotFound { message, .. } => message.clone(),
            ApiError::BadRequest(message) => message.clone(),
            ApiError::Ai(err) => err.to_string(),
            ApiError::RateLimited { code, .. } if *code == "AI_RATE_LIMIT_EXCEEDED" => {
                "Too many AI requests, please try again later.".to_string()
            }
            ApiError::RateLimited { .. } => {
                "Too many requests from this IP, please try again later.".to_string()
            }
        }
    }
}

/// HTTP status for each AI failure kind.
pub fn ai_status(kind: AiErrorKind) -> StatusCode {
    match kind {
        AiErrorKind::EmptyContent
        | AiErrorKind::ContentTooLong
        | AiErrorKind::ContentTooShort
        | AiErrorKind::UnknownAction => StatusCode::BAD_REQUEST,
        AiErrorKind::Unconfigured => StatusCode::SERVICE_UNAVAILABLE,
        AiErrorKind::AuthError | AiErrorKind::GenerationError => StatusCode::BAD_GATEWAY,
        AiErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        AiErrorKind::NoActionableItems | AiErrorKind::NoExtractableContent => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

impl From<quire_core::Error> for ApiError {
    fn from(err: quire_core::Error) -> Self {
        use quire_core::Error;
        match err {
            Error::NoteNotFound(_) => ApiError::NotFound {
                code: "NOTE_NOT_FOUND",
                message: "Note not found".to_string(),
            },
            Error::TaskNotFound(_) => ApiError::NotFound {
                code: "TASK_NOT_FOUND",
                message: "Task not found".to_string(),
            },
            Error::NotFound(msg) => ApiError::NotFound {
                code: "NOT_FOUND",
                message: msg,
            },
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Unauthorized(msg) => ApiError::unauthorized(msg),
            Error::Ai(ai) => ApiError::Ai(ai),
            other => ApiError::Internal(other),
        }
    }
}

impl From<AiError> for ApiError {
    fn from(err: AiError) -> Self {
        ApiError::Ai(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let ApiError::Internal(err) = &self {
            error!(subsystem = "api", error = %err, "Request failed");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.message(),
            },
        };
        let mut response = (status, Json(body)).into_response();

        if let ApiError::RateLimited {
            retry_after_secs, ..
        } = self
        {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}
