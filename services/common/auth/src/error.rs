use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Outcome of a failed token verification.
///
/// Only two coarse reasons are ever reported for a presented token so a
/// forger learns nothing about which check rejected it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token malformed or signature invalid")]
    Malformed,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not authorized, no token")]
    MissingToken,
    #[error("Not authorized, token failed")]
    InvalidToken,
    #[error("Not authorized, token expired")]
    ExpiredToken,
    #[error("Not authorized, user not found")]
    UserNotFound,
    #[error("missing required role")]
    Forbidden {
        required: Vec<String>,
        actual: Vec<String>,
    },
    #[error("identity lookup failed: {0}")]
    Resolver(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "no_token",
            AuthError::InvalidToken => "token_invalid",
            AuthError::ExpiredToken => "token_expired",
            AuthError::UserNotFound => "user_not_found",
            AuthError::Forbidden { .. } => "missing_role",
            AuthError::Resolver(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AuthError::Resolver(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::Malformed | TokenError::Signing(_) => AuthError::InvalidToken,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual: Option<Vec<String>>,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let body = match self {
            AuthError::Forbidden { required, actual } => ErrorBody {
                code,
                message: format!(
                    "User role '{}' is not authorized to access this resource. Required roles: {}.",
                    actual.join(", "),
                    required.join(", ")
                ),
                required: Some(required),
                actual: Some(actual),
            },
            AuthError::Resolver(detail) => {
                error!(%detail, "identity resolution failed");
                ErrorBody {
                    code,
                    message: "Server Error".to_string(),
                    required: None,
                    actual: None,
                }
            }
            other => ErrorBody {
                code,
                message: other.to_string(),
                required: None,
                actual: None,
            },
        };

        let mut resp = (status, Json(body)).into_response();
        resp.headers_mut()
            .insert("X-Error-Code", HeaderValue::from_static(code));
        resp
    }
}
