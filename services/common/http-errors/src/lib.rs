use std::fmt::Display;

use axum::{extract::{rejection::JsonRejection, FromRequest}, http::{StatusCode, HeaderValue}, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")] pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")] pub resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")] pub trace_id: Option<Uuid>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: &'static str, field: Option<String>, message: String },
    Unauthorized { code: &'static str, message: String },
    NotFound { code: &'static str, resource_id: Option<String>, message: String },
    Conflict { code: &'static str, message: String },
    /// Detail stays in the server log; the caller only sees the trace id.
    Internal { trace_id: Uuid },
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest { code: "validation_error", field: Some(field.into()), message: message.into() }
    }

    pub fn not_found(code: &'static str, resource_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound { code, resource_id: Some(resource_id.into()), message: message.into() }
    }

    pub fn internal<E: Display>(e: E) -> Self {
        let trace_id = Uuid::new_v4();
        error!(%trace_id, error = %e, "internal error");
        Self::Internal { trace_id }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { code, .. }
            | ApiError::Unauthorized { code, .. }
            | ApiError::NotFound { code, .. }
            | ApiError::Conflict { code, .. } => *code,
            ApiError::Internal { .. } => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_code = self.code();
        let body = match self {
            ApiError::BadRequest { code, field, message } =>
                ErrorBody { code, message, field, resource_id: None, trace_id: None },
            ApiError::Unauthorized { code, message } | ApiError::Conflict { code, message } =>
                ErrorBody { code, message, field: None, resource_id: None, trace_id: None },
            ApiError::NotFound { code, resource_id, message } =>
                ErrorBody { code, message, field: None, resource_id, trace_id: None },
            ApiError::Internal { trace_id } =>
                ErrorBody { code: "internal_error", message: "Server Error".into(), field: None, resource_id: None, trace_id: Some(trace_id) },
        };
        let mut resp = (status, Json(body)).into_response();
        if let Ok(val) = HeaderValue::from_str(error_code) {
            resp.headers_mut().insert("X-Error-Code", val);
        }
        resp
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest { code: "validation_error", field: None, message: rejection.body_text() }
    }
}

/// `Json` body extractor whose rejections use the `ApiError` envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

pub type ApiResult<T> = Result<T, ApiError>;
