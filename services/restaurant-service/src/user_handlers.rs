use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, SecondsFormat, Utc};
use common_auth::CallerIdentity;
use common_http_errors::{ApiError, ApiJson, ApiResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::credentials::{CredentialError, Registration};
use crate::metrics;
use crate::models::User;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default, alias = "email", alias = "username")]
    pub identifier: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub expires_at: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Validation { field, message } => ApiError::validation(field, message),
            CredentialError::DuplicateIdentity { .. } => ApiError::Conflict {
                code: "duplicate_identity",
                message: "User already exists".into(),
            },
            CredentialError::InvalidCredentials => invalid_credentials(),
            other => ApiError::internal(other),
        }
    }
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized {
        code: "invalid_credentials",
        message: "Invalid Credentials".into(),
    }
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let user = state
        .credentials
        .register(Registration {
            username: request.username,
            email: request.email,
            password: request.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
            user,
        }),
    ))
}

pub async fn login_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = match state
        .credentials
        .authenticate(&request.identifier, &request.password)
        .await
    {
        Ok(user) => user,
        Err(CredentialError::InvalidCredentials) => {
            metrics::login_attempt("invalid_credentials");
            warn!("login rejected");
            return Err(invalid_credentials());
        }
        Err(err) => {
            metrics::login_attempt("error");
            return Err(err.into());
        }
    };

    let issued = state.tokens.issue(user.id).map_err(ApiError::internal)?;
    metrics::login_attempt("success");
    info!(user_id = %user.id, "login succeeded");

    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: issued.token_type,
        expires_in: issued.expires_in,
        expires_at: format_timestamp(issued.expires_at),
        user,
    }))
}

pub async fn profile(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> ApiResult<Json<ProfileResponse>> {
    let user = state
        .credentials
        .find_user(caller.user_id)
        .await?
        .ok_or(ApiError::Unauthorized {
            code: "user_not_found",
            message: "Not authorized, user not found".into(),
        })?;
    Ok(Json(ProfileResponse { user }))
}
