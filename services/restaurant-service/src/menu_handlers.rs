use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common_auth::{ensure_role, CallerIdentity, ROLE_ADMIN};
use common_http_errors::{ApiError, ApiJson, ApiResult};

use crate::catalog::{CatalogError, NewMenuItem};
use crate::models::MenuItem;
use crate::AppState;

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation { field, message } => ApiError::validation(field, message),
            CatalogError::Store(err) => ApiError::internal(err),
        }
    }
}

pub async fn list_menu(State(state): State<AppState>) -> ApiResult<Json<Vec<MenuItem>>> {
    let items = state.catalog.list_available().await.map_err(ApiError::internal)?;
    Ok(Json(items))
}

pub async fn create_menu_item(
    State(state): State<AppState>,
    caller: CallerIdentity,
    ApiJson(input): ApiJson<NewMenuItem>,
) -> Result<(StatusCode, Json<MenuItem>), Response> {
    ensure_role(&caller, &[ROLE_ADMIN]).map_err(IntoResponse::into_response)?;

    let item = state
        .catalog
        .create_item(input)
        .await
        .map_err(|err| ApiError::from(err).into_response())?;
    Ok((StatusCode::CREATED, Json(item)))
}
