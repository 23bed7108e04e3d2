use axum::{extract::State, http::StatusCode, Json};
use common_auth::CallerIdentity;
use common_http_errors::{ApiError, ApiJson, ApiResult};
use serde::Serialize;
use tracing::warn;

use crate::metrics;
use crate::models::Order;
use crate::orders::{OrderError, PlaceOrder};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct OrderCreated {
    pub message: &'static str,
    pub order: Order,
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation { field, message } => ApiError::validation(field, message),
            OrderError::MenuItemUnavailable { menu_item_id } => ApiError::not_found(
                "menu_item_not_found",
                menu_item_id.clone(),
                format!("Menu item with ID {menu_item_id} not found or unavailable"),
            ),
            OrderError::Store(err) => ApiError::internal(err),
        }
    }
}

pub async fn create_order(
    State(state): State<AppState>,
    caller: CallerIdentity,
    ApiJson(request): ApiJson<PlaceOrder>,
) -> ApiResult<(StatusCode, Json<OrderCreated>)> {
    let order = state
        .orders
        .place_order(caller.user_id, request)
        .await
        .map_err(|err| {
            if !matches!(err, OrderError::Store(_)) {
                warn!(user_id = %caller.user_id, error = %err, "order rejected");
            }
            ApiError::from(err)
        })?;
    metrics::order_placed();

    Ok((
        StatusCode::CREATED,
        Json(OrderCreated {
            message: "Order placed successfully",
            order,
        }),
    ))
}

pub async fn list_orders(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> ApiResult<Json<Vec<Order>>> {
    let orders = state
        .orders
        .list_orders_for_user(caller.user_id)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(orders))
}
