//! Order validation, repricing against the catalog, and recording.
//!
//! Client-supplied prices and totals are never trusted: every line is
//! re-priced from the catalog and the total is recomputed here.

use std::sync::Arc;

use common_money::Money;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::models::{max_stored_amount, stored_now, Order, OrderLine, OrderStatus, PaymentMethod};
use crate::store::{OrderStore, StoreError};

/// Most units of one menu item a single cart line may request.
pub const MAX_LINE_QUANTITY: u32 = 10_000;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },
    #[error("menu item {menu_item_id} not found or unavailable")]
    MenuItemUnavailable { menu_item_id: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One cart line as submitted. Quantity stays signed so that zero and
/// negative values reach validation instead of failing deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(default)]
    pub menu_item_id: String,
    #[serde(default)]
    pub quantity: i64,
}

/// Checkout request body. Unknown fields, including any client total, are
/// discarded during deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_address: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub payment_method: String,
}

struct ValidatedOrder {
    customer_name: String,
    customer_address: String,
    customer_phone: String,
    lines: Vec<(String, u32)>,
    payment_method: PaymentMethod,
}

#[derive(Clone)]
pub struct OrderService {
    catalog: Catalog,
    orders: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(catalog: Catalog, orders: Arc<dyn OrderStore>) -> Self {
        Self { catalog, orders }
    }

    /// Validates, re-prices and persists one order owned by `user_id`.
    ///
    /// Either the whole order is stored or nothing is.
    pub async fn place_order(&self, user_id: Uuid, request: PlaceOrder) -> Result<Order, OrderError> {
        let validated = validate(request)?;

        let mut items = Vec::with_capacity(validated.lines.len());
        let mut total_amount = Money::zero();
        for (raw_id, quantity) in validated.lines {
            let line = self.price_line(&raw_id, quantity).await?;
            total_amount += &line.line_total();
            items.push(line);
        }
        if total_amount > max_stored_amount() {
            return Err(validation("items", "Order total is too large"));
        }

        let now = stored_now();
        let order = Order {
            id: Uuid::new_v4(),
            user_id,
            customer_name: validated.customer_name,
            customer_address: validated.customer_address,
            customer_phone: validated.customer_phone,
            items,
            total_amount,
            payment_method: validated.payment_method,
            order_status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let stored = self.orders.insert_order(order).await?;
        info!(
            order_id = %stored.id,
            user_id = %stored.user_id,
            lines = stored.items.len(),
            total = %stored.total_amount,
            "order placed"
        );
        Ok(stored)
    }

    pub async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError> {
        self.orders.list_orders_for_user(user_id).await
    }

    async fn price_line(&self, raw_id: &str, quantity: u32) -> Result<OrderLine, OrderError> {
        let unavailable = || OrderError::MenuItemUnavailable {
            menu_item_id: raw_id.to_string(),
        };

        let id = Uuid::parse_str(raw_id).map_err(|_| unavailable())?;
        let item = match self.catalog.find_item(id).await? {
            Some(item) if item.is_available => item,
            Some(_) => {
                debug!(menu_item_id = %id, "menu item is not available");
                return Err(unavailable());
            }
            None => return Err(unavailable()),
        };

        Ok(OrderLine {
            menu_item_id: item.id,
            name: item.name,
            price: item.price,
            quantity,
        })
    }
}

fn validate(request: PlaceOrder) -> Result<ValidatedOrder, OrderError> {
    let customer_name = required("customerName", &request.customer_name, "Customer name is required")?;
    let customer_address = required(
        "customerAddress",
        &request.customer_address,
        "Customer address is required",
    )?;
    let customer_phone = required("customerPhone", &request.customer_phone, "Customer phone is required")?;

    if request.items.is_empty() {
        return Err(validation("items", "No order items"));
    }

    let mut lines = Vec::with_capacity(request.items.len());
    for line in request.items {
        let menu_item_id = line.menu_item_id.trim().to_string();
        if menu_item_id.is_empty() {
            return Err(validation("items", "Invalid item data in order"));
        }
        if line.quantity <= 0 {
            return Err(validation("quantity", "Quantity must be at least 1"));
        }
        let quantity = u32::try_from(line.quantity)
            .ok()
            .filter(|quantity| *quantity <= MAX_LINE_QUANTITY)
            .ok_or_else(|| validation("quantity", "Quantity is too large"))?;
        lines.push((menu_item_id, quantity));
    }

    let payment_method = request
        .payment_method
        .parse::<PaymentMethod>()
        .map_err(|_| validation("paymentMethod", "Payment method must be 'Cash on Delivery' or 'Online Payment'"))?;

    Ok(ValidatedOrder {
        customer_name,
        customer_address,
        customer_phone,
        lines,
        payment_method,
    })
}

fn required(field: &'static str, value: &str, message: &str) -> Result<String, OrderError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(validation(field, message))
    } else {
        Ok(trimmed.to_string())
    }
}

fn validation(field: &'static str, message: &str) -> OrderError {
    OrderError::Validation {
        field,
        message: message.to_string(),
    }
}
