use std::sync::Arc;

use common_money::Money;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::{max_stored_amount, stored_now, MenuItem, PLACEHOLDER_MENU_IMAGE};
use crate::store::{MenuStore, StoreError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Administrative input for a new menu item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenuItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub is_available: Option<bool>,
}

/// Trusted source of menu prices.
#[derive(Clone)]
pub struct Catalog {
    menu: Arc<dyn MenuStore>,
}

impl Catalog {
    pub fn new(menu: Arc<dyn MenuStore>) -> Self {
        Self { menu }
    }

    pub async fn list_available(&self) -> Result<Vec<MenuItem>, StoreError> {
        self.menu.list_available_items().await
    }

    /// Looks an item up regardless of availability.
    pub async fn find_item(&self, id: Uuid) -> Result<Option<MenuItem>, StoreError> {
        self.menu.find_menu_item(id).await
    }

    pub async fn create_item(&self, input: NewMenuItem) -> Result<MenuItem, CatalogError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(validation("name", "Name is required"));
        }
        let category = input.category.trim().to_string();
        if category.is_empty() {
            return Err(validation("category", "Category is required"));
        }
        let price = input
            .price
            .ok_or_else(|| validation("price", "Price is required"))?;
        if price.is_negative() {
            return Err(validation("price", "Price must not be negative"));
        }
        if price > max_stored_amount() {
            return Err(validation("price", "Price is too large"));
        }

        let description = input
            .description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        let image = input
            .image
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| PLACEHOLDER_MENU_IMAGE.to_string());

        let item = MenuItem {
            id: Uuid::new_v4(),
            name,
            description,
            price,
            category,
            image,
            is_available: input.is_available.unwrap_or(true),
            created_at: stored_now(),
        };
        let stored = self.menu.insert_menu_item(item).await?;
        info!(menu_item_id = %stored.id, category = %stored.category, "menu item created");
        Ok(stored)
    }
}

fn validation(field: &'static str, message: &str) -> CatalogError {
    CatalogError::Validation {
        field,
        message: message.to_string(),
    }
}
