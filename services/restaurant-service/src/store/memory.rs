use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    MenuStore, OrderStore, StoreError, StoreResult, TestimonialStore, UserRecord, UserStore,
};
use crate::models::{MenuItem, Order, Testimonial};

/// Process-local store used by tests and by local runs without `DATABASE_URL`.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<UserRecord>>,
    menu: RwLock<Vec<MenuItem>>,
    orders: RwLock<Vec<Order>>,
    testimonials: RwLock<Vec<Testimonial>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: UserRecord) -> StoreResult<UserRecord> {
        let mut users = self.users.write().await;
        if users.iter().any(|existing| existing.username == user.username) {
            return Err(StoreError::Duplicate { field: "username" });
        }
        if users.iter().any(|existing| existing.email == user.email) {
            return Err(StoreError::Duplicate { field: "email" });
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_user_by_identifier(&self, identifier: &str) -> StoreResult<Option<UserRecord>> {
        let email = identifier.to_lowercase();
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|user| user.username == identifier || user.email == email)
            .cloned())
    }
}

#[async_trait]
impl MenuStore for MemoryStore {
    async fn list_available_items(&self) -> StoreResult<Vec<MenuItem>> {
        let menu = self.menu.read().await;
        let mut items: Vec<MenuItem> = menu.iter().filter(|item| item.is_available).cloned().collect();
        items.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
        Ok(items)
    }

    async fn find_menu_item(&self, id: Uuid) -> StoreResult<Option<MenuItem>> {
        let menu = self.menu.read().await;
        Ok(menu.iter().find(|item| item.id == id).cloned())
    }

    async fn insert_menu_item(&self, item: MenuItem) -> StoreResult<MenuItem> {
        self.menu.write().await.push(item.clone());
        Ok(item)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: Order) -> StoreResult<Order> {
        self.orders.write().await.push(order.clone());
        Ok(order)
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let orders = self.orders.read().await;
        // Reverse insertion order keeps same-timestamp orders newest first.
        let mut owned: Vec<Order> = orders
            .iter()
            .rev()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}

#[async_trait]
impl TestimonialStore for MemoryStore {
    async fn insert_testimonial(&self, testimonial: Testimonial) -> StoreResult<Testimonial> {
        self.testimonials.write().await.push(testimonial.clone());
        Ok(testimonial)
    }

    async fn list_testimonials(&self) -> StoreResult<Vec<Testimonial>> {
        let testimonials = self.testimonials.read().await;
        let mut all: Vec<Testimonial> = testimonials.iter().rev().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}
