//! Persistence seams. Each trait is implemented by [`MemoryStore`] and
//! [`PgStore`]; services only ever hold `Arc<dyn ...>` handles.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common_auth::RoleSet;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{MenuItem, Order, Testimonial, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{field} already exists")]
    Duplicate { field: &'static str },
    #[error("stored record is corrupt: {0}")]
    Corrupt(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Full credential record, including the password hash.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: RoleSet,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            id: record.id,
            username: record.username,
            email: record.email,
            roles: record.roles,
            created_at: record.created_at,
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the username or email is taken.
    async fn insert_user(&self, user: UserRecord) -> StoreResult<UserRecord>;
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>>;
    /// Matches the username exactly or the (already lowercased) email.
    async fn find_user_by_identifier(&self, identifier: &str) -> StoreResult<Option<UserRecord>>;
}

#[async_trait]
pub trait MenuStore: Send + Sync {
    /// Available items ordered by category, then name.
    async fn list_available_items(&self) -> StoreResult<Vec<MenuItem>>;
    async fn find_menu_item(&self, id: Uuid) -> StoreResult<Option<MenuItem>>;
    async fn insert_menu_item(&self, item: MenuItem) -> StoreResult<MenuItem>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists the order header and all of its lines, or nothing.
    async fn insert_order(&self, order: Order) -> StoreResult<Order>;
    /// Orders owned by `user_id`, newest first.
    async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>>;
}

#[async_trait]
pub trait TestimonialStore: Send + Sync {
    async fn insert_testimonial(&self, testimonial: Testimonial) -> StoreResult<Testimonial>;
    /// All testimonials, newest first.
    async fn list_testimonials(&self) -> StoreResult<Vec<Testimonial>>;
}

/// One handle per store concern, all backed by the same implementation.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub menu: Arc<dyn MenuStore>,
    pub orders: Arc<dyn OrderStore>,
    pub testimonials: Arc<dyn TestimonialStore>,
}

impl Stores {
    pub fn memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::default()))
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::from_backend(Arc::new(PgStore::new(pool)))
    }

    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserStore + MenuStore + OrderStore + TestimonialStore + 'static,
    {
        Self {
            users: backend.clone(),
            menu: backend.clone(),
            orders: backend.clone(),
            testimonials: backend,
        }
    }
}
