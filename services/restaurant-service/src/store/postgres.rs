use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common_auth::RoleSet;
use common_money::Money;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{
    MenuStore, OrderStore, StoreError, StoreResult, TestimonialStore, UserRecord, UserStore,
};
use crate::models::{MenuItem, Order, OrderLine, OrderStatus, PaymentMethod, Testimonial};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    roles: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            roles: RoleSet::from_iter(row.roles),
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct MenuItemRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    price: Money,
    category: String,
    image: String,
    is_available: bool,
    created_at: DateTime<Utc>,
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        MenuItem {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            category: row.category,
            image: row.image,
            is_available: row.is_available,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    customer_name: String,
    customer_address: String,
    customer_phone: String,
    total_amount: Money,
    payment_method: String,
    order_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct OrderLineRow {
    order_id: Uuid,
    menu_item_id: Uuid,
    name: String,
    price: Money,
    quantity: i32,
}

#[derive(FromRow)]
struct TestimonialRow {
    id: Uuid,
    name: String,
    rating: i16,
    text: String,
    image: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TestimonialRow> for Testimonial {
    type Error = StoreError;

    fn try_from(row: TestimonialRow) -> Result<Self, Self::Error> {
        let rating = u8::try_from(row.rating)
            .map_err(|_| StoreError::Corrupt(format!("testimonial {} has rating {}", row.id, row.rating)))?;
        Ok(Testimonial {
            id: row.id,
            name: row.name,
            rating,
            text: row.text,
            image: row.image,
            created_at: row.created_at,
        })
    }
}

fn map_unique_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let field = match db_err.constraint() {
                Some(constraint) if constraint.contains("email") => "email",
                _ => "username",
            };
            return StoreError::Duplicate { field };
        }
    }
    StoreError::Database(err)
}

fn assemble_order(row: OrderRow, items: Vec<OrderLine>) -> StoreResult<Order> {
    let payment_method = row
        .payment_method
        .parse::<PaymentMethod>()
        .map_err(|err| StoreError::Corrupt(format!("order {} payment method: {err}", row.id)))?;
    let order_status = row
        .order_status
        .parse::<OrderStatus>()
        .map_err(|err| StoreError::Corrupt(format!("order {} status: {err}", row.id)))?;
    Ok(Order {
        id: row.id,
        user_id: row.user_id,
        customer_name: row.customer_name,
        customer_address: row.customer_address,
        customer_phone: row.customer_phone,
        items,
        total_amount: row.total_amount,
        payment_method,
        order_status,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: UserRecord) -> StoreResult<UserRecord> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, roles, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.roles.to_vec())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password_hash, roles, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserRecord::from))
    }

    async fn find_user_by_identifier(&self, identifier: &str) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password_hash, roles, created_at
             FROM users
             WHERE username = $1 OR email = lower($1)
             LIMIT 1",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserRecord::from))
    }
}

#[async_trait]
impl MenuStore for PgStore {
    async fn list_available_items(&self) -> StoreResult<Vec<MenuItem>> {
        let rows = sqlx::query_as::<_, MenuItemRow>(
            "SELECT id, name, description, price, category, image, is_available, created_at
             FROM menu_items
             WHERE is_available
             ORDER BY category, name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(MenuItem::from).collect())
    }

    async fn find_menu_item(&self, id: Uuid) -> StoreResult<Option<MenuItem>> {
        let row = sqlx::query_as::<_, MenuItemRow>(
            "SELECT id, name, description, price, category, image, is_available, created_at
             FROM menu_items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(MenuItem::from))
    }

    async fn insert_menu_item(&self, item: MenuItem) -> StoreResult<MenuItem> {
        sqlx::query(
            "INSERT INTO menu_items (id, name, description, price, category, image, is_available, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.price)
        .bind(&item.category)
        .bind(&item.image)
        .bind(item.is_available)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;
        Ok(item)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, order: Order) -> StoreResult<Order> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, user_id, customer_name, customer_address, customer_phone,
                                 total_amount, payment_method, order_status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(&order.customer_name)
        .bind(&order.customer_address)
        .bind(&order.customer_phone)
        .bind(&order.total_amount)
        .bind(order.payment_method.as_str())
        .bind(order.order_status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for (position, line) in order.items.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| StoreError::Corrupt(format!("order {} has too many lines", order.id)))?;
            let quantity = i32::try_from(line.quantity)
                .map_err(|_| StoreError::Corrupt(format!("order {} quantity out of range", order.id)))?;
            sqlx::query(
                "INSERT INTO order_items (order_id, position, menu_item_id, name, price, quantity)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(order.id)
            .bind(position)
            .bind(line.menu_item_id)
            .bind(&line.name)
            .bind(&line.price)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order)
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, customer_name, customer_address, customer_phone,
                    total_amount, payment_method, order_status, created_at, updated_at
             FROM orders
             WHERE user_id = $1
             ORDER BY created_at DESC, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let line_rows = sqlx::query_as::<_, OrderLineRow>(
            "SELECT order_id, menu_item_id, name, price, quantity
             FROM order_items
             WHERE order_id = ANY($1)
             ORDER BY order_id, position",
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut lines: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
        for row in line_rows {
            let quantity = u32::try_from(row.quantity)
                .map_err(|_| StoreError::Corrupt(format!("order {} has quantity {}", row.order_id, row.quantity)))?;
            lines.entry(row.order_id).or_default().push(OrderLine {
                menu_item_id: row.menu_item_id,
                name: row.name,
                price: row.price,
                quantity,
            });
        }

        rows.into_iter()
            .map(|row| {
                let items = lines.remove(&row.id).unwrap_or_default();
                assemble_order(row, items)
            })
            .collect()
    }
}

#[async_trait]
impl TestimonialStore for PgStore {
    async fn insert_testimonial(&self, testimonial: Testimonial) -> StoreResult<Testimonial> {
        sqlx::query(
            "INSERT INTO testimonials (id, name, rating, text, image, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(testimonial.id)
        .bind(&testimonial.name)
        .bind(i16::from(testimonial.rating))
        .bind(&testimonial.text)
        .bind(&testimonial.image)
        .bind(testimonial.created_at)
        .execute(&self.pool)
        .await?;
        Ok(testimonial)
    }

    async fn list_testimonials(&self) -> StoreResult<Vec<Testimonial>> {
        let rows = sqlx::query_as::<_, TestimonialRow>(
            "SELECT id, name, rating, text, image, created_at
             FROM testimonials
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Testimonial::try_from).collect()
    }
}
