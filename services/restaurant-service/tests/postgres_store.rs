use std::env;

use anyhow::Result;
use chrono::Utc;
use common_auth::RoleSet;
use common_money::Money;
use restaurant_service::models::{
    stored_now, MenuItem, Order, OrderLine, OrderStatus, PaymentMethod, Testimonial,
};
use restaurant_service::store::{
    MenuStore, OrderStore, PgStore, StoreError, TestimonialStore, UserRecord, UserStore,
};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

async fn connect() -> Result<Option<PgStore>> {
    let Ok(url) = env::var("RESTAURANT_TEST_DATABASE_URL") else {
        eprintln!("Skipping Postgres store tests: set RESTAURANT_TEST_DATABASE_URL to run them.");
        return Ok(None);
    };
    let pool = PgPoolOptions::new().max_connections(2).connect(&url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(Some(PgStore::new(pool)))
}

fn user_record(tag: &str) -> UserRecord {
    UserRecord {
        id: Uuid::new_v4(),
        username: format!("user-{tag}"),
        email: format!("{tag}@example.com"),
        password_hash: "$argon2id$placeholder".into(),
        roles: RoleSet::from_iter(["user"]),
        created_at: Utc::now(),
    }
}

#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(feature = "integration"), ignore = "enable with --features integration (requires Postgres)")]
async fn users_are_unique_by_username_and_email() -> Result<()> {
    let Some(store) = connect().await? else {
        return Ok(());
    };
    let tag = Uuid::new_v4().simple().to_string();
    let stored = store.insert_user(user_record(&tag)).await?;

    let mut same_name = user_record(&format!("{tag}-other"));
    same_name.username = stored.username.clone();
    assert!(matches!(
        store.insert_user(same_name).await,
        Err(StoreError::Duplicate { field: "username" })
    ));

    let mut same_email = user_record(&format!("{tag}-third"));
    same_email.email = stored.email.clone();
    assert!(matches!(
        store.insert_user(same_email).await,
        Err(StoreError::Duplicate { field: "email" })
    ));

    let found = store
        .find_user_by_identifier(&stored.email.to_uppercase())
        .await?
        .expect("lookup by email");
    assert_eq!(found.id, stored.id);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(feature = "integration"), ignore = "enable with --features integration (requires Postgres)")]
async fn orders_round_trip_with_lines() -> Result<()> {
    let Some(store) = connect().await? else {
        return Ok(());
    };
    let tag = Uuid::new_v4().simple().to_string();
    let owner = store.insert_user(user_record(&tag)).await?;

    let item = store
        .insert_menu_item(MenuItem {
            id: Uuid::new_v4(),
            name: format!("Dish {tag}"),
            description: Some("test".into()),
            price: "7.25".parse()?,
            category: "Tests".into(),
            image: "img".into(),
            is_available: true,
            created_at: Utc::now(),
        })
        .await?;
    assert!(store.find_menu_item(item.id).await?.is_some());

    let now = stored_now();
    let line = OrderLine {
        menu_item_id: item.id,
        name: item.name.clone(),
        price: item.price.clone(),
        quantity: 2,
    };
    let order = store
        .insert_order(Order {
            id: Uuid::new_v4(),
            user_id: owner.id,
            customer_name: "Alice".into(),
            customer_address: "1 Main St".into(),
            customer_phone: "555-0100".into(),
            total_amount: line.line_total(),
            items: vec![line],
            payment_method: PaymentMethod::OnlinePayment,
            order_status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        })
        .await?;

    let listed = store.list_orders_for_user(owner.id).await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, order.id);
    assert_eq!(listed[0].total_amount, Money::from_cents(1450));
    assert_eq!(listed[0].items.len(), 1);
    assert_eq!(listed[0].payment_method, PaymentMethod::OnlinePayment);
    assert_eq!(listed[0].created_at, order.created_at);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(feature = "integration"), ignore = "enable with --features integration (requires Postgres)")]
async fn testimonials_round_trip() -> Result<()> {
    let Some(store) = connect().await? else {
        return Ok(());
    };
    let stored = store
        .insert_testimonial(Testimonial {
            id: Uuid::new_v4(),
            name: "Dana".into(),
            rating: 5,
            text: "Lovely".into(),
            image: "img".into(),
            created_at: Utc::now(),
        })
        .await?;
    let listed = store.list_testimonials().await?;
    assert!(listed.iter().any(|t| t.id == stored.id && t.rating == 5));
    Ok(())
}
