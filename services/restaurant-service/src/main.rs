use std::net::SocketAddr;

use anyhow::Context;
use restaurant_service::store::Stores;
use restaurant_service::{build_router, load_service_config, AppState};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_service_config()?;

    let stores = match config.database_url.as_deref() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("Failed to connect to DATABASE_URL")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;
            info!("using Postgres store");
            Stores::postgres(pool)
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory store, data is lost on restart");
            Stores::memory()
        }
    };

    info!(
        issuer = %config.jwt.issuer,
        audience = %config.jwt.audience,
        ttl_seconds = config.jwt.ttl_seconds,
        admin_emails = config.admin_emails.len(),
        "token and account settings loaded"
    );

    let state = AppState::new(&config, stores)?;
    let app = build_router(state, &config.cors_allowed_origins);

    let ip: std::net::IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST '{}'", config.host))?;
    let addr = SocketAddr::from((ip, config.port));

    info!(%addr, "starting restaurant-service");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
