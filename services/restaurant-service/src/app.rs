use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::{middleware, routing::{get, post}, Router};
use common_auth::{IdentityResolver, TokenService};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::catalog::Catalog;
use crate::config::ServiceConfig;
use crate::credentials::CredentialService;
use crate::menu_handlers::{create_menu_item, list_menu};
use crate::metrics::{http_error_metrics, metrics_endpoint};
use crate::order_handlers::{create_order, list_orders};
use crate::orders::OrderService;
use crate::store::Stores;
use crate::testimonial_handlers::{create_testimonial, list_testimonials};
use crate::testimonials::Testimonials;
use crate::user_handlers::{login_user, profile, register_user};

#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub credentials: Arc<CredentialService>,
    pub catalog: Catalog,
    pub orders: OrderService,
    pub testimonials: Testimonials,
}

impl AppState {
    pub fn new(config: &ServiceConfig, stores: Stores) -> anyhow::Result<Self> {
        let credentials = CredentialService::new(
            stores.users.clone(),
            config.hashing,
            config.admin_emails.clone(),
        )
        .context("Failed to configure password hashing")?;
        let catalog = Catalog::new(stores.menu.clone());

        Ok(Self {
            tokens: Arc::new(TokenService::new(config.jwt.clone())),
            credentials: Arc::new(credentials),
            orders: OrderService::new(catalog.clone(), stores.orders.clone()),
            catalog,
            testimonials: Testimonials::new(stores.testimonials),
        })
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl FromRef<AppState> for Arc<dyn IdentityResolver> {
    fn from_ref(state: &AppState) -> Self {
        state.credentials.clone()
    }
}

pub async fn health() -> &'static str {
    "ok"
}

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE, AUTHORIZATION]);

    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/auth/register", post(register_user))
        .route("/auth/login", post(login_user))
        .route("/auth/profile", get(profile))
        .route("/menu", get(list_menu).post(create_menu_item))
        .route("/orders", post(create_order).get(list_orders))
        .route("/testimonials", post(create_testimonial).get(list_testimonials))
        .with_state(state)
        .layer(middleware::from_fn(http_error_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
