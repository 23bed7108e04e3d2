pub mod app;
pub mod catalog;
pub mod config;
pub mod credentials;
pub mod menu_handlers;
pub mod metrics;
pub mod models;
pub mod order_handlers;
pub mod orders;
pub mod store;
pub mod testimonial_handlers;
pub mod testimonials;
pub mod user_handlers;

pub use app::{build_router, AppState};
pub use config::{load_service_config, ServiceConfig};
