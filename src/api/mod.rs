//! HTTP surface consumed by the admin, seller and storefront apps.

pub mod error;
pub mod exports;
pub mod health;
pub mod identity;
pub mod reviews;
pub mod state;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(reviews::routes())
        .merge(exports::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
