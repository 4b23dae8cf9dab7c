pub mod api;
pub mod dashboard;
pub mod transactions;

use axum::routing::{get, patch};
use axum::Router;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        // Period resolution
        .route("/api/range", get(api::range))
        // Transactions
        .route(
            "/api/transactions",
            get(transactions::index).post(transactions::create),
        )
        .route(
            "/api/transactions/:id",
            patch(transactions::update).delete(transactions::delete),
        )
        // Dashboard (JSON for charts and cards)
        .route("/api/dashboard", get(dashboard::index))
        .route("/api/breakdown", get(api::breakdown))
        // Health check
        .route("/health", get(health))
}

async fn health() -> &'static str {
    "OK"
}
