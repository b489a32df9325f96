use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::reservoir::*;

/// Defines the transaction number routes to be used in the main router
pub fn reservoir_routes() -> Router<PgPool> {
    Router::new()
        .route(
            "/transaction-number/generate",
            post(generate_transaction_number),
        )
        .route("/transaction-number/mark-used", post(mark_transaction_used))
        .route(
            "/transaction-number/mark-expired",
            post(mark_transaction_expired),
        )
        .route("/transaction-number/status", get(get_transaction_status))
}
