use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::approval::*;

/// Defines the transaction approval routes to be used in the main router
pub fn approval_routes() -> Router<PgPool> {
    Router::new()
        .route(
            "/transaction-approvals/initiate",
            post(initiate_transaction_approval),
        )
        .route("/transaction-approvals/approve", post(approve_transaction))
        .route("/transaction-approvals/reject", post(reject_transaction))
        .route(
            "/transaction-approvals/status",
            get(get_transaction_approval_status),
        )
        .route(
            "/transaction-approvals/pending",
            get(get_user_pending_approvals),
        )
}
