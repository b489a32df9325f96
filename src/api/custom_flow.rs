use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::custom_flow::*;

/// Defines the custom approval routes to be used in the main router
pub fn custom_flow_routes() -> Router<PgPool> {
    Router::new()
        .route("/custom-approvals", post(create_custom_approval))
        .route("/custom-approvals/me", get(get_user_custom_approvals))
        .route(
            "/custom-approvals/pending-verifications",
            get(get_pending_verifications),
        )
        .route("/custom-approvals/{flow_id}", put(update_custom_approval))
        .route("/custom-approvals/{flow_id}", delete(delete_custom_approval))
        .route("/custom-approvals/{flow_id}/verify", post(verify_custom_approval))
        .route(
            "/approval-flows/{flow_id}/can-customize",
            get(check_can_customize),
        )
}
