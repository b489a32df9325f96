use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::flow::*;

/// Defines the approval flow template routes to be used in the main router
pub fn flow_routes() -> Router<PgPool> {
    Router::new()
        .route("/approval-flows", get(get_approval_flows)) // List all templates
        .route("/approval-flows", post(create_approval_flow)) // Create a template
        .route("/approval-flows/resolve", get(resolve_approval_flow)) // Effective flow for caller
        .route("/approval-flows/code/{flow_code}", get(get_approval_flow_by_code))
        .route("/approval-flows/{flow_id}", get(get_approval_flow))
        .route("/approval-flows/{flow_id}", patch(update_approval_flow))
        .route("/approval-flows/{flow_id}", delete(delete_approval_flow))
        .route("/approval-flow-steps", post(create_flow_step))
        .route("/approval-flow-steps/{step_id}", patch(update_flow_step))
        .route("/approval-flow-steps/{step_id}", delete(delete_flow_step))
}
