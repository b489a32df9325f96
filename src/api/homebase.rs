use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::homebase::*;

/// Defines the homebase routes to be used in the main router
pub fn homebase_routes() -> Router<PgPool> {
    Router::new()
        .route("/user/homebases", get(get_user_homebases))
        .route("/user/homebase/set-active", post(set_active_homebase))
}
