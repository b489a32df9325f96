use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::error;

use crate::config::Config;
use crate::utils::api_response::ApiResponse;

/// JWT claims issued by the external auth service. The core only consumes the
/// subject (user id) and username; role membership is loaded from storage.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject - User ID as String
    pub sub: String,
    /// The username of the authenticated user.
    pub username: String,
    /// Expiration timestamp (UNIX TIME)
    pub exp: usize,
}

impl Claims {
    /// Converts `sub` (user ID) to `i32`, or returns a descriptive error.
    pub fn user_id(&self) -> Result<i32, ApiResponse<()>> {
        self.sub.parse::<i32>().map_err(|_| {
            ApiResponse::error(
                StatusCode::BAD_REQUEST,
                "Invalid user ID format in token",
                None,
            )
        })
    }
}

/// Role membership cache keyed by user id.
pub type RoleCache = Arc<Cache<i32, UserRoles>>;

/// Initialize the role cache with a 10 minute TTL.
pub fn create_role_cache() -> RoleCache {
    Arc::new(
        Cache::builder()
            .time_to_live(Duration::from_secs(600))
            .build(),
    )
}

/// **JWT Middleware** (Handles Token Authentication)
pub async fn jwt_middleware(mut req: Request<Body>, next: Next) -> Result<Response, Response> {
    let auth_header = req.headers().get("Authorization").ok_or_else(|| {
        error!("Missing Authorization header");
        ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, "Missing Authorization header", None)
            .into_response()
    })?;

    let token_str = auth_header.to_str().map_err(|_| {
        error!("Invalid Authorization header format");
        ApiResponse::<()>::error(
            StatusCode::BAD_REQUEST,
            "Invalid Authorization header format",
            None,
        )
        .into_response()
    })?;

    let token = token_str.strip_prefix("Bearer ").ok_or_else(|| {
        error!("Invalid token format (missing 'Bearer ' prefix)");
        ApiResponse::<()>::error(
            StatusCode::BAD_REQUEST,
            "Invalid token format (missing 'Bearer ' prefix)",
            None,
        )
        .into_response()
    })?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(Config::get().jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        error!("JWT decoding failed: {:?}", e);
        ApiResponse::<()>::error(
            StatusCode::UNAUTHORIZED,
            "Invalid token",
            Some(json!({ "error": e.to_string() })),
        )
        .into_response()
    })?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

/// Role memberships of the authenticated user.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserRoles {
    pub user_id: i32,
    pub role_ids: Vec<i32>,
    pub role_names: Vec<String>,
}

impl UserRoles {
    /// System-wide administrator.
    pub fn is_admin(&self) -> bool {
        self.role_names.iter().any(|name| name == "admin")
    }

    /// Asset team members verify custom flows alongside admins.
    pub fn can_verify_custom_flows(&self) -> bool {
        self.is_admin() || self.role_names.iter().any(|name| name == "asset_team")
    }

    pub fn has_role(&self, role_id: i32) -> bool {
        self.role_ids.contains(&role_id)
    }

    pub fn has_any_role(&self, role_ids: &[i32]) -> bool {
        role_ids.iter().any(|id| self.has_role(*id))
    }
}

/// **Role Middleware** — attaches the user's role memberships (cached).
pub async fn role_middleware(
    State(db_pool): State<PgPool>,
    Extension(role_cache): Extension<RoleCache>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let claims = req.extensions().get::<Claims>().cloned().ok_or_else(|| {
        error!("Missing JWT claims in request");
        ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, "Missing JWT claims in request", None)
            .into_response()
    })?;

    let user_id: i32 = claims.sub.parse().map_err(|_| {
        error!("Invalid user ID format in JWT claims");
        ApiResponse::<()>::error(
            StatusCode::UNAUTHORIZED,
            "Invalid user ID format in JWT claims",
            None,
        )
        .into_response()
    })?;

    if let Some(cached) = role_cache.get(&user_id) {
        req.extensions_mut().insert(cached);
        return Ok(next.run(req).await);
    }

    let user_roles = match fetch_roles_from_db(user_id, &db_pool).await {
        Ok(roles) => roles,
        Err(err) => {
            error!("Database query failed: {:?}", err);
            return Err(ApiResponse::<()>::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load user roles",
                Some(json!({ "error": err.to_string() })),
            )
            .into_response());
        }
    };

    role_cache.insert(user_id, user_roles.clone());
    req.extensions_mut().insert(user_roles);
    Ok(next.run(req).await)
}

/// Query role memberships for a user.
async fn fetch_roles_from_db(user_id: i32, pool: &PgPool) -> Result<UserRoles, sqlx::Error> {
    let rows: Vec<(i32, String)> = sqlx::query_as(
        r#"
        SELECT ur.role_id, r.name
        FROM user_roles ur
        JOIN roles r ON r.id = ur.role_id
        WHERE ur.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let (role_ids, role_names) = rows.into_iter().unzip();
    Ok(UserRoles {
        user_id,
        role_ids,
        role_names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str], ids: &[i32]) -> UserRoles {
        UserRoles {
            user_id: 1,
            role_ids: ids.to_vec(),
            role_names: names.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn admin_and_asset_team_can_verify() {
        assert!(roles(&["admin"], &[1]).can_verify_custom_flows());
        assert!(roles(&["asset_team"], &[2]).can_verify_custom_flows());
        assert!(!roles(&["staff"], &[3]).can_verify_custom_flows());
    }

    #[test]
    fn role_membership_checks() {
        let user = roles(&["staff", "finance"], &[3, 9]);
        assert!(user.has_role(9));
        assert!(!user.has_role(4));
        assert!(user.has_any_role(&[4, 9]));
        assert!(!user.has_any_role(&[4, 5]));
        assert!(!user.is_admin());
    }
}
