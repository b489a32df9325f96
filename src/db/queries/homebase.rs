use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use sqlx::PgPool;
use utoipa::OpenApi;

use crate::db::models::branch::{Branch, HomebaseBranch, SetActiveHomebaseRequest, UserBranch};
use crate::middleware::auth::Claims;
use crate::utils::api_response::ApiResponse;
use crate::utils::error::{ServiceError, ServiceResult};

//
// SERVICE HELPERS
//

/// Resolve the user's single active homebase assignment and its branch.
pub async fn active_homebase(pool: &PgPool, user_id: i32) -> ServiceResult<(UserBranch, Branch)> {
    let user_branch = sqlx::query_as::<_, UserBranch>(
        r#"
        SELECT * FROM user_branches
        WHERE user_id = $1 AND branch_type = 'homebase' AND is_active = TRUE
        ORDER BY updated_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ServiceError::not_found("User does not have an active homebase branch"))?;

    let branch = sqlx::query_as::<_, Branch>("SELECT * FROM branches WHERE id = $1")
        .bind(user_branch.branch_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Branch data not found"))?;

    Ok((user_branch, branch))
}

//
// HANDLERS
//

#[utoipa::path(
    get,
    path = "/user/homebases",
    responses(
        (status = 200, description = "Homebase branches for the current user", body = Vec<HomebaseBranch>)
    ),
    tag = "Homebase",
    security(("bearerAuth" = []))
)]
pub async fn get_user_homebases(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<Vec<HomebaseBranch>>, ApiResponse<()>> {
    let user_id = claims.user_id()?;

    let assignments = sqlx::query_as::<_, UserBranch>(
        r#"
        SELECT * FROM user_branches
        WHERE user_id = $1 AND branch_type = 'homebase'
        ORDER BY created_at ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    let mut result = Vec::with_capacity(assignments.len());
    for user_branch in assignments {
        let branch = sqlx::query_as::<_, Branch>("SELECT * FROM branches WHERE id = $1")
            .bind(user_branch.branch_id)
            .fetch_optional(&pool)
            .await
            .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;
        if let Some(branch) = branch {
            result.push(HomebaseBranch {
                user_branch,
                branch,
            });
        }
    }

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Homebase branches retrieved successfully",
        result,
    ))
}

#[utoipa::path(
    post,
    path = "/user/homebase/set-active",
    request_body = SetActiveHomebaseRequest,
    responses(
        (status = 200, description = "Active homebase set successfully"),
        (status = 404, description = "Homebase branch not found for this user")
    ),
    tag = "Homebase",
    security(("bearerAuth" = []))
)]
pub async fn set_active_homebase(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SetActiveHomebaseRequest>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    let user_id = claims.user_id()?;

    // Deactivate-all then activate-one as a single transaction so the user
    // never observably has zero or two active homebases.
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    sqlx::query(
        r#"
        UPDATE user_branches SET is_active = FALSE, updated_at = NOW()
        WHERE user_id = $1 AND branch_type = 'homebase'
        "#,
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    let activated = sqlx::query(
        r#"
        UPDATE user_branches SET is_active = TRUE, updated_at = NOW()
        WHERE user_id = $1 AND branch_id = $2 AND branch_type = 'homebase'
        "#,
    )
    .bind(user_id)
    .bind(payload.branch_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    if activated.rows_affected() == 0 {
        return Err(ApiResponse::from(ServiceError::not_found(
            "Homebase branch not found for this user",
        )));
    }

    tx.commit()
        .await
        .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Active homebase set successfully",
        (),
    ))
}

#[derive(OpenApi)]
#[openapi(
    paths(get_user_homebases, set_active_homebase),
    components(schemas(HomebaseBranch, UserBranch, Branch, SetActiveHomebaseRequest)),
    tags(
        (name = "Homebase", description = "User homebase branch management")
    )
)]
pub struct HomebaseDoc;
