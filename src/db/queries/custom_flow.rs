use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use sqlx::PgPool;
use utoipa::OpenApi;

use crate::db::models::flow::{
    ApprovalFlow, CustomFlowState, CustomFlowStatus, FlowWithSteps, NewCustomFlow,
    UpdateCustomFlow, VerifyAction, VerifyCustomFlow,
};
use crate::db::queries::flow::{
    get_flow_by_id, get_flow_steps, insert_step, validate_step_refs,
};
use crate::middleware::auth::{Claims, UserRoles};
use crate::utils::api_response::ApiResponse;
use crate::utils::error::{is_unique_violation, ServiceError, ServiceResult};

//
// SERVICE HELPERS
//

/// True when an empty allow-list (anyone) or a shared role id permits the user.
pub fn roles_permit(allowed_role_ids: &[i32], user_role_ids: &[i32]) -> bool {
    allowed_role_ids.is_empty()
        || allowed_role_ids
            .iter()
            .any(|allowed| user_role_ids.contains(allowed))
}

/// Whether the user may create a custom flow on top of `flow_id`.
/// Custom flows can never be customized again; a non-customizable template
/// refuses everyone; an empty creator-role list admits everyone.
pub async fn can_user_customize_flow(
    pool: &PgPool,
    user_roles: &UserRoles,
    flow_id: i32,
) -> ServiceResult<bool> {
    let flow = get_flow_by_id(pool, flow_id).await?;

    if flow.is_custom {
        return Ok(false);
    }
    if !flow.is_customizable {
        return Ok(false);
    }

    let allowed = flow.allowed_creator_roles()?;
    Ok(roles_permit(&allowed, &user_roles.role_ids))
}

async fn load_custom_flow(
    pool: &PgPool,
    flow_id: i32,
) -> ServiceResult<(ApprovalFlow, CustomFlowState)> {
    let flow = get_flow_by_id(pool, flow_id).await?;
    let state = flow.custom_state()?.ok_or_else(|| {
        ServiceError::validation("This is not a custom approval flow")
    })?;
    Ok((flow, state))
}

//
// HANDLERS
//

#[utoipa::path(
    post,
    path = "/custom-approvals",
    request_body = NewCustomFlow,
    responses(
        (status = 201, description = "Custom approval created successfully", body = FlowWithSteps),
        (status = 403, description = "User may not customize this flow"),
        (status = 409, description = "User already has a custom approval for this base flow")
    ),
    tag = "Custom Approvals",
    security(("bearerAuth" = []))
)]
pub async fn create_custom_approval(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Extension(user_roles): Extension<UserRoles>,
    Json(payload): Json<NewCustomFlow>,
) -> Result<ApiResponse<FlowWithSteps>, ApiResponse<()>> {
    let user_id = claims.user_id()?;

    let base_flow = get_flow_by_id(&pool, payload.base_flow_id)
        .await
        .map_err(ApiResponse::from)?;
    if base_flow.is_custom {
        return Err(ApiResponse::from(ServiceError::validation(
            "Custom flows cannot be customized",
        )));
    }

    let can_customize = can_user_customize_flow(&pool, &user_roles, payload.base_flow_id)
        .await
        .map_err(ApiResponse::from)?;
    if !can_customize {
        return Err(ApiResponse::from(ServiceError::forbidden(
            "You don't have permission to customize this flow",
        )));
    }

    // One live custom flow per user per base.
    let duplicate: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM approval_flows
            WHERE is_custom = TRUE AND created_by = $1 AND base_flow_id = $2
              AND deleted_at IS NULL
        )
        "#,
    )
    .bind(user_id)
    .bind(payload.base_flow_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    if duplicate {
        return Err(ApiResponse::from(ServiceError::conflict(
            "You already have a custom approval based on this flow. Please update it instead",
        )));
    }

    for step in &payload.steps {
        validate_step_refs(&pool, step)
            .await
            .map_err(ApiResponse::from)?;
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    let flow = sqlx::query_as::<_, ApprovalFlow>(
        r#"
        INSERT INTO approval_flows
            (flow_code, flow_name, approval_way, assignment_type, assigned_user_id,
             is_customizable, is_custom, created_by, base_flow_id, custom_status,
             description, is_active)
        VALUES ($1, $2, $3, 'user_specific', $4,
                FALSE, TRUE, $4, $5, 'pending_verification',
                $6, FALSE)
        RETURNING *
        "#,
    )
    .bind(format!("CUSTOM_{}_{}", user_id, base_flow.flow_code))
    .bind(&payload.flow_name)
    .bind(base_flow.approval_way)
    .bind(user_id)
    .bind(base_flow.id)
    .bind(format!(
        "Custom approval created by user based on {}",
        base_flow.flow_name
    ))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiResponse::from(ServiceError::conflict(
                "You already have a custom approval based on this flow. Please update it instead",
            ))
        } else {
            ApiResponse::from(ServiceError::from(e))
        }
    })?;

    let mut steps = Vec::with_capacity(payload.steps.len());
    for step in &payload.steps {
        steps.push(
            insert_step(&mut tx, flow.id, step)
                .await
                .map_err(ApiResponse::from)?,
        );
    }

    tx.commit()
        .await
        .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    tracing::info!(flow_id = flow.id, user_id, "custom approval created");

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Custom approval created successfully",
        FlowWithSteps { flow, steps },
    ))
}

#[utoipa::path(
    get,
    path = "/custom-approvals/me",
    responses(
        (status = 200, description = "Custom approvals for the current user", body = Vec<FlowWithSteps>)
    ),
    tag = "Custom Approvals",
    security(("bearerAuth" = []))
)]
pub async fn get_user_custom_approvals(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<Vec<FlowWithSteps>>, ApiResponse<()>> {
    let user_id = claims.user_id()?;

    let flows = sqlx::query_as::<_, ApprovalFlow>(
        r#"
        SELECT * FROM approval_flows
        WHERE is_custom = TRUE AND created_by = $1 AND deleted_at IS NULL
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    let mut result = Vec::with_capacity(flows.len());
    for flow in flows {
        let steps = get_flow_steps(&pool, flow.id)
            .await
            .map_err(ApiResponse::from)?;
        result.push(FlowWithSteps { flow, steps });
    }

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Custom approvals retrieved successfully",
        result,
    ))
}

#[utoipa::path(
    put,
    path = "/custom-approvals/{flow_id}",
    params(("flow_id" = i32, Path, description = "Custom approval flow ID")),
    request_body = UpdateCustomFlow,
    responses(
        (status = 200, description = "Custom approval updated successfully", body = FlowWithSteps),
        (status = 403, description = "Only the owner or an admin may edit"),
        (status = 404, description = "Custom approval not found")
    ),
    tag = "Custom Approvals",
    security(("bearerAuth" = []))
)]
pub async fn update_custom_approval(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Extension(user_roles): Extension<UserRoles>,
    Path(flow_id): Path<i32>,
    Json(payload): Json<UpdateCustomFlow>,
) -> Result<ApiResponse<FlowWithSteps>, ApiResponse<()>> {
    let user_id = claims.user_id()?;

    let (_flow, state) = load_custom_flow(&pool, flow_id)
        .await
        .map_err(ApiResponse::from)?;

    if state.created_by != user_id && !user_roles.is_admin() {
        return Err(ApiResponse::from(ServiceError::forbidden(
            "You can only edit your own custom approval",
        )));
    }

    for step in &payload.steps {
        validate_step_refs(&pool, step)
            .await
            .map_err(ApiResponse::from)?;
    }

    // Full step-set replacement and the verification reset are one
    // transaction; a partially replaced step set must never be observable.
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    let updated = sqlx::query_as::<_, ApprovalFlow>(
        r#"
        UPDATE approval_flows SET
            flow_name = $1,
            custom_status = 'pending_verification',
            is_active = FALSE,
            updated_at = NOW()
        WHERE id = $2 AND deleted_at IS NULL
        RETURNING *
        "#,
    )
    .bind(&payload.flow_name)
    .bind(flow_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    sqlx::query("DELETE FROM approval_flow_steps WHERE flow_id = $1")
        .bind(flow_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    let mut steps = Vec::with_capacity(payload.steps.len());
    for step in &payload.steps {
        steps.push(
            insert_step(&mut tx, flow_id, step)
                .await
                .map_err(ApiResponse::from)?,
        );
    }

    tx.commit()
        .await
        .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Custom approval updated successfully",
        FlowWithSteps {
            flow: updated,
            steps,
        },
    ))
}

#[utoipa::path(
    delete,
    path = "/custom-approvals/{flow_id}",
    params(("flow_id" = i32, Path, description = "Custom approval flow ID")),
    responses(
        (status = 200, description = "Custom approval deleted successfully"),
        (status = 403, description = "Only the owner may delete"),
        (status = 404, description = "Custom approval not found")
    ),
    tag = "Custom Approvals",
    security(("bearerAuth" = []))
)]
pub async fn delete_custom_approval(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(flow_id): Path<i32>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    let user_id = claims.user_id()?;

    let (_flow, state) = load_custom_flow(&pool, flow_id)
        .await
        .map_err(ApiResponse::from)?;

    if state.created_by != user_id {
        return Err(ApiResponse::from(ServiceError::forbidden(
            "You can only delete your own custom approval",
        )));
    }

    sqlx::query(
        "UPDATE approval_flows SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(flow_id)
    .execute(&pool)
    .await
    .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Custom approval deleted successfully",
        (),
    ))
}

#[utoipa::path(
    post,
    path = "/custom-approvals/{flow_id}/verify",
    params(("flow_id" = i32, Path, description = "Custom approval flow ID")),
    request_body = VerifyCustomFlow,
    responses(
        (status = 200, description = "Custom approval verified", body = FlowWithSteps),
        (status = 403, description = "Verifier role required"),
        (status = 409, description = "Custom approval already verified")
    ),
    tag = "Custom Approvals",
    security(("bearerAuth" = []))
)]
pub async fn verify_custom_approval(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Extension(user_roles): Extension<UserRoles>,
    Path(flow_id): Path<i32>,
    Json(payload): Json<VerifyCustomFlow>,
) -> Result<ApiResponse<FlowWithSteps>, ApiResponse<()>> {
    let verifier_id = claims.user_id()?;

    if !user_roles.can_verify_custom_flows() {
        return Err(ApiResponse::from(ServiceError::forbidden(
            "You don't have permission to verify custom approvals",
        )));
    }

    let (_flow, state) = load_custom_flow(&pool, flow_id)
        .await
        .map_err(ApiResponse::from)?;

    if state.status.is_terminal() {
        return Err(ApiResponse::from(ServiceError::conflict(
            "Custom approval already verified",
        )));
    }

    let (new_status, is_active) = match payload.action {
        VerifyAction::Approve => (CustomFlowStatus::Approved, true),
        VerifyAction::Reject => (CustomFlowStatus::Rejected, false),
    };

    // Conditioned on the row still being pending so two verifiers racing on
    // the same flow produce one winner and one Conflict.
    let updated = sqlx::query_as::<_, ApprovalFlow>(
        r#"
        UPDATE approval_flows SET
            custom_status = $1,
            is_active = $2,
            verified_by = $3,
            verified_at = NOW(),
            verification_notes = CASE WHEN $4 THEN $5 ELSE verification_notes END,
            rejection_reason = CASE WHEN $4 THEN rejection_reason ELSE $5 END,
            updated_at = NOW()
        WHERE id = $6 AND custom_status = 'pending_verification' AND deleted_at IS NULL
        RETURNING *
        "#,
    )
    .bind(new_status)
    .bind(is_active)
    .bind(verifier_id)
    .bind(payload.action == VerifyAction::Approve)
    .bind(&payload.notes)
    .bind(flow_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiResponse::from(ServiceError::from(e)))?
    .ok_or_else(|| ApiResponse::from(ServiceError::conflict("Custom approval already verified")))?;

    tracing::info!(flow_id, verifier_id, action = ?payload.action, "custom approval verified");

    let steps = get_flow_steps(&pool, updated.id)
        .await
        .map_err(ApiResponse::from)?;
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Custom approval verified",
        FlowWithSteps {
            flow: updated,
            steps,
        },
    ))
}

#[utoipa::path(
    get,
    path = "/custom-approvals/pending-verifications",
    responses(
        (status = 200, description = "Custom approvals awaiting verification", body = Vec<FlowWithSteps>),
        (status = 403, description = "Verifier role required")
    ),
    tag = "Custom Approvals",
    security(("bearerAuth" = []))
)]
pub async fn get_pending_verifications(
    State(pool): State<PgPool>,
    Extension(user_roles): Extension<UserRoles>,
) -> Result<ApiResponse<Vec<FlowWithSteps>>, ApiResponse<()>> {
    if !user_roles.can_verify_custom_flows() {
        return Err(ApiResponse::from(ServiceError::forbidden(
            "You don't have permission to view pending verifications",
        )));
    }

    let flows = sqlx::query_as::<_, ApprovalFlow>(
        r#"
        SELECT * FROM approval_flows
        WHERE is_custom = TRUE AND custom_status = 'pending_verification'
          AND deleted_at IS NULL
        ORDER BY created_at ASC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    let mut result = Vec::with_capacity(flows.len());
    for flow in flows {
        let steps = get_flow_steps(&pool, flow.id)
            .await
            .map_err(ApiResponse::from)?;
        result.push(FlowWithSteps { flow, steps });
    }

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Pending verifications retrieved successfully",
        result,
    ))
}

#[utoipa::path(
    get,
    path = "/approval-flows/{flow_id}/can-customize",
    params(("flow_id" = i32, Path, description = "Approval flow ID")),
    responses(
        (status = 200, description = "Whether the current user may customize the flow", body = bool),
        (status = 404, description = "Approval flow not found")
    ),
    tag = "Custom Approvals",
    security(("bearerAuth" = []))
)]
pub async fn check_can_customize(
    State(pool): State<PgPool>,
    Extension(user_roles): Extension<UserRoles>,
    Path(flow_id): Path<i32>,
) -> Result<ApiResponse<bool>, ApiResponse<()>> {
    let can_customize = can_user_customize_flow(&pool, &user_roles, flow_id)
        .await
        .map_err(ApiResponse::from)?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Customization permission retrieved",
        can_customize,
    ))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create_custom_approval,
        get_user_custom_approvals,
        update_custom_approval,
        delete_custom_approval,
        verify_custom_approval,
        get_pending_verifications,
        check_can_customize
    ),
    components(schemas(NewCustomFlow, UpdateCustomFlow, VerifyCustomFlow, VerifyAction, CustomFlowStatus)),
    tags(
        (name = "Custom Approvals", description = "User-authored approval flow customization")
    )
)]
pub struct CustomFlowDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allow_list_admits_everyone() {
        assert!(roles_permit(&[], &[]));
        assert!(roles_permit(&[], &[1, 2]));
    }

    #[test]
    fn allow_list_requires_shared_role() {
        assert!(roles_permit(&[3, 5], &[5]));
        assert!(!roles_permit(&[3, 5], &[4]));
        assert!(!roles_permit(&[3, 5], &[]));
    }
}
