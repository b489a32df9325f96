use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
};
use axum::Json;
use serde::Deserialize;
use sqlx::PgPool;
use utoipa::{IntoParams, OpenApi};

use crate::db::models::flow::{
    ApprovalFlow, ApprovalFlowStep, ApprovalWay, AssignmentType, FlowWithSteps, NewApprovalFlow,
    NewFlowStep, StepCategoryFilter, StepChannel, StepInput, StepRole, StepTypeFilter,
    UpdateApprovalFlow, UpdateFlowStep,
};
use crate::middleware::auth::{Claims, UserRoles};
use crate::utils::api_response::ApiResponse;
use crate::utils::error::{is_unique_violation, ServiceError, ServiceResult};

//
// SERVICE HELPERS
//

/// Load a live (non-deleted) flow by id.
pub async fn get_flow_by_id(pool: &PgPool, flow_id: i32) -> ServiceResult<ApprovalFlow> {
    sqlx::query_as::<_, ApprovalFlow>(
        "SELECT * FROM approval_flows WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(flow_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ServiceError::not_found("Approval flow not found"))
}

/// Load a flow's steps ordered by `step_order`.
pub async fn get_flow_steps(pool: &PgPool, flow_id: i32) -> ServiceResult<Vec<ApprovalFlowStep>> {
    let steps = sqlx::query_as::<_, ApprovalFlowStep>(
        "SELECT * FROM approval_flow_steps WHERE flow_id = $1 ORDER BY step_order ASC",
    )
    .bind(flow_id)
    .fetch_all(pool)
    .await?;
    Ok(steps)
}

pub async fn get_flow_with_steps(pool: &PgPool, flow_id: i32) -> ServiceResult<FlowWithSteps> {
    let flow = get_flow_by_id(pool, flow_id).await?;
    let steps = get_flow_steps(pool, flow.id).await?;
    Ok(FlowWithSteps { flow, steps })
}

/// Resolve the effective flow for a user. Priority: the user's verified
/// custom flow, then a user-specific master flow assigned to them, then the
/// general master flow. Ties within a tier go to the most recently created
/// flow. The general tier is not filtered by transaction type.
pub async fn resolve_flow_for_user(
    pool: &PgPool,
    user_id: i32,
    _transaction_type: &str,
) -> ServiceResult<FlowWithSteps> {
    let custom = sqlx::query_as::<_, ApprovalFlow>(
        r#"
        SELECT * FROM approval_flows
        WHERE is_custom = TRUE AND created_by = $1
          AND custom_status = 'approved' AND is_active = TRUE
          AND deleted_at IS NULL
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    if let Some(flow) = custom {
        let steps = get_flow_steps(pool, flow.id).await?;
        return Ok(FlowWithSteps { flow, steps });
    }

    let user_specific = sqlx::query_as::<_, ApprovalFlow>(
        r#"
        SELECT * FROM approval_flows
        WHERE is_custom = FALSE AND assignment_type = 'user_specific'
          AND assigned_user_id = $1 AND is_active = TRUE
          AND deleted_at IS NULL
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    if let Some(flow) = user_specific {
        let steps = get_flow_steps(pool, flow.id).await?;
        return Ok(FlowWithSteps { flow, steps });
    }

    let general = sqlx::query_as::<_, ApprovalFlow>(
        r#"
        SELECT * FROM approval_flows
        WHERE is_custom = FALSE AND assignment_type = 'general'
          AND is_active = TRUE AND deleted_at IS NULL
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    if let Some(flow) = general {
        let steps = get_flow_steps(pool, flow.id).await?;
        return Ok(FlowWithSteps { flow, steps });
    }

    Err(ServiceError::not_found(
        "No approval flow found for this user",
    ))
}

async fn role_exists(pool: &PgPool, role_id: i32) -> ServiceResult<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM roles WHERE id = $1)")
        .bind(role_id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

async fn branch_exists(pool: &PgPool, branch_id: i32) -> ServiceResult<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM branches WHERE id = $1)")
        .bind(branch_id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Insert one step for a flow inside an open transaction. Used by master step
/// creation and by the custom-flow step-set writes, so that multi-step writes
/// stay atomic.
pub async fn insert_step(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    flow_id: i32,
    step: &StepInput,
) -> ServiceResult<ApprovalFlowStep> {
    let inserted = sqlx::query_as::<_, ApprovalFlowStep>(
        r#"
        INSERT INTO approval_flow_steps
            (flow_id, step_order, step_name, step_role, role_id, branch_id, structure,
             is_required, can_skip, is_visible, step_type, category, channel,
             auto_approve, timeout_hours, conditions)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING *
        "#,
    )
    .bind(flow_id)
    .bind(step.step_order)
    .bind(&step.step_name)
    .bind(step.step_role)
    .bind(step.role_id)
    .bind(step.branch_id)
    .bind(&step.structure)
    .bind(step.is_required)
    .bind(step.can_skip)
    .bind(step.is_visible)
    .bind(step.step_type.unwrap_or(StepTypeFilter::All))
    .bind(step.category.unwrap_or(StepCategoryFilter::All))
    .bind(step.channel.unwrap_or(StepChannel::Web))
    .bind(step.auto_approve)
    .bind(step.timeout_hours)
    .bind(&step.conditions)
    .fetch_one(&mut **tx)
    .await?;
    Ok(inserted)
}

/// Validate the role/branch references of a step against the directory tables.
pub async fn validate_step_refs(pool: &PgPool, step: &StepInput) -> ServiceResult<()> {
    if let Some(role_id) = step.role_id {
        if !role_exists(pool, role_id).await? {
            return Err(ServiceError::not_found("Role not found"));
        }
    }
    if let Some(branch_id) = step.branch_id {
        if !branch_exists(pool, branch_id).await? {
            return Err(ServiceError::not_found("Branch not found"));
        }
    }
    Ok(())
}

//
// APPROVAL FLOW HANDLERS (admin, master templates)
//

#[utoipa::path(
    get,
    path = "/approval-flows",
    responses(
        (status = 200, description = "Approval flows retrieved successfully", body = Vec<FlowWithSteps>),
        (status = 403, description = "Administrator role required")
    ),
    tag = "Approval Flows",
    security(("bearerAuth" = []))
)]
pub async fn get_approval_flows(
    State(pool): State<PgPool>,
    Extension(user_roles): Extension<UserRoles>,
) -> Result<ApiResponse<Vec<FlowWithSteps>>, ApiResponse<()>> {
    if !user_roles.is_admin() {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Administrator role required",
            None,
        ));
    }

    let flows = sqlx::query_as::<_, ApprovalFlow>(
        "SELECT * FROM approval_flows WHERE deleted_at IS NULL ORDER BY created_at DESC",
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
        "Approval flows retrieved successfully",
        result,
    ))
}

#[utoipa::path(
    get,
    path = "/approval-flows/{flow_id}",
    params(("flow_id" = i32, Path, description = "Approval flow ID")),
    responses(
        (status = 200, description = "Approval flow retrieved successfully", body = FlowWithSteps),
        (status = 404, description = "Approval flow not found")
    ),
    tag = "Approval Flows",
    security(("bearerAuth" = []))
)]
pub async fn get_approval_flow(
    State(pool): State<PgPool>,
    Extension(user_roles): Extension<UserRoles>,
    Path(flow_id): Path<i32>,
) -> Result<ApiResponse<FlowWithSteps>, ApiResponse<()>> {
    if !user_roles.is_admin() {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Administrator role required",
            None,
        ));
    }

    let flow = get_flow_with_steps(&pool, flow_id)
        .await
        .map_err(ApiResponse::from)?;
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Approval flow retrieved successfully",
        flow,
    ))
}

#[utoipa::path(
    get,
    path = "/approval-flows/code/{flow_code}",
    params(("flow_code" = String, Path, description = "Unique flow code")),
    responses(
        (status = 200, description = "Approval flow retrieved successfully", body = FlowWithSteps),
        (status = 404, description = "Approval flow not found")
    ),
    tag = "Approval Flows",
    security(("bearerAuth" = []))
)]
pub async fn get_approval_flow_by_code(
    State(pool): State<PgPool>,
    Extension(user_roles): Extension<UserRoles>,
    Path(flow_code): Path<String>,
) -> Result<ApiResponse<FlowWithSteps>, ApiResponse<()>> {
    if !user_roles.is_admin() {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Administrator role required",
            None,
        ));
    }

    let flow = sqlx::query_as::<_, ApprovalFlow>(
        "SELECT * FROM approval_flows WHERE flow_code = $1 AND deleted_at IS NULL",
    )
    .bind(&flow_code)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiResponse::from(ServiceError::from(e)))?
    .ok_or_else(|| ApiResponse::from(ServiceError::not_found("Approval flow not found")))?;

    let steps = get_flow_steps(&pool, flow.id)
        .await
        .map_err(ApiResponse::from)?;
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Approval flow retrieved successfully",
        FlowWithSteps { flow, steps },
    ))
}

#[utoipa::path(
    post,
    path = "/approval-flows",
    request_body = NewApprovalFlow,
    responses(
        (status = 201, description = "Approval flow created successfully", body = FlowWithSteps),
        (status = 422, description = "assigned_user_id is required when assignment_type is user_specific")
    ),
    tag = "Approval Flows",
    security(("bearerAuth" = []))
)]
pub async fn create_approval_flow(
    State(pool): State<PgPool>,
    Extension(user_roles): Extension<UserRoles>,
    Json(payload): Json<NewApprovalFlow>,
) -> Result<ApiResponse<FlowWithSteps>, ApiResponse<()>> {
    if !user_roles.is_admin() {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Administrator role required",
            None,
        ));
    }

    if payload.assignment_type == AssignmentType::UserSpecific && payload.assigned_user_id.is_none()
    {
        return Err(ApiResponse::from(ServiceError::validation(
            "assigned_user_id is required when assignment_type is user_specific",
        )));
    }

    let allowed_roles = if payload.allowed_creator_roles.is_empty() {
        None
    } else {
        Some(
            serde_json::to_value(&payload.allowed_creator_roles)
                .map_err(|e| ApiResponse::from(ServiceError::from(e)))?,
        )
    };

    let flow = sqlx::query_as::<_, ApprovalFlow>(
        r#"
        INSERT INTO approval_flows
            (flow_code, flow_name, approval_way, assignment_type, assigned_user_id,
             is_customizable, allowed_creator_roles, description, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(&payload.flow_code)
    .bind(&payload.flow_name)
    .bind(payload.approval_way)
    .bind(payload.assignment_type)
    .bind(payload.assigned_user_id)
    .bind(payload.is_customizable)
    .bind(allowed_roles)
    .bind(&payload.description)
    .bind(payload.is_active)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiResponse::from(ServiceError::conflict("Flow code already in use"))
        } else {
            ApiResponse::from(ServiceError::from(e))
        }
    })?;

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Approval flow created successfully",
        FlowWithSteps {
            flow,
            steps: Vec::new(),
        },
    ))
}

#[utoipa::path(
    patch,
    path = "/approval-flows/{flow_id}",
    params(("flow_id" = i32, Path, description = "Approval flow ID")),
    request_body = UpdateApprovalFlow,
    responses(
        (status = 200, description = "Approval flow updated successfully", body = FlowWithSteps),
        (status = 404, description = "Approval flow not found")
    ),
    tag = "Approval Flows",
    security(("bearerAuth" = []))
)]
pub async fn update_approval_flow(
    State(pool): State<PgPool>,
    Extension(user_roles): Extension<UserRoles>,
    Path(flow_id): Path<i32>,
    Json(payload): Json<UpdateApprovalFlow>,
) -> Result<ApiResponse<FlowWithSteps>, ApiResponse<()>> {
    if !user_roles.is_admin() {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Administrator role required",
            None,
        ));
    }

    let allowed_roles = match &payload.allowed_creator_roles {
        Some(roles) => Some(
            serde_json::to_value(roles).map_err(|e| ApiResponse::from(ServiceError::from(e)))?,
        ),
        None => None,
    };

    let updated = sqlx::query_as::<_, ApprovalFlow>(
        r#"
        UPDATE approval_flows SET
            flow_code = COALESCE($1, flow_code),
            flow_name = COALESCE($2, flow_name),
            approval_way = COALESCE($3, approval_way),
            assignment_type = COALESCE($4, assignment_type),
            assigned_user_id = COALESCE($5, assigned_user_id),
            is_customizable = COALESCE($6, is_customizable),
            allowed_creator_roles = COALESCE($7, allowed_creator_roles),
            description = COALESCE($8, description),
            is_active = COALESCE($9, is_active),
            updated_at = NOW()
        WHERE id = $10 AND deleted_at IS NULL
        RETURNING *
        "#,
    )
    .bind(&payload.flow_code)
    .bind(&payload.flow_name)
    .bind(payload.approval_way)
    .bind(payload.assignment_type)
    .bind(payload.assigned_user_id)
    .bind(payload.is_customizable)
    .bind(allowed_roles)
    .bind(&payload.description)
    .bind(payload.is_active)
    .bind(flow_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiResponse::from(ServiceError::from(e)))?
    .ok_or_else(|| ApiResponse::from(ServiceError::not_found("Approval flow not found")))?;

    let steps = get_flow_steps(&pool, updated.id)
        .await
        .map_err(ApiResponse::from)?;
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Approval flow updated successfully",
        FlowWithSteps {
            flow: updated,
            steps,
        },
    ))
}

#[utoipa::path(
    delete,
    path = "/approval-flows/{flow_id}",
    params(("flow_id" = i32, Path, description = "Approval flow ID")),
    responses(
        (status = 200, description = "Approval flow deleted successfully"),
        (status = 404, description = "Approval flow not found")
    ),
    tag = "Approval Flows",
    security(("bearerAuth" = []))
)]
pub async fn delete_approval_flow(
    State(pool): State<PgPool>,
    Extension(user_roles): Extension<UserRoles>,
    Path(flow_id): Path<i32>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    if !user_roles.is_admin() {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Administrator role required",
            None,
        ));
    }

    let result = sqlx::query(
        "UPDATE approval_flows SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(flow_id)
    .execute(&pool)
    .await
    .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(ApiResponse::from(ServiceError::not_found(
            "Approval flow not found",
        )));
    }

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Approval flow deleted successfully",
        (),
    ))
}

//
// APPROVAL FLOW STEP HANDLERS (admin)
//

#[utoipa::path(
    post,
    path = "/approval-flow-steps",
    request_body = NewFlowStep,
    responses(
        (status = 201, description = "Approval flow step created successfully", body = ApprovalFlowStep),
        (status = 404, description = "Approval flow, role or branch not found")
    ),
    tag = "Approval Flows",
    security(("bearerAuth" = []))
)]
pub async fn create_flow_step(
    State(pool): State<PgPool>,
    Extension(user_roles): Extension<UserRoles>,
    Json(payload): Json<NewFlowStep>,
) -> Result<ApiResponse<ApprovalFlowStep>, ApiResponse<()>> {
    if !user_roles.is_admin() {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Administrator role required",
            None,
        ));
    }

    get_flow_by_id(&pool, payload.flow_id)
        .await
        .map_err(ApiResponse::from)?;
    validate_step_refs(&pool, &payload.step)
        .await
        .map_err(ApiResponse::from)?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;
    let step = insert_step(&mut tx, payload.flow_id, &payload.step)
        .await
        .map_err(ApiResponse::from)?;
    tx.commit()
        .await
        .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Approval flow step created successfully",
        step,
    ))
}

#[utoipa::path(
    patch,
    path = "/approval-flow-steps/{step_id}",
    params(("step_id" = i32, Path, description = "Approval flow step ID")),
    request_body = UpdateFlowStep,
    responses(
        (status = 200, description = "Approval flow step updated successfully", body = ApprovalFlowStep),
        (status = 404, description = "Approval flow step not found")
    ),
    tag = "Approval Flows",
    security(("bearerAuth" = []))
)]
pub async fn update_flow_step(
    State(pool): State<PgPool>,
    Extension(user_roles): Extension<UserRoles>,
    Path(step_id): Path<i32>,
    Json(payload): Json<UpdateFlowStep>,
) -> Result<ApiResponse<ApprovalFlowStep>, ApiResponse<()>> {
    if !user_roles.is_admin() {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Administrator role required",
            None,
        ));
    }

    if let Some(role_id) = payload.role_id {
        if !role_exists(&pool, role_id).await.map_err(ApiResponse::from)? {
            return Err(ApiResponse::from(ServiceError::not_found("Role not found")));
        }
    }
    if let Some(branch_id) = payload.branch_id {
        if !branch_exists(&pool, branch_id)
            .await
            .map_err(ApiResponse::from)?
        {
            return Err(ApiResponse::from(ServiceError::not_found(
                "Branch not found",
            )));
        }
    }

    let updated = sqlx::query_as::<_, ApprovalFlowStep>(
        r#"
        UPDATE approval_flow_steps SET
            step_order = COALESCE($1, step_order),
            step_name = COALESCE($2, step_name),
            step_role = COALESCE($3, step_role),
            role_id = COALESCE($4, role_id),
            branch_id = COALESCE($5, branch_id),
            structure = COALESCE($6, structure),
            is_required = COALESCE($7, is_required),
            can_skip = COALESCE($8, can_skip),
            is_visible = COALESCE($9, is_visible),
            step_type = COALESCE($10, step_type),
            category = COALESCE($11, category),
            channel = COALESCE($12, channel),
            auto_approve = COALESCE($13, auto_approve),
            timeout_hours = COALESCE($14, timeout_hours),
            conditions = COALESCE($15, conditions),
            updated_at = NOW()
        WHERE id = $16
        RETURNING *
        "#,
    )
    .bind(payload.step_order)
    .bind(&payload.step_name)
    .bind(payload.step_role)
    .bind(payload.role_id)
    .bind(payload.branch_id)
    .bind(&payload.structure)
    .bind(payload.is_required)
    .bind(payload.can_skip)
    .bind(payload.is_visible)
    .bind(payload.step_type)
    .bind(payload.category)
    .bind(payload.channel)
    .bind(payload.auto_approve)
    .bind(payload.timeout_hours)
    .bind(&payload.conditions)
    .bind(step_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiResponse::from(ServiceError::from(e)))?
    .ok_or_else(|| ApiResponse::from(ServiceError::not_found("Approval flow step not found")))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Approval flow step updated successfully",
        updated,
    ))
}

#[utoipa::path(
    delete,
    path = "/approval-flow-steps/{step_id}",
    params(("step_id" = i32, Path, description = "Approval flow step ID")),
    responses(
        (status = 200, description = "Approval flow step deleted successfully"),
        (status = 404, description = "Approval flow step not found")
    ),
    tag = "Approval Flows",
    security(("bearerAuth" = []))
)]
pub async fn delete_flow_step(
    State(pool): State<PgPool>,
    Extension(user_roles): Extension<UserRoles>,
    Path(step_id): Path<i32>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    if !user_roles.is_admin() {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Administrator role required",
            None,
        ));
    }

    let result = sqlx::query("DELETE FROM approval_flow_steps WHERE id = $1")
        .bind(step_id)
        .execute(&pool)
        .await
        .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(ApiResponse::from(ServiceError::not_found(
            "Approval flow step not found",
        )));
    }

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Approval flow step deleted successfully",
        (),
    ))
}

//
// RESOLVER
//

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResolveParams {
    pub transaction_type: String,
}

#[utoipa::path(
    get,
    path = "/approval-flows/resolve",
    params(ResolveParams),
    responses(
        (status = 200, description = "Effective approval flow for the current user", body = FlowWithSteps),
        (status = 404, description = "No approval flow found for this user")
    ),
    tag = "Approval Flows",
    security(("bearerAuth" = []))
)]
pub async fn resolve_approval_flow(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ResolveParams>,
) -> Result<ApiResponse<FlowWithSteps>, ApiResponse<()>> {
    let user_id = claims.user_id()?;

    let flow = resolve_flow_for_user(&pool, user_id, &params.transaction_type)
        .await
        .map_err(ApiResponse::from)?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Approval flow resolved successfully",
        flow,
    ))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        get_approval_flows,
        get_approval_flow,
        get_approval_flow_by_code,
        create_approval_flow,
        update_approval_flow,
        delete_approval_flow,
        create_flow_step,
        update_flow_step,
        delete_flow_step,
        resolve_approval_flow
    ),
    components(schemas(
        ApprovalFlow,
        ApprovalFlowStep,
        FlowWithSteps,
        NewApprovalFlow,
        UpdateApprovalFlow,
        NewFlowStep,
        UpdateFlowStep,
        StepInput,
        ApprovalWay,
        AssignmentType,
        StepRole,
        StepTypeFilter,
        StepCategoryFilter,
        StepChannel
    )),
    tags(
        (name = "Approval Flows", description = "Approval flow template management")
    )
)]
pub struct FlowDoc;
