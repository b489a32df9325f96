use std::collections::HashMap;

use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sqlx::PgPool;
use utoipa::OpenApi;

use crate::db::models::approval::{
    ApprovalDecision, ApprovalDetail, ApprovalSignature, ApprovalStatus, ApprovalStatusParams,
    ApprovalSummary, NewTransactionApproval, OverallStatus, SignatureStatus, StatusView,
    TransactionApproval,
};
use crate::db::models::flow::ApprovalFlowStep;
use crate::db::queries::flow::get_flow_with_steps;
use crate::db::queries::reservoir::mark_used_in_tx;
use crate::middleware::auth::{Claims, UserRoles};
use crate::utils::api_response::ApiResponse;
use crate::utils::error::{is_unique_violation, ServiceError, ServiceResult};

//
// AGGREGATION
//

/// Fold per-step statuses (ordered by step order) into the transaction-level
/// view: any rejection wins, then a fully signed-off chain, then partial
/// progress. Returns (overall, completed count, index of the current step).
pub fn aggregate_status(statuses: &[ApprovalStatus]) -> (OverallStatus, usize, Option<usize>) {
    let total = statuses.len();
    let completed = statuses
        .iter()
        .filter(|s| **s == ApprovalStatus::Approved)
        .count();
    let current = statuses.iter().position(|s| *s == ApprovalStatus::Pending);

    let overall = if statuses.iter().any(|s| *s == ApprovalStatus::Rejected) {
        OverallStatus::Rejected
    } else if statuses.last() == Some(&ApprovalStatus::Approved) {
        OverallStatus::Approved
    } else if completed > 0 && completed < total {
        OverallStatus::InProgress
    } else {
        OverallStatus::Pending
    };

    (overall, completed, current)
}

//
// SERVICE HELPERS
//

pub async fn get_approval_by_id(
    pool: &PgPool,
    approval_id: i32,
) -> ServiceResult<TransactionApproval> {
    sqlx::query_as::<_, TransactionApproval>(
        "SELECT * FROM transaction_approvals WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(approval_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ServiceError::not_found("Transaction approval not found"))
}

async fn get_step_by_id(pool: &PgPool, step_id: i32) -> ServiceResult<ApprovalFlowStep> {
    sqlx::query_as::<_, ApprovalFlowStep>("SELECT * FROM approval_flow_steps WHERE id = $1")
        .bind(step_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Approval flow step not found"))
}

/// Load the step rows backing a set of approvals, keyed by step id.
async fn load_steps_for(
    pool: &PgPool,
    approvals: &[TransactionApproval],
) -> ServiceResult<HashMap<i32, ApprovalFlowStep>> {
    let step_ids: Vec<i32> = approvals.iter().map(|a| a.flow_step_id).collect();
    let steps = sqlx::query_as::<_, ApprovalFlowStep>(
        "SELECT * FROM approval_flow_steps WHERE id = ANY($1)",
    )
    .bind(&step_ids)
    .fetch_all(pool)
    .await?;
    Ok(steps.into_iter().map(|s| (s.id, s)).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Approve,
    Reject,
}

/// Apply an approve/reject decision to a pending approval record.
///
/// The caller must be the assigned approver user, or hold the assigned
/// approver role; a record with neither assignment accepts no one. The
/// status write is conditioned on the record still being pending, so two
/// simultaneous decisions yield one winner and one Conflict. The status
/// update and the signature append share one transaction.
async fn decide(
    pool: &PgPool,
    user_id: i32,
    user_roles: &UserRoles,
    decision: Decision,
    payload: &ApprovalDecision,
) -> ServiceResult<()> {
    let approval = get_approval_by_id(pool, payload.transaction_approval_id).await?;

    if approval.status != ApprovalStatus::Pending {
        return Err(ServiceError::conflict("Approval already processed"));
    }

    if let Some(approver_user_id) = approval.approver_user_id {
        if approver_user_id != user_id {
            return Err(ServiceError::forbidden(
                "You are not authorized to act on this transaction",
            ));
        }
    } else if let Some(approver_role_id) = approval.approver_role_id {
        if !user_roles.has_role(approver_role_id) {
            return Err(ServiceError::forbidden(
                "You do not have the required role to act on this transaction",
            ));
        }
    } else {
        return Err(ServiceError::forbidden(
            "This approval has no assigned approver",
        ));
    }

    let step = get_step_by_id(pool, approval.flow_step_id).await?;
    let now = Utc::now().naive_utc();

    let mut tx = pool.begin().await?;

    let updated = match decision {
        Decision::Approve => {
            sqlx::query(
                r#"
                UPDATE transaction_approvals
                SET status = 'approved', approved_at = $1, approved_by = $2,
                    notes = $3, updated_at = $1
                WHERE id = $4 AND status = 'pending'
                "#,
            )
            .bind(now)
            .bind(user_id)
            .bind(&payload.notes)
            .bind(approval.id)
            .execute(&mut *tx)
            .await?
        }
        Decision::Reject => {
            sqlx::query(
                r#"
                UPDATE transaction_approvals
                SET status = 'rejected', rejected_at = $1, rejected_by = $2,
                    notes = $3, updated_at = $1
                WHERE id = $4 AND status = 'pending'
                "#,
            )
            .bind(now)
            .bind(user_id)
            .bind(&payload.notes)
            .bind(approval.id)
            .execute(&mut *tx)
            .await?
        }
    };

    if updated.rows_affected() == 0 {
        // Lost the race to another decision on the same record.
        return Err(ServiceError::conflict("Approval already processed"));
    }

    let signature_status = match decision {
        Decision::Approve => SignatureStatus::Signed,
        Decision::Reject => SignatureStatus::Rejected,
    };

    sqlx::query(
        r#"
        INSERT INTO approval_signatures
            (transaction_number, transaction_type, user_id, role_id, step_role,
             signed_at, status, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(&approval.transaction_number)
    .bind(&approval.transaction_type)
    .bind(user_id)
    .bind(approval.approver_role_id)
    .bind(step.step_role)
    .bind(now)
    .bind(signature_status)
    .bind(&payload.notes)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        approval_id = approval.id,
        user_id,
        transaction_number = %approval.transaction_number,
        decision = ?decision,
        "approval decision recorded"
    );

    Ok(())
}

//
// HANDLERS
//

#[utoipa::path(
    post,
    path = "/transaction-approvals/initiate",
    request_body = NewTransactionApproval,
    responses(
        (status = 201, description = "Approval records created for the transaction"),
        (status = 404, description = "Approval flow not found"),
        (status = 409, description = "Approval already initiated for this transaction"),
        (status = 422, description = "Approval flow is inactive")
    ),
    tag = "Transaction Approvals",
    security(("bearerAuth" = []))
)]
pub async fn initiate_transaction_approval(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<NewTransactionApproval>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    let user_id = claims.user_id()?;

    let flow = get_flow_with_steps(&pool, payload.flow_id)
        .await
        .map_err(ApiResponse::from)?;

    if !flow.flow.is_active {
        return Err(ApiResponse::from(ServiceError::validation(
            "Approval flow is inactive",
        )));
    }

    // Record creation is all-or-nothing: the duplicate check, the reservoir
    // mark and every per-step insert commit together.
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    let already_initiated: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM transaction_approvals
            WHERE transaction_number = $1 AND transaction_type = $2
              AND deleted_at IS NULL
        )
        "#,
    )
    .bind(&payload.transaction_number)
    .bind(&payload.transaction_type)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    if already_initiated {
        return Err(ApiResponse::from(ServiceError::conflict(
            "Approval already initiated for this transaction",
        )));
    }

    // Numbers issued by the reservoir flip to `used` here; manually entered
    // numbers have no reservoir entry and are tolerated.
    match mark_used_in_tx(&mut tx, &payload.transaction_number).await {
        Ok(()) | Err(ServiceError::NotFound(_)) => {}
        Err(e) => return Err(ApiResponse::from(e)),
    }

    for step in &flow.steps {
        let status_view = if step.is_visible {
            StatusView::Visible
        } else {
            StatusView::Hidden
        };

        sqlx::query(
            r#"
            INSERT INTO transaction_approvals
                (flow_id, flow_step_id, transaction_number, transaction_type,
                 approver_role_id, status, status_view, metadata)
            VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7)
            "#,
        )
        .bind(flow.flow.id)
        .bind(step.id)
        .bind(&payload.transaction_number)
        .bind(&payload.transaction_type)
        .bind(step.role_id)
        .bind(status_view)
        .bind(&payload.metadata)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiResponse::from(ServiceError::conflict(
                    "Approval already initiated for this transaction",
                ))
            } else {
                ApiResponse::from(ServiceError::from(e))
            }
        })?;
    }

    tx.commit()
        .await
        .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    tracing::info!(
        flow_id = flow.flow.id,
        user_id,
        transaction_number = %payload.transaction_number,
        steps = flow.steps.len(),
        "transaction approval initiated"
    );

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Transaction approval initiated successfully",
        (),
    ))
}

#[utoipa::path(
    post,
    path = "/transaction-approvals/approve",
    request_body = ApprovalDecision,
    responses(
        (status = 200, description = "Transaction approved successfully"),
        (status = 403, description = "Caller is not the assigned approver"),
        (status = 404, description = "Transaction approval not found"),
        (status = 409, description = "Approval already processed")
    ),
    tag = "Transaction Approvals",
    security(("bearerAuth" = []))
)]
pub async fn approve_transaction(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Extension(user_roles): Extension<UserRoles>,
    Json(payload): Json<ApprovalDecision>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    let user_id = claims.user_id()?;

    decide(&pool, user_id, &user_roles, Decision::Approve, &payload)
        .await
        .map_err(ApiResponse::from)?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Transaction approved successfully",
        (),
    ))
}

#[utoipa::path(
    post,
    path = "/transaction-approvals/reject",
    request_body = ApprovalDecision,
    responses(
        (status = 200, description = "Transaction rejected successfully"),
        (status = 403, description = "Caller is not the assigned approver"),
        (status = 404, description = "Transaction approval not found"),
        (status = 409, description = "Approval already processed")
    ),
    tag = "Transaction Approvals",
    security(("bearerAuth" = []))
)]
pub async fn reject_transaction(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Extension(user_roles): Extension<UserRoles>,
    Json(payload): Json<ApprovalDecision>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    let user_id = claims.user_id()?;

    decide(&pool, user_id, &user_roles, Decision::Reject, &payload)
        .await
        .map_err(ApiResponse::from)?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Transaction rejected successfully",
        (),
    ))
}

#[utoipa::path(
    get,
    path = "/transaction-approvals/status",
    params(ApprovalStatusParams),
    responses(
        (status = 200, description = "Approval status for the transaction", body = ApprovalSummary),
        (status = 404, description = "No approval found for this transaction")
    ),
    tag = "Transaction Approvals",
    security(("bearerAuth" = []))
)]
pub async fn get_transaction_approval_status(
    State(pool): State<PgPool>,
    Query(params): Query<ApprovalStatusParams>,
) -> Result<ApiResponse<ApprovalSummary>, ApiResponse<()>> {
    let approvals = sqlx::query_as::<_, TransactionApproval>(
        r#"
        SELECT * FROM transaction_approvals
        WHERE transaction_number = $1 AND transaction_type = $2
          AND deleted_at IS NULL
        "#,
    )
    .bind(&params.transaction_number)
    .bind(&params.transaction_type)
    .fetch_all(&pool)
    .await
    .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    if approvals.is_empty() {
        return Err(ApiResponse::from(ServiceError::not_found(
            "No approval found for this transaction",
        )));
    }

    let mut steps = load_steps_for(&pool, &approvals)
        .await
        .map_err(ApiResponse::from)?;

    let mut details: Vec<ApprovalDetail> = approvals
        .into_iter()
        .map(|approval| {
            let step = steps.remove(&approval.flow_step_id);
            ApprovalDetail { approval, step }
        })
        .collect();
    details.sort_by_key(|d| d.step.as_ref().map_or(i32::MAX, |s| s.step_order));

    let statuses: Vec<ApprovalStatus> = details.iter().map(|d| d.approval.status).collect();
    let (overall, completed, current) = aggregate_status(&statuses);

    let current_step = current
        .and_then(|idx| details.get(idx))
        .and_then(|d| d.step.clone());

    let created_at = details
        .iter()
        .map(|d| d.approval.created_at)
        .min()
        .unwrap_or_else(|| Utc::now().naive_utc());

    let summary = ApprovalSummary {
        transaction_number: params.transaction_number,
        transaction_type: params.transaction_type,
        total_steps: details.len(),
        completed_steps: completed,
        current_step,
        status: overall,
        approvals: details,
        created_at,
    };

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Approval status retrieved successfully",
        summary,
    ))
}

#[utoipa::path(
    get,
    path = "/transaction-approvals/pending",
    responses(
        (status = 200, description = "Pending approvals for the current user", body = Vec<ApprovalDetail>)
    ),
    tag = "Transaction Approvals",
    security(("bearerAuth" = []))
)]
pub async fn get_user_pending_approvals(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Extension(user_roles): Extension<UserRoles>,
) -> Result<ApiResponse<Vec<ApprovalDetail>>, ApiResponse<()>> {
    let user_id = claims.user_id()?;

    let approvals = sqlx::query_as::<_, TransactionApproval>(
        r#"
        SELECT * FROM transaction_approvals
        WHERE status = 'pending' AND status_view = 'visible' AND deleted_at IS NULL
          AND (approver_user_id = $1 OR approver_role_id = ANY($2))
        ORDER BY created_at ASC
        "#,
    )
    .bind(user_id)
    .bind(&user_roles.role_ids)
    .fetch_all(&pool)
    .await
    .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    let mut steps = load_steps_for(&pool, &approvals)
        .await
        .map_err(ApiResponse::from)?;

    let details = approvals
        .into_iter()
        .map(|approval| {
            let step = steps.remove(&approval.flow_step_id);
            ApprovalDetail { approval, step }
        })
        .collect();

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Pending approvals retrieved successfully",
        details,
    ))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        initiate_transaction_approval,
        approve_transaction,
        reject_transaction,
        get_transaction_approval_status,
        get_user_pending_approvals
    ),
    components(schemas(
        NewTransactionApproval,
        ApprovalDecision,
        ApprovalSummary,
        ApprovalDetail,
        TransactionApproval,
        ApprovalSignature,
        ApprovalStatus,
        StatusView,
        SignatureStatus,
        OverallStatus
    )),
    tags(
        (name = "Transaction Approvals", description = "Per-transaction approval processing")
    )
)]
pub struct ApprovalDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use ApprovalStatus::{Approved, Pending, Rejected};

    #[test]
    fn all_pending_is_pending() {
        let (overall, completed, current) = aggregate_status(&[Pending, Pending]);
        assert_eq!(overall, OverallStatus::Pending);
        assert_eq!(completed, 0);
        assert_eq!(current, Some(0));
    }

    #[test]
    fn partial_progress_is_in_progress() {
        let (overall, completed, current) = aggregate_status(&[Approved, Pending]);
        assert_eq!(overall, OverallStatus::InProgress);
        assert_eq!(completed, 1);
        assert_eq!(current, Some(1));
    }

    #[test]
    fn fully_approved_chain_is_approved() {
        let (overall, completed, current) = aggregate_status(&[Approved, Approved]);
        assert_eq!(overall, OverallStatus::Approved);
        assert_eq!(completed, 2);
        assert_eq!(current, None);
    }

    #[test]
    fn any_rejection_short_circuits() {
        let (overall, completed, current) = aggregate_status(&[Pending, Rejected]);
        assert_eq!(overall, OverallStatus::Rejected);
        assert_eq!(completed, 0);
        assert_eq!(current, Some(0));

        let (overall, _, _) = aggregate_status(&[Approved, Rejected, Pending]);
        assert_eq!(overall, OverallStatus::Rejected);
    }

    #[test]
    fn single_step_flows() {
        assert_eq!(aggregate_status(&[Pending]).0, OverallStatus::Pending);
        assert_eq!(aggregate_status(&[Approved]).0, OverallStatus::Approved);
        assert_eq!(aggregate_status(&[Rejected]).0, OverallStatus::Rejected);
    }
}
