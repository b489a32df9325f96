use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::db::models::flow::{ApprovalFlowStep, StepRole};

/// Decision state of a single approval record. Records only ever leave
/// `pending`, and only once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Skipped,
}

/// Whether a record is shown in pending-approval listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_view", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StatusView {
    Visible,
    Hidden,
}

/// One approval record per (transaction, flow step), created as a set when
/// approval is initiated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TransactionApproval {
    pub id: i32,
    pub flow_id: i32,
    pub flow_step_id: i32,
    pub transaction_number: String,
    pub transaction_type: String,
    pub approver_user_id: Option<i32>,
    pub approver_role_id: Option<i32>,
    pub status: ApprovalStatus,
    pub status_view: StatusView,
    pub approved_at: Option<NaiveDateTime>,
    pub approved_by: Option<i32>,
    pub rejected_at: Option<NaiveDateTime>,
    pub rejected_by: Option<i32>,
    pub notes: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

/// Audit record written alongside every approve/reject. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ApprovalSignature {
    pub id: i32,
    pub transaction_number: String,
    pub transaction_type: String,
    pub user_id: i32,
    pub role_id: Option<i32>,
    pub step_role: StepRole,
    pub signed_at: NaiveDateTime,
    pub status: SignatureStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "signature_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SignatureStatus {
    Signed,
    Rejected,
}

/// Aggregate state of a transaction's approval chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Pending,
    InProgress,
    Approved,
    Rejected,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewTransactionApproval {
    pub flow_id: i32,
    pub transaction_number: String,
    pub transaction_type: String,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApprovalDecision {
    pub transaction_approval_id: i32,
    pub notes: Option<String>,
}

/// Transaction numbers carry `/` separators, so status lookups travel as
/// query parameters rather than path segments.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApprovalStatusParams {
    pub transaction_number: String,
    pub transaction_type: String,
}

/// An approval record enriched with its flow step.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApprovalDetail {
    pub approval: TransactionApproval,
    pub step: Option<ApprovalFlowStep>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApprovalSummary {
    pub transaction_number: String,
    pub transaction_type: String,
    pub total_steps: usize,
    pub completed_steps: usize,
    pub current_step: Option<ApprovalFlowStep>,
    pub status: OverallStatus,
    pub approvals: Vec<ApprovalDetail>,
    pub created_at: NaiveDateTime,
}
