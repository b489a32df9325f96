use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::utils::error::{ServiceError, ServiceResult};

/// How the steps of a flow are worked through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_way", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalWay {
    Sequential,
    Parallel,
    Conditional,
}

/// Who a flow template applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "assignment_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentType {
    General,
    UserSpecific,
}

/// Verification state of a user-authored custom flow.
/// `pending_verification` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "custom_flow_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CustomFlowStatus {
    PendingVerification,
    Approved,
    Rejected,
}

impl CustomFlowStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, CustomFlowStatus::Approved | CustomFlowStatus::Rejected)
    }
}

/// Function of a step within the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "step_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StepRole {
    Creator,
    Reviewer,
    Approver,
    Receiver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "step_type_filter", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StepTypeFilter {
    It,
    NonIt,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "step_category_filter", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StepCategoryFilter {
    Budget,
    NonBudget,
    Return,
    All,
}

/// Where the decision for a step is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "step_channel", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StepChannel {
    Web,
    Upload,
}

/// Approval flow template. One table serves both master templates
/// (`is_custom = false`, admin-managed) and user-authored custom flows
/// (`is_custom = true`, inactive until verified).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ApprovalFlow {
    pub id: i32,
    pub flow_code: String,
    pub flow_name: String,
    pub approval_way: ApprovalWay,
    pub assignment_type: AssignmentType,
    pub assigned_user_id: Option<i32>,
    pub is_customizable: bool,
    /// JSON array of role ids allowed to customize; empty or null means
    /// unrestricted. Decode through [`ApprovalFlow::allowed_creator_roles`].
    pub allowed_creator_roles: Option<serde_json::Value>,
    pub is_custom: bool,
    pub created_by: Option<i32>,
    pub base_flow_id: Option<i32>,
    pub custom_status: Option<CustomFlowStatus>,
    pub verified_by: Option<i32>,
    pub verified_at: Option<NaiveDateTime>,
    pub verification_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub description: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

/// Typed view over the custom-flow columns of [`ApprovalFlow`].
#[derive(Debug, Clone, Copy)]
pub struct CustomFlowState {
    pub created_by: i32,
    pub base_flow_id: i32,
    pub status: CustomFlowStatus,
}

impl ApprovalFlow {
    /// Returns the custom-flow state, `None` for master templates.
    /// A custom row missing its owner, base or status is malformed data.
    pub fn custom_state(&self) -> ServiceResult<Option<CustomFlowState>> {
        if !self.is_custom {
            return Ok(None);
        }
        match (self.created_by, self.base_flow_id, self.custom_status) {
            (Some(created_by), Some(base_flow_id), Some(status)) => Ok(Some(CustomFlowState {
                created_by,
                base_flow_id,
                status,
            })),
            _ => Err(ServiceError::validation(
                "custom flow record is missing owner, base flow or status",
            )),
        }
    }

    /// Decodes `allowed_creator_roles` into role ids; empty means anyone.
    pub fn allowed_creator_roles(&self) -> ServiceResult<Vec<i32>> {
        match &self.allowed_creator_roles {
            None => Ok(Vec::new()),
            Some(value) => Ok(serde_json::from_value(value.clone())?),
        }
    }
}

/// One stage of an approval flow, ordered by `step_order`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ApprovalFlowStep {
    pub id: i32,
    pub flow_id: i32,
    pub step_order: i32,
    pub step_name: String,
    pub step_role: StepRole,
    pub role_id: Option<i32>,
    pub branch_id: Option<i32>,
    pub structure: Option<String>,
    pub is_required: bool,
    pub can_skip: bool,
    pub is_visible: bool,
    pub step_type: StepTypeFilter,
    pub category: StepCategoryFilter,
    pub channel: StepChannel,
    /// Auto-approval is configuration only; no process acts on it.
    pub auto_approve: bool,
    /// Timeout is configuration only; no scheduler enforces it.
    pub timeout_hours: Option<i32>,
    pub conditions: Option<serde_json::Value>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A flow template together with its ordered steps.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FlowWithSteps {
    pub flow: ApprovalFlow,
    pub steps: Vec<ApprovalFlowStep>,
}

fn default_true() -> bool {
    true
}

/// Step payload shared by master step creation and custom flow step sets.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StepInput {
    pub step_order: i32,
    pub step_name: String,
    pub step_role: StepRole,
    pub role_id: Option<i32>,
    pub branch_id: Option<i32>,
    pub structure: Option<String>,
    #[serde(default = "default_true")]
    pub is_required: bool,
    #[serde(default)]
    pub can_skip: bool,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub step_type: Option<StepTypeFilter>,
    #[serde(default)]
    pub category: Option<StepCategoryFilter>,
    #[serde(default)]
    pub channel: Option<StepChannel>,
    #[serde(default)]
    pub auto_approve: bool,
    pub timeout_hours: Option<i32>,
    pub conditions: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewFlowStep {
    pub flow_id: i32,
    #[serde(flatten)]
    pub step: StepInput,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateFlowStep {
    pub step_order: Option<i32>,
    pub step_name: Option<String>,
    pub step_role: Option<StepRole>,
    pub role_id: Option<i32>,
    pub branch_id: Option<i32>,
    pub structure: Option<String>,
    pub is_required: Option<bool>,
    pub can_skip: Option<bool>,
    pub is_visible: Option<bool>,
    pub step_type: Option<StepTypeFilter>,
    pub category: Option<StepCategoryFilter>,
    pub channel: Option<StepChannel>,
    pub auto_approve: Option<bool>,
    pub timeout_hours: Option<i32>,
    pub conditions: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewApprovalFlow {
    pub flow_code: String,
    pub flow_name: String,
    pub approval_way: ApprovalWay,
    pub assignment_type: AssignmentType,
    pub assigned_user_id: Option<i32>,
    #[serde(default)]
    pub is_customizable: bool,
    #[serde(default)]
    pub allowed_creator_roles: Vec<i32>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateApprovalFlow {
    pub flow_code: Option<String>,
    pub flow_name: Option<String>,
    pub approval_way: Option<ApprovalWay>,
    pub assignment_type: Option<AssignmentType>,
    pub assigned_user_id: Option<i32>,
    pub is_customizable: Option<bool>,
    pub allowed_creator_roles: Option<Vec<i32>>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewCustomFlow {
    pub base_flow_id: i32,
    pub flow_name: String,
    pub steps: Vec<StepInput>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCustomFlow {
    pub flow_name: String,
    pub steps: Vec<StepInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VerifyAction {
    Approve,
    Reject,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyCustomFlow {
    pub action: VerifyAction,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flow(is_custom: bool) -> ApprovalFlow {
        let now = chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        ApprovalFlow {
            id: 1,
            flow_code: "PROC_STD".to_string(),
            flow_name: "Standard Procurement".to_string(),
            approval_way: ApprovalWay::Sequential,
            assignment_type: AssignmentType::General,
            assigned_user_id: None,
            is_customizable: true,
            allowed_creator_roles: None,
            is_custom,
            created_by: None,
            base_flow_id: None,
            custom_status: None,
            verified_by: None,
            verified_at: None,
            verification_notes: None,
            rejection_reason: None,
            description: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn master_flow_has_no_custom_state() {
        assert!(flow(false).custom_state().unwrap().is_none());
    }

    #[test]
    fn custom_flow_state_requires_all_columns() {
        let mut f = flow(true);
        assert!(f.custom_state().is_err());

        f.created_by = Some(7);
        f.base_flow_id = Some(1);
        f.custom_status = Some(CustomFlowStatus::PendingVerification);
        let state = f.custom_state().unwrap().unwrap();
        assert_eq!(state.created_by, 7);
        assert!(!state.status.is_terminal());
    }

    #[test]
    fn allowed_creator_roles_decodes_and_defaults() {
        let mut f = flow(false);
        assert!(f.allowed_creator_roles().unwrap().is_empty());

        f.allowed_creator_roles = Some(json!([3, 5]));
        assert_eq!(f.allowed_creator_roles().unwrap(), vec![3, 5]);

        f.allowed_creator_roles = Some(json!("not-a-list"));
        assert!(f.allowed_creator_roles().is_err());
    }

    #[test]
    fn step_input_defaults() {
        let step: StepInput = serde_json::from_value(json!({
            "step_order": 1,
            "step_name": "Reviewer",
            "step_role": "reviewer"
        }))
        .unwrap();
        assert!(step.is_required);
        assert!(step.is_visible);
        assert!(!step.can_skip);
        assert!(!step.auto_approve);
        assert!(step.step_type.is_none());
    }
}
