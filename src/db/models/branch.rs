use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "branch_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BranchStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Branch {
    pub id: i32,
    pub branch_code: String,
    pub branch_name: String,
    pub status: BranchStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Kind of user-to-branch assignment. A user's active `homebase` scopes the
/// transaction numbers issued for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "branch_assignment", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BranchAssignment {
    Homebase,
    Temporary,
    Assignment,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserBranch {
    pub id: i32,
    pub user_id: i32,
    pub branch_id: i32,
    pub branch_type: BranchAssignment,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A homebase assignment together with its branch detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HomebaseBranch {
    pub user_branch: UserBranch,
    pub branch: Branch,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetActiveHomebaseRequest {
    pub branch_id: i32,
}
