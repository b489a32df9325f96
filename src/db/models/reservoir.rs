use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Lifecycle of an issued transaction number.
/// `delayed` = reserved, `used` = submitted, `expired` = cancelled/replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "reservoir_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReservoirStatus {
    Delayed,
    Used,
    Expired,
}

/// An issued transaction number, scoped by type, branch and period.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservoir {
    pub id: i32,
    pub transaction_number: String,
    pub branch_code: String,
    pub transaction_type: String,
    pub period_month: i32,
    pub period_year: i32,
    pub status: ReservoirStatus,
    pub branch_id: Option<i32>,
    pub user_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateNumberRequest {
    pub transaction_type: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GeneratedNumber {
    pub transaction_number: String,
    pub branch_code: String,
    pub branch_name: String,
    pub transaction_type: String,
    pub status: ReservoirStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkNumberRequest {
    pub transaction_number: String,
}

/// Generated numbers contain `/` separators, so lookups use a query
/// parameter rather than a path segment.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NumberStatusParams {
    pub transaction_number: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NumberStatusResponse {
    pub transaction_number: String,
    pub status: ReservoirStatus,
}
