use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use utoipa::OpenApi;

use crate::db::models::reservoir::{
    GenerateNumberRequest, GeneratedNumber, MarkNumberRequest, NumberStatusParams,
    NumberStatusResponse, Reservoir, ReservoirStatus,
};
use crate::db::queries::homebase::active_homebase;
use crate::middleware::auth::Claims;
use crate::utils::api_response::ApiResponse;
use crate::utils::error::{is_unique_violation, ServiceError, ServiceResult};

// Transaction type constants
pub const TX_PROCUREMENT: &str = "procurement"; // -IO
pub const TX_DISPOSAL: &str = "disposal"; // -DPSL
pub const TX_MUTATION: &str = "mutation"; // -MTI
pub const TX_STOCK_OPNAME: &str = "stock_opname"; // -OPNM

/// Number suffix for a transaction type; unknown types fall back to TRX.
pub fn transaction_suffix(transaction_type: &str) -> &'static str {
    match transaction_type {
        TX_PROCUREMENT => "IO",
        TX_DISPOSAL => "DPSL",
        TX_MUTATION => "MTI",
        TX_STOCK_OPNAME => "OPNM",
        _ => "TRX",
    }
}

/// Roman numeral for a calendar month (1-12).
pub fn roman_month(month: u32) -> &'static str {
    const ROMANS: [&str; 12] = [
        "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII",
    ];
    if !(1..=12).contains(&month) {
        return "I";
    }
    ROMANS[(month - 1) as usize]
}

/// Format: `{sequence}/{branch_code}/{branch_name}/{roman_month}/{year}-{suffix}`
/// Example: `0001/C00001/HO Jakarta/I/2025-IO`
pub fn format_transaction_number(
    sequence: i32,
    branch_code: &str,
    branch_name: &str,
    month: u32,
    year: i32,
    transaction_type: &str,
) -> String {
    format!(
        "{:04}/{}/{}/{}/{}-{}",
        sequence,
        branch_code,
        branch_name,
        roman_month(month),
        year,
        transaction_suffix(transaction_type)
    )
}

/// Advance and return the sequence for a (type, branch, month, year) scope.
/// The upsert-increment serializes concurrent issuers on the scope row, so
/// numbers never collide; a read-max-then-insert would.
pub async fn next_sequence(
    tx: &mut Transaction<'_, Postgres>,
    transaction_type: &str,
    branch_code: &str,
    month: u32,
    year: i32,
) -> ServiceResult<i32> {
    let seq: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO reservoir_sequences (transaction_type, branch_code, period_month, period_year, last_seq)
        VALUES ($1, $2, $3, $4, 1)
        ON CONFLICT (transaction_type, branch_code, period_month, period_year)
        DO UPDATE SET last_seq = reservoir_sequences.last_seq + 1
        RETURNING last_seq
        "#,
    )
    .bind(transaction_type)
    .bind(branch_code)
    .bind(month as i32)
    .bind(year)
    .fetch_one(&mut **tx)
    .await?;
    Ok(seq)
}

/// Flip a reservoir entry to `used` inside an open transaction.
/// Conditioned on the row not already being used, so a fresh number marks
/// used exactly once even under concurrent submitters.
pub async fn mark_used_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    transaction_number: &str,
) -> ServiceResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE reservoirs SET status = 'used', updated_at = NOW()
        WHERE transaction_number = $1 AND status <> 'used'
        "#,
    )
    .bind(transaction_number)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM reservoirs WHERE transaction_number = $1)")
                .bind(transaction_number)
                .fetch_one(&mut **tx)
                .await?;
        if exists {
            return Err(ServiceError::conflict("Transaction number already used"));
        }
        return Err(ServiceError::not_found(
            "Transaction number not found in reservoir",
        ));
    }

    Ok(())
}

//
// HANDLERS
//

#[utoipa::path(
    post,
    path = "/transaction-number/generate",
    request_body = GenerateNumberRequest,
    responses(
        (status = 201, description = "Transaction number generated successfully", body = GeneratedNumber),
        (status = 404, description = "User does not have an active homebase branch")
    ),
    tag = "Transaction Numbers",
    security(("bearerAuth" = []))
)]
pub async fn generate_transaction_number(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<GenerateNumberRequest>,
) -> Result<ApiResponse<GeneratedNumber>, ApiResponse<()>> {
    let user_id = claims.user_id()?;

    let (user_branch, branch) = active_homebase(&pool, user_id)
        .await
        .map_err(ApiResponse::from)?;

    let now = Utc::now();
    let month = now.month();
    let year = now.year();

    // Sequence bump and reservoir insert commit together; an abandoned
    // sequence value just leaves a gap, never a duplicate.
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    let sequence = next_sequence(&mut tx, &payload.transaction_type, &branch.branch_code, month, year)
        .await
        .map_err(ApiResponse::from)?;

    let transaction_number = format_transaction_number(
        sequence,
        &branch.branch_code,
        &branch.branch_name,
        month,
        year,
        &payload.transaction_type,
    );

    sqlx::query(
        r#"
        INSERT INTO reservoirs
            (transaction_number, branch_code, transaction_type, period_month, period_year,
             status, branch_id, user_id)
        VALUES ($1, $2, $3, $4, $5, 'delayed', $6, $7)
        "#,
    )
    .bind(&transaction_number)
    .bind(&branch.branch_code)
    .bind(&payload.transaction_type)
    .bind(month as i32)
    .bind(year)
    .bind(user_branch.branch_id)
    .bind(user_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiResponse::from(ServiceError::conflict("Transaction number already issued"))
        } else {
            ApiResponse::from(ServiceError::from(e))
        }
    })?;

    tx.commit()
        .await
        .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    tracing::info!(user_id, %transaction_number, "transaction number issued");

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Transaction number generated successfully",
        GeneratedNumber {
            transaction_number,
            branch_code: branch.branch_code,
            branch_name: branch.branch_name,
            transaction_type: payload.transaction_type,
            status: ReservoirStatus::Delayed,
        },
    ))
}

#[utoipa::path(
    post,
    path = "/transaction-number/mark-used",
    request_body = MarkNumberRequest,
    responses(
        (status = 200, description = "Transaction marked as used"),
        (status = 404, description = "Transaction number not found in reservoir"),
        (status = 409, description = "Transaction number already used")
    ),
    tag = "Transaction Numbers",
    security(("bearerAuth" = []))
)]
pub async fn mark_transaction_used(
    State(pool): State<PgPool>,
    Json(payload): Json<MarkNumberRequest>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    mark_used_in_tx(&mut tx, &payload.transaction_number)
        .await
        .map_err(ApiResponse::from)?;

    tx.commit()
        .await
        .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Transaction marked as used",
        (),
    ))
}

#[utoipa::path(
    post,
    path = "/transaction-number/mark-expired",
    request_body = MarkNumberRequest,
    responses(
        (status = 200, description = "Transaction marked as expired"),
        (status = 404, description = "Transaction number not found in reservoir"),
        (status = 409, description = "Transaction number already expired")
    ),
    tag = "Transaction Numbers",
    security(("bearerAuth" = []))
)]
pub async fn mark_transaction_expired(
    State(pool): State<PgPool>,
    Json(payload): Json<MarkNumberRequest>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    // Expiry is reachable from both delayed and used entries; only an entry
    // already expired conflicts.
    let result = sqlx::query(
        r#"
        UPDATE reservoirs SET status = 'expired', updated_at = NOW()
        WHERE transaction_number = $1 AND status <> 'expired'
        "#,
    )
    .bind(&payload.transaction_number)
    .execute(&pool)
    .await
    .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;

    if result.rows_affected() == 0 {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM reservoirs WHERE transaction_number = $1)")
                .bind(&payload.transaction_number)
                .fetch_one(&pool)
                .await
                .map_err(|e| ApiResponse::from(ServiceError::from(e)))?;
        if exists {
            return Err(ApiResponse::from(ServiceError::conflict(
                "Transaction number already expired",
            )));
        }
        return Err(ApiResponse::from(ServiceError::not_found(
            "Transaction number not found in reservoir",
        )));
    }

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Transaction marked as expired",
        (),
    ))
}

#[utoipa::path(
    get,
    path = "/transaction-number/status",
    params(NumberStatusParams),
    responses(
        (status = 200, description = "Transaction status retrieved successfully", body = NumberStatusResponse),
        (status = 404, description = "Transaction number not found")
    ),
    tag = "Transaction Numbers",
    security(("bearerAuth" = []))
)]
pub async fn get_transaction_status(
    State(pool): State<PgPool>,
    Query(params): Query<NumberStatusParams>,
) -> Result<ApiResponse<NumberStatusResponse>, ApiResponse<()>> {
    let reservoir = sqlx::query_as::<_, Reservoir>(
        "SELECT * FROM reservoirs WHERE transaction_number = $1",
    )
    .bind(&params.transaction_number)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiResponse::from(ServiceError::from(e)))?
    .ok_or_else(|| ApiResponse::from(ServiceError::not_found("Transaction number not found")))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Transaction status retrieved successfully",
        NumberStatusResponse {
            transaction_number: reservoir.transaction_number,
            status: reservoir.status,
        },
    ))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        generate_transaction_number,
        mark_transaction_used,
        mark_transaction_expired,
        get_transaction_status
    ),
    components(schemas(
        GenerateNumberRequest,
        GeneratedNumber,
        MarkNumberRequest,
        NumberStatusResponse,
        Reservoir,
        ReservoirStatus
    )),
    tags(
        (name = "Transaction Numbers", description = "Transaction number reservoir")
    )
)]
pub struct ReservoirDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_by_transaction_type() {
        assert_eq!(transaction_suffix(TX_PROCUREMENT), "IO");
        assert_eq!(transaction_suffix(TX_DISPOSAL), "DPSL");
        assert_eq!(transaction_suffix(TX_MUTATION), "MTI");
        assert_eq!(transaction_suffix(TX_STOCK_OPNAME), "OPNM");
        assert_eq!(transaction_suffix("purchase_request"), "TRX");
    }

    #[test]
    fn roman_months() {
        assert_eq!(roman_month(1), "I");
        assert_eq!(roman_month(9), "IX");
        assert_eq!(roman_month(12), "XII");
        // Out-of-range input falls back to January.
        assert_eq!(roman_month(0), "I");
        assert_eq!(roman_month(13), "I");
    }

    #[test]
    fn number_format_matches_convention() {
        let number =
            format_transaction_number(1, "C00001", "HO Jakarta", 1, 2025, TX_PROCUREMENT);
        assert_eq!(number, "0001/C00001/HO Jakarta/I/2025-IO");
    }

    #[test]
    fn sequence_padding_and_suffix_fallback() {
        let number = format_transaction_number(123, "B00002", "Surabaya", 11, 2024, "transfer");
        assert_eq!(number, "0123/B00002/Surabaya/XI/2024-TRX");
    }
}
