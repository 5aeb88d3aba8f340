// src/inventory.rs
//
// Inventory accounting engine: the only code path that ever decreases
// `available`. All count mutations are single conditional UPDATE statements,
// so the check-and-write is atomic in the store and two concurrent reserves
// against the same resource can never both pass the check on a stale read.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::Resource;

const RESOURCE_COLUMNS: &str = "resource_id, name, description, category, priority, city, \
     total, available, min_threshold, created_by, created_at, last_updated";

/// Invariant check for an absolute total/available pair: 0 <= available <= total.
pub fn validate_counts(total: i32, available: i32) -> Result<(), ApiError> {
    if total < 0 {
        return Err(ApiError::Validation("total must be >= 0".into()));
    }
    if available < 0 {
        return Err(ApiError::Validation("available must be >= 0".into()));
    }
    if available > total {
        return Err(ApiError::Validation("available cannot exceed total".into()));
    }
    Ok(())
}

pub fn validate_amount(amount: i32) -> Result<(), ApiError> {
    if amount <= 0 {
        return Err(ApiError::Validation("amount must be positive".into()));
    }
    Ok(())
}

/// Debits `quantity` units of a resource, or refuses without writing.
///
/// Not idempotent: replaying the same logical decision is prevented by the
/// request lifecycle's status guard, not here. Runs on a plain connection so
/// the lifecycle can call it inside its transaction.
pub async fn reserve(
    conn: &mut PgConnection,
    city: &str,
    resource_id: Uuid,
    quantity: i32,
) -> ApiResult<Resource> {
    validate_amount(quantity)?;

    let sql = format!(
        r#"
        UPDATE resources
           SET available = available - $3,
               last_updated = now()
         WHERE resource_id = $1 AND city = $2 AND available >= $3
        RETURNING {RESOURCE_COLUMNS}
        "#
    );
    let updated = sqlx::query_as::<_, Resource>(&sql)
        .bind(resource_id)
        .bind(city)
        .bind(quantity)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(resource) = updated {
        return Ok(resource);
    }

    // Zero rows: either the resource is not visible in this city, or the
    // stock check refused the debit. Look again to tell the two apart.
    let present: Option<(i32,)> =
        sqlx::query_as(r#"SELECT available FROM resources WHERE resource_id = $1 AND city = $2"#)
            .bind(resource_id)
            .bind(city)
            .fetch_optional(&mut *conn)
            .await?;

    match present {
        Some(_) => Err(ApiError::InsufficientStock),
        None => Err(ApiError::NotFound("resource")),
    }
}

/// Adds `amount` units of stock: total and available both grow by the same
/// amount in one statement, so this can never violate the catalog invariant
/// and commutes with concurrent reserves.
pub async fn add_stock(
    pool: &PgPool,
    city: &str,
    resource_id: Uuid,
    amount: i32,
) -> ApiResult<Resource> {
    validate_amount(amount)?;

    let sql = format!(
        r#"
        UPDATE resources
           SET total = total + $3,
               available = available + $3,
               last_updated = now()
         WHERE resource_id = $1 AND city = $2
        RETURNING {RESOURCE_COLUMNS}
        "#
    );
    sqlx::query_as::<_, Resource>(&sql)
        .bind(resource_id)
        .bind(city)
        .bind(amount)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound("resource"))
}
