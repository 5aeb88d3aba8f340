// src/routes/resources.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{query, query_as, PgPool};
use uuid::Uuid;

use crate::auth::{AdminContext, CitizenContext};
use crate::error::{ApiError, ApiResult};
use crate::inventory::{self, validate_counts};
use crate::models::{PriorityLevel, Resource, ResourceCategory};
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateResourceBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: ResourceCategory,
    #[serde(default = "default_priority")]
    pub priority: PriorityLevel,
    pub total: i32,
    pub available: i32,
    #[serde(default = "default_threshold")]
    pub min_threshold: i32,
    // Accepted and ignored: the record's city is always the admin's city.
    #[serde(default)]
    pub city: Option<String>,
}
fn default_priority() -> PriorityLevel {
    PriorityLevel::Medium
}
fn default_threshold() -> i32 {
    5
}

#[derive(Deserialize)]
pub struct UpdateResourceBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<ResourceCategory>,
    pub priority: Option<PriorityLevel>,
    pub total: Option<i32>,
    pub available: Option<i32>,
    pub min_threshold: Option<i32>,
}

#[derive(Deserialize)]
pub struct ListResourcesQ {
    pub category: Option<ResourceCategory>,
    pub priority: Option<PriorityLevel>,
    /// Only resources with available > 0.
    pub available: Option<bool>,
    /// Only resources at or below their minimum threshold.
    pub low_stock: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct AddStockBody {
    pub amount: i32,
}

#[derive(Serialize)]
pub struct Deleted {
    pub deleted: bool,
}

const COLUMNS: &str = "resource_id, name, description, category, priority, city, \
     total, available, min_threshold, created_by, created_at, last_updated";

async fn list_in_city(pool: &PgPool, city: &str, q: ListResourcesQ) -> ApiResult<Vec<Resource>> {
    let limit = q.limit.unwrap_or(50).clamp(1, 500);
    let offset = q.offset.unwrap_or(0).max(0);

    let sql = format!(
        r#"
        SELECT {COLUMNS} FROM resources
        WHERE city = $1
          AND ($2::resource_category IS NULL OR category = $2)
          AND ($3::priority_level IS NULL OR priority = $3)
          AND (NOT $4 OR available > 0)
          AND (NOT $5 OR available <= min_threshold)
        ORDER BY name ASC, created_at ASC
        LIMIT $6 OFFSET $7
        "#
    );
    let rows = query_as::<_, Resource>(&sql)
        .bind(city)
        .bind(q.category)
        .bind(q.priority)
        .bind(q.available.unwrap_or(false))
        .bind(q.low_stock.unwrap_or(false))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin handlers (all scoped to the admin's home city)
// ─────────────────────────────────────────────────────────────────────────────

pub async fn create_resource(
    State(state): State<AppState>,
    admin: AdminContext,
    Json(b): Json<CreateResourceBody>,
) -> ApiResult<Json<Resource>> {
    if b.name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be empty".into()));
    }
    validate_counts(b.total, b.available)?;
    if b.min_threshold < 0 {
        return Err(ApiError::Validation("min_threshold must be >= 0".into()));
    }

    let sql = format!(
        r#"
        INSERT INTO resources
            (resource_id, name, description, category, priority, city,
             total, available, min_threshold, created_by)
        VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
        RETURNING {COLUMNS}
        "#
    );
    let row = query_as::<_, Resource>(&sql)
        .bind(Uuid::new_v4())
        .bind(b.name.trim())
        .bind(&b.description)
        .bind(b.category)
        .bind(b.priority)
        .bind(&admin.city)
        .bind(b.total)
        .bind(b.available)
        .bind(b.min_threshold)
        .bind(admin.admin_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(Json(row))
}

pub async fn list_resources(
    State(state): State<AppState>,
    admin: AdminContext,
    Query(q): Query<ListResourcesQ>,
) -> ApiResult<Json<Vec<Resource>>> {
    Ok(Json(list_in_city(&state.pool, &admin.city, q).await?))
}

pub async fn get_resource(
    State(state): State<AppState>,
    admin: AdminContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Resource>> {
    let sql = format!(r#"SELECT {COLUMNS} FROM resources WHERE resource_id = $1 AND city = $2"#);
    let row = query_as::<_, Resource>(&sql)
        .bind(id)
        .bind(&admin.city)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(ApiError::NotFound("resource"))?;
    Ok(Json(row))
}

pub async fn update_resource(
    State(state): State<AppState>,
    admin: AdminContext,
    Path(id): Path<Uuid>,
    Json(b): Json<UpdateResourceBody>,
) -> ApiResult<Json<Resource>> {
    if let Some(name) = &b.name {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("name must not be empty".into()));
        }
    }
    // Counts are an explicit reset: both or neither, validated as a pair so
    // the invariant is checked against the values actually written.
    match (b.total, b.available) {
        (Some(total), Some(available)) => validate_counts(total, available)?,
        (None, None) => {}
        _ => {
            return Err(ApiError::Validation(
                "total and available must be updated together".into(),
            ))
        }
    }
    if let Some(t) = b.min_threshold {
        if t < 0 {
            return Err(ApiError::Validation("min_threshold must be >= 0".into()));
        }
    }

    let sql = format!(
        r#"
        UPDATE resources SET
            name          = COALESCE($3, name),
            description   = COALESCE($4, description),
            category      = COALESCE($5, category),
            priority      = COALESCE($6, priority),
            total         = COALESCE($7, total),
            available     = COALESCE($8, available),
            min_threshold = COALESCE($9, min_threshold),
            last_updated  = now()
        WHERE resource_id = $1 AND city = $2
        RETURNING {COLUMNS}
        "#
    );
    let row = query_as::<_, Resource>(&sql)
        .bind(id)
        .bind(&admin.city)
        .bind(b.name.map(|n| n.trim().to_string()))
        .bind(b.description)
        .bind(b.category)
        .bind(b.priority)
        .bind(b.total)
        .bind(b.available)
        .bind(b.min_threshold)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(ApiError::NotFound("resource"))?;
    Ok(Json(row))
}

pub async fn delete_resource(
    State(state): State<AppState>,
    admin: AdminContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Deleted>> {
    let res = query(r#"DELETE FROM resources WHERE resource_id = $1 AND city = $2"#)
        .bind(id)
        .bind(&admin.city)
        .execute(&state.pool)
        .await?;
    if res.rows_affected() == 0 {
        return Err(ApiError::NotFound("resource"));
    }
    Ok(Json(Deleted { deleted: true }))
}

pub async fn add_stock(
    State(state): State<AppState>,
    admin: AdminContext,
    Path(id): Path<Uuid>,
    Json(b): Json<AddStockBody>,
) -> ApiResult<Json<Resource>> {
    let row = inventory::add_stock(&state.pool, &admin.city, id, b.amount).await?;
    Ok(Json(row))
}

// ─────────────────────────────────────────────────────────────────────────────
// Citizen projection
// ─────────────────────────────────────────────────────────────────────────────

pub async fn list_city_resources(
    State(state): State<AppState>,
    citizen: CitizenContext,
    Query(q): Query<ListResourcesQ>,
) -> ApiResult<Json<Vec<Resource>>> {
    let city = citizen.resolved_city()?.to_string();
    Ok(Json(list_in_city(&state.pool, &city, q).await?))
}
