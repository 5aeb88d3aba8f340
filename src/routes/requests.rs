// src/routes/requests.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use sqlx::query_as;
use uuid::Uuid;

use crate::auth::{AdminContext, CitizenContext};
use crate::error::{ApiError, ApiResult};
use crate::lifecycle::{self, DecisionOutcome, RequestAction};
use crate::models::{RequestStatus, Resource, ResourceRequest};
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateRequestBody {
    pub resource_id: Uuid,
    pub quantity: i32,
    pub urgency_note: Option<String>,
    pub delivery_address: Option<String>,
}

#[derive(Deserialize)]
pub struct ListRequestsQ {
    pub status: Option<RequestStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct DecisionBody {
    pub action: RequestAction,
}

const COLUMNS: &str = "request_id, resource_id, resource_name, quantity, citizen_id, \
     citizen_name, contact_number, city, status, priority, urgency_note, \
     delivery_address, created_at, processed_at, processed_by";

// ─────────────────────────────────────────────────────────────────────────────
// Citizen handlers
// ─────────────────────────────────────────────────────────────────────────────

pub async fn create_request(
    State(state): State<AppState>,
    citizen: CitizenContext,
    Json(b): Json<CreateRequestBody>,
) -> ApiResult<Json<ResourceRequest>> {
    if b.quantity <= 0 {
        return Err(ApiError::Validation("quantity must be positive".into()));
    }
    let city = citizen.resolved_city()?.to_string();

    // The target must live in the requester's city; name and priority are
    // denormalized from it for display.
    let resource = query_as::<_, Resource>(
        r#"SELECT resource_id, name, description, category, priority, city,
                  total, available, min_threshold, created_by, created_at, last_updated
           FROM resources WHERE resource_id = $1 AND city = $2"#,
    )
    .bind(b.resource_id)
    .bind(&city)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(ApiError::NotFound("resource"))?;

    let sql = format!(
        r#"
        INSERT INTO requests
            (request_id, resource_id, resource_name, quantity, citizen_id,
             citizen_name, contact_number, city, status, priority,
             urgency_note, delivery_address)
        VALUES ($1,$2,$3,$4,$5,$6,$7,$8,'pending',$9,$10,$11)
        RETURNING {COLUMNS}
        "#
    );
    let row = query_as::<_, ResourceRequest>(&sql)
        .bind(Uuid::new_v4())
        .bind(resource.resource_id)
        .bind(&resource.name)
        .bind(b.quantity)
        .bind(citizen.citizen_id)
        .bind(&citizen.full_name)
        .bind(&citizen.contact_number)
        .bind(&city)
        .bind(resource.priority)
        .bind(b.urgency_note)
        .bind(b.delivery_address)
        .fetch_one(&state.pool)
        .await?;
    Ok(Json(row))
}

pub async fn list_my_requests(
    State(state): State<AppState>,
    citizen: CitizenContext,
    Query(q): Query<ListRequestsQ>,
) -> ApiResult<Json<Vec<ResourceRequest>>> {
    let limit = q.limit.unwrap_or(50).clamp(1, 500);
    let offset = q.offset.unwrap_or(0).max(0);

    let sql = format!(
        r#"
        SELECT {COLUMNS} FROM requests
        WHERE citizen_id = $1
          AND ($2::request_status IS NULL OR status = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#
    );
    let rows = query_as::<_, ResourceRequest>(&sql)
        .bind(citizen.citizen_id)
        .bind(q.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(rows))
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin handlers
// ─────────────────────────────────────────────────────────────────────────────

pub async fn list_city_requests(
    State(state): State<AppState>,
    admin: AdminContext,
    Query(q): Query<ListRequestsQ>,
) -> ApiResult<Json<Vec<ResourceRequest>>> {
    let limit = q.limit.unwrap_or(50).clamp(1, 500);
    let offset = q.offset.unwrap_or(0).max(0);

    let sql = format!(
        r#"
        SELECT {COLUMNS} FROM requests
        WHERE city = $1
          AND ($2::request_status IS NULL OR status = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#
    );
    let rows = query_as::<_, ResourceRequest>(&sql)
        .bind(&admin.city)
        .bind(q.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(rows))
}

pub async fn decide_request(
    State(state): State<AppState>,
    admin: AdminContext,
    Path(id): Path<Uuid>,
    Json(b): Json<DecisionBody>,
) -> ApiResult<Json<DecisionOutcome>> {
    let outcome = lifecycle::decide(&state.pool, &admin, id, b.action).await?;
    Ok(Json(outcome))
}
