// src/routes/notifications.rs
//
// Citizen-facing notification reads. The engine only ever inserts these;
// the read flag belongs to this surface.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use sqlx::query_as;
use uuid::Uuid;

use crate::auth::CitizenContext;
use crate::error::{ApiError, ApiResult};
use crate::models::Notification;
use crate::AppState;

#[derive(Deserialize)]
pub struct ListNotificationsQ {
    pub unread: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const COLUMNS: &str = "notification_id, user_id, title, message, kind, resource_id, \
     request_id, city, is_read, created_at";

pub async fn list_notifications(
    State(state): State<AppState>,
    citizen: CitizenContext,
    Query(q): Query<ListNotificationsQ>,
) -> ApiResult<Json<Vec<Notification>>> {
    let limit = q.limit.unwrap_or(50).clamp(1, 500);
    let offset = q.offset.unwrap_or(0).max(0);

    let sql = format!(
        r#"
        SELECT {COLUMNS} FROM notifications
        WHERE user_id = $1
          AND (NOT $2 OR is_read = FALSE)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#
    );
    let rows = query_as::<_, Notification>(&sql)
        .bind(citizen.citizen_id)
        .bind(q.unread.unwrap_or(false))
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(rows))
}

pub async fn mark_read(
    State(state): State<AppState>,
    citizen: CitizenContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Notification>> {
    let sql = format!(
        r#"
        UPDATE notifications SET is_read = TRUE
        WHERE notification_id = $1 AND user_id = $2
        RETURNING {COLUMNS}
        "#
    );
    let row = query_as::<_, Notification>(&sql)
        .bind(id)
        .bind(citizen.citizen_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(ApiError::NotFound("notification"))?;
    Ok(Json(row))
}
