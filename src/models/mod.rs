// src/models/mod.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ───────────────────────────────────────
// Closed enumerations
// ───────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "resource_category", rename_all = "lowercase")]
pub enum ResourceCategory {
    Medical,
    Food,
    Shelter,
    Rescue,
    Communication,
    Transportation,
    Tools,
    Energy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "priority_level", rename_all = "lowercase")]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Fulfilled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Fulfilled => "fulfilled",
        }
    }

    /// `rejected` and `fulfilled` admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Rejected | RequestStatus::Fulfilled)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "notification_kind", rename_all = "lowercase")]
pub enum NotificationKind {
    Approval,
    Fulfillment,
}

// ───────────────────────────────────────
// Identities
// ───────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Admin {
    pub admin_id: Uuid,
    pub full_name: String,
    pub city: String,
    #[serde(skip_serializing)]
    pub api_token_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Citizen {
    pub citizen_id: Uuid,
    pub full_name: String,
    pub contact_number: String,
    pub city: String,
    #[serde(skip_serializing)]
    pub api_token_hash: String,
    pub created_at: DateTime<Utc>,
}

// ───────────────────────────────────────
// Relief catalog & requests
// ───────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Resource {
    pub resource_id: Uuid,
    pub name: String,
    pub description: String,
    pub category: ResourceCategory,
    pub priority: PriorityLevel,
    pub city: String,
    pub total: i32,
    pub available: i32,
    pub min_threshold: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct ResourceRequest {
    pub request_id: Uuid,
    pub resource_id: Uuid,
    pub resource_name: String,
    pub quantity: i32,
    pub citizen_id: Uuid,
    pub citizen_name: String,
    pub contact_number: String,
    pub city: String,
    pub status: RequestStatus,
    pub priority: PriorityLevel,
    pub urgency_note: Option<String>,
    pub delivery_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub notification_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub resource_id: Uuid,
    pub request_id: Uuid,
    pub city: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
