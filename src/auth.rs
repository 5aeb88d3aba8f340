// src/auth.rs
//
// City-scoped access guard. Resolves the caller's identity and home city
// once per request from the bearer token; handlers receive the resolved
// context explicitly and thread it into every store call.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Admin, Citizen};
use crate::AppState;

/// Sentinel used by provisioning flows for an admin without a home city.
const CITY_UNSET: &str = "unset";

#[derive(Debug, Clone)]
pub struct AdminContext {
    pub admin_id: Uuid,
    pub full_name: String,
    pub city: String,
}

#[derive(Debug, Clone)]
pub struct CitizenContext {
    pub citizen_id: Uuid,
    pub full_name: String,
    pub contact_number: String,
    pub city: String,
}

impl CitizenContext {
    /// A citizen without a resolvable city cannot target any resource.
    pub fn resolved_city(&self) -> Result<&str, ApiError> {
        if city_provisioned(&self.city) {
            Ok(&self.city)
        } else {
            Err(ApiError::Validation("citizen city is not set".into()))
        }
    }
}

pub fn city_provisioned(city: &str) -> bool {
    !city.trim().is_empty() && city != CITY_UNSET
}

/// SHA-256 of the raw token, lowercase hex. Only hashes are stored.
pub fn token_hash(token: &str) -> String {
    Sha256::digest(token.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))
}

#[async_trait]
impl FromRequestParts<AppState> for AdminContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let hash = token_hash(bearer_token(parts)?);
        let admin: Admin = sqlx::query_as(
            r#"SELECT admin_id, full_name, city, api_token_hash, created_at
               FROM admins WHERE api_token_hash = $1"#,
        )
        .bind(&hash)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("unknown admin token".into()))?;

        // An admin without a home city is not provisioned; every mutating
        // call fails closed before any store access happens.
        if !city_provisioned(&admin.city) {
            return Err(ApiError::Unauthorized("admin city is not provisioned".into()));
        }

        Ok(AdminContext {
            admin_id: admin.admin_id,
            full_name: admin.full_name,
            city: admin.city,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CitizenContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let hash = token_hash(bearer_token(parts)?);
        let citizen: Citizen = sqlx::query_as(
            r#"SELECT citizen_id, full_name, contact_number, city, api_token_hash, created_at
               FROM citizens WHERE api_token_hash = $1"#,
        )
        .bind(&hash)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("unknown citizen token".into()))?;

        Ok(CitizenContext {
            citizen_id: citizen.citizen_id,
            full_name: citizen.full_name,
            contact_number: citizen.contact_number,
            city: citizen.city,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hash_is_stable_hex() {
        let h = token_hash("secret-token");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(h, token_hash("secret-token"));
        assert_ne!(h, token_hash("other-token"));
    }

    #[test]
    fn unset_city_fails_closed() {
        assert!(!city_provisioned(""));
        assert!(!city_provisioned("   "));
        assert!(!city_provisioned("unset"));
        assert!(city_provisioned("Chiang Mai"));
    }
}
