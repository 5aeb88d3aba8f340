// src/routes/weather.rs
//
// Thin proxy over the external weather service. No caching, no aggregation;
// upstream failures surface as 502s.

use axum::{extract::Query, Json};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

#[derive(Deserialize)]
pub struct WeatherQ {
    pub city: String,
}

pub async fn current_weather(Query(q): Query<WeatherQ>) -> ApiResult<Json<serde_json::Value>> {
    if q.city.trim().is_empty() {
        return Err(ApiError::Validation("city must not be empty".into()));
    }

    let base =
        std::env::var("WEATHER_API_BASE").unwrap_or_else(|_| "https://wttr.in".into());
    let url = format!("{}/{}?format=j1", base.trim_end_matches('/'), q.city.trim());

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .map_err(|e| ApiError::Upstream(format!("client build error: {e}")))?;

    let payload: serde_json::Value = client
        .get(&url)
        .send()
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?
        .error_for_status()
        .map_err(|e| ApiError::Upstream(e.to_string()))?
        .json()
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    Ok(Json(payload))
}
