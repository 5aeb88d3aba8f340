// src/lib.rs

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::{Pool, Postgres};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod auth;
pub mod db;
pub mod error;
pub mod inventory;
pub mod lifecycle;
pub mod models;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub pool: Pool<Postgres>,
}

pub fn build_router(state: AppState) -> Router {
    // Very permissive CORS for local dev (tighten for prod)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // health
        .route("/health", get(routes::health::health))
        // citizen surface
        .route(
            "/api/v1/resources",
            get(routes::resources::list_city_resources),
        )
        .route(
            "/api/v1/requests",
            post(routes::requests::create_request).get(routes::requests::list_my_requests),
        )
        .route(
            "/api/v1/notifications",
            get(routes::notifications::list_notifications),
        )
        .route(
            "/api/v1/notifications/:id/read",
            post(routes::notifications::mark_read),
        )
        .route("/api/v1/weather", get(routes::weather::current_weather))
        // admin console (every call scoped to the admin's home city)
        .route(
            "/api/v1/admin/resources",
            post(routes::resources::create_resource).get(routes::resources::list_resources),
        )
        .route(
            "/api/v1/admin/resources/:id",
            get(routes::resources::get_resource)
                .patch(routes::resources::update_resource)
                .delete(routes::resources::delete_resource),
        )
        .route(
            "/api/v1/admin/resources/:id/stock",
            post(routes::resources::add_stock),
        )
        .route(
            "/api/v1/admin/requests",
            get(routes::requests::list_city_requests),
        )
        .route(
            "/api/v1/admin/requests/:id/decision",
            post(routes::requests::decide_request),
        )
        // state & middleware
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
