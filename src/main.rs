// src/main.rs

use std::env;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use reliefnet_api::{build_router, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Initialize DB pool and bring the schema up to date
    let pool = db::connect().await?;
    db::MIGRATOR.run(&pool).await?;
    let state = AppState { pool };

    let api = build_router(state);

    // Port (axum 0.7 style)
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080); // default 8080

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;

    println!("✅ PORT={}, using {}", port, addr);
    println!("🚀 API listening on http://127.0.0.1:{port}");

    axum::serve(listener, api.into_make_service()).await?;
    Ok(())
}
