// src/db/mod.rs

use std::env;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

/// Embedded schema migrations, applied at startup (and by the test suite).
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

pub async fn connect() -> anyhow::Result<Pool<Postgres>> {
    let database_url =
        env::var("DATABASE_URL").expect("❌ DATABASE_URL must be set in your .env file");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        // Store calls are bounded; a timed-out call is failed-not-applied.
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await?;

    println!("✅ Connected to PostgreSQL");
    Ok(pool)
}
