//! HTTP-surface tests: the access guard, city forcing, validation, and the
//! decision endpoint, driven through a real router on a loopback listener.
//! Skipped when DATABASE_URL is not set.

use reliefnet_api::auth::token_hash;
use reliefnet_api::db::MIGRATOR;
use reliefnet_api::{build_router, AppState};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

async fn test_pool() -> Option<PgPool> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("skipping: DATABASE_URL not set");
            return None;
        }
    };
    let pool = match PgPoolOptions::new().max_connections(5).connect(&url).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("skipping: cannot connect to DATABASE_URL: {e}");
            return None;
        }
    };
    MIGRATOR.run(&pool).await.expect("run migrations");
    Some(pool)
}

async fn spawn_app(pool: PgPool) -> String {
    let app = build_router(AppState { pool });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve app");
    });
    format!("http://{addr}")
}

fn fresh_city(tag: &str) -> String {
    format!("{tag}-{}", Uuid::new_v4())
}

/// Seeds an admin and returns the raw bearer token for it.
async fn seed_admin(pool: &PgPool, city: &str) -> String {
    let token = format!("admin-{}", Uuid::new_v4());
    sqlx::query(
        r#"INSERT INTO admins (admin_id, full_name, city, api_token_hash)
           VALUES ($1, $2, $3, $4)"#,
    )
    .bind(Uuid::new_v4())
    .bind("Console Admin")
    .bind(city)
    .bind(token_hash(&token))
    .execute(pool)
    .await
    .expect("seed admin");
    token
}

async fn seed_citizen(pool: &PgPool, city: &str) -> (Uuid, String) {
    let token = format!("citizen-{}", Uuid::new_v4());
    let citizen_id = Uuid::new_v4();
    sqlx::query(
        r#"INSERT INTO citizens (citizen_id, full_name, contact_number, city, api_token_hash)
           VALUES ($1, $2, $3, $4, $5)"#,
    )
    .bind(citizen_id)
    .bind("App Citizen")
    .bind("555-0123")
    .bind(city)
    .bind(token_hash(&token))
    .execute(pool)
    .await
    .expect("seed citizen");
    (citizen_id, token)
}

fn resource_body(name: &str, total: i32, available: i32) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "description": "",
        "category": "medical",
        "priority": "high",
        "total": total,
        "available": available,
    })
}

#[tokio::test]
async fn guard_fails_closed() {
    let Some(pool) = test_pool().await else { return };
    let base = spawn_app(pool.clone()).await;
    let client = reqwest::Client::new();

    // no token
    let resp = client
        .get(format!("{base}/api/v1/admin/resources"))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 401);

    // unknown token
    let resp = client
        .get(format!("{base}/api/v1/admin/resources"))
        .bearer_auth("no-such-token")
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 401);

    // provisioning sentinel: an admin whose city is "unset" can do nothing
    let token = seed_admin(&pool, "unset").await;
    let resp = client
        .post(format!("{base}/api/v1/admin/resources"))
        .bearer_auth(&token)
        .json(&resource_body("Bandages", 10, 10))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn create_forces_city_and_validates_counts() {
    let Some(pool) = test_pool().await else { return };
    let base = spawn_app(pool.clone()).await;
    let client = reqwest::Client::new();
    let city = fresh_city("api-create");
    let token = seed_admin(&pool, &city).await;

    // the client-supplied city is ignored
    let mut body = resource_body("Bandages", 10, 10);
    body["city"] = serde_json::json!("Elsewhere");
    let resp = client
        .post(format!("{base}/api/v1/admin/resources"))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 200);
    let created: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(created["city"], serde_json::json!(city));

    for bad in [
        resource_body("", 10, 10),
        resource_body("Bandages", -1, 0),
        resource_body("Bandages", 10, -1),
        resource_body("Bandages", 10, 11),
    ] {
        let resp = client
            .post(format!("{base}/api/v1/admin/resources"))
            .bearer_auth(&token)
            .json(&bad)
            .send()
            .await
            .expect("send");
        assert_eq!(resp.status(), 422, "body {bad} must be refused");
    }
}

#[tokio::test]
async fn cross_city_edits_look_like_not_found() {
    let Some(pool) = test_pool().await else { return };
    let base = spawn_app(pool.clone()).await;
    let client = reqwest::Client::new();
    let token_a = seed_admin(&pool, &fresh_city("api-a")).await;
    let token_b = seed_admin(&pool, &fresh_city("api-b")).await;

    let resp = client
        .post(format!("{base}/api/v1/admin/resources"))
        .bearer_auth(&token_a)
        .json(&resource_body("Fuel", 10, 10))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 200);
    let created: serde_json::Value = resp.json().await.expect("json");
    let id = created["resource_id"].as_str().expect("id").to_string();

    // admin B cannot see, edit, or delete A's resource
    for resp in [
        client
            .get(format!("{base}/api/v1/admin/resources/{id}"))
            .bearer_auth(&token_b)
            .send()
            .await
            .expect("send"),
        client
            .patch(format!("{base}/api/v1/admin/resources/{id}"))
            .bearer_auth(&token_b)
            .json(&serde_json::json!({"description": "hijack"}))
            .send()
            .await
            .expect("send"),
        client
            .delete(format!("{base}/api/v1/admin/resources/{id}"))
            .bearer_auth(&token_b)
            .send()
            .await
            .expect("send"),
    ] {
        assert_eq!(resp.status(), 404);
    }

    // a lone total (without available) is refused as a pair violation
    let resp = client
        .patch(format!("{base}/api/v1/admin/resources/{id}"))
        .bearer_auth(&token_a)
        .json(&serde_json::json!({"total": 50}))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 422);
}

#[tokio::test]
async fn list_filters_and_ordering() {
    let Some(pool) = test_pool().await else { return };
    let base = spawn_app(pool.clone()).await;
    let client = reqwest::Client::new();
    let city = fresh_city("api-list");
    let token = seed_admin(&pool, &city).await;

    // Cots: depleted; Axes: low stock (<= threshold 5); Beds: healthy
    for (name, total, available) in [("Cots", 10, 0), ("Axes", 10, 3), ("Beds", 10, 10)] {
        let resp = client
            .post(format!("{base}/api/v1/admin/resources"))
            .bearer_auth(&token)
            .json(&resource_body(name, total, available))
            .send()
            .await
            .expect("send");
        assert_eq!(resp.status(), 200);
    }

    let names = |rows: &serde_json::Value| -> Vec<String> {
        rows.as_array()
            .expect("array")
            .iter()
            .map(|r| r["name"].as_str().expect("name").to_string())
            .collect()
    };

    let all: serde_json::Value = client
        .get(format!("{base}/api/v1/admin/resources"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    assert_eq!(names(&all), ["Axes", "Beds", "Cots"]);

    let in_stock: serde_json::Value = client
        .get(format!("{base}/api/v1/admin/resources?available=true"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    assert_eq!(names(&in_stock), ["Axes", "Beds"]);

    let low: serde_json::Value = client
        .get(format!("{base}/api/v1/admin/resources?low_stock=true"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    assert_eq!(names(&low), ["Axes", "Cots"]);
}

#[tokio::test]
async fn citizen_request_and_decision_round_trip() {
    let Some(pool) = test_pool().await else { return };
    let base = spawn_app(pool.clone()).await;
    let client = reqwest::Client::new();
    let city = fresh_city("api-flow");
    let admin_token = seed_admin(&pool, &city).await;
    let (citizen_id, citizen_token) = seed_citizen(&pool, &city).await;

    let resp = client
        .post(format!("{base}/api/v1/admin/resources"))
        .bearer_auth(&admin_token)
        .json(&resource_body("Bandages", 100, 100))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 200);
    let resource: serde_json::Value = resp.json().await.expect("json");
    let resource_id = resource["resource_id"].as_str().expect("id").to_string();

    // bad quantity is refused before anything is written
    let resp = client
        .post(format!("{base}/api/v1/requests"))
        .bearer_auth(&citizen_token)
        .json(&serde_json::json!({"resource_id": resource_id, "quantity": 0}))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 422);

    let resp = client
        .post(format!("{base}/api/v1/requests"))
        .bearer_auth(&citizen_token)
        .json(&serde_json::json!({
            "resource_id": resource_id,
            "quantity": 30,
            "delivery_address": "12 River Rd",
        }))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 200);
    let request: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(request["status"], serde_json::json!("pending"));
    assert_eq!(request["city"], serde_json::json!(city));
    let request_id = request["request_id"].as_str().expect("id").to_string();

    // approve over HTTP: committed transition + delivered notification
    let resp = client
        .post(format!("{base}/api/v1/admin/requests/{request_id}/decision"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({"action": "approve"}))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 200);
    let outcome: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(outcome["request"]["status"], serde_json::json!("approved"));
    assert_eq!(outcome["notified"], serde_json::json!(true));

    // approving again is refused by the status guard, not re-debited
    let resp = client
        .post(format!("{base}/api/v1/admin/requests/{request_id}/decision"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({"action": "approve"}))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 409);

    let resource: serde_json::Value = client
        .get(format!("{base}/api/v1/admin/resources/{resource_id}"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    assert_eq!(resource["available"], serde_json::json!(70));

    // the citizen sees exactly one approval notification and may mark it read
    let notifications: serde_json::Value = client
        .get(format!("{base}/api/v1/notifications"))
        .bearer_auth(&citizen_token)
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    let rows = notifications.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["kind"], serde_json::json!("approval"));
    assert_eq!(
        rows[0]["user_id"],
        serde_json::json!(citizen_id.to_string())
    );

    let notification_id = rows[0]["notification_id"].as_str().expect("id");
    let resp = client
        .post(format!("{base}/api/v1/notifications/{notification_id}/read"))
        .bearer_auth(&citizen_token)
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 200);
    let marked: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(marked["is_read"], serde_json::json!(true));
}

#[tokio::test]
async fn insufficient_stock_surfaces_verbatim() {
    let Some(pool) = test_pool().await else { return };
    let base = spawn_app(pool.clone()).await;
    let client = reqwest::Client::new();
    let city = fresh_city("api-short");
    let admin_token = seed_admin(&pool, &city).await;
    let (_citizen_id, citizen_token) = seed_citizen(&pool, &city).await;

    let resource: serde_json::Value = client
        .post(format!("{base}/api/v1/admin/resources"))
        .bearer_auth(&admin_token)
        .json(&resource_body("Water Tanks", 5, 5))
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    let resource_id = resource["resource_id"].as_str().expect("id").to_string();

    let request: serde_json::Value = client
        .post(format!("{base}/api/v1/requests"))
        .bearer_auth(&citizen_token)
        .json(&serde_json::json!({"resource_id": resource_id, "quantity": 10}))
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    let request_id = request["request_id"].as_str().expect("id").to_string();

    let resp = client
        .post(format!("{base}/api/v1/admin/requests/{request_id}/decision"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({"action": "approve"}))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 409);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["code"], serde_json::json!("INSUFFICIENT_STOCK"));
    assert_eq!(
        body["error"],
        serde_json::json!("not enough resources available")
    );
}
