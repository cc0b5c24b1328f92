//! Shared setup for the database-backed tests.
//!
//! These tests need PostgreSQL with PostGIS. Set TEST_DATABASE_URL (or
//! DATABASE_URL) and run them with `--ignored`. They truncate both tables.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use service_areas_api::config::Config;
use service_areas_api::db::Database;
use service_areas_api::handlers::AppState;
use service_areas_api::routes;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::env;
use std::sync::{Arc, OnceLock};
use tokio::sync::{Mutex, MutexGuard};
use tower::ServiceExt;

/// A GeoJSON position, `[x, y]`.
pub type Position = [f64; 2];

pub const ZONE_1: [Position; 5] = [
    [-123.046875, 47.109375],
    [-101.689453125, 47.109375],
    [-101.77734375, 34.716796875],
    [-123.22265625, 34.892578125],
    [-123.046875, 47.109375],
];

pub const ZONE_2: [Position; 5] = [
    [-111.62109375, 39.375],
    [-86.396484375, 39.375],
    [-86.396484375, 50.9765625],
    [-111.533203125, 51.591796875],
    [-111.62109375, 39.375],
];

pub const ZONE_3: [Position; 5] = [
    [-111.4453125, 40.78125],
    [-103.095703125, 40.60546875],
    [-103.359375, 49.921875],
    [-111.4453125, 49.658203125],
    [-111.4453125, 40.78125],
];

pub fn polygon_json(zone: &[Position]) -> Value {
    serde_json::json!({ "type": "Polygon", "coordinates": [zone] })
}

/// Tests share one database, so they take turns.
fn database_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

pub struct TestDb {
    pub pool: PgPool,
    pub config: Config,
    _guard: MutexGuard<'static, ()>,
}

/// Connects, migrates, and empties both tables.
pub async fn test_db() -> anyhow::Result<TestDb> {
    let guard = database_lock().lock().await;

    let db_url = env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL or DATABASE_URL to run this test"))?;

    let config = Config::for_database(db_url);
    let db = Database::from_config(&config).await?;
    sqlx::query("TRUNCATE service_areas, providers RESTART IDENTITY CASCADE")
        .execute(&db.pool)
        .await?;

    Ok(TestDb {
        pool: db.pool,
        config,
        _guard: guard,
    })
}

pub struct TestApp {
    pub router: Router,
    pub db: TestDb,
}

pub async fn test_app() -> anyhow::Result<TestApp> {
    let db = test_db().await?;
    let state = Arc::new(AppState::new(db.pool.clone(), db.config.clone())?);
    Ok(TestApp {
        router: routes::router(state),
        db,
    })
}

/// A router whose pool never connects. Only requests answered before any
/// query runs can be sent through it.
pub fn offline_router() -> anyhow::Result<Router> {
    let config = Config::for_database("postgres://postgres@127.0.0.1:1/offline");
    let pool = PgPoolOptions::new().connect_lazy(&config.database_url)?;
    let state = Arc::new(AppState::new(pool, config)?);
    Ok(routes::router(state))
}

/// Runs one request and returns the status and JSON body (`Null` when the
/// body is empty).
pub async fn call(router: &Router, request: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, json))
}

/// A GET request for `uri`.
pub fn get_request(uri: &str) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder().method(Method::GET).uri(uri).body(Body::empty())?)
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> anyhow::Result<(StatusCode, Value)> {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        call(&self.router, request.body(body)?).await
    }

    pub async fn get(&self, uri: &str) -> anyhow::Result<(StatusCode, Value)> {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> anyhow::Result<(StatusCode, Value)> {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> anyhow::Result<(StatusCode, Value)> {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> anyhow::Result<(StatusCode, Value)> {
        self.send(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> anyhow::Result<(StatusCode, Value)> {
        self.send(Method::DELETE, uri, None).await
    }

    /// Creates a provider through the API and returns its id.
    pub async fn create_provider(&self, name: &str, language: &str, currency: &str) -> anyhow::Result<i64> {
        let (status, body) = self
            .post(
                "/providers/",
                serde_json::json!({
                    "name": name,
                    "email": format!("info@{}.com", name.to_lowercase().replace(' ', "")),
                    "phone_number": "1111",
                    "language": language,
                    "currency": currency,
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create provider: {} {}", status, body);
        body["id"]
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("provider id missing: {}", body))
    }

    /// Creates a service area through the API and returns its id.
    pub async fn create_area(
        &self,
        name: &str,
        zone: &[Position],
        provider_id: i64,
        price: &str,
    ) -> anyhow::Result<i64> {
        let (status, body) = self
            .post(
                "/service-areas/",
                serde_json::json!({
                    "name": name,
                    "provider": format!("/providers/{}/", provider_id),
                    "price": price,
                    "poly": polygon_json(zone).to_string(),
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create area: {} {}", status, body);
        body["id"]
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("service area id missing: {}", body))
    }

    /// The original three-zone fixture: provider 1 owns zones 1 and 2,
    /// provider 2 owns zone 3.
    pub async fn seed_fixture(&self) -> anyhow::Result<(i64, i64)> {
        let p1 = self.create_provider("Test Provider 1", "US", "USD").await?;
        let p2 = self.create_provider("Test Provider 2", "AR", "ARS").await?;
        self.create_area("Test Service Area 1", &ZONE_1, p1, "1").await?;
        self.create_area("Test Service Area 2", &ZONE_2, p1, "2").await?;
        self.create_area("Test Service Area 3", &ZONE_3, p2, "2").await?;
        Ok((p1, p2))
    }
}
