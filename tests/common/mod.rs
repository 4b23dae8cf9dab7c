//! Shared test utilities for integration tests.
//!
//! `TestClient` drives the router with `oneshot` requests against a fresh
//! in-memory database and a throwaway cache file.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use solarium::config::Config;
use solarium::db::{create_in_memory_pool, run_migrations};
use solarium::server;
use solarium::state::AppState;
use solarium::store::{FallbackRepository, LocalCacheRepository, SqliteRepository};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestClient {
    state: AppState,
    // Keeps the cache directory alive for the client's lifetime.
    _cache_dir: TempDir,
}

impl TestClient {
    pub fn new() -> Self {
        let pool = create_in_memory_pool().expect("Failed to create in-memory pool");
        {
            let mut conn = pool.get().expect("Failed to get connection");
            run_migrations(&mut conn, Path::new("migrations")).expect("Failed to run migrations");
        }

        let cache_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let cache_path = cache_dir.path().join("transactions.json");

        let config = Config {
            host: "127.0.0.1".into(),
            port: 7070,
            database_path: PathBuf::from(":memory:"),
            migrations_path: PathBuf::from("migrations"),
            cache_path: cache_path.clone(),
        };

        let repo = FallbackRepository::new(
            SqliteRepository::new(pool),
            LocalCacheRepository::new(cache_path),
        );

        Self {
            state: AppState::new(Arc::new(repo), config),
            _cache_dir: cache_dir,
        }
    }

    pub fn router(&self) -> Router {
        server::router(self.state.clone())
    }

    pub fn cache_path(&self) -> &Path {
        &self.state.config.cache_path
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).to_string())
    }

    fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    /// GET and parse the body as JSON. `None` when the body is not JSON.
    pub async fn get_json(&self, uri: &str) -> (StatusCode, Option<Value>) {
        let (status, body) = self.get(uri).await;
        (status, serde_json::from_str(&body).ok())
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Option<Value>) {
        let (status, body) = self.send(Self::json_request("POST", uri, body)).await;
        (status, serde_json::from_str(&body).ok())
    }

    pub async fn patch_json(&self, uri: &str, body: &Value) -> (StatusCode, Option<Value>) {
        let (status, body) = self.send(Self::json_request("PATCH", uri, body)).await;
        (status, serde_json::from_str(&body).ok())
    }

    pub async fn delete(&self, uri: &str) -> StatusCode {
        let request = Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await.0
    }

    // =========================================================================
    // Helpers for creating entities through the API
    // =========================================================================

    /// Create a transaction via POST and return its id.
    pub async fn create_transaction(
        &self,
        date: &str,
        kind: &str,
        amount_cents: i64,
        description: &str,
        category: Option<&str>,
    ) -> i64 {
        let body = json!({
            "date": date,
            "kind": kind,
            "amount_cents": amount_cents,
            "description": description,
            "destination": description,
            "category": category,
            "classification": "Essencial",
            "method": "Pix",
        });
        let (status, created) = self.post_json("/api/transactions", &body).await;
        assert_eq!(status, StatusCode::CREATED, "create failed for {}", description);
        created.and_then(|v| v["id"].as_i64()).expect("created transaction has an id")
    }
}
