//! Shared harness for gradebook-api integration tests
//!
//! Builds the real router over an in-memory database, a mock language model
//! and an HS256 verifier, and drives it with `oneshot`.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use gradebook_api::services::llm::MockBackend;
use gradebook_api::services::AnalysisGateway;
use gradebook_api::{build_router, AppState};
use gradebook_common::api::JwtVerifier;
use gradebook_common::db::init_memory_database;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt; // for `oneshot` method

pub const JWT_SECRET: &str = "integration-test-secret-long-enough-for-hs256";
pub const WEBHOOK_SECRET: &str = "webhook-test-secret";

pub const VALID_ANALYSIS: &str = r#"{
    "overview": {"summary": "Good progress", "highlights": ["Math"]},
    "perSubject": [{
        "subject": "Math",
        "average": 15.0,
        "trend": "stable",
        "strengths": ["mental arithmetic"],
        "weaknesses": [],
        "actions": ["weekly exercises"]
    }],
    "globalTips": ["regular sleep"],
    "risk": {"level": "low", "reasons": []}
}"#;

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub backend: Arc<MockBackend>,
    verifier: JwtVerifier,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(
            MockBackend::new("gpt-4o-mini").with_response(VALID_ANALYSIS),
            Some(WEBHOOK_SECRET),
        )
        .await
    }

    pub async fn with_backend(backend: MockBackend) -> Self {
        Self::build(backend, Some(WEBHOOK_SECRET)).await
    }

    pub async fn without_webhook_secret() -> Self {
        Self::build(MockBackend::default(), None).await
    }

    async fn build(backend: MockBackend, webhook_secret: Option<&str>) -> Self {
        let db = init_memory_database().await.unwrap();
        let backend = Arc::new(backend);
        let verifier = JwtVerifier::new(JWT_SECRET).unwrap();
        let gateway = AnalysisGateway::new(backend.clone(), Duration::from_secs(5));

        let state = AppState::new(
            db.clone(),
            Arc::new(verifier.clone()),
            Arc::new(gateway),
            webhook_secret.map(str::to_string),
        );

        Self {
            router: build_router(state),
            db,
            backend,
            verifier,
        }
    }

    pub fn token(&self, uid: &str) -> String {
        self.verifier.issue(uid, 3600).unwrap()
    }

    /// Send a request as `uid` (or anonymously) and decode the JSON reply
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        uid: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(uid) = uid {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token(uid)));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.dispatch(builder.body(body).unwrap()).await
    }

    /// Send a prepared request and decode the JSON reply
    pub async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    pub async fn register(&self, uid: &str) {
        let (status, _) = self
            .send(
                "POST",
                "/api/account",
                Some(uid),
                Some(json!({"email": format!("{}@example.com", uid), "name": uid})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    /// Register `uid` and create one child for them
    pub async fn register_with_child(&self, uid: &str, first_name: &str) -> String {
        self.register(uid).await;
        self.create_child(uid, first_name).await
    }

    pub async fn create_child(&self, uid: &str, first_name: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/children",
                Some(uid),
                Some(json!({"firstName": first_name, "gradeLevel": "CM2"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create child failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn create_grade(&self, uid: &str, grade: Value) -> String {
        let (status, body) = self.send("POST", "/api/grades", Some(uid), Some(grade)).await;
        assert_eq!(status, StatusCode::CREATED, "create grade failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Move `uid` to the premium plan directly in the store
    pub async fn make_premium(&self, uid: &str) {
        sqlx::query("UPDATE users SET plan = 'premium' WHERE id = ?")
            .bind(uid)
            .execute(&self.db)
            .await
            .unwrap();
    }
}
