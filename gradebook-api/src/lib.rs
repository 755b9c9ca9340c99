//! gradebook-api library
//!
//! Parent-facing grade tracking service: child profiles, grades, averages,
//! AI analyses and a thin subscription billing bridge.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use gradebook_common::api::IdentityVerifier;

pub mod api;
pub mod build_info;
pub mod config;
pub mod db;
pub mod error;
pub mod services;

pub use error::{ApiError, ApiResult};
use services::AnalysisGateway;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Record store
    pub db: SqlitePool,
    /// Turns bearer tokens into subject ids
    pub identity: Arc<dyn IdentityVerifier>,
    pub analysis: Arc<AnalysisGateway>,
    /// Payment-provider webhook secret; webhooks are refused when `None`
    pub webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        identity: Arc<dyn IdentityVerifier>,
        analysis: Arc<AnalysisGateway>,
        webhook_secret: Option<String>,
    ) -> Self {
        Self {
            db,
            identity,
            analysis,
            webhook_secret,
        }
    }
}

/// Build application router
///
/// Every `/api` route requires a bearer token except the billing webhook,
/// which authenticates with its own signature header.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, patch, post};

    // Protected routes (require authentication)
    let protected = Router::new()
        .route(
            "/api/account",
            post(api::register_account).get(api::get_account),
        )
        .route(
            "/api/children",
            post(api::create_child).get(api::list_children),
        )
        .route("/api/children/:child_id", get(api::get_child))
        .route("/api/children/:child_id/average", get(api::child_average))
        .route("/api/grades", post(api::create_grade).get(api::list_grades))
        .route(
            "/api/grades/:grade_id",
            patch(api::update_grade).delete(api::delete_grade),
        )
        .route("/api/ai/analysis", post(api::request_analysis))
        .route(
            "/api/reports",
            post(api::create_report).get(api::list_reports),
        )
        .route(
            "/api/billing/link-subscription",
            post(api::link_subscription),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no bearer token)
    let public = Router::new()
        .route("/api/billing/webhook", post(api::billing_webhook))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
