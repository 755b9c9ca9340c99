//! AI report endpoints
//!
//! Reports are stored only on explicit request and never modified.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Extension, Json,
};
use gradebook_common::db::{AiReport, RiskLevel};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::grades::ChildQuery;
use super::{access, AuthUser};
use crate::db::reports;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    #[serde(default)]
    pub child_id: Option<String>,
    #[serde(default)]
    pub analysis: Option<Value>,
    /// Defaults to the analysis' own `risk.level`
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
}

impl CreateReportRequest {
    fn validate(self) -> ApiResult<(String, Value, RiskLevel)> {
        let child_id = self
            .child_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Missing childId".to_string()))?;

        let analysis = self
            .analysis
            .filter(Value::is_object)
            .ok_or_else(|| ApiError::BadRequest("analysis must be a JSON object".to_string()))?;

        let risk_level = match self.risk_level {
            Some(level) => level,
            None => analysis["risk"]["level"]
                .as_str()
                .and_then(|level| level.parse().ok())
                .ok_or_else(|| ApiError::BadRequest("Missing riskLevel".to_string()))?,
        };

        Ok((child_id, analysis, risk_level))
    }
}

/// POST /api/reports
pub async fn create_report(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateReportRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(request) = payload?;
    let (child_id, analysis, risk_level) = request.validate()?;

    let child = access::require_child(&state.db, &child_id, &user.uid).await?;
    let report = reports::insert(&state.db, &child.id, &analysis, risk_level).await?;

    info!("Stored report {} for child {}", report.id, child.id);
    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "id": report.id }))))
}

#[derive(Debug, Serialize)]
pub struct ReportsResponse {
    pub reports: Vec<AiReport>,
}

/// GET /api/reports?childId=
pub async fn list_reports(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ChildQuery>,
) -> ApiResult<Json<ReportsResponse>> {
    let child_id = query
        .child_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing childId".to_string()))?;

    let child = access::require_child(&state.db, &child_id, &user.uid).await?;
    let reports = reports::list_by_child(&state.db, &child.id).await?;
    Ok(Json(ReportsResponse { reports }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_taken_from_analysis() {
        let request = CreateReportRequest {
            child_id: Some("c1".to_string()),
            analysis: Some(json!({"risk": {"level": "high", "reasons": []}})),
            risk_level: None,
        };
        let (_, _, level) = request.validate().unwrap();
        assert_eq!(level, RiskLevel::High);
    }

    #[test]
    fn test_explicit_risk_level_wins() {
        let request = CreateReportRequest {
            child_id: Some("c1".to_string()),
            analysis: Some(json!({"risk": {"level": "high"}})),
            risk_level: Some(RiskLevel::Low),
        };
        let (_, _, level) = request.validate().unwrap();
        assert_eq!(level, RiskLevel::Low);
    }

    #[test]
    fn test_rejects_non_object_analysis() {
        let request = CreateReportRequest {
            child_id: Some("c1".to_string()),
            analysis: Some(json!("text")),
            risk_level: Some(RiskLevel::Low),
        };
        assert!(matches!(request.validate(), Err(ApiError::BadRequest(_))));
    }
}
