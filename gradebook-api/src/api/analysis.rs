//! AI analysis endpoint

use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{access, AuthUser};
use crate::db::grades;
use crate::services::analysis::{AnalysisReport, ChildDescriptor, GradeInput};
use crate::{ApiError, ApiResult, AppState};

/// Either a stored child (`childId`) or inline child context and grades
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[serde(default)]
    pub child_id: Option<String>,
    #[serde(default)]
    pub child: Option<ChildDescriptor>,
    #[serde(default)]
    pub grades: Option<Vec<GradeInput>>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis: AnalysisReport,
    pub model: String,
}

/// POST /api/ai/analysis
///
/// With `childId`, the child's ownership check and its grade listing run
/// concurrently; the grades are sent newest first.
pub async fn request_analysis(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> ApiResult<Json<AnalysisResponse>> {
    let Json(request) = payload?;

    let (child, grades): (ChildDescriptor, Vec<GradeInput>) = match request.child_id.filter(|id| !id.is_empty()) {
        Some(child_id) => {
            let (child, stored) = tokio::try_join!(
                access::require_child(&state.db, &child_id, &user.uid),
                async {
                    grades::list_by_child(&state.db, &child_id)
                        .await
                        .map_err(ApiError::from)
                },
            )?;
            let descriptor = ChildDescriptor {
                first_name: Some(child.first_name),
                grade_level: child.grade_level,
            };
            (descriptor, stored.iter().map(GradeInput::from).collect())
        }
        None => (
            request.child.unwrap_or_default(),
            request.grades.unwrap_or_default(),
        ),
    };

    if grades.is_empty() {
        return Err(ApiError::BadRequest("No grades provided".to_string()));
    }

    let completed = state.analysis.analyze(&child, &grades).await?;
    info!(
        "Analysis for {} completed by {}{}",
        user.uid,
        completed.model,
        if completed.outcome.is_degraded() { " (fallback)" } else { "" }
    );

    Ok(Json(AnalysisResponse {
        analysis: completed.outcome.into_report(),
        model: completed.model,
    }))
}
