//! Child profile endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use gradebook_common::db::Child;
use gradebook_common::time::is_calendar_date;
use gradebook_common::{average, GradeSample};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::{access, AuthUser};
use crate::db::{children, grades, users, NewChild};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChildRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub grade_level: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CreateChildRequest {
    fn validate(self) -> ApiResult<NewChild> {
        let first_name = optional_text(self.first_name)
            .ok_or_else(|| ApiError::BadRequest("Missing firstName".to_string()))?;

        let birth_date = optional_text(self.birth_date);
        if let Some(date) = &birth_date {
            if !is_calendar_date(date) {
                return Err(ApiError::BadRequest(
                    "birthDate must be a YYYY-MM-DD date".to_string(),
                ));
            }
        }

        Ok(NewChild {
            first_name,
            last_name: optional_text(self.last_name),
            grade_level: optional_text(self.grade_level),
            birth_date,
        })
    }
}

/// POST /api/children
///
/// Fails with a capacity error once the caller's plan limit is reached.
pub async fn create_child(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateChildRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(request) = payload?;
    let new_child = request.validate()?;

    let profile = users::get(&state.db, &user.uid)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    let limit = profile.plan.max_children();

    let child = children::insert_within_limit(&state.db, &user.uid, &new_child, limit)
        .await?
        .ok_or(ApiError::PlanLimitReached {
            plan: profile.plan,
            limit,
        })?;

    info!("Created child {} for {}", child.id, user.uid);
    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "id": child.id }))))
}

#[derive(Debug, Serialize)]
pub struct ChildrenResponse {
    pub children: Vec<Child>,
}

/// GET /api/children
pub async fn list_children(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<ChildrenResponse>> {
    let children = children::list_by_parent(&state.db, &user.uid).await?;
    Ok(Json(ChildrenResponse { children }))
}

#[derive(Debug, Serialize)]
pub struct ChildResponse {
    pub child: Child,
}

/// GET /api/children/:child_id
pub async fn get_child(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(child_id): Path<String>,
) -> ApiResult<Json<ChildResponse>> {
    let child = access::require_child(&state.db, &child_id, &user.uid).await?;
    Ok(Json(ChildResponse { child }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageResponse {
    pub child_id: String,
    /// `null` when the child has no grades
    pub average: Option<f64>,
    pub count: usize,
}

/// GET /api/children/:child_id/average
pub async fn child_average(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(child_id): Path<String>,
) -> ApiResult<Json<AverageResponse>> {
    let child = access::require_child(&state.db, &child_id, &user.uid).await?;
    let samples: Vec<GradeSample> = grades::list_by_child(&state.db, &child.id)
        .await?
        .iter()
        .map(|grade| grade.sample())
        .collect();

    Ok(Json(AverageResponse {
        child_id: child.id,
        average: average(&samples),
        count: samples.len(),
    }))
}
