//! Grade endpoints
//!
//! Every operation is checked through the owning child: Grade → Child →
//! parent.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use gradebook_common::db::Grade;
use gradebook_common::time::is_calendar_date;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::{access, AuthUser};
use crate::db::{grades, GradeUpdate, NewGrade};
use crate::services::analysis::{GRADE_SCALE, MAX_SUBJECT_CHARS};
use crate::{ApiError, ApiResult, AppState};

fn validate_subject(subject: &str) -> ApiResult<String> {
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(ApiError::BadRequest("subject must not be blank".to_string()));
    }
    if subject.chars().count() > MAX_SUBJECT_CHARS {
        return Err(ApiError::BadRequest(format!(
            "subject must be at most {} characters",
            MAX_SUBJECT_CHARS
        )));
    }
    Ok(subject.to_string())
}

fn validate_value(value: f64) -> ApiResult<f64> {
    if !value.is_finite() || !(0.0..=GRADE_SCALE).contains(&value) {
        return Err(ApiError::BadRequest(
            "value must be between 0 and 20".to_string(),
        ));
    }
    Ok(value)
}

fn validate_coef(coef: f64) -> ApiResult<f64> {
    if !coef.is_finite() || coef < 0.0 {
        return Err(ApiError::BadRequest("coef must be zero or positive".to_string()));
    }
    Ok(coef)
}

/// Blank dates count as absent
fn validate_date(date: Option<&str>) -> ApiResult<Option<String>> {
    let Some(date) = date.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    if !is_calendar_date(date) {
        return Err(ApiError::BadRequest("date must be a YYYY-MM-DD date".to_string()));
    }
    Ok(Some(date.to_string()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGradeRequest {
    #[serde(default)]
    pub child_id: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub coef: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
}

impl CreateGradeRequest {
    fn validate(self) -> ApiResult<(String, NewGrade)> {
        let (child_id, subject, value) = match (self.child_id, self.subject, self.value) {
            (Some(child_id), Some(subject), Some(value)) if !child_id.is_empty() => {
                (child_id, subject, value)
            }
            _ => {
                return Err(ApiError::BadRequest(
                    "Missing childId|value|subject".to_string(),
                ))
            }
        };

        let grade = NewGrade {
            subject: validate_subject(&subject)?,
            value: validate_value(value)?,
            coef: self.coef.map(validate_coef).transpose()?,
            date: validate_date(self.date.as_deref())?,
        };
        Ok((child_id, grade))
    }
}

/// POST /api/grades
pub async fn create_grade(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateGradeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(request) = payload?;
    let (child_id, new_grade) = request.validate()?;

    let child = access::require_child(&state.db, &child_id, &user.uid).await?;
    let grade = grades::insert(&state.db, &child.id, &new_grade).await?;

    info!("Created grade {} for child {}", grade.id, child.id);
    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "id": grade.id }))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildQuery {
    pub child_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GradesResponse {
    pub grades: Vec<Grade>,
}

/// GET /api/grades?childId=
pub async fn list_grades(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ChildQuery>,
) -> ApiResult<Json<GradesResponse>> {
    let child_id = query
        .child_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing childId".to_string()))?;

    let child = access::require_child(&state.db, &child_id, &user.uid).await?;
    let grades = grades::list_by_child(&state.db, &child.id).await?;
    Ok(Json(GradesResponse { grades }))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateGradeRequest {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub coef: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
}

impl UpdateGradeRequest {
    fn validate(self) -> ApiResult<GradeUpdate> {
        let changes = GradeUpdate {
            subject: self.subject.as_deref().map(validate_subject).transpose()?,
            value: self.value.map(validate_value).transpose()?,
            coef: self.coef.map(validate_coef).transpose()?,
            date: validate_date(self.date.as_deref())?,
        };
        if changes.is_empty() {
            return Err(ApiError::BadRequest("Nothing to update".to_string()));
        }
        Ok(changes)
    }
}

/// PATCH /api/grades/:grade_id
///
/// Merges only the fields present in the body. A blank `date` is treated as
/// absent, and `coef` and `date` cannot be cleared once set.
pub async fn update_grade(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(grade_id): Path<String>,
    payload: Result<Json<UpdateGradeRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    let changes = request.validate()?;

    let (grade, _) = access::require_grade(&state.db, &grade_id, &user.uid).await?;
    if !grades::update(&state.db, &grade.id, &changes).await? {
        return Err(ApiError::NotFoundOrForbidden);
    }

    info!("Updated grade {}", grade.id);
    Ok(Json(json!({ "ok": true })))
}

/// DELETE /api/grades/:grade_id
pub async fn delete_grade(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(grade_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let (grade, _) = access::require_grade(&state.db, &grade_id, &user.uid).await?;
    if !grades::delete(&state.db, &grade.id).await? {
        return Err(ApiError::NotFoundOrForbidden);
    }

    info!("Deleted grade {}", grade.id);
    Ok(Json(json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_core_fields() {
        let request = CreateGradeRequest {
            child_id: Some("c1".to_string()),
            subject: Some("Math".to_string()),
            ..Default::default()
        };
        assert!(matches!(request.validate(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_create_validates_ranges() {
        let base = || CreateGradeRequest {
            child_id: Some("c1".to_string()),
            subject: Some("Math".to_string()),
            value: Some(12.0),
            ..Default::default()
        };

        assert!(base().validate().is_ok());
        for bad in [
            CreateGradeRequest { value: Some(20.5), ..base() },
            CreateGradeRequest { value: Some(-0.1), ..base() },
            CreateGradeRequest { coef: Some(-1.0), ..base() },
            CreateGradeRequest { subject: Some("x".repeat(65)), ..base() },
            CreateGradeRequest { subject: Some("  ".to_string()), ..base() },
            CreateGradeRequest { date: Some("2024-13-01".to_string()), ..base() },
        ] {
            assert!(matches!(bad.validate(), Err(ApiError::BadRequest(_))));
        }
    }

    #[test]
    fn test_create_keeps_optional_fields() {
        let request = CreateGradeRequest {
            child_id: Some("c1".to_string()),
            subject: Some(" Math ".to_string()),
            value: Some(20.0),
            coef: Some(0.0),
            date: Some("2024-02-29".to_string()),
        };
        let (child_id, grade) = request.validate().unwrap();
        assert_eq!(child_id, "c1");
        assert_eq!(grade.subject, "Math");
        assert_eq!(grade.coef, Some(0.0));
        assert_eq!(grade.date.as_deref(), Some("2024-02-29"));
    }

    #[test]
    fn test_update_requires_a_field() {
        let result = UpdateGradeRequest::default().validate();
        match result {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, "Nothing to update"),
            other => panic!("expected BadRequest, got {:?}", other),
        }

        let changes = UpdateGradeRequest {
            value: Some(15.0),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(changes.value, Some(15.0));
        assert!(changes.subject.is_none());
    }

    #[test]
    fn test_blank_date_is_absent_on_create_and_update() {
        let (_, grade) = CreateGradeRequest {
            child_id: Some("c1".to_string()),
            subject: Some("Math".to_string()),
            value: Some(12.0),
            date: Some(" ".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(grade.date, None);

        let changes = UpdateGradeRequest {
            value: Some(15.0),
            date: Some(String::new()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(changes.date, None);

        let only_blank_date = UpdateGradeRequest {
            date: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(only_blank_date.validate(), Err(ApiError::BadRequest(_))));
    }
}
