//! Account endpoints

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Extension, Json};
use gradebook_common::db::UserProfile;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AuthUser;
use crate::db::users;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl RegisterRequest {
    /// Trimmed `(email, name)`; email is required
    fn validate(self) -> Result<(String, String), ApiError> {
        let email = self
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Missing email".to_string()))?;
        let name = self.name.unwrap_or_default().trim().to_string();
        Ok((email, name))
    }
}

/// Profile plus the plan's child capacity
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub max_children: i64,
}

impl From<UserProfile> for AccountResponse {
    fn from(profile: UserProfile) -> Self {
        let max_children = profile.plan.max_children();
        Self {
            profile,
            max_children,
        }
    }
}

/// POST /api/account
///
/// Registers the caller on the free plan; `email` is required. An existing
/// profile is returned unchanged with 200, a new one with 201.
pub async fn register_account(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AccountResponse>)> {
    let Json(request) = payload?;
    let (email, name) = request.validate()?;

    let (profile, created) = users::insert_if_absent(&state.db, &user.uid, &email, &name).await?;

    if created {
        info!("Registered account {}", user.uid);
        Ok((StatusCode::CREATED, Json(profile.into())))
    } else {
        Ok((StatusCode::OK, Json(profile.into())))
    }
}

/// GET /api/account
pub async fn get_account(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<AccountResponse>> {
    let profile = users::get(&state.db, &user.uid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not registered".to_string()))?;

    Ok(Json(profile.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_requires_email() {
        let request = RegisterRequest {
            email: Some("  ".to_string()),
            name: Some("Ana".to_string()),
        };
        assert!(matches!(request.validate(), Err(ApiError::BadRequest(_))));
        assert!(matches!(
            RegisterRequest::default().validate(),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_register_request_trims_fields() {
        let request = RegisterRequest {
            email: Some(" ana@example.com ".to_string()),
            name: None,
        };
        let (email, name) = request.validate().unwrap();
        assert_eq!(email, "ana@example.com");
        assert_eq!(name, "");
    }
}
