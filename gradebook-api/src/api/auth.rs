//! Authentication middleware for gradebook-api
//!
//! Resolves `Authorization: Bearer <token>` to the caller's subject id and
//! hands it to handlers as an [`AuthUser`] extension.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use gradebook_common::api::extract_bearer_token;

use crate::{ApiError, AppState};

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Subject id from the identity provider
    pub uid: String,
}

/// Authentication middleware
///
/// Applied to protected routes only; `/health` and the billing webhook do not
/// use it.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = extract_bearer_token(header_value)?;
    let uid = state.identity.verify(token).await?;

    request.extensions_mut().insert(AuthUser { uid });
    Ok(next.run(request).await)
}
