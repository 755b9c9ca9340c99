//! Billing bridge
//!
//! Links a payment-provider subscription to the caller and mirrors the
//! provider's webhook events into the plan and subscription status. No
//! outbound provider calls are made.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Extension, Json,
};
use gradebook_common::api::validate_signature;
use gradebook_common::db::subscription_status;
use gradebook_common::Plan;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::AuthUser;
use crate::db::users;
use crate::{ApiError, ApiResult, AppState};

/// Header carrying hex HMAC-SHA256 of the raw body keyed with the secret
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

pub const EVENT_ACTIVATED: &str = "BILLING.SUBSCRIPTION.ACTIVATED";
pub const EVENT_CANCELLED: &str = "BILLING.SUBSCRIPTION.CANCELLED";
pub const EVENT_SUSPENDED: &str = "BILLING.SUBSCRIPTION.SUSPENDED";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSubscriptionRequest {
    #[serde(default)]
    pub subscription_id: Option<String>,
}

/// POST /api/billing/link-subscription
///
/// Grants premium right away with status `PENDING`; the provider's
/// activation webhook later confirms it.
pub async fn link_subscription(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<LinkSubscriptionRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    let subscription_id = request
        .subscription_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing subscription ID".to_string()))?;

    if !users::link_subscription(&state.db, &user.uid, &subscription_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!("Linked subscription {} to {}", subscription_id, user.uid);
    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(default)]
    event_type: Option<String>,
    #[serde(default)]
    resource: Option<WebhookResource>,
}

#[derive(Debug, Deserialize)]
struct WebhookResource {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    subscription_id: Option<String>,
}

impl WebhookResource {
    /// First non-blank of `id` and `subscription_id`
    fn subscription_id(self) -> Option<String> {
        let present = |id: &String| !id.trim().is_empty();
        self.id
            .filter(present)
            .or_else(|| self.subscription_id.filter(present))
    }
}

/// Plan and status an event moves a subscriber to
fn event_effect(event_type: &str) -> Option<(Option<Plan>, &'static str)> {
    match event_type {
        EVENT_ACTIVATED => Some((Some(Plan::Premium), subscription_status::ACTIVE)),
        EVENT_CANCELLED => Some((Some(Plan::Free), subscription_status::CANCELLED)),
        EVENT_SUSPENDED => Some((None, subscription_status::SUSPENDED)),
        _ => None,
    }
}

/// POST /api/billing/webhook
///
/// Unknown subscriptions and event types are acknowledged without change.
pub async fn billing_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let secret = state
        .webhook_secret
        .as_deref()
        .ok_or_else(|| ApiError::Unavailable("Billing webhook is not configured".to_string()))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    validate_signature(signature, &body, secret)?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

    let subscription_id = event.resource.and_then(WebhookResource::subscription_id);
    let Some(subscription_id) = subscription_id else {
        return Ok(Json(json!({ "ok": true })));
    };

    let Some(profile) = users::find_by_subscription(&state.db, &subscription_id).await? else {
        warn!("Webhook: no user found for subscription {}", subscription_id);
        return Ok(Json(json!({ "ok": true })));
    };

    let event_type = event.event_type.unwrap_or_default();
    match event_effect(&event_type) {
        Some((plan, status)) => {
            users::apply_subscription_event(&state.db, &profile.id, plan, status).await?;
            info!(
                "Webhook {}: subscription {} of {} is now {}",
                event_type, subscription_id, profile.id, status
            );
        }
        None => info!("Webhook: ignoring event {}", event_type),
    }

    Ok(Json(json!({ "ok": true })))
}
