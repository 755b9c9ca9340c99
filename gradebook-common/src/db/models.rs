//! Database models
//!
//! Serialized to clients in camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::grades::GradeSample;
use crate::ownership::Owned;
use crate::plan::Plan;
use crate::Error;

/// Subscription status values mirrored from the payment provider
pub mod subscription_status {
    pub const PENDING: &str = "PENDING";
    pub const ACTIVE: &str = "ACTIVE";
    pub const CANCELLED: &str = "CANCELLED";
    pub const SUSPENDED: &str = "SUSPENDED";
}

/// Parent account; `id` is the identity provider's subject id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub plan: Plan,
    pub subscription_id: Option<String>,
    pub subscription_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub id: String,
    pub parent_id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub grade_level: Option<String>,
    pub birth_date: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Owned for Child {
    fn owner_id(&self) -> &str {
        &self.parent_id
    }
}

/// One grade on the /20 scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: String,
    pub child_id: String,
    pub subject: String,
    pub value: f64,
    pub coef: Option<f64>,
    /// Calendar date, `YYYY-MM-DD`
    pub date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Grade {
    pub fn sample(&self) -> GradeSample {
        match self.coef {
            Some(coef) => GradeSample::weighted(self.value, coef),
            None => GradeSample::new(self.value),
        }
    }
}

/// Coarse risk assessment attached to an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(Error::InvalidInput(format!("Unknown risk level: {}", other))),
        }
    }
}

/// Persisted AI analysis; immutable once stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiReport {
    pub id: String,
    pub child_id: String,
    pub analysis: serde_json::Value,
    pub risk_level: RiskLevel,
    pub created_at: DateTime<Utc>,
}
