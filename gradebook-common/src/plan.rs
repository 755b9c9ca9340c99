//! Subscription plans and the child-profile limits they grant

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Child profiles allowed on the free plan
pub const FREE_MAX_CHILDREN: i64 = 1;

/// Child profiles allowed on the premium plan
pub const PREMIUM_MAX_CHILDREN: i64 = 10;

/// Subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Premium,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
        }
    }

    /// Maximum number of child profiles on this plan
    pub fn max_children(&self) -> i64 {
        max_children(*self)
    }
}

/// Maximum number of child profiles a plan permits
///
/// ```
/// use gradebook_common::plan::{max_children, Plan};
///
/// assert_eq!(max_children(Plan::Free), 1);
/// assert_eq!(max_children(Plan::Premium), 10);
/// ```
pub fn max_children(plan: Plan) -> i64 {
    match plan {
        Plan::Free => FREE_MAX_CHILDREN,
        Plan::Premium => PREMIUM_MAX_CHILDREN,
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "premium" => Ok(Plan::Premium),
            other => Err(Error::InvalidInput(format!("Unknown plan: {}", other))),
        }
    }
}
