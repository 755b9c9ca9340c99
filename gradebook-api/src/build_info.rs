//! Identity of the running binary, stamped by `build.rs`

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub built_at: &'static str,
    pub profile: &'static str,
}

/// This binary
pub const BUILD: BuildInfo = BuildInfo {
    version: env!("CARGO_PKG_VERSION"),
    git_hash: env!("GIT_HASH"),
    built_at: env!("BUILD_TIMESTAMP"),
    profile: env!("BUILD_PROFILE"),
};

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{} [{}] built {} ({})",
            self.version, self.git_hash, self.built_at, self.profile
        )
    }
}
