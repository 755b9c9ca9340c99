//! Stamps the binary with the git revision, build time and cargo profile
//!
//! Read back through `build_info::BUILD` for the startup banner and `/health`.
//! Missing git metadata (e.g. a source tarball) yields `unknown`.

use std::process::Command;

const UNKNOWN: &str = "unknown";

fn git_revision() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let revision = String::from_utf8(output.stdout).ok()?;
    let revision = revision.trim();
    (!revision.is_empty()).then(|| revision.to_string())
}

fn stamp(key: &str, value: &str) {
    println!("cargo:rustc-env={}={}", key, value);
}

fn main() {
    stamp(
        "GIT_HASH",
        &git_revision().unwrap_or_else(|| UNKNOWN.to_string()),
    );
    stamp(
        "BUILD_TIMESTAMP",
        &chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    );
    stamp(
        "BUILD_PROFILE",
        &std::env::var("PROFILE").unwrap_or_else(|_| UNKNOWN.to_string()),
    );
    // Without rerun-if-changed the script runs on every build, keeping the
    // revision and timestamp current.
}
