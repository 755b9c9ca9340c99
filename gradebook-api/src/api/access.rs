//! Ownership-checked record lookups
//!
//! A missing record and another parent's record both end in
//! [`ApiError::NotFoundOrForbidden`].

use gradebook_common::db::{Child, Grade};
use gradebook_common::guard;
use sqlx::SqlitePool;

use crate::db::{children, grades};
use crate::{ApiError, ApiResult};

/// Load a child owned by `caller_id`
pub async fn require_child(db: &SqlitePool, child_id: &str, caller_id: &str) -> ApiResult<Child> {
    let child = children::get(db, child_id).await?;
    Ok(guard(child, caller_id).into_result()?)
}

/// Load a grade whose child is owned by `caller_id`
pub async fn require_grade(
    db: &SqlitePool,
    grade_id: &str,
    caller_id: &str,
) -> ApiResult<(Grade, Child)> {
    let grade = grades::get(db, grade_id)
        .await?
        .ok_or(ApiError::NotFoundOrForbidden)?;
    let child = require_child(db, &grade.child_id, caller_id).await?;
    Ok((grade, child))
}
