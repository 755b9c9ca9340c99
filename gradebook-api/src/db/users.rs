//! User profile queries

use gradebook_common::db::UserProfile;
use gradebook_common::time::{from_storage, now, to_storage};
use gradebook_common::{Error, Plan, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const SELECT_PROFILE: &str = "SELECT id, email, name, plan, subscription_id, subscription_status, \
     created_at, updated_at FROM users";

fn row_to_profile(row: &SqliteRow) -> Result<UserProfile> {
    let plan: String = row.get("plan");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(UserProfile {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        plan: plan
            .parse::<Plan>()
            .map_err(|_| Error::CorruptRecord(format!("Unknown plan: {}", plan)))?,
        subscription_id: row.get("subscription_id"),
        subscription_status: row.get("subscription_status"),
        created_at: from_storage(&created_at)?,
        updated_at: from_storage(&updated_at)?,
    })
}

/// Fetch one profile
pub async fn get(pool: &SqlitePool, id: &str) -> Result<Option<UserProfile>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_PROFILE))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_profile).transpose()
}

/// Register a profile on the free plan, keeping any existing one
///
/// Returns the stored profile and whether it was created by this call.
pub async fn insert_if_absent(
    pool: &SqlitePool,
    id: &str,
    email: &str,
    name: &str,
) -> Result<(UserProfile, bool)> {
    let timestamp = to_storage(&now());

    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO users (id, email, name, plan, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(email)
    .bind(name)
    .bind(Plan::Free.as_str())
    .bind(&timestamp)
    .bind(&timestamp)
    .execute(pool)
    .await?;

    let profile = get(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Profile {} missing after insert", id)))?;

    Ok((profile, result.rows_affected() > 0))
}

/// Attach a subscription to a profile and grant premium pending activation
///
/// Returns false when no profile exists for `id`.
pub async fn link_subscription(pool: &SqlitePool, id: &str, subscription_id: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET subscription_id = ?, subscription_status = ?, plan = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(subscription_id)
    .bind(gradebook_common::db::subscription_status::PENDING)
    .bind(Plan::Premium.as_str())
    .bind(to_storage(&now()))
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Find the profile a subscription is linked to
pub async fn find_by_subscription(
    pool: &SqlitePool,
    subscription_id: &str,
) -> Result<Option<UserProfile>> {
    let row = sqlx::query(&format!(
        "{} WHERE subscription_id = ? ORDER BY created_at LIMIT 1",
        SELECT_PROFILE
    ))
    .bind(subscription_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_profile).transpose()
}

/// Record a subscription status change; `plan` is left untouched when `None`
pub async fn apply_subscription_event(
    pool: &SqlitePool,
    id: &str,
    plan: Option<Plan>,
    status: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET plan = COALESCE(?, plan), subscription_status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(plan.map(|p| p.as_str()))
    .bind(status)
    .bind(to_storage(&now()))
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradebook_common::db::{init_memory_database, subscription_status};

    #[tokio::test]
    async fn test_insert_if_absent_is_idempotent() {
        let pool = init_memory_database().await.unwrap();

        let (first, created) = insert_if_absent(&pool, "u1", "a@example.com", "Ann")
            .await
            .unwrap();
        assert!(created);
        assert_eq!(first.plan, Plan::Free);

        let (second, created) = insert_if_absent(&pool, "u1", "other@example.com", "Other")
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second.email, "a@example.com");
    }

    #[tokio::test]
    async fn test_subscription_lifecycle() {
        let pool = init_memory_database().await.unwrap();
        insert_if_absent(&pool, "u1", "a@example.com", "").await.unwrap();

        assert!(link_subscription(&pool, "u1", "I-123").await.unwrap());
        assert!(!link_subscription(&pool, "missing", "I-999").await.unwrap());

        let linked = find_by_subscription(&pool, "I-123").await.unwrap().unwrap();
        assert_eq!(linked.id, "u1");
        assert_eq!(linked.plan, Plan::Premium);
        assert_eq!(
            linked.subscription_status.as_deref(),
            Some(subscription_status::PENDING)
        );

        apply_subscription_event(&pool, "u1", None, subscription_status::SUSPENDED)
            .await
            .unwrap();
        let suspended = get(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(suspended.plan, Plan::Premium);
        assert_eq!(
            suspended.subscription_status.as_deref(),
            Some(subscription_status::SUSPENDED)
        );

        apply_subscription_event(&pool, "u1", Some(Plan::Free), subscription_status::CANCELLED)
            .await
            .unwrap();
        let cancelled = get(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(cancelled.plan, Plan::Free);
    }
}
