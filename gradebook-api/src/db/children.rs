//! Child profile queries

use gradebook_common::db::Child;
use gradebook_common::time::{from_storage, now, to_storage};
use gradebook_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Fields supplied when creating a child
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewChild {
    pub first_name: String,
    pub last_name: Option<String>,
    pub grade_level: Option<String>,
    pub birth_date: Option<String>,
}

fn row_to_child(row: &SqliteRow) -> Result<Child> {
    let created_at: String = row.get("created_at");

    Ok(Child {
        id: row.get("id"),
        parent_id: row.get("parent_id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        grade_level: row.get("grade_level"),
        birth_date: row.get("birth_date"),
        created_at: from_storage(&created_at)?,
    })
}

/// Insert a child unless the parent already has `limit` children
///
/// Counting and inserting happen in one statement, so concurrent requests
/// cannot push a parent past the limit. Returns `None` when the limit is
/// reached.
pub async fn insert_within_limit(
    pool: &SqlitePool,
    parent_id: &str,
    child: &NewChild,
    limit: i64,
) -> Result<Option<Child>> {
    let created = Child {
        id: Uuid::new_v4().to_string(),
        parent_id: parent_id.to_string(),
        first_name: child.first_name.clone(),
        last_name: child.last_name.clone(),
        grade_level: child.grade_level.clone(),
        birth_date: child.birth_date.clone(),
        created_at: now(),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO children (id, parent_id, first_name, last_name, grade_level, birth_date, created_at)
        SELECT ?, ?, ?, ?, ?, ?, ?
        WHERE (SELECT COUNT(*) FROM children WHERE parent_id = ?) < ?
        "#,
    )
    .bind(&created.id)
    .bind(&created.parent_id)
    .bind(&created.first_name)
    .bind(&created.last_name)
    .bind(&created.grade_level)
    .bind(&created.birth_date)
    .bind(to_storage(&created.created_at))
    .bind(parent_id)
    .bind(limit)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    Ok(Some(created))
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<Option<Child>> {
    let row = sqlx::query(
        "SELECT id, parent_id, first_name, last_name, grade_level, birth_date, created_at \
         FROM children WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_child).transpose()
}

/// A parent's children, newest first
pub async fn list_by_parent(pool: &SqlitePool, parent_id: &str) -> Result<Vec<Child>> {
    let rows = sqlx::query(
        "SELECT id, parent_id, first_name, last_name, grade_level, birth_date, created_at \
         FROM children WHERE parent_id = ? ORDER BY created_at DESC, rowid DESC",
    )
    .bind(parent_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_child).collect()
}

/// Delete a child and, by cascade, its grades and reports
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM children WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradebook_common::db::init_memory_database;

    fn named(first_name: &str) -> NewChild {
        NewChild {
            first_name: first_name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_respects_limit() {
        let pool = init_memory_database().await.unwrap();

        let first = insert_within_limit(&pool, "p1", &named("Ana"), 1).await.unwrap();
        assert!(first.is_some());

        let second = insert_within_limit(&pool, "p1", &named("Ben"), 1).await.unwrap();
        assert!(second.is_none());
        assert_eq!(list_by_parent(&pool, "p1").await.unwrap().len(), 1);

        // Limits are per parent
        let other = insert_within_limit(&pool, "p2", &named("Cleo"), 1).await.unwrap();
        assert!(other.is_some());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let pool = init_memory_database().await.unwrap();
        for name in ["Ana", "Ben", "Cleo"] {
            insert_within_limit(&pool, "p1", &named(name), 10).await.unwrap();
        }

        let names: Vec<String> = list_by_parent(&pool, "p1")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.first_name)
            .collect();
        assert_eq!(names, vec!["Cleo", "Ben", "Ana"]);
    }

    #[tokio::test]
    async fn test_get_and_delete() {
        let pool = init_memory_database().await.unwrap();
        let child = insert_within_limit(&pool, "p1", &named("Ana"), 1)
            .await
            .unwrap()
            .unwrap();

        let fetched = get(&pool, &child.id).await.unwrap().unwrap();
        assert_eq!(fetched.parent_id, "p1");

        assert!(delete(&pool, &child.id).await.unwrap());
        assert!(get(&pool, &child.id).await.unwrap().is_none());
        assert!(!delete(&pool, &child.id).await.unwrap());
    }
}
