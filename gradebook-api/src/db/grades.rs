//! Grade queries

use gradebook_common::db::Grade;
use gradebook_common::time::{from_storage, now, to_storage};
use gradebook_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const SELECT_GRADE: &str =
    "SELECT id, child_id, subject, value, coef, date, created_at, updated_at FROM grades";

/// Validated fields of a new grade
#[derive(Debug, Clone, PartialEq)]
pub struct NewGrade {
    pub subject: String,
    pub value: f64,
    pub coef: Option<f64>,
    pub date: Option<String>,
}

/// Partial update; `None` leaves the stored field unchanged, so a set `coef`
/// or `date` cannot be cleared
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradeUpdate {
    pub subject: Option<String>,
    pub value: Option<f64>,
    pub coef: Option<f64>,
    pub date: Option<String>,
}

impl GradeUpdate {
    pub fn is_empty(&self) -> bool {
        self.subject.is_none() && self.value.is_none() && self.coef.is_none() && self.date.is_none()
    }
}

fn row_to_grade(row: &SqliteRow) -> Result<Grade> {
    let created_at: String = row.get("created_at");
    let updated_at: Option<String> = row.get("updated_at");

    Ok(Grade {
        id: row.get("id"),
        child_id: row.get("child_id"),
        subject: row.get("subject"),
        value: row.get("value"),
        coef: row.get("coef"),
        date: row.get("date"),
        created_at: from_storage(&created_at)?,
        updated_at: updated_at.as_deref().map(from_storage).transpose()?,
    })
}

pub async fn insert(pool: &SqlitePool, child_id: &str, grade: &NewGrade) -> Result<Grade> {
    let created = Grade {
        id: Uuid::new_v4().to_string(),
        child_id: child_id.to_string(),
        subject: grade.subject.clone(),
        value: grade.value,
        coef: grade.coef,
        date: grade.date.clone(),
        created_at: now(),
        updated_at: None,
    };

    sqlx::query(
        r#"
        INSERT INTO grades (id, child_id, subject, value, coef, date, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&created.id)
    .bind(&created.child_id)
    .bind(&created.subject)
    .bind(created.value)
    .bind(created.coef)
    .bind(&created.date)
    .bind(to_storage(&created.created_at))
    .execute(pool)
    .await?;

    Ok(created)
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<Option<Grade>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_GRADE))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_grade).transpose()
}

/// A child's grades, newest first
pub async fn list_by_child(pool: &SqlitePool, child_id: &str) -> Result<Vec<Grade>> {
    let rows = sqlx::query(&format!(
        "{} WHERE child_id = ? ORDER BY created_at DESC, rowid DESC",
        SELECT_GRADE
    ))
    .bind(child_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_grade).collect()
}

/// Merge the given fields into a stored grade and stamp `updated_at`
///
/// Returns false when the grade does not exist.
pub async fn update(pool: &SqlitePool, id: &str, changes: &GradeUpdate) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE grades
        SET subject = COALESCE(?, subject),
            value = COALESCE(?, value),
            coef = COALESCE(?, coef),
            date = COALESCE(?, date),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&changes.subject)
    .bind(changes.value)
    .bind(changes.coef)
    .bind(&changes.date)
    .bind(to_storage(&now()))
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM grades WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
