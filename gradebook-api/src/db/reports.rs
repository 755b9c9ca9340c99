//! AI report queries

use gradebook_common::db::{AiReport, RiskLevel};
use gradebook_common::time::{from_storage, now, to_storage};
use gradebook_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

fn row_to_report(row: &SqliteRow) -> Result<AiReport> {
    let analysis: String = row.get("analysis");
    let risk_level: String = row.get("risk_level");
    let created_at: String = row.get("created_at");

    Ok(AiReport {
        id: row.get("id"),
        child_id: row.get("child_id"),
        analysis: serde_json::from_str(&analysis)
            .map_err(|e| Error::CorruptRecord(format!("Report analysis: {}", e)))?,
        risk_level: risk_level
            .parse()
            .map_err(|_| Error::CorruptRecord(format!("Unknown risk level: {}", risk_level)))?,
        created_at: from_storage(&created_at)?,
    })
}

pub async fn insert(
    pool: &SqlitePool,
    child_id: &str,
    analysis: &serde_json::Value,
    risk_level: RiskLevel,
) -> Result<AiReport> {
    let report = AiReport {
        id: Uuid::new_v4().to_string(),
        child_id: child_id.to_string(),
        analysis: analysis.clone(),
        risk_level,
        created_at: now(),
    };

    sqlx::query(
        r#"
        INSERT INTO ai_reports (id, child_id, analysis, risk_level, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&report.id)
    .bind(&report.child_id)
    .bind(report.analysis.to_string())
    .bind(report.risk_level.as_str())
    .bind(to_storage(&report.created_at))
    .execute(pool)
    .await?;

    Ok(report)
}

/// A child's reports, newest first
pub async fn list_by_child(pool: &SqlitePool, child_id: &str) -> Result<Vec<AiReport>> {
    let rows = sqlx::query(
        "SELECT id, child_id, analysis, risk_level, created_at FROM ai_reports \
         WHERE child_id = ? ORDER BY created_at DESC, rowid DESC",
    )
    .bind(child_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_report).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::children::{insert_within_limit, NewChild};
    use gradebook_common::db::init_memory_database;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_list_reports() {
        let pool = init_memory_database().await.unwrap();
        let child = insert_within_limit(
            &pool,
            "p1",
            &NewChild {
                first_name: "Ana".to_string(),
                ..Default::default()
            },
            1,
        )
        .await
        .unwrap()
        .unwrap();

        insert(&pool, &child.id, &json!({"overview": {"summary": "first"}}), RiskLevel::Low)
            .await
            .unwrap();
        insert(&pool, &child.id, &json!({"overview": {"summary": "second"}}), RiskLevel::High)
            .await
            .unwrap();

        let reports = list_by_child(&pool, &child.id).await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].analysis["overview"]["summary"], "second");
        assert_eq!(reports[0].risk_level, RiskLevel::High);
        assert_eq!(reports[1].risk_level, RiskLevel::Low);
    }
}
