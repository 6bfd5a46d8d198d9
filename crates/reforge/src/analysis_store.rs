//! Durable storage for completed analyses.
//!
//! One row per analysis id holding the serialized [`AnalysisSummary`] and
//! the proposed [`TargetArchitecture`] as JSON text. `put` overwrites
//! wholesale; there is no versioning. A generation-time architecture
//! override is never written back here.

use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};

use reforge_core::models::{AnalysisRecord, AnalysisSummary, TargetArchitecture};

#[derive(Clone)]
pub struct AnalysisStore {
    pool: SqlitePool,
}

impl AnalysisStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist an analysis record, replacing any prior row with the same id.
    pub async fn put(&self, record: &AnalysisRecord) -> Result<()> {
        let summary =
            serde_json::to_string(&record.summary).context("serialize analysis summary")?;
        let architecture =
            serde_json::to_string(&record.architecture).context("serialize architecture")?;

        sqlx::query(
            "INSERT OR REPLACE INTO analyses (id, summary, architecture, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&record.analysis_id)
        .bind(summary)
        .bind(architecture)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("insert analysis record")?;

        Ok(())
    }

    /// Fetch an analysis record by id. Returns `None` when no row exists.
    pub async fn get(&self, analysis_id: &str) -> Result<Option<AnalysisRecord>> {
        let row = sqlx::query("SELECT summary, architecture FROM analyses WHERE id = ?1")
            .bind(analysis_id)
            .fetch_optional(&self.pool)
            .await
            .context("query analysis record")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let summary_json: String = row.get("summary");
        let architecture_json: String = row.get("architecture");

        let summary: AnalysisSummary =
            serde_json::from_str(&summary_json).context("deserialize analysis summary")?;
        let architecture: TargetArchitecture =
            serde_json::from_str(&architecture_json).context("deserialize architecture")?;

        Ok(Some(AnalysisRecord {
            analysis_id: analysis_id.to_string(),
            summary,
            architecture,
        }))
    }
}
