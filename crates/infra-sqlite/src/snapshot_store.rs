// SQLite SnapshotStore Implementation

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use transflow_core::domain::{ClientId, JobSnapshot, JobStatus, PipelinePhase};
use transflow_core::error::{AppError, Result};
use transflow_core::port::SnapshotStore;

// Helper to convert sqlx::Error to AppError with structured information
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "275" => {
                        // SQLITE_CONSTRAINT_CHECK
                        AppError::Database(format!(
                            "Check constraint violation: {} ({})",
                            db_err.message(),
                            code_str
                        ))
                    }
                    "5" => {
                        // SQLITE_BUSY - database is locked
                        AppError::Database(format!(
                            "Database locked (SQLITE_BUSY): {}",
                            db_err.message()
                        ))
                    }
                    "13" => {
                        // SQLITE_FULL - database or disk is full
                        AppError::Database(format!("Database full: {}", db_err.message()))
                    }
                    _ => AppError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Database(format!("Column not found: {}", col))
        }
        // Connection, pool, protocol errors
        _ => AppError::Database(err.to_string()),
    }
}

pub struct SqliteSnapshotStore {
    pool: SqlitePool,
}

impl SqliteSnapshotStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn upsert(&self, snapshot: &JobSnapshot) -> Result<()> {
        // Single statement: readers see either the old row or the new one
        sqlx::query(
            r#"
            INSERT INTO translations (
                client_id, original_text, target_language,
                status, phase, start_time, completion_time, time_remaining,
                packet_count, packets_processed, translated_text,
                stage_a_done, stage_a_output, stage_b_done, stage_b_output
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(client_id) DO UPDATE SET
                original_text = excluded.original_text,
                target_language = excluded.target_language,
                status = excluded.status,
                phase = excluded.phase,
                start_time = excluded.start_time,
                completion_time = excluded.completion_time,
                time_remaining = excluded.time_remaining,
                packet_count = excluded.packet_count,
                packets_processed = excluded.packets_processed,
                translated_text = excluded.translated_text,
                stage_a_done = excluded.stage_a_done,
                stage_a_output = excluded.stage_a_output,
                stage_b_done = excluded.stage_b_done,
                stage_b_output = excluded.stage_b_output
            "#,
        )
        .bind(&snapshot.client_id)
        .bind(&snapshot.original_text)
        .bind(&snapshot.target_language)
        .bind(snapshot.status.as_str())
        .bind(snapshot.phase.map(|p| p.as_str()))
        .bind(snapshot.start_time)
        .bind(snapshot.completion_time)
        .bind(snapshot.time_remaining)
        .bind(snapshot.packet_count as i64)
        .bind(snapshot.packets_processed as i64)
        .bind(&snapshot.translated_text)
        .bind(snapshot.stage_a_done)
        .bind(&snapshot.stage_a_output)
        .bind(snapshot.stage_b_done)
        .bind(&snapshot.stage_b_output)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn get(&self, client_id: &str) -> Result<Option<JobSnapshot>> {
        let row = sqlx::query_as::<_, SnapshotRow>("SELECT * FROM translations WHERE client_id = ?")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(SnapshotRow::into_snapshot).transpose()
    }

    async fn list(&self) -> Result<BTreeMap<ClientId, JobSnapshot>> {
        let rows: Vec<SnapshotRow> =
            sqlx::query_as("SELECT * FROM translations ORDER BY client_id")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| row.into_snapshot().map(|s| (s.client_id.clone(), s)))
            .collect()
    }

    async fn count_by_status(&self, status: JobStatus) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM translations WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn reset(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM translations")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SnapshotRow {
    client_id: String,
    original_text: String,
    target_language: String,
    status: String,
    phase: Option<String>,
    start_time: Option<i64>,
    completion_time: Option<i64>,
    time_remaining: i64,
    packet_count: i64,
    packets_processed: i64,
    translated_text: String,
    stage_a_done: bool,
    stage_a_output: String,
    stage_b_done: bool,
    stage_b_output: String,
}

impl SnapshotRow {
    fn into_snapshot(self) -> Result<JobSnapshot> {
        let status: JobStatus = self.status.parse()?;
        let phase = self
            .phase
            .as_deref()
            .map(str::parse::<PipelinePhase>)
            .transpose()?;

        Ok(JobSnapshot {
            client_id: self.client_id,
            original_text: self.original_text,
            target_language: self.target_language,
            status,
            phase,
            start_time: self.start_time,
            completion_time: self.completion_time,
            time_remaining: self.time_remaining,
            packet_count: self.packet_count.max(0) as usize,
            packets_processed: self.packets_processed.max(0) as usize,
            translated_text: self.translated_text,
            stage_a_done: self.stage_a_done,
            stage_a_output: self.stage_a_output,
            stage_b_done: self.stage_b_done,
            stage_b_output: self.stage_b_output,
        })
    }
}
