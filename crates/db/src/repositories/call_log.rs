use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use loadline_core::{
    CallLogEntry, CallLogId, CallLogSink, CallOutcomeNotice, LoadId, NewCallLog, RepositoryError,
};

use super::CallLogRepository;
use crate::DbPool;

const CALL_LOG_COLUMNS: &str =
    "call_id, load_id, call_started_at, sentiment, outcome, round_count";

pub struct SqlCallLogRepository {
    pool: DbPool,
}

impl SqlCallLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn unavailable(error: sqlx::Error) -> RepositoryError {
    RepositoryError::Unavailable(error.to_string())
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<CallLogEntry, RepositoryError> {
    let decode = |e: sqlx::Error| RepositoryError::Decode(e.to_string());

    let started_at_raw: String = row.try_get("call_started_at").map_err(decode)?;
    let call_started_at = DateTime::parse_from_rfc3339(&started_at_raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|error| {
            RepositoryError::Decode(format!("call_started_at: `{started_at_raw}`: {error}"))
        })?;
    let round_count: Option<i64> = row.try_get("round_count").map_err(decode)?;

    Ok(CallLogEntry {
        call_id: CallLogId(row.try_get("call_id").map_err(decode)?),
        load_id: LoadId(row.try_get("load_id").map_err(decode)?),
        call_started_at,
        sentiment: row.try_get("sentiment").map_err(decode)?,
        outcome: row.try_get("outcome").map_err(decode)?,
        round_count: round_count.map(|count| count as u32),
    })
}

#[async_trait]
impl CallLogRepository for SqlCallLogRepository {
    async fn create(&self, new_entry: NewCallLog) -> Result<CallLogEntry, RepositoryError> {
        let entry = CallLogEntry {
            call_id: CallLogId(Uuid::new_v4().to_string()),
            load_id: new_entry.load_id,
            call_started_at: new_entry.call_started_at,
            sentiment: new_entry.sentiment,
            outcome: new_entry.outcome,
            round_count: new_entry.round_count,
        };

        sqlx::query(
            "INSERT INTO call_logs (call_id, load_id, call_started_at, sentiment, outcome, round_count)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.call_id.0)
        .bind(&entry.load_id.0)
        .bind(entry.call_started_at.to_rfc3339())
        .bind(&entry.sentiment)
        .bind(&entry.outcome)
        .bind(entry.round_count.map(i64::from))
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(entry)
    }

    async fn find_by_id(
        &self,
        call_id: &CallLogId,
    ) -> Result<Option<CallLogEntry>, RepositoryError> {
        let row =
            sqlx::query(&format!("SELECT {CALL_LOG_COLUMNS} FROM call_logs WHERE call_id = ?"))
                .bind(&call_id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(unavailable)?;

        match row {
            Some(ref r) => Ok(Some(row_to_entry(r)?)),
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<CallLogEntry>, u64), RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM call_logs")
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)?;

        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(&format!(
            "SELECT {CALL_LOG_COLUMNS} FROM call_logs
             ORDER BY call_started_at DESC
             LIMIT ? OFFSET ?",
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        let entries = rows.iter().map(row_to_entry).collect::<Result<Vec<_>, _>>()?;
        Ok((entries, total as u64))
    }

    async fn fetch_recent(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<CallLogEntry>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = match limit {
            Some(limit) => {
                sqlx::query(&format!(
                    "SELECT {CALL_LOG_COLUMNS} FROM call_logs
                     ORDER BY call_started_at DESC
                     LIMIT ?",
                ))
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {CALL_LOG_COLUMNS} FROM call_logs ORDER BY call_started_at DESC",
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(unavailable)?;

        rows.iter().map(row_to_entry).collect()
    }
}

#[async_trait]
impl CallLogSink for SqlCallLogRepository {
    async fn record(&self, notice: CallOutcomeNotice) -> Result<(), RepositoryError> {
        self.create(NewCallLog {
            load_id: notice.load_id,
            call_started_at: Utc::now(),
            sentiment: None,
            outcome: notice.outcome.as_str().to_string(),
            round_count: Some(notice.round_count),
        })
        .await
        .map(|_| ())
    }
}
