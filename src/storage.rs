// src/storage.rs

//! Append-only log of scans and user feedback, backed by SQLite.
//! Nothing in the scanner reads these rows back.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};

use crate::core::models::ScanResult;
use crate::error::{Result, ScanError};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS scan_results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL,
        result TEXT NOT NULL,
        scanned_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS feedback (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_email TEXT,
        message TEXT NOT NULL,
        submitted_at TEXT NOT NULL
    )",
];

/// Longest URL accepted into the scan log.
pub const MAX_URL_LEN: usize = 2083;

#[derive(Debug, Clone, FromRow)]
pub struct ScanRecord {
    pub id: i64,
    pub url: String,
    pub result: String,
    pub scanned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Feedback {
    pub id: i64,
    pub user_email: Option<String>,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the database at `url` and ensures the tables exist.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // In-memory databases are per connection, so keep a single one.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        info!(url, "Database ready.");
        Ok(Self { pool })
    }

    pub async fn record_scan(&self, url: &str, result: &ScanResult) -> Result<i64> {
        if url.len() > MAX_URL_LEN {
            return Err(ScanError::Validation(format!("URL longer than {MAX_URL_LEN} characters")));
        }
        let blob = serde_json::to_string(result)?;
        let id = sqlx::query("INSERT INTO scan_results (url, result, scanned_at) VALUES (?, ?, ?)")
            .bind(url)
            .bind(blob)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        debug!(id, url, "Scan recorded.");
        Ok(id)
    }

    pub async fn record_feedback(&self, user_email: Option<&str>, message: &str) -> Result<i64> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ScanError::Validation("feedback message must not be empty".into()));
        }
        let user_email = user_email.map(str::trim).filter(|e| !e.is_empty());
        let id = sqlx::query("INSERT INTO feedback (user_email, message, submitted_at) VALUES (?, ?, ?)")
            .bind(user_email)
            .bind(message)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        debug!(id, "Feedback recorded.");
        Ok(id)
    }

    pub async fn scan_records(&self) -> Result<Vec<ScanRecord>> {
        Ok(sqlx::query_as::<_, ScanRecord>("SELECT id, url, result, scanned_at FROM scan_results ORDER BY id")
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn feedback(&self) -> Result<Vec<Feedback>> {
        Ok(sqlx::query_as::<_, Feedback>("SELECT id, user_email, message, submitted_at FROM feedback ORDER BY id")
            .fetch_all(&self.pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Section;
    use serde_json::json;

    async fn memory_db() -> Database {
        Database::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn scans_are_appended_with_serialized_result() {
        let db = memory_db().await;
        let result = ScanResult::new(
            "https://example.com",
            vec![(Section::Headers, json!({"status": "success"}))],
            "2024-01-01 00:00:00",
        );

        let first = db.record_scan("https://example.com", &result).await.unwrap();
        let second = db.record_scan("https://example.org", &result).await.unwrap();
        assert!(second > first);

        let rows = db.scan_records().await.unwrap();
        assert_eq!(rows.len(), 2);
        let stored: serde_json::Value = serde_json::from_str(&rows[0].result).unwrap();
        assert_eq!(stored["headers"]["status"], "success");
        assert_eq!(stored["timestamp"], "2024-01-01 00:00:00");
    }

    #[tokio::test]
    async fn feedback_email_is_optional_and_message_required() {
        let db = memory_db().await;
        db.record_feedback(None, "Great tool").await.unwrap();
        db.record_feedback(Some("  "), "Blank email").await.unwrap();
        db.record_feedback(Some("a@example.com"), "Found a bug").await.unwrap();

        let err = db.record_feedback(Some("a@example.com"), "   ").await.unwrap_err();
        assert!(matches!(err, ScanError::Validation(_)));

        let rows = db.feedback().await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].user_email, None);
        assert_eq!(rows[1].user_email, None);
        assert_eq!(rows[2].user_email.as_deref(), Some("a@example.com"));
    }

    #[tokio::test]
    async fn overlong_url_is_rejected() {
        let db = memory_db().await;
        let result = ScanResult::new("u", Vec::new(), "t");
        let url = format!("https://example.com/{}", "a".repeat(MAX_URL_LEN));
        assert!(matches!(db.record_scan(&url, &result).await, Err(ScanError::Validation(_))));
    }
}
