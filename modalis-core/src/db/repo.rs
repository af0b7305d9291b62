//! Database repository layer
//!
//! Provides the insight log and class roster on top of a single SQLite
//! connection. Every write happens under the connection lock, which is what
//! makes appends linearizable.

use crate::error::{Error, Result};
use crate::store::{monotonic_timestamp, new_insight_id, InsightStore, RosterProvider};
use crate::types::*;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

/// Database handle with connection pooling (single connection for now)
///
/// Several handles (or processes) may share one file; appends serialize on
/// SQLite's write lock, waiting up to the configured busy timeout.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::StoreUnavailable(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path)?;

        // WAL lets readers proceed while a chat session appends
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// How long a statement waits on a locked database file before failing.
    ///
    /// The failure surfaces as `StoreUnavailable`; nothing here retries.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.busy_timeout(timeout)?;
        Ok(())
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    // ============================================
    // Insight operations
    // ============================================

    /// Append an insight, assigning its id and a monotonic `created_at`.
    pub fn append_insight(&self, insight: NewInsight) -> Result<Insight> {
        let mut conn = self.conn.lock().unwrap();
        // Write lock up front; a deferred read-to-write upgrade skips busy_timeout
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous: Option<String> = tx
            .query_row(
                "SELECT created_at FROM insights ORDER BY seq DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let previous = previous
            .map(|s| DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc)))
            .transpose()
            .map_err(|e| conversion_error(0, e))?;

        let stored = insight.into_insight(new_insight_id(), monotonic_timestamp(previous))?;

        tx.execute(
            r#"
            INSERT INTO insights (
                id, class_id, student_id, created_at, modality, level,
                strengths, needs, recent_topic, metrics
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                stored.id,
                stored.class_id,
                stored.student_id,
                // Fixed-width stamps keep ORDER BY created_at chronological
                stored.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
                stored.modality.as_str(),
                stored.level.as_str(),
                serde_json::to_string(&stored.strengths)?,
                serde_json::to_string(&stored.needs)?,
                stored.recent_topic,
                stored.metrics.map(|m| serde_json::to_string(&m)).transpose()?,
            ],
        )?;
        tx.commit()?;

        tracing::debug!(
            insight_id = %stored.id,
            class_id = %stored.class_id,
            student_id = %stored.student_id,
            modality = %stored.modality,
            "Insight appended"
        );

        Ok(stored)
    }

    /// All insights for a class, in insertion order
    pub fn list_insights_by_class(&self, class_id: &str) -> Result<Vec<Insight>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM insights
            WHERE class_id = ?
            ORDER BY seq ASC
            "#,
        )?;

        let insights = stmt
            .query_map([class_id], Self::row_to_insight)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(insights)
    }

    /// All insights for one student in a class, in insertion order
    pub fn list_student_insights(&self, class_id: &str, student_id: &str) -> Result<Vec<Insight>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM insights
            WHERE class_id = ?1 AND student_id = ?2
            ORDER BY seq ASC
            "#,
        )?;

        let insights = stmt
            .query_map(params![class_id, student_id], Self::row_to_insight)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(insights)
    }

    /// Most recent insight for a student (last inserted wins on equal stamps)
    pub fn get_latest_insight(&self, class_id: &str, student_id: &str) -> Result<Option<Insight>> {
        let conn = self.conn.lock().unwrap();
        let insight = conn
            .query_row(
                r#"
                SELECT * FROM insights
                WHERE class_id = ?1 AND student_id = ?2
                ORDER BY created_at DESC, seq DESC
                LIMIT 1
                "#,
                params![class_id, student_id],
                Self::row_to_insight,
            )
            .optional()?;
        Ok(insight)
    }

    /// Count insights across all classes
    pub fn count_insights(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(*) FROM insights", [], |r| r.get(0))?;
        Ok(count)
    }

    fn row_to_insight(row: &Row) -> rusqlite::Result<Insight> {
        let created_at_str: String = row.get("created_at")?;
        let modality_str: String = row.get("modality")?;
        let level_str: String = row.get("level")?;
        let strengths_str: String = row.get("strengths")?;
        let needs_str: String = row.get("needs")?;
        let metrics_str: Option<String> = row.get("metrics")?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(4, e))?;
        let modality = modality_str
            .parse::<Modality>()
            .map_err(|e| conversion_error(5, e))?;
        let level = level_str
            .parse::<Level>()
            .map_err(|e| conversion_error(6, e))?;
        let metrics = metrics_str
            .map(|s| serde_json::from_str::<Metrics>(&s))
            .transpose()
            .map_err(|e| conversion_error(10, e))?;

        Ok(Insight {
            id: row.get("id")?,
            class_id: row.get("class_id")?,
            student_id: row.get("student_id")?,
            created_at,
            modality,
            level,
            strengths: serde_json::from_str(&strengths_str).map_err(|e| conversion_error(7, e))?,
            needs: serde_json::from_str(&needs_str).map_err(|e| conversion_error(8, e))?,
            recent_topic: row.get("recent_topic")?,
            metrics,
        })
    }

    // ============================================
    // Roster operations
    // ============================================

    /// Insert a roster entry, or rename it in place if already enrolled.
    ///
    /// New students are appended to the end of the class roster.
    pub fn upsert_roster_entry(&self, entry: &RosterEntry) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO class_members (class_id, student_id, nombre, position)
            VALUES (
                ?1, ?2, ?3,
                COALESCE((SELECT MAX(position) FROM class_members WHERE class_id = ?1), 0) + 1
            )
            ON CONFLICT(class_id, student_id) DO UPDATE SET
                nombre = excluded.nombre
            "#,
            params![entry.class_id, entry.student_id, entry.nombre],
        )?;
        Ok(())
    }

    /// Remove a student from a class roster. Returns whether a row was removed.
    ///
    /// The student's insights are untouched.
    pub fn remove_roster_entry(&self, class_id: &str, student_id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute(
            "DELETE FROM class_members WHERE class_id = ?1 AND student_id = ?2",
            params![class_id, student_id],
        )?;
        Ok(removed > 0)
    }

    /// Roster for a class, in enrollment order
    pub fn get_roster(&self, class_id: &str) -> Result<Vec<RosterEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT class_id, student_id, nombre FROM class_members
            WHERE class_id = ?
            ORDER BY position ASC
            "#,
        )?;

        let entries = stmt
            .query_map([class_id], |row| {
                Ok(RosterEntry {
                    class_id: row.get(0)?,
                    student_id: row.get(1)?,
                    nombre: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

impl InsightStore for Database {
    fn append(&self, insight: NewInsight) -> Result<Insight> {
        self.append_insight(insight)
    }

    fn list_by_class(&self, class_id: &str) -> Result<Vec<Insight>> {
        self.list_insights_by_class(class_id)
    }

    fn list_by_student(&self, class_id: &str, student_id: &str) -> Result<Vec<Insight>> {
        self.list_student_insights(class_id, student_id)
    }
}

impl RosterProvider for Database {
    fn list_roster(&self, class_id: &str) -> Result<Vec<RosterEntry>> {
        self.get_roster(class_id)
    }
}
