//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: insight log
    r#"
    -- Append-only. `seq` is the insertion order and breaks created_at ties.
    CREATE TABLE insights (
        seq              INTEGER PRIMARY KEY AUTOINCREMENT,
        id               TEXT NOT NULL UNIQUE,
        class_id         TEXT NOT NULL,
        student_id       TEXT NOT NULL,
        created_at       DATETIME NOT NULL,
        modality         TEXT NOT NULL,      -- 'visual', 'auditory', 'reading', 'kinesthetic', 'mixed'
        level            TEXT NOT NULL,      -- 'basico', 'intermedio', 'avanzado'
        strengths        JSON NOT NULL,
        needs            JSON NOT NULL,
        recent_topic     TEXT,
        metrics          JSON                -- {analisis, reflexion, sintesis}
    );

    CREATE INDEX idx_insights_class ON insights(class_id, seq);
    CREATE INDEX idx_insights_student ON insights(class_id, student_id, seq);
    "#,
    // Version 2: class roster
    r#"
    CREATE TABLE class_members (
        class_id         TEXT NOT NULL,
        student_id       TEXT NOT NULL,
        nombre           TEXT NOT NULL,
        position         INTEGER NOT NULL,   -- roster order within the class

        PRIMARY KEY (class_id, student_id)
    );

    CREATE INDEX idx_class_members_order ON class_members(class_id, position);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute_batch(&format!("PRAGMA user_version = {}", version))?;
        }
    }

    Ok(())
}
