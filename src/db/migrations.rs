// src/db/migrations.rs
//
// Schema versioning for the library database
//
// PRINCIPLES:
// - Every schema change is a numbered, embedded SQL script
// - Pending scripts run in order, each inside its own transaction
// - A database newer than this build is refused, never touched
// - Safe to call on every startup

use rusqlite::{params, Connection};

use crate::error::{AppError, AppResult};

/// Embedded migration scripts, oldest first
const MIGRATIONS: &[(i32, &str)] = &[(1, include_str!("../../schema.sql"))];

/// Highest version this build understands
pub fn latest_schema_version() -> i32 {
    MIGRATIONS.last().map(|(version, _)| *version).unwrap_or(0)
}

/// Bring the schema up to date. Returns the number of scripts applied.
pub fn initialize_database(conn: &Connection) -> AppResult<usize> {
    let current = schema_version(conn)?;
    let latest = latest_schema_version();

    if current > latest {
        return Err(AppError::Other(format!(
            "Library database is at schema {} but this build only knows {}",
            current, latest
        )));
    }

    let mut applied = 0;
    for (version, script) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        conn.execute_batch("BEGIN IMMEDIATE")?;
        let outcome = conn.execute_batch(script).and_then(|_| {
            conn.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
                params![version],
            )
        });
        match outcome {
            Ok(_) => conn.execute_batch("COMMIT")?,
            Err(e) => {
                conn.execute_batch("ROLLBACK")?;
                return Err(AppError::Other(format!(
                    "Schema migration {} failed: {}",
                    version, e
                )));
            }
        }
        applied += 1;
    }
    Ok(applied)
}

/// 0 for a fresh database
fn schema_version(conn: &Connection) -> AppResult<i32> {
    let has_table: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
        [],
        |row| row.get(0),
    )?;
    if !has_table {
        return Ok(0);
    }

    let version: Option<i32> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(version.unwrap_or(0))
}

/// Run SQLite's integrity check
pub fn verify_database_integrity(conn: &Connection) -> AppResult<()> {
    let result: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
    if result != "ok" {
        return Err(AppError::Other(format!(
            "Library database failed its integrity check: {}",
            result
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::create_test_connection;

    #[test]
    fn test_fresh_database_is_migrated() {
        let conn = create_test_connection().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);

        assert_eq!(initialize_database(&conn).unwrap(), 1);
        assert_eq!(schema_version(&conn).unwrap(), latest_schema_version());

        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='library_entries')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(exists);
    }

    #[test]
    fn test_second_run_applies_nothing() {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();
        assert_eq!(initialize_database(&conn).unwrap(), 0);
    }

    #[test]
    fn test_newer_database_is_refused() {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();
        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (99, datetime('now'))",
            [],
        )
        .unwrap();

        assert!(initialize_database(&conn).is_err());
    }

    #[test]
    fn test_score_check_constraint() {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO library_entries (id, title, score, status, last_updated)
             VALUES ('1', 'Trigun', 11, 'watching', datetime('now'))",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_status_check_rejects_on_hold() {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO library_entries (id, title, status, last_updated)
             VALUES ('1', 'Trigun', 'on_hold', datetime('now'))",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_integrity_check() {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();
        verify_database_integrity(&conn).unwrap();
    }
}
