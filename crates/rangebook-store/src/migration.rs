//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    // Get current version
    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {current} is newer than supported version {CURRENT_VERSION}"
        )));
    }

    // Apply migrations
    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    // Ranges, supply metadata and custody agents
    conn.execute_batch(
        r#"
        -- One row per live range, keyed by its first identifier
        CREATE TABLE ranges (
            start INTEGER PRIMARY KEY,        -- first identifier (inclusive)
            stop INTEGER NOT NULL,            -- one past the last identifier
            owner BLOB NOT NULL,              -- 20 bytes, beneficial owner
            custodian BLOB,                   -- 20 bytes, NULL when held directly
            lock_time INTEGER NOT NULL DEFAULT 0,  -- Unix seconds, 0 = unlocked
            tag BLOB NOT NULL,                -- opaque compliance tag

            CHECK (stop > start)
        );

        -- Single metadata row
        CREATE TABLE ledger_meta (
            id INTEGER PRIMARY KEY CHECK (id = 0),
            cursor INTEGER NOT NULL,
            authorized_supply INTEGER NOT NULL,
            total_supply INTEGER NOT NULL,
            digest BLOB,                      -- 32 bytes, NULL until checkpointed
            updated_at INTEGER NOT NULL
        );

        -- Registered custody agents
        CREATE TABLE custodians (
            address BLOB PRIMARY KEY,         -- 20 bytes
            registered_at INTEGER NOT NULL
        );

        -- Holder lookups for reporting
        CREATE INDEX idx_ranges_owner ON ranges(owner, custodian);
        CREATE INDEX idx_ranges_custodian ON ranges(custodian) WHERE custodian IS NOT NULL;
        "#,
    )?;

    Ok(())
}

/// Current time in milliseconds, or zero if the system clock is before 1970.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
