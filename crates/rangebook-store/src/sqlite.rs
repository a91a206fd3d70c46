//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for Rangebook. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::debug;

use rangebook_core::{Address, Range, RangeChange, StateDigest, Tag};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{LedgerMeta, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Task(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

const RANGE_COLUMNS: &str = "start, stop, owner, custodian, lock_time, tag";

// Helper to convert a row to Range
fn row_to_range(row: &rusqlite::Row<'_>) -> rusqlite::Result<Range> {
    let owner: Vec<u8> = row.get("owner")?;
    let custodian: Option<Vec<u8>> = row.get("custodian")?;
    let tag: Vec<u8> = row.get("tag")?;

    Ok(Range {
        start: row.get("start")?,
        stop: row.get("stop")?,
        owner: blob_to_address(&owner, 2, "owner")?,
        custodian: custodian
            .map(|b| blob_to_address(&b, 3, "custodian"))
            .transpose()?,
        lock_time: row.get("lock_time")?,
        tag: Tag::new(tag),
    })
}

fn blob_to_address(bytes: &[u8], index: usize, column: &str) -> rusqlite::Result<Address> {
    Address::try_from(bytes)
        .map_err(|_| rusqlite::Error::InvalidColumnType(index, column.into(), Type::Blob))
}

fn put_range(tx: &Transaction<'_>, range: &Range) -> Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT OR REPLACE INTO ranges (start, stop, owner, custodian, lock_time, tag)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    stmt.execute(params![
        range.start,
        range.stop,
        range.owner.as_bytes().as_slice(),
        range.custodian.as_ref().map(|c| c.as_bytes().to_vec()),
        range.lock_time,
        range.tag.as_bytes(),
    ])?;
    Ok(())
}

fn write_meta(tx: &Transaction<'_>, meta: &LedgerMeta) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO ledger_meta
            (id, cursor, authorized_supply, total_supply, digest, updated_at)
         VALUES (0, ?1, ?2, ?3, ?4, ?5)",
        params![
            meta.cursor,
            meta.authorized_supply,
            meta.total_supply,
            meta.digest.map(|d| d.0.to_vec()),
            now_millis(),
        ],
    )?;
    Ok(())
}

#[async_trait]
impl Store for SqliteStore {
    async fn load_ranges(&self) -> Result<Vec<Range>> {
        self.run(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {RANGE_COLUMNS} FROM ranges ORDER BY start"))?;
            let ranges = stmt
                .query_map([], row_to_range)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ranges)
        })
        .await
    }

    async fn load_meta(&self) -> Result<Option<LedgerMeta>> {
        self.run(|conn| {
            let row = conn
                .query_row(
                    "SELECT cursor, authorized_supply, total_supply, digest
                     FROM ledger_meta WHERE id = 0",
                    [],
                    |row| {
                        let cursor: u64 = row.get(0)?;
                        let authorized_supply: u64 = row.get(1)?;
                        let total_supply: u64 = row.get(2)?;
                        let digest: Option<Vec<u8>> = row.get(3)?;
                        Ok((cursor, authorized_supply, total_supply, digest))
                    },
                )
                .optional()?;

            let Some((cursor, authorized_supply, total_supply, digest)) = row else {
                return Ok(None);
            };
            let digest = match digest {
                Some(bytes) => {
                    let arr: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
                        StoreError::InvalidData(format!("digest of {} bytes", b.len()))
                    })?;
                    Some(StateDigest::from_bytes(arr))
                }
                None => None,
            };

            Ok(Some(LedgerMeta {
                cursor,
                authorized_supply,
                total_supply,
                digest,
            }))
        })
        .await
    }

    async fn load_custodians(&self) -> Result<Vec<Address>> {
        self.run(|conn| {
            let mut stmt = conn.prepare("SELECT address FROM custodians ORDER BY address")?;
            let blobs = stmt
                .query_map([], |row| row.get::<_, Vec<u8>>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            blobs
                .iter()
                .map(|b| blob_to_address(b, 0, "address").map_err(StoreError::from))
                .collect()
        })
        .await
    }

    async fn set_custodian(&self, agent: &Address, registered: bool) -> Result<()> {
        let agent = *agent;
        self.run(move |conn| {
            if registered {
                conn.execute(
                    "INSERT OR IGNORE INTO custodians (address, registered_at) VALUES (?1, ?2)",
                    params![agent.as_bytes().as_slice(), now_millis()],
                )?;
            } else {
                conn.execute(
                    "DELETE FROM custodians WHERE address = ?1",
                    params![agent.as_bytes().as_slice()],
                )?;
            }
            Ok(())
        })
        .await
    }

    async fn commit(&self, changes: &[RangeChange], meta: &LedgerMeta) -> Result<()> {
        let changes = changes.to_vec();
        let meta = *meta;

        self.run(move |conn| {
            let tx = conn.transaction()?;
            for change in &changes {
                match change {
                    RangeChange::Put(range) => put_range(&tx, range)?,
                    RangeChange::Delete(start) => {
                        tx.prepare_cached("DELETE FROM ranges WHERE start = ?1")?
                            .execute(params![start])?;
                    }
                }
            }
            write_meta(&tx, &meta)?;
            tx.commit()?;

            debug!(changes = changes.len(), cursor = meta.cursor, "committed");
            Ok(())
        })
        .await
    }

}
