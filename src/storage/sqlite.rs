use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::rusqlite::{params, OpenFlags, OptionalExtension, Transaction, TransactionBehavior};
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::UniverseConfig;
use crate::errors::{StorageError, StorageResult};
use crate::storage::area::{AssetStore, DataStore};

/// SQLite-backed draft and asset storage.
///
/// Drafts live in `universe_data`, assets in `universe_assets`. Every
/// connection is taken from a pool whose acquisition timeout is the bounded
/// wait: a database held by someone else surfaces as [`StorageError::Blocked`]
/// instead of hanging.
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
    connection_timeout: Duration,
    quota: Option<u64>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>, config: &UniverseConfig) -> StorageResult<Self> {
        let busy_timeout = config.busy_timeout;
        let manager = SqliteConnectionManager::file(path.as_ref())
            .with_flags(
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI,
            )
            .with_init(move |c| {
                c.busy_timeout(busy_timeout)?;
                c.pragma_update(None, "journal_mode", "WAL")?;
                c.execute_batch(
                    "CREATE TABLE IF NOT EXISTS universe_data (
                        key TEXT PRIMARY KEY NOT NULL,
                        value TEXT NOT NULL,
                        updated_at INTEGER NOT NULL DEFAULT (strftime('%s','now'))
                    );
                    CREATE TABLE IF NOT EXISTS universe_assets (
                        name TEXT PRIMARY KEY NOT NULL,
                        data BLOB NOT NULL,
                        updated_at INTEGER NOT NULL DEFAULT (strftime('%s','now'))
                    );",
                )?;
                Ok(())
            });

        let pool = Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        Ok(Self {
            pool,
            connection_timeout: config.connection_timeout,
            quota: config.quota_bytes,
        })
    }

    fn conn(&self) -> StorageResult<PooledConnection<SqliteConnectionManager>> {
        // r2d2 only fails `get` when the connection timeout elapses.
        self.pool.get().map_err(|e| {
            log::error!("sqlite: no connection within {:?}: {e}", self.connection_timeout);
            StorageError::Blocked {
                waited: self.connection_timeout,
            }
        })
    }

    /// Fails with `QuotaExceeded` if writing `incoming` bytes (replacing the
    /// draft `key` or the asset `name`) would exceed the quota.
    fn check_quota(
        &self,
        tx: &Transaction<'_>,
        key: Option<&str>,
        name: Option<&str>,
        incoming: usize,
    ) -> StorageResult<()> {
        let Some(quota) = self.quota else {
            return Ok(());
        };
        let used: i64 = tx.query_row(
            "SELECT
                (SELECT COALESCE(SUM(LENGTH(CAST(value AS BLOB))), 0) FROM universe_data WHERE key IS NOT ?1)
              + (SELECT COALESCE(SUM(LENGTH(data)), 0) FROM universe_assets WHERE name IS NOT ?2)",
            params![key, name],
            |row| row.get(0),
        )?;
        let needed = used.max(0) as u64 + incoming as u64;
        if needed > quota {
            return Err(StorageError::QuotaExceeded { needed, quota });
        }
        Ok(())
    }
}

impl DataStore for SqliteStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM universe_data WHERE key=?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        self.check_quota(&tx, Some(key), None, value.len())?;
        tx.execute(
            "INSERT INTO universe_data(key,value) VALUES (?1,?2)
             ON CONFLICT(key) DO UPDATE
             SET value=excluded.value, updated_at=strftime('%s','now')",
            params![key, value],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM universe_data WHERE key=?1", params![key])?;
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM universe_data", [])?;
        Ok(())
    }
}

impl AssetStore for SqliteStore {
    fn put_asset(&self, name: &str, bytes: &[u8]) -> StorageResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        self.check_quota(&tx, None, Some(name), bytes.len())?;
        tx.execute(
            "INSERT INTO universe_assets(name,data) VALUES (?1,?2)
             ON CONFLICT(name) DO UPDATE
             SET data=excluded.data, updated_at=strftime('%s','now')",
            params![name, bytes],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get_asset(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        let conn = self.conn()?;
        let data = conn
            .query_row(
                "SELECT data FROM universe_assets WHERE name=?1",
                params![name],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(data)
    }

    fn list_asset_keys(&self) -> StorageResult<BTreeSet<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT name FROM universe_assets ORDER BY name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut keys = BTreeSet::new();
        for name in rows {
            keys.insert(name?);
        }
        Ok(keys)
    }

    fn remove_asset(&self, name: &str) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM universe_assets WHERE name=?1", params![name])?;
        Ok(())
    }

    fn clear_assets(&self) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM universe_assets", [])?;
        Ok(())
    }
}
