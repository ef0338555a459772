//! SQLite implementation of the SegmentLog trait.
//!
//! This is the durable local log. It uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection};

use logferry_core::{validate_dataset_name, Checksum, Segment};

use crate::error::{LogError, Result};
use crate::migration;
use crate::traits::{LogMeta, SegmentLog};

/// File extension of a SQLite-backed log.
pub const LOG_EXTENSION: &str = "db";

/// SQLite-based segment log.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteLog {
    name: String,
    path: Option<PathBuf>,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLog {
    /// Open (or create) the log for `name` inside `dir`.
    ///
    /// The database lives at `<dir>/<name>.db`. The directory is created if
    /// missing and migrations run on every open.
    pub fn open(dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        validate_dataset_name(name)?;
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let path = dir.join(format!("{}.{}", name, LOG_EXTENSION));
        let mut conn = Connection::open(&path)?;
        migration::migrate(&mut conn)?;

        tracing::debug!(name, path = %path.display(), "opened sqlite log");
        Ok(Self {
            name: name.to_string(),
            path: Some(path),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite log.
    ///
    /// Useful for testing.
    pub fn open_memory(name: &str) -> Result<Self> {
        validate_dataset_name(name)?;
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            name: name.to_string(),
            path: None,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| LogError::Task(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| LogError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

fn head_created_at(conn: &Connection) -> Result<i64> {
    let created_at: i64 = conn.query_row(
        "SELECT COALESCE(MAX(created_at), 0) FROM segments",
        [],
        |row| row.get(0),
    )?;
    Ok(created_at)
}

fn load_records(conn: &Connection, segment_seq: i64) -> Result<Vec<Bytes>> {
    let mut stmt =
        conn.prepare_cached("SELECT payload FROM records WHERE segment_seq = ?1 ORDER BY idx")?;
    let rows = stmt.query_map(params![segment_seq], |row| row.get::<_, Vec<u8>>(0))?;

    let mut records = Vec::new();
    for row in rows {
        records.push(Bytes::from(row?));
    }
    Ok(records)
}

#[async_trait]
impl SegmentLog for SqliteLog {
    fn name(&self) -> &str {
        &self.name
    }

    fn filename(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn merge(&self, segment: &Segment) -> Result<()> {
        let segment = segment.clone();
        let name = self.name.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            let last = head_created_at(&tx)?;
            LogError::ensure_order(last, segment.created_at())?;

            tx.execute(
                "INSERT INTO segments (created_at, checksum, record_count, merged_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    segment.created_at(),
                    segment.checksum().as_bytes().as_slice(),
                    segment.len() as i64,
                    crate::now_millis(),
                ],
            )?;
            let seq = tx.last_insert_rowid();

            {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO records (segment_seq, idx, payload) VALUES (?1, ?2, ?3)",
                )?;
                for (idx, record) in segment.records().iter().enumerate() {
                    stmt.execute(params![seq, idx as i64, record.as_ref()])?;
                }
            }

            tx.commit()?;
            tracing::debug!(
                name = %name,
                created_at = segment.created_at(),
                records = segment.len(),
                "merged segment"
            );
            Ok(())
        })
        .await
    }

    async fn meta(&self) -> Result<LogMeta> {
        self.blocking(|conn| {
            Ok(LogMeta {
                created_at: head_created_at(conn)?,
            })
        })
        .await
    }

    async fn segments(&self) -> Result<Vec<Segment>> {
        self.blocking(|conn| {
            let heads: Vec<(i64, i64, Vec<u8>)> = {
                let mut stmt =
                    conn.prepare("SELECT seq, created_at, checksum FROM segments ORDER BY seq")?;
                let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
                rows.collect::<std::result::Result<_, _>>()?
            };

            let mut segments = Vec::with_capacity(heads.len());
            for (seq, created_at, stored) in heads {
                let segment = Segment::new(created_at, load_records(conn, seq)?);
                let stored = Checksum::try_from(stored.as_slice()).map_err(|_| {
                    LogError::Corrupt(format!("segment {} has a malformed checksum", created_at))
                })?;
                if segment.checksum() != stored {
                    return Err(LogError::Corrupt(format!(
                        "segment {} does not match its checksum",
                        created_at
                    )));
                }
                segments.push(segment);
            }
            Ok(segments)
        })
        .await
    }

    async fn segment_count(&self) -> Result<u64> {
        self.blocking(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM segments", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logferry_core::SegmentBuilder;

    fn segment(created_at: i64) -> Segment {
        SegmentBuilder::new(created_at)
            .record(format!("row-a-{}", created_at).into_bytes())
            .record(format!("row-b-{}", created_at).into_bytes())
            .seal()
    }

    #[tokio::test]
    async fn test_merge_and_read_back() {
        let log = SqliteLog::open_memory("ds").unwrap();
        log.merge(&segment(100)).await.unwrap();
        log.merge(&segment(200)).await.unwrap();

        assert_eq!(log.meta().await.unwrap(), LogMeta { created_at: 200 });
        assert_eq!(log.segment_count().await.unwrap(), 2);
        assert_eq!(log.segments().await.unwrap(), vec![segment(100), segment(200)]);
    }

    #[tokio::test]
    async fn test_out_of_order_leaves_log_unchanged() {
        let log = SqliteLog::open_memory("ds").unwrap();
        log.merge(&segment(200)).await.unwrap();

        let err = log.merge(&segment(200)).await.unwrap_err();
        assert!(matches!(err, LogError::OutOfOrder { last: 200, got: 200 }));
        assert_eq!(log.segment_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_open_names_file_after_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let log = SqliteLog::open(dir.path().join("nested"), "orders").unwrap();

        let expected = dir.path().join("nested").join("orders.db");
        assert_eq!(log.filename(), Some(expected.as_path()));
        assert!(expected.exists());
    }

    #[tokio::test]
    async fn test_reopen_preserves_head() {
        let dir = tempfile::tempdir().unwrap();
        {
            let log = SqliteLog::open(dir.path(), "ds").unwrap();
            log.merge(&segment(100)).await.unwrap();
            log.merge(&segment(300)).await.unwrap();
        }

        let log = SqliteLog::open(dir.path(), "ds").unwrap();
        assert_eq!(log.meta().await.unwrap().created_at, 300);
        assert_eq!(log.segments().await.unwrap().len(), 2);
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(matches!(
            SqliteLog::open_memory(""),
            Err(LogError::Validation(_))
        ));
    }
}
