use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, info};

use super::{
    fold_term, Explanation, ExplanationDetail, ExplanationId, GlossaryRecord, GlossaryStore,
    LookupLimit, Replaced,
};
use crate::error::{WtfError, WtfResult};

// Additive only: every statement must be safe to run against an existing db.
const CREATE_SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS glossary (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    term TEXT NOT NULL,
    term_key TEXT NOT NULL,
    explanation TEXT NOT NULL,
    author TEXT NOT NULL,
    deleted BOOLEAN NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_glossary_term_key ON glossary(term_key, id);
";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// `rusqlite::Connection` is `Send` but not `Sync`; the mutex makes the store
/// shareable across gateway tasks and doubles as the single-writer guard.
struct DbConn(Mutex<Connection>);

impl std::fmt::Debug for DbConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DbConn(<sqlite>)")
    }
}

/// SQLite-backed [`GlossaryStore`].
///
/// Every mutation runs in a `BEGIN IMMEDIATE` transaction, so a crash never
/// leaves a half-written record and concurrent writers are linearized.
/// `replace` does its lookup, delete and insert inside one transaction.
#[derive(Debug)]
pub struct SqliteGlossary {
    conn: DbConn,
    db_path: Option<PathBuf>,
}

impl SqliteGlossary {
    /// Open (or create) the glossary database at `path`.
    pub fn open(path: &Path) -> WtfResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // WAL lets readers in other processes proceed while we write.
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();
        conn.execute_batch(CREATE_SCHEMA_SQL)?;

        info!("[Glossary] Opened DB at {}", path.display());

        Ok(Self {
            conn: DbConn(Mutex::new(conn)),
            db_path: Some(path.to_path_buf()),
        })
    }

    /// Private in-memory database, gone when the store is dropped.
    pub fn open_in_memory() -> WtfResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(CREATE_SCHEMA_SQL)?;
        Ok(Self {
            conn: DbConn(Mutex::new(conn)),
            db_path: None,
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Total number of rows, live and deleted.
    pub fn record_count(&self) -> WtfResult<u64> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(1) FROM glossary", [], |r| r.get(0))?;
        Ok(n as u64)
    }

    fn lock(&self) -> WtfResult<MutexGuard<'_, Connection>> {
        self.conn
            .0
            .lock()
            .map_err(|_| WtfError::LockPoisoned("glossary connection"))
    }

    /// Run `f` inside an immediate transaction; commit only if it succeeds.
    fn write<T>(&self, f: impl FnOnce(&Connection) -> WtfResult<T>) -> WtfResult<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&*tx)?;
        tx.commit()?;
        Ok(out)
    }
}

fn require_text<'a>(field: &str, value: &'a str) -> WtfResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(WtfError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(trimmed)
}

fn sql_limit(limit: LookupLimit) -> i64 {
    // SQLite treats a negative LIMIT as "no limit".
    limit.map(i64::from).unwrap_or(-1)
}

fn insert_record(
    conn: &Connection,
    term: &str,
    explanation: &str,
    author: &str,
) -> WtfResult<ExplanationId> {
    conn.execute(
        "INSERT INTO glossary (term, term_key, explanation, author) VALUES (?1, ?2, ?3, ?4)",
        params![term, fold_term(term), explanation, author],
    )?;
    Ok(conn.last_insert_rowid())
}

fn live_term(conn: &Connection, id: ExplanationId) -> WtfResult<Option<String>> {
    let term = conn
        .query_row(
            "SELECT term FROM glossary WHERE NOT deleted AND id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(term)
}

fn mark_deleted(conn: &Connection, id: ExplanationId) -> WtfResult<usize> {
    let changed = conn.execute(
        "UPDATE glossary SET deleted = 1 WHERE id = ?1 AND NOT deleted",
        params![id],
    )?;
    Ok(changed)
}

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GlossaryRecord> {
    Ok(GlossaryRecord {
        id: row.get(0)?,
        term: row.get(1)?,
        explanation: row.get(2)?,
        author: row.get(3)?,
        deleted: row.get(4)?,
    })
}

impl GlossaryStore for SqliteGlossary {
    fn add(&self, term: &str, explanation: &str, author: &str) -> WtfResult<ExplanationId> {
        let term = require_text("term", term)?;
        let explanation = require_text("explanation", explanation)?;
        require_text("author", author)?;

        let id = self.write(|conn| insert_record(conn, term, explanation, author))?;
        debug!("[Glossary] Inserted #{} for {:?}", id, term);
        Ok(id)
    }

    fn find_by_term(&self, term: &str, limit: LookupLimit) -> WtfResult<Vec<Explanation>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT term, explanation FROM glossary \
             WHERE NOT deleted AND term_key = ?1 \
             ORDER BY id ASC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![fold_term(term), sql_limit(limit)], |row| {
                Ok(Explanation {
                    term: row.get(0)?,
                    explanation: row.get(1)?,
                })
            })
            .and_then(|mapped| mapped.collect::<Result<Vec<_>, _>>())?;
        Ok(rows)
    }

    fn find_by_term_full(
        &self,
        term: &str,
        limit: LookupLimit,
    ) -> WtfResult<Vec<ExplanationDetail>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, term, explanation, author FROM glossary \
             WHERE NOT deleted AND term_key = ?1 \
             ORDER BY id ASC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![fold_term(term), sql_limit(limit)], |row| {
                Ok(ExplanationDetail {
                    id: row.get(0)?,
                    term: row.get(1)?,
                    explanation: row.get(2)?,
                    author: row.get(3)?,
                })
            })
            .and_then(|mapped| mapped.collect::<Result<Vec<_>, _>>())?;
        Ok(rows)
    }

    fn get_term_by_id(&self, id: ExplanationId) -> WtfResult<Option<String>> {
        let conn = self.lock()?;
        live_term(&conn, id)
    }

    fn delete(&self, id: ExplanationId) -> WtfResult<()> {
        let changed = self.write(|conn| mark_deleted(conn, id))?;
        if changed == 0 {
            debug!("[Glossary] Delete of #{} matched no live record", id);
        }
        Ok(())
    }

    fn replace(
        &self,
        id: ExplanationId,
        new_explanation: &str,
        author: &str,
    ) -> WtfResult<Option<Replaced>> {
        let new_explanation = require_text("explanation", new_explanation)?;
        require_text("author", author)?;

        self.write(|conn| {
            let Some(term) = live_term(conn, id)? else {
                return Ok(None);
            };
            mark_deleted(conn, id)?;
            let new_id = insert_record(conn, &term, new_explanation, author)?;
            Ok(Some(Replaced { term, new_id }))
        })
    }

    fn get_record(&self, id: ExplanationId) -> WtfResult<Option<GlossaryRecord>> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                "SELECT id, term, explanation, author, deleted FROM glossary WHERE id = ?1",
                params![id],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn history(&self, term: &str) -> WtfResult<Vec<GlossaryRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, term, explanation, author, deleted FROM glossary \
             WHERE term_key = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![fold_term(term)], record_from_row)
            .and_then(|mapped| mapped.collect::<Result<Vec<_>, _>>())?;
        Ok(rows)
    }
}
