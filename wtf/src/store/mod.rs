//! Glossary record store.
//!
//! Responsibilities:
//! - Keep an append-mostly table of explanations with soft deletion.
//! - Match terms case-insensitively through a single folding rule ([`fold_term`]).
//! - Return multiple explanations for a term in insertion (ascending id) order.
//!
//! Records are never updated in place: `delete` flips the `deleted` flag and
//! `replace` retires the old id and issues a new one.

pub mod sqlite;

pub use sqlite::SqliteGlossary;

use serde::{Deserialize, Serialize};

use crate::error::WtfResult;

/// Store-assigned primary key, strictly increasing and never reused.
pub type ExplanationId = i64;

/// One glossary row, including its soft-delete flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryRecord {
    pub id: ExplanationId,
    pub term: String,
    pub explanation: String,
    pub author: String,
    pub deleted: bool,
}

/// Short lookup row: what the plain `is` lookup shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub term: String,
    pub explanation: String,
}

/// Detailed lookup row: what `detail` shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationDetail {
    pub id: ExplanationId,
    pub term: String,
    pub explanation: String,
    pub author: String,
}

/// Outcome of a successful replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replaced {
    pub term: String,
    pub new_id: ExplanationId,
}

/// Maximum number of rows a lookup may return. `None` is unbounded.
pub type LookupLimit = Option<u32>;

/// The one case-folding rule used for both stored and queried terms.
pub fn fold_term(term: &str) -> String {
    term.to_lowercase()
}

/// Storage-agnostic glossary API consumed by the interpreter and importer.
pub trait GlossaryStore: Send + Sync {
    /// Insert a new live record and return its id.
    fn add(&self, term: &str, explanation: &str, author: &str) -> WtfResult<ExplanationId>;

    /// Live explanations for `term`, ascending id, at most `limit` rows.
    fn find_by_term(&self, term: &str, limit: LookupLimit) -> WtfResult<Vec<Explanation>>;

    /// Like [`GlossaryStore::find_by_term`] but with id and author.
    fn find_by_term_full(&self, term: &str, limit: LookupLimit)
        -> WtfResult<Vec<ExplanationDetail>>;

    /// Term of the live record `id`, or `None` if missing or deleted.
    fn get_term_by_id(&self, id: ExplanationId) -> WtfResult<Option<String>>;

    /// Soft-delete `id`. Missing and already-deleted ids are a no-op.
    fn delete(&self, id: ExplanationId) -> WtfResult<()>;

    /// Retire `id` and add a new record with the same term and `new_explanation`.
    /// Returns `None` without touching anything if `id` is not live.
    fn replace(
        &self,
        id: ExplanationId,
        new_explanation: &str,
        author: &str,
    ) -> WtfResult<Option<Replaced>>;

    /// Any record by id, deleted or not.
    fn get_record(&self, id: ExplanationId) -> WtfResult<Option<GlossaryRecord>>;

    /// Every record ever stored for `term`, deleted ones included, ascending id.
    fn history(&self, term: &str) -> WtfResult<Vec<GlossaryRecord>>;
}
