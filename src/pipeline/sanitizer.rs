//! Textual policy gate between generated SQL and the store.
//!
//! This is a fast-fail filter, not a parser. It matches deny-listed keywords
//! as plain substrings, so identifiers such as `insert_date` or clauses such
//! as `OFFSET` are rejected along with genuinely mutating statements. The
//! read-only database role and read-only transaction in the executor remain
//! the authoritative controls.

use thiserror::Error;

use crate::domain::{GeneratedQuery, ValidatedQuery};

/// Default upper bound on generated query length, in characters
pub const DEFAULT_MAX_QUERY_CHARS: usize = 5000;

/// Keyword that must appear somewhere in an acceptable query
pub const READ_KEYWORD: &str = "select";

/// Mutating, administrative and session-control keywords
pub const DENIED_KEYWORDS: &[&str] = &[
    "insert",
    "update",
    "delete",
    "truncate",
    "merge",
    "create",
    "alter",
    "drop",
    "rename",
    "comment",
    "grant",
    "revoke",
    "begin",
    "commit",
    "rollback",
    "savepoint",
    "release",
    "execute",
    "do",
    "set",
    "load",
    "listen",
    "notify",
];

/// Why a generated query was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("query is empty")]
    Empty,

    #[error("query is {len} characters, the limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("query does not contain a read keyword")]
    MissingSelect,

    #[error("query contains denied keyword '{0}'")]
    DeniedKeyword(&'static str),
}

/// Allow-list/deny-list sanitizer
#[derive(Debug, Clone, Copy)]
pub struct QuerySanitizer {
    max_chars: usize,
}

impl Default for QuerySanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_QUERY_CHARS)
    }
}

impl QuerySanitizer {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Decide whether `query` may run. Total and deterministic.
    pub fn check(&self, sql: &str) -> std::result::Result<(), Rejection> {
        if sql.trim().is_empty() {
            return Err(Rejection::Empty);
        }

        let len = sql.chars().count();
        if len > self.max_chars {
            return Err(Rejection::TooLong {
                len,
                max: self.max_chars,
            });
        }

        let lowered = sql.to_lowercase();
        if !lowered.contains(READ_KEYWORD) {
            return Err(Rejection::MissingSelect);
        }

        if let Some(keyword) = DENIED_KEYWORDS
            .iter()
            .find(|keyword| lowered.contains(*keyword))
        {
            return Err(Rejection::DeniedKeyword(*keyword));
        }

        Ok(())
    }

    /// Promote a generated query to a validated one, unchanged, if it passes.
    pub fn sanitize(&self, query: &GeneratedQuery) -> std::result::Result<ValidatedQuery, Rejection> {
        self.check(query.sql())?;
        Ok(ValidatedQuery::from_generated(query))
    }
}
