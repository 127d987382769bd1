//! Task query engine.
//!
//! A [`FilterPayload`] flows through the stages below, each in its own module:
//!
//! 1. [`scope`] binds the payload to the path workspace and picks the
//!    narrowest locator.
//! 2. [`predicate`] and [`tags`] compile filter rules and the tags block into
//!    SQL fragments.
//! 3. [`assemble`] joins scope, predicates, sort and pagination into one
//!    `SELECT DISTINCT` over tasks.
//! 4. [`group`] buckets the fetched page by the requested key.
//! 5. [`shape`] reduces rows to output records and builds the envelope.
//!
//! Fragments use anonymous `?` placeholders; parameters are kept in text order
//! so fragments can be concatenated freely.

pub mod assemble;
pub mod group;
pub mod payload;
pub mod predicate;
pub mod scope;
pub mod shape;
pub mod sort;
pub mod tags;

pub use assemble::{TaskQuery, build_task_query};
pub use group::{FieldValueLookup, NO_VALUE, group_tasks};
pub use payload::{
    FilterField, FilterPayload, FilterRule, GroupBy, NativeField, Operator, PayloadError, Scope,
    TagsFilter, TagsMatch,
};
pub use shape::{FilterResponse, Group, TaskOut};
pub use sort::{Direction, SortColumn, SortKey, TieBreak};

use rusqlite::types::Value as SqlValue;
use std::sync::atomic::{AtomicU64, Ordering};

/// A SQL fragment and its positional parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Clause {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Clause {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// A fragment without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    /// Wrap as `NOT (<sql>)`.
    pub fn negate(self) -> Self {
        Self {
            sql: format!("NOT ({})", self.sql),
            params: self.params,
        }
    }
}

/// `?, ?, ?` for `n` values.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

static DROPPED_RULES: AtomicU64 = AtomicU64::new(0);

/// Number of filter rules dropped since process start because their
/// field/operator combination is not supported.
pub fn dropped_rules() -> u64 {
    DROPPED_RULES.load(Ordering::Relaxed)
}

pub(crate) fn record_dropped_rule(field: &str, op: Operator, reason: &str) {
    DROPPED_RULES.fetch_add(1, Ordering::Relaxed);
    tracing::warn!(field, op = op.as_str(), reason, "dropping filter rule");
}
