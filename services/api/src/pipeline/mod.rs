//! In-process aggregation over records fetched from the store
//!
//! A pipeline is a [`Query`] built from plain rows, filtered and explicitly
//! sorted, cut into a [`Page`] by [`paginate`], and then enriched with the
//! [`resolver`] helpers. Only the rows of the requested page are enriched.

use thiserror::Error;

pub mod lookup;
pub mod pagination;
pub mod resolver;

pub use pagination::{Page, paginate};
pub use resolver::Relation;

/// Errors raised by a misconfigured pipeline
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PipelineError {
    /// Pagination was requested without a sort stage
    #[error("Cannot paginate a query without an explicit sort order")]
    Unordered,
}

/// Sort direction for [`Query::sort_by`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Rows flowing through a pipeline, remembering whether they were sorted
#[derive(Debug, Clone)]
pub struct Query<T> {
    rows: Vec<T>,
    ordered: bool,
}

impl<T> Query<T> {
    pub fn from_rows(rows: Vec<T>) -> Self {
        Self {
            rows,
            ordered: false,
        }
    }

    /// Keep only the rows matching `predicate`
    pub fn filter(mut self, predicate: impl FnMut(&T) -> bool) -> Self {
        self.rows.retain(predicate);
        self
    }

    /// Stable sort by `key`; rows with equal keys keep their relative order
    pub fn sort_by<K: Ord>(mut self, mut key: impl FnMut(&T) -> K, direction: SortDirection) -> Self {
        match direction {
            SortDirection::Ascending => self.rows.sort_by_key(key),
            SortDirection::Descending => self.rows.sort_by(|a, b| key(b).cmp(&key(a))),
        }
        self.ordered = true;
        self
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Query<U> {
        Query {
            rows: self.rows.into_iter().map(f).collect(),
            ordered: self.ordered,
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn into_rows(self) -> Vec<T> {
        self.rows
    }
}
