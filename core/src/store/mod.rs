//! Persistence of the test list and the per-test procedure lists.
//!
//! Both backends follow the same contract: a missing list reads as empty,
//! malformed content is an error, and an update only persists when the
//! mutation asks for it.

use crate::types::{Procedure, TestName};
use error::StoreError;

pub(crate) mod db;
pub(crate) mod json;

pub use db::DbStore;
pub use json::{JsonStore, read_list, write_list};

pub mod error {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum StoreError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Malformed JSON in {location}: {source}")]
        Json {
            location: String,
            #[source]
            source: serde_json::Error,
        },

        #[error("Database error: {0}")]
        Database(#[from] redb::DatabaseError),

        #[error("Table error: {0}")]
        Table(#[from] redb::TableError),

        #[error("Storage error: {0}")]
        Storage(#[from] redb::StorageError),

        #[error("Transaction error: {0}")]
        Transaction(#[from] redb::TransactionError),

        #[error("Commit error: {0}")]
        Commit(#[from] redb::CommitError),
    }
}

/// Outcome of a list mutation: whether the list must be written back, and
/// the value to hand to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update<R> {
    Keep(R),
    Write(R),
}

impl<R> Update<R> {
    pub fn into_parts(self) -> (bool, R) {
        match self {
            Update::Keep(outcome) => (false, outcome),
            Update::Write(outcome) => (true, outcome),
        }
    }
}

pub trait RecordStore {
    fn tests(&self) -> Result<Vec<TestName>, StoreError>;

    /// Loads the test list, applies `f`, and writes the list back if `f`
    /// returns [`Update::Write`].
    fn update_tests<R, F>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Vec<TestName>) -> Update<R>;

    fn procedures(&self, test: &TestName) -> Result<Vec<Procedure>, StoreError>;

    /// Per-test counterpart of [`RecordStore::update_tests`].
    fn update_procedures<R, F>(&self, test: &TestName, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Vec<Procedure>) -> Update<R>;

    /// Persists an empty procedure list for `test`.
    fn init_procedures(&self, test: &TestName) -> Result<(), StoreError>;

    /// Removes the procedure list of `test`. A missing list is not an error.
    fn remove_procedures(&self, test: &TestName) -> Result<(), StoreError>;
}
