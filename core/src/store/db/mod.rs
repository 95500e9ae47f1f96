//! redb-backed store.
//!
//! Lists are kept as JSON strings keyed by test name, in the same shape as
//! the shared-folder files. Every update runs inside one write transaction,
//! so concurrent writers are serialized instead of overwriting each other.

use crate::store::error::StoreError;
use crate::store::{RecordStore, Update};
use crate::types::{Config, Procedure, TestName};
use redb::{ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

type JsonTable = TableDefinition<'static, &'static str, &'static str>;

/// Registry table: &str → JSON string
const REGISTRY_TABLE: JsonTable = TableDefinition::new("registry");

/// Procedures table: test name → JSON array of procedures
const PROCEDURES_TABLE: JsonTable = TableDefinition::new("procedures");

/// Registry key holding the test list.
const REGISTRY_KEY_TESTS: &str = "tests";

pub struct DbStore {
    db: redb::Database,
}

impl DbStore {
    /// Creates or opens the database at [`Config::db_path`].
    pub fn open(config: &Config) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&config.shared_root)?;

        let db = redb::Database::create(config.db_path())?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(REGISTRY_TABLE)?;
            let _ = write_txn.open_table(PROCEDURES_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    fn decode<T: DeserializeOwned>(key: &str, raw: Option<String>) -> Result<Vec<T>, StoreError> {
        let Some(raw) = raw else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|source| StoreError::Json {
            location: format!("database entry '{key}'"),
            source,
        })
    }

    fn encode<T: Serialize>(key: &str, items: &[T]) -> Result<String, StoreError> {
        serde_json::to_string(items).map_err(|source| StoreError::Json {
            location: format!("database entry '{key}'"),
            source,
        })
    }

    fn read_list<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> Result<Vec<T>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        let raw = table.get(key)?.map(|guard| guard.value().to_string());
        Self::decode(key, raw)
    }

    fn update_list<T, R, F>(&self, table: JsonTable, key: &str, f: F) -> Result<R, StoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>) -> Update<R>,
    {
        let write_txn = self.db.begin_write()?;

        let (write, outcome) = {
            let mut table = write_txn.open_table(table)?;
            let raw = table.get(key)?.map(|guard| guard.value().to_string());
            let mut items = Self::decode(key, raw)?;

            let (write, outcome) = f(&mut items).into_parts();
            if write {
                let encoded = Self::encode(key, &items)?;
                table.insert(key, encoded.as_str())?;
            }
            (write, outcome)
        };

        if write {
            write_txn.commit()?;
            debug!(key, "database entry written");
        } else {
            write_txn.abort()?;
        }
        Ok(outcome)
    }
}

impl RecordStore for DbStore {
    fn tests(&self) -> Result<Vec<TestName>, StoreError> {
        self.read_list(REGISTRY_TABLE, REGISTRY_KEY_TESTS)
    }

    fn update_tests<R, F>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Vec<TestName>) -> Update<R>,
    {
        self.update_list(REGISTRY_TABLE, REGISTRY_KEY_TESTS, f)
    }

    fn procedures(&self, test: &TestName) -> Result<Vec<Procedure>, StoreError> {
        self.read_list(PROCEDURES_TABLE, test.as_str())
    }

    fn update_procedures<R, F>(&self, test: &TestName, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Vec<Procedure>) -> Update<R>,
    {
        self.update_list(PROCEDURES_TABLE, test.as_str(), f)
    }

    fn init_procedures(&self, test: &TestName) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PROCEDURES_TABLE)?;
            table.insert(test.as_str(), "[]")?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove_procedures(&self, test: &TestName) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PROCEDURES_TABLE)?;
            table.remove(test.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
