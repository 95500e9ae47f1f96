//! Test and procedure registry over a [`RecordStore`].

use crate::changes::{self, Refresh, Snapshot};
use crate::core::attachments::AttachmentStorage;
use crate::store::error::StoreError;
use crate::store::{DbStore, JsonStore, RecordStore, Update};
use crate::types::{
    Config, FileRef, Link, Procedure, ProcedureEdit, ProcedureId, TestName, TestNameError,
    UrlMapper,
};
use error::ProcLabError;
use std::path::Path;
use tracing::{info, warn};

pub(crate) mod attachments;

pub use attachments::StoredAttachment;
pub use attachments::error::AttachmentError;

pub mod error {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum ProcLabError {
        #[error("Store error: {0}")]
        Store(#[from] StoreError),

        #[error("Attachment error: {0}")]
        Attachment(#[from] AttachmentError),

        #[error("Invalid test name: {0}")]
        InvalidTestName(#[from] TestNameError),

        #[error("Procedure not found: {0}")]
        ProcedureNotFound(ProcedureId),
    }
}

pub struct ProcLabCore<S> {
    store: S,
    attachments: AttachmentStorage,
    url_mapper: Option<UrlMapper>,
}

impl ProcLabCore<JsonStore> {
    /// Opens the JSON files in the shared folder.
    pub fn open_json(config: Config) -> Result<Self, ProcLabError> {
        let store = JsonStore::open(config.clone())?;
        Ok(Self::with_store(store, &config))
    }
}

impl ProcLabCore<DbStore> {
    /// Opens the redb database in the shared folder.
    pub fn open_db(config: Config) -> Result<Self, ProcLabError> {
        let store = DbStore::open(&config)?;
        Ok(Self::with_store(store, &config))
    }
}

impl<S: RecordStore> ProcLabCore<S> {
    pub fn with_store(store: S, config: &Config) -> Self {
        Self {
            store,
            attachments: AttachmentStorage {
                procedures_path: config.procedures_path(),
            },
            url_mapper: config.url_mapper.clone(),
        }
    }
}

/// Test operations.
impl<S: RecordStore> ProcLabCore<S> {
    pub fn tests(&self) -> Result<Vec<TestName>, ProcLabError> {
        Ok(self.store.tests()?)
    }

    /// Adds a test and creates its empty procedure list.
    ///
    /// Returns `false` without touching storage if `name` is blank or the
    /// test already exists.
    pub fn add_test(&mut self, name: &str) -> Result<bool, ProcLabError> {
        if name.trim().is_empty() {
            return Ok(false);
        }
        let test = TestName::try_from(name)?;

        let added = self.store.update_tests(|tests| {
            if tests.contains(&test) {
                Update::Keep(false)
            } else {
                tests.push(test.clone());
                Update::Write(true)
            }
        })?;

        if added {
            self.store.init_procedures(&test)?;
            info!(test = %test, "test added");
        }
        Ok(added)
    }

    /// Removes a test and its procedure list.
    ///
    /// Returns `false` if the test does not exist. Failing to remove the
    /// procedure list (e.g. a file held open elsewhere) is logged and
    /// otherwise ignored.
    pub fn delete_test(&mut self, test: &TestName) -> Result<bool, ProcLabError> {
        let removed = self.store.update_tests(|tests| {
            let before = tests.len();
            tests.retain(|t| t != test);
            if tests.len() == before {
                Update::Keep(false)
            } else {
                Update::Write(true)
            }
        })?;

        if removed {
            if let Err(e) = self.store.remove_procedures(test) {
                warn!(test = %test, error = %e, "could not remove procedure list");
            }
            info!(test = %test, "test deleted");
        }
        Ok(removed)
    }
}

/// Procedure operations.
impl<S: RecordStore> ProcLabCore<S> {
    pub fn procedures(&self, test: &TestName) -> Result<Vec<Procedure>, ProcLabError> {
        Ok(self.store.procedures(test)?)
    }

    /// Appends a procedure. Returns `None` without touching storage if
    /// `text` is blank.
    pub fn add_procedure(
        &mut self,
        test: &TestName,
        text: &str,
        link: Link,
    ) -> Result<Option<ProcedureId>, ProcLabError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let procedure = Procedure::new(text, link);
        let id = procedure.id;

        self.store.update_procedures(test, |procedures| {
            procedures.push(procedure);
            assign_missing_ids(procedures);
            Update::Write(())
        })?;

        info!(test = %test, "procedure added");
        Ok(id)
    }

    /// Edits the procedure at `index`. Returns `false` if the index is out of
    /// bounds.
    pub fn edit_procedure(
        &mut self,
        test: &TestName,
        index: usize,
        edit: ProcedureEdit,
    ) -> Result<bool, ProcLabError> {
        let edited = self.store.update_procedures(test, |procedures| {
            let Some(procedure) = procedures.get_mut(index) else {
                return Update::Keep(false);
            };
            edit.apply(procedure);
            assign_missing_ids(procedures);
            Update::Write(true)
        })?;

        if edited {
            info!(test = %test, index, "procedure edited");
        }
        Ok(edited)
    }

    /// Removes the procedure at `index`. Returns `false` if the index is out
    /// of bounds.
    pub fn delete_procedure(&mut self, test: &TestName, index: usize) -> Result<bool, ProcLabError> {
        let deleted = self.store.update_procedures(test, |procedures| {
            if index >= procedures.len() {
                return Update::Keep(false);
            }
            procedures.remove(index);
            assign_missing_ids(procedures);
            Update::Write(true)
        })?;

        if deleted {
            info!(test = %test, index, "procedure deleted");
        }
        Ok(deleted)
    }

    /// Edits the procedure with the given id, wherever it currently sits.
    pub fn edit_procedure_by_id(
        &mut self,
        test: &TestName,
        id: ProcedureId,
        edit: ProcedureEdit,
    ) -> Result<(), ProcLabError> {
        let found = self.store.update_procedures(test, |procedures| {
            let Some(procedure) = procedures.iter_mut().find(|p| p.id == Some(id)) else {
                return Update::Keep(false);
            };
            edit.apply(procedure);
            assign_missing_ids(procedures);
            Update::Write(true)
        })?;

        if !found {
            return Err(ProcLabError::ProcedureNotFound(id));
        }
        info!(test = %test, %id, "procedure edited");
        Ok(())
    }

    /// Removes the procedure with the given id and returns it.
    pub fn delete_procedure_by_id(
        &mut self,
        test: &TestName,
        id: ProcedureId,
    ) -> Result<Procedure, ProcLabError> {
        let removed = self.store.update_procedures(test, |procedures| {
            let Some(index) = procedures.iter().position(|p| p.id == Some(id)) else {
                return Update::Keep(None);
            };
            let removed = procedures.remove(index);
            assign_missing_ids(procedures);
            Update::Write(Some(removed))
        })?;

        let removed = removed.ok_or(ProcLabError::ProcedureNotFound(id))?;
        info!(test = %test, %id, "procedure deleted");
        Ok(removed)
    }
}

/// Attachment operations.
impl<S: RecordStore> ProcLabCore<S> {
    /// Copies `source` into the shared folder and returns a link to the copy.
    ///
    /// The link carries the remote URL when a URL mapping is configured.
    pub fn attach_file(&mut self, test: &TestName, source: &Path) -> Result<Link, ProcLabError> {
        let stored = self.attachments.store(test, source)?;
        let path = stored.path.to_string_lossy().into_owned();
        let url = self.url_mapper.as_ref().map(|mapper| mapper.map(&path));
        info!(test = %test, file = %stored.file_name, size = stored.size, "file attached");

        Ok(Link::File(FileRef {
            path,
            name: stored.file_name,
            url,
        }))
    }

    /// Maps a local path with the configured URL mapping, if any.
    pub fn remote_url(&self, local_path: &str) -> Option<String> {
        self.url_mapper.as_ref().map(|mapper| mapper.map(local_path))
    }
}

/// Refresh operations.
impl<S: RecordStore> ProcLabCore<S> {
    /// Reloads the procedures of `test` and flags those not in `previous`.
    pub fn refresh(&self, test: &TestName, previous: &Snapshot) -> Result<Refresh, ProcLabError> {
        let current = self.store.procedures(test)?;
        Ok(changes::detect(previous, current))
    }
}

/// Entries loaded from lists written before ids existed get one on the next
/// write of their list.
fn assign_missing_ids(procedures: &mut [Procedure]) {
    for procedure in procedures.iter_mut().filter(|p| p.id.is_none()) {
        procedure.id = Some(ProcedureId::new());
    }
}

#[cfg(test)]
mod tests;
