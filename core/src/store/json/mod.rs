//! Flat JSON files in the shared folder.
//!
//! Layout under `shared_root`:
//! - `tests.json`: array of test names
//! - `TestProcedures/<test>_procedures.json`: array of procedures
//!
//! Writes go to a temporary sibling and are renamed over the target, so a
//! reader never sees a half-written file. There is no locking: two writers
//! doing read-modify-write on the same file race, and the last rename wins.

use crate::store::error::StoreError;
use crate::store::{RecordStore, Update};
use crate::types::{Config, Procedure, TestName};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::PrettyFormatter;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

const INDENT: &[u8] = b"    ";

/// Reads the JSON array at `path`. A missing file reads as an empty list.
pub fn read_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "list file absent, reading as empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
        location: path.display().to_string(),
        source,
    })
}

/// Writes `items` as an indented JSON array to `path`, atomically replacing
/// any previous content.
pub fn write_list<T: Serialize>(path: &Path, items: &[T]) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut temp = new_temp_file(dir)?;
    {
        let mut writer = std::io::BufWriter::new(temp.as_file_mut());
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(INDENT));
        items
            .serialize(&mut serializer)
            .map_err(|source| StoreError::Json {
                location: path.display().to_string(),
                source,
            })?;
        writer.flush()?;
    }
    if let Ok(metadata) = std::fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    debug!(path = %path.display(), items = items.len(), "list written");
    Ok(())
}

/// A temporary file created with the same mode a plain `File::create` would
/// get, so lists stay readable by every user of the shared folder.
#[cfg(unix)]
fn new_temp_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    tempfile::Builder::new()
        .permissions(std::fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn new_temp_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    NamedTempFile::new_in(dir)
}

pub struct JsonStore {
    config: Config,
}

impl JsonStore {
    /// Opens the shared folder, creating the procedures directory if needed.
    pub fn open(config: Config) -> Result<Self, StoreError> {
        std::fs::create_dir_all(config.procedures_path())?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn update_list<T, R, F>(path: &Path, f: F) -> Result<R, StoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>) -> Update<R>,
    {
        let mut items = read_list(path)?;
        let (write, outcome) = f(&mut items).into_parts();
        if write {
            write_list(path, &items)?;
        }
        Ok(outcome)
    }
}

impl RecordStore for JsonStore {
    fn tests(&self) -> Result<Vec<TestName>, StoreError> {
        read_list(&self.config.tests_file())
    }

    fn update_tests<R, F>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Vec<TestName>) -> Update<R>,
    {
        Self::update_list(&self.config.tests_file(), f)
    }

    fn procedures(&self, test: &TestName) -> Result<Vec<Procedure>, StoreError> {
        read_list(&self.config.procedures_file(test))
    }

    fn update_procedures<R, F>(&self, test: &TestName, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Vec<Procedure>) -> Update<R>,
    {
        Self::update_list(&self.config.procedures_file(test), f)
    }

    fn init_procedures(&self, test: &TestName) -> Result<(), StoreError> {
        write_list::<Procedure>(&self.config.procedures_file(test), &[])
    }

    fn remove_procedures(&self, test: &TestName) -> Result<(), StoreError> {
        let path = self.config.procedures_file(test);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
