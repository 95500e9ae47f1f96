//! Uploaded files kept next to the procedure lists.

use crate::types::TestName;
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod error {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum AttachmentError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Directory not supported")]
        IsDirectory,

        #[error("File name is not valid UTF-8")]
        NonUtf8FileName,
    }
}

use error::AttachmentError;

/// Stores uploads as `{procedures_path}/{test}_{file_name}`.
///
/// Storing a file under a name that already exists overwrites it.
pub struct AttachmentStorage {
    pub procedures_path: PathBuf,
}

/// A file copied into the shared folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAttachment {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
}

impl AttachmentStorage {
    pub fn store(&self, test: &TestName, source: &Path) -> Result<StoredAttachment, AttachmentError> {
        let metadata = std::fs::metadata(source)?;
        if metadata.is_dir() {
            return Err(AttachmentError::IsDirectory);
        }
        let file_name = source
            .file_name()
            .ok_or(AttachmentError::IsDirectory)?
            .to_str()
            .ok_or(AttachmentError::NonUtf8FileName)?
            .to_string();

        std::fs::create_dir_all(&self.procedures_path)?;
        let dest_path = self.attachment_path(test, &file_name);
        std::fs::copy(source, &dest_path)?;
        debug!(path = %dest_path.display(), size = metadata.len(), "attachment stored");

        Ok(StoredAttachment {
            path: dest_path,
            file_name,
            size: metadata.len(),
        })
    }

    pub fn attachment_path(&self, test: &TestName, file_name: &str) -> PathBuf {
        self.procedures_path.join(test.upload_file_name(file_name))
    }
}
