//! What a procedure's link lets the user do.

use crate::types::{FileRef, Link};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// The uploaded file is reachable locally.
    Download {
        path: PathBuf,
        name: String,
        url: Option<String>,
    },
    /// The uploaded file is not reachable locally but has a remote URL.
    OpenRemote(String),
    /// An uploaded file with neither a local copy nor a remote URL.
    Missing { name: String },
    Open(String),
    Nothing,
}

impl LinkAction {
    pub fn of(link: &Link) -> Self {
        match link {
            Link::None => LinkAction::Nothing,
            Link::Url(url) if url.is_empty() => LinkAction::Nothing,
            Link::Url(url) => LinkAction::Open(url.clone()),
            Link::File(FileRef { path, name, url }) => {
                let name = if name.is_empty() {
                    "file".to_string()
                } else {
                    name.clone()
                };
                if !path.is_empty() && Path::new(path).exists() {
                    LinkAction::Download {
                        path: PathBuf::from(path),
                        name,
                        url: url.clone(),
                    }
                } else if let Some(url) = url {
                    LinkAction::OpenRemote(url.clone())
                } else {
                    LinkAction::Missing { name }
                }
            }
        }
    }
}
