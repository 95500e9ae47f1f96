//! Procedure records and their JSON shapes in the shared folder.
//!
//! On disk a procedure is `{"id": ..., "text": ..., "link": ...}` where `link`
//! is either a plain string (empty for "no link") or a file record
//! `{"type": "file", "path": ..., "name": ..., "url": ...}`. Lists written by
//! the older dashboard hold bare strings instead of objects; those still load.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stable identity of a procedure within its test, assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcedureId(Uuid);

impl ProcedureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProcedureId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProcedureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ProcedureId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawProcedure")]
pub struct Procedure {
    /// `None` only for entries loaded from lists written before ids existed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ProcedureId>,
    pub text: String,
    pub link: Link,
}

impl Procedure {
    pub fn new(text: impl Into<String>, link: Link) -> Self {
        Self {
            id: Some(ProcedureId::new()),
            text: text.into(),
            link,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProcedure {
    Legacy(String),
    Entry {
        #[serde(default)]
        id: Option<ProcedureId>,
        #[serde(default)]
        text: String,
        #[serde(default)]
        link: Link,
    },
}

impl From<RawProcedure> for Procedure {
    fn from(raw: RawProcedure) -> Self {
        match raw {
            RawProcedure::Legacy(text) => Self {
                id: None,
                text,
                link: Link::None,
            },
            RawProcedure::Entry { id, text, link } => Self { id, text, link },
        }
    }
}

/// Where a procedure points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawLink", into = "RawLink")]
pub enum Link {
    #[default]
    None,
    Url(String),
    File(FileRef),
}

/// An uploaded file kept in the shared folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    /// Local path of the stored copy.
    pub path: String,
    /// Original file name, used when offering the file for download.
    pub name: String,
    /// Remote URL derived from `path`, if a mapping was configured.
    pub url: Option<String>,
}

impl Link {
    /// A URL link, or [`Link::None`] for an empty string.
    pub fn url(url: impl Into<String>) -> Self {
        let url = url.into();
        if url.trim().is_empty() {
            Link::None
        } else {
            Link::Url(url)
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawLink {
    Text(String),
    Record(RawRecord),
    Null(()),
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawRecord {
    File {
        #[serde(default)]
        path: String,
        #[serde(default)]
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
}

impl From<RawLink> for Link {
    fn from(raw: RawLink) -> Self {
        match raw {
            RawLink::Text(text) => Link::url(text),
            RawLink::Record(RawRecord::File { path, name, url }) => Link::File(FileRef {
                path,
                name,
                url: url.filter(|url| !url.is_empty()),
            }),
            RawLink::Null(()) => Link::None,
        }
    }
}

impl From<Link> for RawLink {
    fn from(link: Link) -> Self {
        match link {
            Link::None => RawLink::Text(String::new()),
            Link::Url(url) => RawLink::Text(url),
            Link::File(FileRef { path, name, url }) => {
                RawLink::Record(RawRecord::File { path, name, url })
            }
        }
    }
}

/// Replacement fields for an edit. Fields left `None` are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcedureEdit {
    pub text: Option<String>,
    pub link: Option<Link>,
}

impl ProcedureEdit {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn link(mut self, link: Link) -> Self {
        self.link = Some(link);
        self
    }

    /// Applies the edit. An empty replacement text is ignored; a procedure
    /// always keeps a description.
    pub(crate) fn apply(self, procedure: &mut Procedure) {
        if let Some(text) = self.text
            && !text.trim().is_empty()
        {
            procedure.text = text;
        }
        if let Some(link) = self.link {
            procedure.link = link;
        }
    }
}
