use super::AppConfig;
use crate::types::{TestName, UrlMapper};
use std::path::PathBuf;

/// Core configuration for ProcLabCore initialization.
#[derive(Clone, Debug)]
pub struct Config {
    pub shared_root: PathBuf,
    pub url_mapper: Option<UrlMapper>,
}

impl Config {
    /// A relative `shared_root` is resolved against the current directory,
    /// so paths recorded for uploads stay valid from anywhere.
    pub fn new(shared_root: impl Into<PathBuf>) -> Self {
        let shared_root = shared_root.into();
        Self {
            shared_root: std::path::absolute(&shared_root).unwrap_or(shared_root),
            url_mapper: None,
        }
    }

    pub fn tests_file(&self) -> PathBuf {
        self.shared_root.join("tests.json")
    }

    pub fn procedures_path(&self) -> PathBuf {
        self.shared_root.join("TestProcedures")
    }

    pub fn procedures_file(&self, test: &TestName) -> PathBuf {
        self.procedures_path().join(test.procedures_file_name())
    }

    pub fn db_path(&self) -> PathBuf {
        self.shared_root.join("proclab.redb")
    }
}

impl From<&AppConfig> for Config {
    fn from(config: &AppConfig) -> Self {
        Self {
            url_mapper: config.links.mapper(),
            ..Self::new(config.storage.shared_root.clone())
        }
    }
}
