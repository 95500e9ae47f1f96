pub(crate) mod config;
pub use config::{
    AppConfig, AppConfigError, Backend, Config, LinksConfig, RefreshConfig, StorageConfig,
};

pub(crate) mod test_name;
pub use test_name::{MAX_TEST_NAME_LENGTH, TestName, TestNameError};

pub(crate) mod procedure;
pub use procedure::{FileRef, Link, Procedure, ProcedureEdit, ProcedureId};

pub(crate) mod url_mapper;
pub use url_mapper::UrlMapper;
