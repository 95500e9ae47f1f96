mod app;
mod core;

pub use app::{
    AppConfig, AppConfigError, Backend, LinksConfig, RefreshConfig, StorageConfig,
};
pub use self::core::Config;
