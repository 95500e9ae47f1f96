pub mod changes;
pub mod core;
pub mod store;
pub mod types;
pub mod view;

pub use crate::changes::{Observed, Refresh, Snapshot};
pub use crate::core::ProcLabCore;
pub use crate::core::error::ProcLabError;
pub use crate::view::LinkAction;
