//! OxideLog Engine - asynchronous log writing with rotation and purge
//!
//! Callers hand messages to an [`Engine`]; worker threads write them to
//! `application.log` and `access.log`, rotating the files by size. A purge
//! loop per stream removes archives past their retention age.

mod dispatcher;
mod engine;
pub mod format;
mod purge;
mod rotation;
mod stream;
mod macros;

pub use dispatcher::Dispatcher;
pub use engine::Engine;
pub use purge::{purge_once, PurgeReport, PurgeScheduler};
pub use rotation::{archive_file_name, is_archive_of};
pub use stream::Stream;

pub use oxidelog_core::{EngineConfig, Error, Level, RequestMeta, Result};
