//! Document-context side: handlers that read and mutate the document tree.
//!
//! ```text
//!   Bridge (document) ──► handlers ──► DocumentHost (tree, linkage, fonts)
//!                              └─────► ClientStorage (global settings)
//! ```
//!
//! The host sits behind an async mutex; each handler holds it for the
//! whole operation, so mutations never interleave.

pub mod handlers;
pub mod host;
pub mod settings;

use lingo_core::{DocumentError, SettingsError};
use thiserror::Error;

pub use handlers::register_handlers;
pub use host::{DocumentHost, PageSummary};
pub use settings::{ClientStorage, MemoryStorage, CONFIG_KEY};

/// Failure inside a document handler, delivered to the caller as a fault.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
