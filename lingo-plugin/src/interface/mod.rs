//! Interface-context side: workflows that combine document reads, the
//! translation service, and the diff engines.

pub mod client;
pub mod copy;
pub mod pull;
pub mod push;
pub mod service;

use lingo_bridge::BridgeError;
use lingo_core::DiffError;
use thiserror::Error;

pub use client::DocumentClient;
pub use copy::{create_page_copy, pull_into_copy};
pub use pull::{apply_pull, prepare_pull, PullOutcome, PullPlan};
pub use push::{prepare_push, submit_push, KeyOutcome, PushReport};
pub use service::{MemoryTranslationService, ServiceError, TranslationService, TranslationUpdate};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Document call failed: {0}")]
    Bridge(#[from] BridgeError),
    #[error("Translation service failed: {0}")]
    Service(#[from] ServiceError),
    #[error("Invalid diff input: {0}")]
    Diff(#[from] DiffError),
}
