//! # lingo-plugin — Translation sync between a document and a remote service
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────┐                 ┌────────────────────────┐
//! │ interface context      │                 │ document context       │
//! │                        │   lingo-bridge  │                        │
//! │ push / pull / copy ────┼────────────────►│ handlers               │
//! │        │               │◄────────────────┼── DocumentHost         │
//! │        ▼               │                 │   ClientStorage        │
//! │ TranslationService     │                 │                        │
//! └────────────────────────┘                 └────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`endpoints`] — endpoint descriptors and payloads shared by both sides
//! - [`document`] — document handlers, host seam, layered settings
//! - [`interface`] — push, pull, and page-copy workflows
//! - [`local`] — wire both contexts together in one process

pub mod document;
pub mod endpoints;
pub mod interface;
pub mod local;

// Re-exports for convenience
pub use document::{ClientStorage, DocumentHost, HandlerError, MemoryStorage};
pub use endpoints::{CopiedPage, CopyPageRequest, FrameScreenshot, KeyedText, NodeQuery, NodeSelection};
pub use interface::{
    DocumentClient, MemoryTranslationService, PullPlan, PushReport, ServiceError, SyncError,
    TranslationService,
};
pub use local::{connect_local, LocalPlugin};
