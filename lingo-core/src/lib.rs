//! # lingo-core — Data model and reconciliation for Lingo
//!
//! Everything here is synchronous and free of I/O.
//!
//! ## Modules
//!
//! - [`model`] — text node snapshots, remote records, change sets
//! - [`namespace`] — default-namespace normalization
//! - [`diff`] — push and pull diff engines
//! - [`document`] — in-memory document tree with per-node linkage
//! - [`settings`] — global / document / page settings and their merge

pub mod diff;
pub mod document;
pub mod model;
pub mod namespace;
pub mod settings;

pub use diff::{compute_pull_changes, compute_push_changes, DiffError, KeyMatching};
pub use document::{
    Document, DocumentError, FontName, FrameInfo, FrameLayer, Layer, Page, Rect, TextLayer,
};
pub use model::{
    KeyChange, KeyRef, NodeLinkage, PullChanges, PushChanges, TextNode, TranslationRecord,
};
pub use namespace::{compare_ns, normalize_ns};
pub use settings::{
    DocumentSettings, GlobalSettings, PageSettings, PluginConfig, SettingsError,
};
