//! Reconciliation between document text and remote translations.
//!
//! ```text
//!   TextNode[] ──┐                      ┌──▸ PushChanges { new_keys, changed_keys }
//!                ├── push::compute ─────┤
//!   Record[]  ───┘                      │
//!                                       │
//!   TextNode[] ──┐                      │
//!                ├── pull::compute ─────┴──▸ PullChanges { changed_nodes, missing_keys }
//!   Record[]  ───┘
//! ```
//!
//! Both engines are pure: no I/O, no partial results. Malformed input
//! is rejected with a [`DiffError`] instead of being skipped.

use thiserror::Error;
use uuid::Uuid;

use serde::{Deserialize, Serialize};

pub mod pull;
pub mod push;

pub use pull::compute_pull_changes;
pub use push::compute_push_changes;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    #[error("Language tag must not be empty")]
    EmptyLanguage,
    #[error("Node {id} has no translation key")]
    EmptyNodeKey { id: Uuid },
    #[error("Translation record #{index} has an empty key name")]
    EmptyKeyName { index: usize },
}

/// How the push engine pairs a node with a remote record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyMatching {
    /// Match on key name alone; the node namespace is ignored.
    Key,
    /// Match on key name and namespace (default namespace normalized).
    #[default]
    KeyAndNamespace,
}

fn check_language(language: &str) -> Result<(), DiffError> {
    if language.is_empty() {
        return Err(DiffError::EmptyLanguage);
    }
    Ok(())
}

fn check_records(records: &[crate::TranslationRecord]) -> Result<(), DiffError> {
    match records.iter().position(|r| r.key_name.is_empty()) {
        Some(index) => Err(DiffError::EmptyKeyName { index }),
        None => Ok(()),
    }
}
