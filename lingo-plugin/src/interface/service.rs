//! Remote translation service seam.

use std::sync::Mutex;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use lingo_core::{compare_ns, TranslationRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Key '{key}' was rejected: {message}")]
    Rejected { key: String, message: String },
}

/// One translation write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationUpdate {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub language: String,
    pub text: String,
}

pub trait TranslationService: Send + Sync {
    /// Records for `keys` (every key when empty), limited to `language`.
    fn fetch_translations<'a>(
        &'a self,
        keys: &'a [String],
        language: &'a str,
    ) -> BoxFuture<'a, Result<Vec<TranslationRecord>, ServiceError>>;

    /// Create or overwrite one key's translation.
    fn push_translation<'a>(&'a self, update: &'a TranslationUpdate) -> BoxFuture<'a, Result<(), ServiceError>>;
}

/// In-process service holding records in memory. Last write wins.
#[derive(Debug, Default)]
pub struct MemoryTranslationService {
    records: Mutex<Vec<TranslationRecord>>,
}

impl MemoryTranslationService {
    pub fn new(records: Vec<TranslationRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TranslationRecord>> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Snapshot of every stored record.
    pub fn records(&self) -> Vec<TranslationRecord> {
        self.lock().clone()
    }
}

impl TranslationService for MemoryTranslationService {
    fn fetch_translations<'a>(
        &'a self,
        keys: &'a [String],
        language: &'a str,
    ) -> BoxFuture<'a, Result<Vec<TranslationRecord>, ServiceError>> {
        let found: Vec<TranslationRecord> = self
            .lock()
            .iter()
            .filter(|record| keys.is_empty() || keys.contains(&record.key_name))
            .map(|record| TranslationRecord {
                translations: record
                    .translations
                    .iter()
                    .filter(|(lang, _)| lang.as_str() == language)
                    .map(|(lang, text)| (lang.clone(), text.clone()))
                    .collect(),
                ..record.clone()
            })
            .collect();
        async move { Ok(found) }.boxed()
    }

    fn push_translation<'a>(&'a self, update: &'a TranslationUpdate) -> BoxFuture<'a, Result<(), ServiceError>> {
        let mut records = self.lock();
        let existing = records.iter_mut().find(|record| {
            record.key_name == update.key
                && compare_ns(record.namespace.as_deref(), update.namespace.as_deref())
        });
        match existing {
            Some(record) => {
                record
                    .translations
                    .insert(update.language.clone(), update.text.clone());
            }
            None => records.push(
                TranslationRecord::new(update.key.clone(), update.namespace.as_deref())
                    .with_translation(&update.language, update.text.clone()),
            ),
        }
        drop(records);
        async { Ok(()) }.boxed()
    }
}
