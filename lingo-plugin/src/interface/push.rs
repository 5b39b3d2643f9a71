//! Push: write local texts to the translation service.
//!
//! ```text
//!   connected nodes ──► fetch records for their keys ──► compute_push_changes
//!                                                              │
//!   PushReport ◄── one write per key, all at once ◄────────────┘
//! ```

use std::collections::HashSet;

use futures_util::future::join_all;
use lingo_core::{compute_push_changes, KeyChange, KeyMatching, PushChanges, TextNode};

use super::service::{ServiceError, TranslationService, TranslationUpdate};
use super::SyncError;

/// Diff local `nodes` against the remote state for `language`.
///
/// Only connected nodes with a key take part.
pub async fn prepare_push(
    service: &dyn TranslationService,
    nodes: &[TextNode],
    language: &str,
    matching: KeyMatching,
) -> Result<PushChanges, SyncError> {
    let candidates: Vec<TextNode> = nodes
        .iter()
        .filter(|node| node.connected && node.has_key())
        .cloned()
        .collect();

    let keys = distinct_keys(&candidates);
    let records = service.fetch_translations(&keys, language).await?;
    let changes = compute_push_changes(&candidates, &records, language, matching)?;
    log::info!(
        "Push ({language}): {} new, {} changed of {} key(s)",
        changes.new_keys.len(),
        changes.changed_keys.len(),
        keys.len()
    );
    Ok(changes)
}

/// Keys of `nodes` in first-seen order, without repeats.
fn distinct_keys(nodes: &[TextNode]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(nodes.len());
    nodes
        .iter()
        .filter(|node| seen.insert(node.key.as_str()))
        .map(|node| node.key.clone())
        .collect()
}

/// Outcome of one key write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOutcome {
    pub change: KeyChange,
    pub result: Result<(), ServiceError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    pub outcomes: Vec<KeyOutcome>,
}

impl PushReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &KeyChange> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_ok())
            .map(|o| &o.change)
    }

    pub fn failed(&self) -> impl Iterator<Item = (&KeyChange, &ServiceError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.change, e)))
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    pub fn is_complete(&self) -> bool {
        self.failure_count() == 0
    }

    /// Some writes committed and some did not.
    pub fn is_partial(&self) -> bool {
        self.success_count() > 0 && self.failure_count() > 0
    }
}

/// Write every change, changed keys first, then new keys. Writes run
/// concurrently; each key's result is reported separately.
pub async fn submit_push(
    service: &dyn TranslationService,
    changes: &PushChanges,
    language: &str,
) -> PushReport {
    let updates: Vec<(KeyChange, TranslationUpdate)> = changes
        .iter()
        .map(|change| {
            let update = TranslationUpdate {
                key: change.key.clone(),
                namespace: change.ns.clone(),
                language: language.to_string(),
                text: change.new_value.clone(),
            };
            (change.clone(), update)
        })
        .collect();

    let results = join_all(
        updates
            .iter()
            .map(|(_, update)| service.push_translation(update)),
    )
    .await;

    let outcomes: Vec<KeyOutcome> = updates
        .into_iter()
        .zip(results)
        .map(|((change, _), result)| {
            if let Err(e) = &result {
                log::warn!("Push of '{}' failed: {e}", change.key);
            }
            KeyOutcome { change, result }
        })
        .collect();

    let report = PushReport { outcomes };
    log::info!(
        "Push ({language}) finished: {} written, {} failed",
        report.success_count(),
        report.failure_count()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::service::MemoryTranslationService;
    use futures_util::future::BoxFuture;
    use futures_util::FutureExt;
    use lingo_core::TranslationRecord;
    use uuid::Uuid;

    #[test]
    fn test_distinct_keys_keep_first_seen_order() {
        let nodes = [
            TextNode::new(Uuid::new_v4(), "Save").with_key("save", None),
            TextNode::new(Uuid::new_v4(), "Back").with_key("back", Some("nav")),
            TextNode::new(Uuid::new_v4(), "Save").with_key("save", Some("dialog")),
            TextNode::new(Uuid::new_v4(), "Back").with_key("back", None),
        ];
        assert_eq!(distinct_keys(&nodes), ["save", "back"]);
        assert!(distinct_keys(&[]).is_empty());
    }

    /// Rejects writes to the listed keys.
    struct Flaky {
        inner: MemoryTranslationService,
        reject: Vec<&'static str>,
    }

    impl TranslationService for Flaky {
        fn fetch_translations<'a>(
            &'a self,
            keys: &'a [String],
            language: &'a str,
        ) -> BoxFuture<'a, Result<Vec<TranslationRecord>, ServiceError>> {
            self.inner.fetch_translations(keys, language)
        }

        fn push_translation<'a>(&'a self, update: &'a TranslationUpdate) -> BoxFuture<'a, Result<(), ServiceError>> {
            if self.reject.iter().any(|key| *key == update.key) {
                let err = ServiceError::Rejected {
                    key: update.key.clone(),
                    message: "quota exceeded".into(),
                };
                return async move { Err(err) }.boxed();
            }
            self.inner.push_translation(update)
        }
    }

    fn node(key: &str, text: &str) -> TextNode {
        TextNode::new(Uuid::new_v4(), text).with_key(key, None)
    }

    #[tokio::test]
    async fn test_prepare_skips_unconnected_nodes() {
        let service = MemoryTranslationService::new(vec![
            TranslationRecord::new("greet", None).with_translation("en", "Hi"),
        ]);
        let mut loose = node("loose", "Loose");
        loose.connected = false;
        let nodes = vec![node("greet", "Hello"), node("title", "Title"), loose, TextNode::new(Uuid::new_v4(), "plain")];

        let changes = prepare_push(&service, &nodes, "en", KeyMatching::default())
            .await
            .unwrap();
        assert_eq!(changes.changed_keys.len(), 1);
        assert_eq!(changes.changed_keys[0].old_value.as_deref(), Some("Hi"));
        assert_eq!(changes.new_keys.len(), 1);
        assert_eq!(changes.new_keys[0].key, "title");
    }

    #[tokio::test]
    async fn test_submit_writes_every_key() {
        let service = MemoryTranslationService::new(vec![
            TranslationRecord::new("greet", None).with_translation("en", "Hi"),
        ]);
        let nodes = vec![node("greet", "Hello"), node("title", "Title")];
        let changes = prepare_push(&service, &nodes, "en", KeyMatching::Key).await.unwrap();

        let report = submit_push(&service, &changes, "en").await;
        assert!(report.is_complete());
        assert!(!report.is_partial());
        let order: Vec<&str> = report.succeeded().map(|c| c.key.as_str()).collect();
        assert_eq!(order, ["greet", "title"]);

        // Nothing left to push afterwards.
        let again = prepare_push(&service, &nodes, "en", KeyMatching::Key).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_is_reported_per_key() {
        let service = Flaky {
            inner: MemoryTranslationService::default(),
            reject: vec!["b"],
        };
        let nodes = vec![node("a", "A"), node("b", "B"), node("c", "C")];
        let changes = prepare_push(&service, &nodes, "en", KeyMatching::default())
            .await
            .unwrap();
        assert_eq!(changes.new_keys.len(), 3);

        let report = submit_push(&service, &changes, "en").await;
        assert!(report.is_partial());
        assert_eq!(report.success_count(), 2);
        let failed: Vec<&str> = report.failed().map(|(c, _)| c.key.as_str()).collect();
        assert_eq!(failed, ["b"]);

        let stored: Vec<String> = service.inner.records().into_iter().map(|r| r.key_name).collect();
        assert_eq!(stored, ["a", "c"]);
    }
}
