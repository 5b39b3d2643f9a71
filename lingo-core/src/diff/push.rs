//! Push diff: which local texts must be written to the remote service.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::diff::{check_language, check_records, DiffError, KeyMatching};
use crate::model::{KeyChange, PushChanges, TextNode, TranslationRecord};
use crate::namespace::normalize_ns;

type Identity<'a> = (&'a str, Option<&'a str>);

fn identity<'a>(key: &'a str, ns: Option<&'a str>, matching: KeyMatching) -> Identity<'a> {
    match matching {
        KeyMatching::Key => (key, None),
        KeyMatching::KeyAndNamespace => (key, normalize_ns(ns)),
    }
}

/// Classify every node as new, changed, or up to date for `language`.
///
/// `nodes` are expected to be connected nodes; each must carry a key.
/// When several records share an identity the first one wins, and when
/// several nodes share an identity only the first node is classified.
pub fn compute_push_changes(
    nodes: &[TextNode],
    records: &[TranslationRecord],
    language: &str,
    matching: KeyMatching,
) -> Result<PushChanges, DiffError> {
    check_language(language)?;
    check_records(records)?;
    if let Some(node) = nodes.iter().find(|n| !n.has_key()) {
        return Err(DiffError::EmptyNodeKey { id: node.id });
    }

    let mut remote: HashMap<Identity<'_>, &TranslationRecord> = HashMap::with_capacity(records.len());
    for record in records {
        remote
            .entry(identity(&record.key_name, record.namespace.as_deref(), matching))
            .or_insert(record);
    }

    let mut seen: HashMap<Identity<'_>, &str> = HashMap::with_capacity(nodes.len());
    let mut changes = PushChanges::default();

    for node in nodes {
        let id = identity(&node.key, node.ns.as_deref(), matching);
        match seen.entry(id) {
            Entry::Occupied(first) => {
                if *first.get() != node.characters {
                    log::warn!(
                        "Key '{}' is used by several texts with different content; keeping the first",
                        node.key
                    );
                }
                continue;
            }
            Entry::Vacant(slot) => {
                slot.insert(&node.characters);
            }
        }

        let old_value = remote
            .get(&id)
            .and_then(|record| record.text(language))
            .map(str::to_string);

        let change = KeyChange {
            key: node.key.clone(),
            ns: normalize_ns(node.ns.as_deref()).map(str::to_string),
            old_value,
            new_value: node.characters.clone(),
        };

        match change.old_value.as_deref() {
            None => changes.new_keys.push(change),
            Some(old) if old != node.characters => changes.changed_keys.push(change),
            Some(_) => {}
        }
    }

    log::debug!(
        "Push diff ({language}): {} new, {} changed, {} nodes",
        changes.new_keys.len(),
        changes.changed_keys.len(),
        nodes.len()
    );
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn node(key: &str, characters: &str) -> TextNode {
        TextNode::new(Uuid::new_v4(), characters).with_key(key, None)
    }

    fn record(key: &str, language: &str, text: &str) -> TranslationRecord {
        TranslationRecord::new(key, None).with_translation(language, text)
    }

    #[test]
    fn test_new_key() {
        let changes =
            compute_push_changes(&[node("greet", "Hi")], &[], "en", KeyMatching::default()).unwrap();

        assert_eq!(
            changes.new_keys,
            vec![KeyChange {
                key: "greet".into(),
                ns: None,
                old_value: None,
                new_value: "Hi".into(),
            }]
        );
        assert!(changes.changed_keys.is_empty());
    }

    #[test]
    fn test_changed_key() {
        let changes = compute_push_changes(
            &[node("greet", "Hello")],
            &[record("greet", "en", "Hi")],
            "en",
            KeyMatching::default(),
        )
        .unwrap();

        assert!(changes.new_keys.is_empty());
        assert_eq!(changes.changed_keys.len(), 1);
        assert_eq!(changes.changed_keys[0].old_value.as_deref(), Some("Hi"));
        assert_eq!(changes.changed_keys[0].new_value, "Hello");
    }

    #[test]
    fn test_up_to_date() {
        let changes = compute_push_changes(
            &[node("greet", "Hi")],
            &[record("greet", "en", "Hi")],
            "en",
            KeyMatching::default(),
        )
        .unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_other_language_counts_as_new() {
        let changes = compute_push_changes(
            &[node("greet", "Hallo")],
            &[record("greet", "en", "Hi")],
            "de",
            KeyMatching::default(),
        )
        .unwrap();
        assert_eq!(changes.new_keys.len(), 1);
        assert_eq!(changes.new_keys[0].old_value, None);
    }

    #[test]
    fn test_empty_remote_text_counts_as_new() {
        let changes = compute_push_changes(
            &[node("greet", "Hi")],
            &[record("greet", "en", "")],
            "en",
            KeyMatching::default(),
        )
        .unwrap();
        assert_eq!(changes.new_keys.len(), 1);
    }

    #[test]
    fn test_namespace_matching_modes() {
        let nodes = [TextNode::new(Uuid::new_v4(), "Hello").with_key("greet", Some("auth"))];
        let records = [record("greet", "en", "Hi")];

        let by_key = compute_push_changes(&nodes, &records, "en", KeyMatching::Key).unwrap();
        assert_eq!(by_key.changed_keys.len(), 1);
        assert_eq!(by_key.changed_keys[0].ns.as_deref(), Some("auth"));

        let by_ns =
            compute_push_changes(&nodes, &records, "en", KeyMatching::KeyAndNamespace).unwrap();
        assert_eq!(by_ns.new_keys.len(), 1);
        assert!(by_ns.changed_keys.is_empty());
    }

    #[test]
    fn test_empty_namespace_matches_default() {
        let nodes = [TextNode::new(Uuid::new_v4(), "Hello").with_key("greet", Some(""))];
        let records = [TranslationRecord::new("greet", Some("")).with_translation("en", "Hi")];
        let changes =
            compute_push_changes(&nodes, &records, "en", KeyMatching::KeyAndNamespace).unwrap();
        assert_eq!(changes.changed_keys.len(), 1);
        assert_eq!(changes.changed_keys[0].ns, None);
    }

    #[test]
    fn test_first_record_wins() {
        let records = [record("greet", "en", "Hi"), record("greet", "en", "Hey")];
        let changes =
            compute_push_changes(&[node("greet", "Hey")], &records, "en", KeyMatching::Key).unwrap();
        assert_eq!(changes.changed_keys[0].old_value.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_partition_each_key_in_one_bucket() {
        let nodes = [
            node("a", "same"),
            node("b", "different"),
            node("c", "fresh"),
            node("b", "other text"),
            node("a", "same"),
        ];
        let records = [record("a", "en", "same"), record("b", "en", "before")];
        let changes =
            compute_push_changes(&nodes, &records, "en", KeyMatching::default()).unwrap();

        let new: Vec<_> = changes.new_keys.iter().map(|c| c.key.as_str()).collect();
        let changed: Vec<_> = changes.changed_keys.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(new, ["c"]);
        assert_eq!(changed, ["b"]);
        assert_eq!(changes.changed_keys[0].new_value, "different");
    }

    #[test]
    fn test_rejects_node_without_key() {
        let bad = TextNode::new(Uuid::new_v4(), "Hi");
        let err = compute_push_changes(&[bad.clone()], &[], "en", KeyMatching::default())
            .unwrap_err();
        assert_eq!(err, DiffError::EmptyNodeKey { id: bad.id });
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert_eq!(
            compute_push_changes(&[], &[], "", KeyMatching::default()).unwrap_err(),
            DiffError::EmptyLanguage
        );
        let records = [record("ok", "en", "x"), TranslationRecord::new("", None)];
        assert_eq!(
            compute_push_changes(&[], &records, "en", KeyMatching::default()).unwrap_err(),
            DiffError::EmptyKeyName { index: 1 }
        );
    }
}
