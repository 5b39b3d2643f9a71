//! Pull diff: which document texts must be replaced by remote translations.

use std::collections::HashSet;

use uuid::Uuid;

use crate::diff::{check_language, check_records, DiffError};
use crate::model::{PullChanges, TextNode, TranslationRecord};
use crate::namespace::normalize_ns;

/// Compare remote translations for `language` against document nodes.
///
/// Records without a value for `language` are ignored. Every node bound to
/// the same `(key, namespace)` as a record is reported as changed when its
/// text differs or when it is not yet connected; the first record to claim
/// a node wins. Records with no matching node land in `missing_keys`, once
/// per identity. Nodes are never created here.
pub fn compute_pull_changes(
    nodes: &[TextNode],
    language: &str,
    records: &[TranslationRecord],
) -> Result<PullChanges, DiffError> {
    check_language(language)?;
    check_records(records)?;

    let mut changes = PullChanges::default();
    let mut claimed: HashSet<Uuid> = HashSet::new();
    let mut missing: HashSet<(&str, Option<&str>)> = HashSet::new();

    for record in records {
        let Some(text) = record.text(language) else {
            continue;
        };

        let mut matched = false;
        for node in nodes
            .iter()
            .filter(|node| node.has_key() && node.matches(&record.key_name, record.namespace.as_deref()))
        {
            matched = true;
            if !claimed.insert(node.id) {
                continue;
            }
            if node.characters != text || !node.connected {
                changes.changed_nodes.push(TextNode {
                    characters: text.to_string(),
                    ..node.clone()
                });
            }
        }

        if !matched && missing.insert((record.key_name.as_str(), normalize_ns(record.namespace.as_deref()))) {
            changes.missing_keys.push(record.key_ref());
        }
    }

    log::debug!(
        "Pull diff ({language}): {} changed, {} missing, {} records",
        changes.changed_nodes.len(),
        changes.missing_keys.len(),
        records.len()
    );
    Ok(changes)
}
