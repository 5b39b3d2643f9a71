//! Shared value types passed between the document and interface contexts.
//!
//! Everything here is a plain snapshot: the document context reads it
//! fresh for each operation and hands it across the bridge by value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::namespace::compare_ns;

/// Linkage metadata persisted on a text node.
///
/// Records which translation key (and namespace) the node is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLinkage {
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,
    #[serde(default)]
    pub connected: bool,
}

impl NodeLinkage {
    pub fn new(key: impl Into<String>, ns: Option<String>, connected: bool) -> Self {
        Self {
            key: key.into(),
            ns,
            connected,
        }
    }
}

/// Snapshot of one editable text node together with its linkage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    /// Translation key; empty when the node is not bound to anything.
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,
    #[serde(default)]
    pub connected: bool,
    /// Literal text currently shown by the node.
    pub characters: String,
}

impl TextNode {
    /// Create an unconnected node snapshot.
    pub fn new(id: Uuid, characters: impl Into<String>) -> Self {
        Self {
            id,
            name: String::new(),
            key: String::new(),
            ns: None,
            connected: false,
            characters: characters.into(),
        }
    }

    /// Builder-style helper binding the snapshot to a key.
    pub fn with_key(mut self, key: impl Into<String>, ns: Option<&str>) -> Self {
        self.key = key.into();
        self.ns = ns.map(str::to_string);
        self.connected = true;
        self
    }

    pub fn linkage(&self) -> NodeLinkage {
        NodeLinkage::new(self.key.clone(), self.ns.clone(), self.connected)
    }

    pub fn has_key(&self) -> bool {
        !self.key.is_empty()
    }

    /// Whether this node is bound to `(key, ns)`, with namespace normalization.
    pub fn matches(&self, key: &str, ns: Option<&str>) -> bool {
        self.key == key && compare_ns(self.ns.as_deref(), ns)
    }
}

/// One key as stored by the remote translation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRecord {
    pub key_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Language tag → translated text.
    #[serde(default)]
    pub translations: BTreeMap<String, String>,
}

impl TranslationRecord {
    pub fn new(key_name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            key_name: key_name.into(),
            namespace: namespace.map(str::to_string),
            translations: BTreeMap::new(),
        }
    }

    pub fn with_translation(mut self, language: &str, text: impl Into<String>) -> Self {
        self.translations.insert(language.to_string(), text.into());
        self
    }

    /// Translation for `language`, treating an empty string as missing.
    pub fn text(&self, language: &str) -> Option<&str> {
        self.translations
            .get(language)
            .map(String::as_str)
            .filter(|text| !text.is_empty())
    }

    pub fn key_ref(&self) -> KeyRef {
        KeyRef {
            key: self.key_name.clone(),
            ns: self.namespace.clone(),
        }
    }
}

/// A bare `(key, namespace)` identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyRef {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,
}

/// One key whose remote value will be written by a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyChange {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,
    /// Remote value before the push; `None` when the key has no value yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    pub new_value: String,
}

/// Result of the push diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushChanges {
    pub new_keys: Vec<KeyChange>,
    pub changed_keys: Vec<KeyChange>,
}

impl PushChanges {
    pub fn len(&self) -> usize {
        self.new_keys.len() + self.changed_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.new_keys.is_empty() && self.changed_keys.is_empty()
    }

    /// Changed keys first, then new keys, the order they are submitted in.
    pub fn iter(&self) -> impl Iterator<Item = &KeyChange> {
        self.changed_keys.iter().chain(self.new_keys.iter())
    }
}

/// Result of the pull diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullChanges {
    /// Nodes with `characters` already replaced by the remote translation.
    pub changed_nodes: Vec<TextNode>,
    /// Keys present remotely with no matching node in the document.
    pub missing_keys: Vec<KeyRef>,
}

impl PullChanges {
    pub fn is_up_to_date(&self) -> bool {
        self.changed_nodes.is_empty()
    }
}
