//! Layered plugin settings.
//!
//! Settings live in three scopes, merged in order (later wins):
//!
//! ```text
//!   GlobalSettings   (client storage, shared by every document)
//!        ▼
//!   DocumentSettings (document root plugin data)
//!        ▼
//!   PageSettings     (per-page plugin data)
//!        ▼
//!   PluginConfig     (effective view)
//! ```
//!
//! Each scope is persisted as a JSON blob; an empty blob is an empty scope.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("Malformed {scope} settings: {source}")]
pub struct SettingsError {
    pub scope: &'static str,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces_disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_info: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_info: Option<bool>,
    /// Set on pages generated by a page copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_copy: Option<bool>,
}

/// Effective configuration seen by the interface context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces_disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_info: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_info: Option<bool>,
    /// The current page was generated by a page copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_copy: Option<bool>,
}

impl PluginConfig {
    /// Merge the three scopes; a value set in a narrower scope wins.
    pub fn merge(global: GlobalSettings, document: DocumentSettings, page: PageSettings) -> Self {
        Self {
            api_url: document.api_url.or(global.api_url),
            api_key: document.api_key.or(global.api_key),
            namespace: document.namespace,
            namespaces_disabled: document.namespaces_disabled,
            document_info: document.document_info,
            language: page.language,
            page_info: page.page_info,
            page_copy: page.page_copy,
        }
    }

    /// Split into the per-scope values written by a settings save.
    pub fn split(&self) -> (GlobalSettings, DocumentSettings, PageSettings) {
        let global = GlobalSettings {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
        };
        let document = DocumentSettings {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            namespace: self.namespace.clone(),
            namespaces_disabled: self.namespaces_disabled,
            document_info: Some(true),
        };
        let page = PageSettings {
            language: self.language.clone(),
            page_info: Some(true),
            page_copy: self.page_copy,
        };
        (global, document, page)
    }
}

/// Decode one scope blob; an empty blob yields defaults.
pub fn decode_scope<T: DeserializeOwned + Default>(
    scope: &'static str,
    blob: &str,
) -> Result<T, SettingsError> {
    if blob.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(blob).map_err(|source| SettingsError { scope, source })
}

pub fn encode_scope<T: Serialize>(scope: &'static str, value: &T) -> Result<String, SettingsError> {
    serde_json::to_string(value).map_err(|source| SettingsError { scope, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_narrow_scope() {
        let global = GlobalSettings {
            api_url: Some("https://global".into()),
            api_key: Some("g-key".into()),
        };
        let document = DocumentSettings {
            api_key: Some("d-key".into()),
            namespace: Some("auth".into()),
            ..DocumentSettings::default()
        };
        let page = PageSettings {
            language: Some("de".into()),
            ..PageSettings::default()
        };

        let config = PluginConfig::merge(global, document, page);
        assert_eq!(config.api_url.as_deref(), Some("https://global"));
        assert_eq!(config.api_key.as_deref(), Some("d-key"));
        assert_eq!(config.namespace.as_deref(), Some("auth"));
        assert_eq!(config.language.as_deref(), Some("de"));
    }

    #[test]
    fn test_split_then_merge() {
        let config = PluginConfig {
            api_url: Some("https://app".into()),
            api_key: Some("key".into()),
            language: Some("en".into()),
            ..PluginConfig::default()
        };
        let (g, d, p) = config.split();
        assert_eq!(d.document_info, Some(true));
        assert_eq!(p.page_info, Some(true));

        let merged = PluginConfig::merge(g, d, p);
        assert_eq!(merged.api_url, config.api_url);
        assert_eq!(merged.language, config.language);
        assert_eq!(merged.page_info, Some(true));
    }

    #[test]
    fn test_page_copy_flag_survives_merge_and_split() {
        let page = PageSettings {
            language: Some("de".into()),
            page_info: Some(true),
            page_copy: Some(true),
        };
        let config = PluginConfig::merge(GlobalSettings::default(), DocumentSettings::default(), page.clone());
        assert_eq!(config.page_copy, Some(true));

        let (_, _, written) = config.split();
        assert_eq!(written, page);

        let plain = PluginConfig::merge(
            GlobalSettings::default(),
            DocumentSettings::default(),
            PageSettings::default(),
        );
        assert_eq!(plain.page_copy, None);
    }

    #[test]
    fn test_decode_empty_and_malformed() {
        let page: PageSettings = decode_scope("page", "").unwrap();
        assert_eq!(page, PageSettings::default());

        let page: PageSettings = decode_scope("page", r#"{"language":"fr","pageCopy":true}"#).unwrap();
        assert_eq!(page.language.as_deref(), Some("fr"));
        assert_eq!(page.page_copy, Some(true));

        let err = decode_scope::<PageSettings>("page", "{oops").unwrap_err();
        assert_eq!(err.scope, "page");
        assert!(err.to_string().starts_with("Malformed page settings"));
    }
}
