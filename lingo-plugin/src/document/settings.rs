//! Reading and writing the layered plugin settings.
//!
//! Global settings live in [`ClientStorage`] under [`CONFIG_KEY`]; document
//! and page settings live in the plugin data of the document root and of
//! each page.

use std::collections::HashMap;
use std::sync::Mutex;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use lingo_core::settings::{decode_scope, encode_scope};
use lingo_core::{DocumentSettings, GlobalSettings, PageSettings, PluginConfig};
use uuid::Uuid;

use super::host::DocumentHost;
use super::HandlerError;

pub const CONFIG_KEY: &str = "lingo_plugin_config";

/// Per-user storage that outlives a single document.
pub trait ClientStorage: Send + Sync + 'static {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<String>>;
    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, ()>;
    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, ()>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ClientStorage for MemoryStorage {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<String>> {
        let value = self.entries().get(key).cloned();
        async move { value }.boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, ()> {
        self.entries().insert(key.to_string(), value);
        async {}.boxed()
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, ()> {
        self.entries().remove(key);
        async {}.boxed()
    }
}

async fn global_settings(storage: &dyn ClientStorage) -> Result<GlobalSettings, HandlerError> {
    let blob = storage.get(CONFIG_KEY).await.unwrap_or_default();
    Ok(decode_scope("global", &blob)?)
}

fn document_settings<H: DocumentHost>(host: &H) -> Result<DocumentSettings, HandlerError> {
    Ok(decode_scope("document", &host.document_data())?)
}

pub(crate) fn page_settings<H: DocumentHost>(host: &H, page: Uuid) -> Result<PageSettings, HandlerError> {
    Ok(decode_scope("page", &host.page_data(page)?)?)
}

pub(crate) fn write_page_settings<H: DocumentHost>(
    host: &mut H,
    page: Uuid,
    settings: &PageSettings,
) -> Result<(), HandlerError> {
    host.set_page_data(page, encode_scope("page", settings)?)?;
    Ok(())
}

/// Effective configuration for the current page.
pub async fn load_config<H: DocumentHost>(
    host: &H,
    storage: &dyn ClientStorage,
) -> Result<PluginConfig, HandlerError> {
    let page = host.current_page()?.id;
    Ok(PluginConfig::merge(
        global_settings(storage).await?,
        document_settings(host)?,
        page_settings(host, page)?,
    ))
}

/// Persist `config` into all three scopes and return the merged result.
pub async fn save_config<H: DocumentHost>(
    host: &mut H,
    storage: &dyn ClientStorage,
    config: &PluginConfig,
) -> Result<PluginConfig, HandlerError> {
    let (global, document, page) = config.split();
    let current = host.current_page()?.id;

    storage
        .set(CONFIG_KEY, encode_scope("global", &global)?)
        .await;
    host.set_document_data(encode_scope("document", &document)?);
    write_page_settings(host, current, &page)?;

    log::info!("Settings saved");
    load_config(host, storage).await
}

pub async fn set_language<H: DocumentHost>(
    host: &mut H,
    storage: &dyn ClientStorage,
    language: String,
) -> Result<PluginConfig, HandlerError> {
    let mut config = load_config(host, storage).await?;
    config.language = Some(language);
    save_config(host, storage, &config).await
}

/// Clear global, document, and every page's settings.
pub async fn reset_config<H: DocumentHost>(
    host: &mut H,
    storage: &dyn ClientStorage,
) -> Result<PluginConfig, HandlerError> {
    storage.delete(CONFIG_KEY).await;
    host.set_document_data(String::new());
    let pages = host.pages();
    for page in &pages {
        host.set_page_data(page.id, String::new())?;
    }
    log::info!("Settings reset on {} page(s)", pages.len());
    load_config(host, storage).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_core::{Document, Page};

    fn config() -> PluginConfig {
        PluginConfig {
            api_url: Some("https://translate.example".into()),
            api_key: Some("secret".into()),
            namespace: Some("app".into()),
            language: Some("en".into()),
            ..PluginConfig::default()
        }
    }

    #[tokio::test]
    async fn test_empty_config() {
        let doc = Document::new();
        let storage = MemoryStorage::new();
        assert_eq!(load_config(&doc, &storage).await.unwrap(), PluginConfig::default());
    }

    #[tokio::test]
    async fn test_save_writes_every_scope() {
        let mut doc = Document::new();
        let storage = MemoryStorage::new();

        let saved = save_config(&mut doc, &storage, &config()).await.unwrap();
        assert_eq!(saved.api_key.as_deref(), Some("secret"));
        assert_eq!(saved.language.as_deref(), Some("en"));
        assert_eq!(saved.document_info, Some(true));
        assert_eq!(saved.page_info, Some(true));

        let global = storage.get(CONFIG_KEY).await.unwrap();
        assert!(global.contains("secret"));
        assert!(doc.plugin_data.contains("\"namespace\":\"app\""));
        assert!(doc.pages[0].plugin_data.contains("\"language\":\"en\""));
    }

    #[tokio::test]
    async fn test_language_is_per_page() {
        let mut doc = Document::with_pages(vec![Page::new("Home"), Page::new("Settings")]);
        let storage = MemoryStorage::new();
        save_config(&mut doc, &storage, &config()).await.unwrap();

        let second = doc.pages[1].id;
        doc.set_current_page(second).unwrap();
        let on_second = load_config(&doc, &storage).await.unwrap();
        assert_eq!(on_second.language, None);
        // Global and document scopes still apply.
        assert_eq!(on_second.namespace.as_deref(), Some("app"));

        let updated = set_language(&mut doc, &storage, "de".into()).await.unwrap();
        assert_eq!(updated.language.as_deref(), Some("de"));
        assert_eq!(updated.api_url.as_deref(), Some("https://translate.example"));
    }

    #[tokio::test]
    async fn test_copy_page_keeps_its_flag_on_language_change() {
        let mut doc = Document::new();
        let storage = MemoryStorage::new();
        let page = doc.pages[0].id;
        write_page_settings(
            &mut doc,
            page,
            &PageSettings {
                language: Some("de".into()),
                page_info: Some(true),
                page_copy: Some(true),
            },
        )
        .unwrap();

        let loaded = load_config(&doc, &storage).await.unwrap();
        assert_eq!(loaded.page_copy, Some(true));

        let switched = set_language(&mut doc, &storage, "fr".into()).await.unwrap();
        assert_eq!(switched.language.as_deref(), Some("fr"));
        assert_eq!(switched.page_copy, Some(true));
        assert!(doc.pages[0].plugin_data.contains("\"pageCopy\":true"));
    }

    #[tokio::test]
    async fn test_reset_clears_all_pages() {
        let mut doc = Document::with_pages(vec![Page::new("A"), Page::new("B")]);
        let storage = MemoryStorage::new();
        save_config(&mut doc, &storage, &config()).await.unwrap();
        let b = doc.pages[1].id;
        write_page_settings(
            &mut doc,
            b,
            &PageSettings {
                language: Some("fr".into()),
                ..PageSettings::default()
            },
        )
        .unwrap();

        let after = reset_config(&mut doc, &storage).await.unwrap();
        assert_eq!(after, PluginConfig::default());
        assert!(storage.get(CONFIG_KEY).await.is_none());
        assert!(doc.pages.iter().all(|p| p.plugin_data.is_empty()));
    }

    #[tokio::test]
    async fn test_malformed_scope_is_reported() {
        let mut doc = Document::new();
        doc.plugin_data = "{not json".into();
        let storage = MemoryStorage::new();
        let err = load_config(&doc, &storage).await.unwrap_err();
        assert!(err.to_string().contains("document"));
    }
}
