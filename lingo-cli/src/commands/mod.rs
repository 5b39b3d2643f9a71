pub mod copy_page;
pub mod pull;
pub mod push;
pub mod screenshots;

pub use copy_page::{copy_page, CopyPageArgs};
pub use pull::{pull, PullArgs};
pub use push::{push, PushArgs};
pub use screenshots::{screenshots, ScreenshotsArgs};

use crate::config::Config;
use crate::files;
use anyhow::anyhow;
use lingo_core::Document;
use lingo_plugin::{connect_local, DocumentClient, LocalPlugin, MemoryStorage};
use std::path::Path;
use std::sync::Arc;

/// Load the document and start both contexts around it.
async fn open(path: &Path, config: &Config) -> anyhow::Result<LocalPlugin<Document>> {
    let document = files::load_document(path)?;
    log::debug!("Opened {} ({} page(s))", path.display(), document.pages.len());
    Ok(connect_local(document, Arc::new(MemoryStorage::new()), config.timeout()).await)
}

/// `--language`, then the config file, then the language stored on the page.
async fn resolve_language(
    flag: Option<String>,
    config: &Config,
    client: &DocumentClient,
) -> anyhow::Result<String> {
    if let Some(language) = flag.or_else(|| config.language.clone()) {
        return Ok(language);
    }
    client
        .config()
        .await?
        .language
        .ok_or_else(|| anyhow!("No language given; pass --language or set it in the config"))
}
