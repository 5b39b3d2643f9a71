//! Page copies: refresh a translated copy, or create one.

use lingo_core::{compute_pull_changes, TranslationRecord};

use super::client::DocumentClient;
use super::service::TranslationService;
use super::SyncError;
use crate::endpoints::{CopiedPage, CopyPageRequest, KeyedText, NodeQuery};

/// Pull translations into the connected nodes of the selection (or of the
/// page when nothing is selected) and apply them right away.
pub async fn pull_into_copy(
    client: &DocumentClient,
    service: &dyn TranslationService,
    language: &str,
) -> Result<usize, SyncError> {
    let records = service.fetch_translations(&[], language).await?;
    let connected = client.nodes(NodeQuery::default().connected()).await?;
    let changes = compute_pull_changes(&connected.items, language, &records)?;
    if changes.changed_nodes.is_empty() {
        return Ok(0);
    }
    Ok(client.update_nodes(changes.changed_nodes).await?)
}

fn keyed_texts(records: &[TranslationRecord], language: &str) -> Vec<KeyedText> {
    records
        .iter()
        .filter_map(|record| {
            record.text(language).map(|text| KeyedText {
                key: record.key_name.clone(),
                ns: record.namespace.clone(),
                characters: text.to_string(),
            })
        })
        .collect()
}

/// Copy the current page with translations for `language`, or with the
/// keys themselves when `language` is `None`.
pub async fn create_page_copy(
    client: &DocumentClient,
    service: &dyn TranslationService,
    language: Option<&str>,
) -> Result<CopiedPage, SyncError> {
    let request = match language {
        Some(language) => {
            let records = service.fetch_translations(&[], language).await?;
            CopyPageRequest::translated(language, keyed_texts(&records, language))
        }
        None => CopyPageRequest::keys(),
    };
    Ok(client.copy_page(&request).await?)
}
