//! Endpoint handlers of the document context.

use std::sync::Arc;

use lingo_bridge::Bridge;
use lingo_core::{PageSettings, PluginConfig, TextNode};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::host::DocumentHost;
use super::settings::{self, ClientStorage};
use super::HandlerError;
use crate::endpoints::{
    CopiedPage, CopyPageRequest, FrameScreenshot, HighlightRequest, NodeBatch, NodeQuery,
    NodeSelection, COPY_PAGE, GET_CONFIG, GET_NODES, GET_SCREENSHOTS, HIGHLIGHT_NODE,
    RESET_CONFIG, SET_CONFIG, SET_LANGUAGE, SET_NODES_DATA, UPDATE_NODES,
};

/// Read text nodes. Without a selection the whole page is read.
pub fn get_nodes<H: DocumentHost>(host: &H, query: NodeQuery) -> NodeSelection {
    let something_selected = host.something_selected();
    let mut items = if query.ignore_selection || !something_selected {
        host.page_nodes()
    } else {
        host.selection_nodes()
    };
    if query.connected_only {
        items.retain(|node| node.connected);
    }
    NodeSelection {
        items,
        something_selected,
    }
}

/// Persist the linkage of every node in `batch`. Unknown ids are skipped.
pub fn set_nodes_data<H: DocumentHost>(host: &mut H, batch: &NodeBatch) -> Result<usize, HandlerError> {
    let mut written = 0;
    for node in &batch.nodes {
        match host.set_node_linkage(node.id, &node.linkage()) {
            Ok(()) => written += 1,
            Err(lingo_core::DocumentError::NodeNotFound(id)) => {
                log::warn!("Skipping linkage for missing node {id}");
            }
            Err(e) => return Err(e.into()),
        }
    }
    log::debug!("Linkage written on {written} node(s)");
    Ok(written)
}

/// Load the fonts of every target node, then replace their text.
pub async fn update_nodes<H: DocumentHost>(host: &mut H, batch: &NodeBatch) -> Result<usize, HandlerError> {
    let ids: Vec<Uuid> = batch.nodes.iter().map(|node| node.id).collect();
    host.load_fonts(&ids).await?;
    for node in &batch.nodes {
        host.set_node_text(node.id, &node.characters)?;
    }
    log::info!("Document translations updated ({} node(s))", batch.nodes.len());
    Ok(batch.nodes.len())
}

pub fn get_screenshots<H: DocumentHost>(host: &H) -> Result<Vec<FrameScreenshot>, HandlerError> {
    host.preview_frames()
        .into_iter()
        .map(|frame| {
            Ok(FrameScreenshot {
                image: host.render_frame(frame.id)?,
                id: frame.id,
                name: frame.name,
                width: frame.bounds.width,
                height: frame.bounds.height,
                nodes: frame.nodes,
            })
        })
        .collect()
}

/// Clone the current page and fill its connected texts with translations
/// (or with their keys when no language is given).
pub async fn copy_page<H: DocumentHost>(
    host: &mut H,
    request: &CopyPageRequest,
) -> Result<CopiedPage, HandlerError> {
    let current = host.current_page()?;
    let name = format!(
        "{} - {}",
        current.name,
        request.language.as_deref().unwrap_or("keys")
    );

    let mut replaced = 0;
    for page in host.pages() {
        if page.id == current.id || page.name != name {
            continue;
        }
        let is_copy = matches!(
            settings::page_settings(host, page.id),
            Ok(PageSettings { page_copy: Some(true), .. })
        );
        if is_copy {
            host.remove_page(page.id)?;
            replaced += 1;
        }
    }

    let page_id = host.duplicate_current_page(&name)?;
    let connected: Vec<TextNode> = host
        .nodes_on_page(page_id)?
        .into_iter()
        .filter(|node| node.connected)
        .collect();
    let ids: Vec<Uuid> = connected.iter().map(|node| node.id).collect();
    host.load_fonts(&ids).await?;

    let mut updated = 0;
    for node in &connected {
        let text = match request.language {
            Some(_) => request
                .texts
                .iter()
                .find(|t| node.matches(&t.key, t.ns.as_deref()))
                .map(|t| t.characters.as_str())
                .filter(|text| !text.is_empty()),
            None => Some(node.key.as_str()),
        };
        if let Some(text) = text {
            host.set_node_text(node.id, text)?;
            updated += 1;
        }
    }

    settings::write_page_settings(
        host,
        page_id,
        &PageSettings {
            language: request.language.clone(),
            page_info: Some(true),
            page_copy: Some(true),
        },
    )?;

    log::info!("Created page \"{name}\" ({updated} text(s) rewritten)");
    Ok(CopiedPage {
        page_id,
        name,
        updated,
        replaced,
    })
}

/// Register every document endpoint on `bridge`.
pub async fn register_handlers<H: DocumentHost>(
    bridge: &Bridge,
    host: Arc<Mutex<H>>,
    storage: Arc<dyn ClientStorage>,
) {
    bridge
        .implement(&GET_NODES, {
            let host = host.clone();
            move |query: NodeQuery| {
                let host = host.clone();
                async move {
                    let host = host.lock().await;
                    Ok::<_, HandlerError>(get_nodes(&*host, query))
                }
            }
        })
        .await;

    bridge
        .implement(&SET_NODES_DATA, {
            let host = host.clone();
            move |batch: NodeBatch| {
                let host = host.clone();
                async move {
                    let mut host = host.lock().await;
                    set_nodes_data(&mut *host, &batch)
                }
            }
        })
        .await;

    bridge
        .implement(&UPDATE_NODES, {
            let host = host.clone();
            move |batch: NodeBatch| {
                let host = host.clone();
                async move {
                    let mut host = host.lock().await;
                    update_nodes(&mut *host, &batch).await
                }
            }
        })
        .await;

    bridge
        .implement(&HIGHLIGHT_NODE, {
            let host = host.clone();
            move |request: HighlightRequest| {
                let host = host.clone();
                async move {
                    host.lock().await.highlight(request.id)?;
                    Ok::<_, HandlerError>(())
                }
            }
        })
        .await;

    bridge
        .implement(&GET_SCREENSHOTS, {
            let host = host.clone();
            move |()| {
                let host = host.clone();
                async move {
                    let host = host.lock().await;
                    get_screenshots(&*host)
                }
            }
        })
        .await;

    bridge
        .implement(&COPY_PAGE, {
            let host = host.clone();
            move |request: CopyPageRequest| {
                let host = host.clone();
                async move {
                    let mut host = host.lock().await;
                    copy_page(&mut *host, &request).await
                }
            }
        })
        .await;

    // --- settings ---

    bridge
        .implement(&GET_CONFIG, {
            let (host, storage) = (host.clone(), storage.clone());
            move |()| {
                let (host, storage) = (host.clone(), storage.clone());
                async move {
                    let host = host.lock().await;
                    settings::load_config(&*host, &*storage).await
                }
            }
        })
        .await;

    bridge
        .implement(&SET_CONFIG, {
            let (host, storage) = (host.clone(), storage.clone());
            move |config: PluginConfig| {
                let (host, storage) = (host.clone(), storage.clone());
                async move {
                    let mut host = host.lock().await;
                    settings::save_config(&mut *host, &*storage, &config).await
                }
            }
        })
        .await;

    bridge
        .implement(&SET_LANGUAGE, {
            let (host, storage) = (host.clone(), storage.clone());
            move |language: String| {
                let (host, storage) = (host.clone(), storage.clone());
                async move {
                    let mut host = host.lock().await;
                    settings::set_language(&mut *host, &*storage, language).await
                }
            }
        })
        .await;

    bridge
        .implement(&RESET_CONFIG, {
            move |()| {
                let (host, storage) = (host.clone(), storage.clone());
                async move {
                    let mut host = host.lock().await;
                    settings::reset_config(&mut *host, &*storage).await
                }
            }
        })
        .await;

    log::debug!("[{}] Document handlers registered", bridge.label());
}
