//! Pull: bring remote translations into the document.

use lingo_core::{compute_pull_changes, PullChanges, TextNode};

use super::client::DocumentClient;
use super::service::TranslationService;
use super::SyncError;
use crate::endpoints::NodeQuery;

/// A computed pull, ready to be confirmed and applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullPlan {
    pub language: String,
    /// Nodes with a key that the diff looked at.
    pub considered: Vec<TextNode>,
    pub changes: PullChanges,
}

impl PullPlan {
    /// Considered nodes whose linkage must still be marked connected.
    pub fn to_connect(&self) -> Vec<TextNode> {
        self.considered
            .iter()
            .filter(|node| !node.connected)
            .map(|node| TextNode {
                connected: true,
                ..node.clone()
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullOutcome {
    pub updated: usize,
    pub connected: usize,
}

/// Read the nodes selected by `query`, fetch every remote translation for
/// `language`, and diff them.
pub async fn prepare_pull(
    client: &DocumentClient,
    service: &dyn TranslationService,
    language: &str,
    query: NodeQuery,
) -> Result<PullPlan, SyncError> {
    let selection = client.nodes(query).await?;
    let considered: Vec<TextNode> = selection
        .items
        .into_iter()
        .filter(TextNode::has_key)
        .collect();

    let records = service.fetch_translations(&[], language).await?;
    let changes = compute_pull_changes(&considered, language, &records)?;
    log::info!(
        "Pull ({language}): {} text(s) to replace, {} key(s) missing locally",
        changes.changed_nodes.len(),
        changes.missing_keys.len()
    );
    Ok(PullPlan {
        language: language.to_string(),
        considered,
        changes,
    })
}

/// Write changed texts, connect the remaining keyed nodes, then remember
/// the language on the page.
pub async fn apply_pull(client: &DocumentClient, plan: &PullPlan) -> Result<PullOutcome, SyncError> {
    let mut outcome = PullOutcome::default();
    if !plan.changes.changed_nodes.is_empty() {
        outcome.updated = client.update_nodes(plan.changes.changed_nodes.clone()).await?;
    }
    outcome.connected = client.set_nodes_data(plan.to_connect()).await?;
    client.set_language(&plan.language).await?;
    Ok(outcome)
}
