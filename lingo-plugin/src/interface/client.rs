//! Typed calls from the interface context into the document context.

use lingo_bridge::{Bridge, BridgeError};
use lingo_core::{PluginConfig, TextNode};
use uuid::Uuid;

use crate::endpoints::{
    CopiedPage, CopyPageRequest, FrameScreenshot, HighlightRequest, NodeQuery, NodeSelection,
    COPY_PAGE, GET_CONFIG, GET_NODES, GET_SCREENSHOTS, HIGHLIGHT_NODE, RESET_CONFIG, SET_CONFIG,
    SET_LANGUAGE, SET_NODES_DATA, UPDATE_NODES,
};

/// Interface-side handle on the document endpoints.
#[derive(Clone)]
pub struct DocumentClient {
    bridge: Bridge,
}

impl DocumentClient {
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    pub async fn nodes(&self, query: NodeQuery) -> Result<NodeSelection, BridgeError> {
        self.bridge.call(&GET_NODES, &query).await
    }

    pub async fn set_nodes_data(&self, nodes: Vec<TextNode>) -> Result<usize, BridgeError> {
        self.bridge.call(&SET_NODES_DATA, &nodes.into()).await
    }

    pub async fn update_nodes(&self, nodes: Vec<TextNode>) -> Result<usize, BridgeError> {
        self.bridge.call(&UPDATE_NODES, &nodes.into()).await
    }

    pub async fn highlight(&self, id: Uuid) -> Result<(), BridgeError> {
        self.bridge.call(&HIGHLIGHT_NODE, &HighlightRequest { id }).await
    }

    pub async fn screenshots(&self) -> Result<Vec<FrameScreenshot>, BridgeError> {
        self.bridge.call(&GET_SCREENSHOTS, &()).await
    }

    pub async fn copy_page(&self, request: &CopyPageRequest) -> Result<CopiedPage, BridgeError> {
        self.bridge.call(&COPY_PAGE, request).await
    }

    pub async fn config(&self) -> Result<PluginConfig, BridgeError> {
        self.bridge.call(&GET_CONFIG, &()).await
    }

    pub async fn save_config(&self, config: &PluginConfig) -> Result<PluginConfig, BridgeError> {
        self.bridge.call(&SET_CONFIG, config).await
    }

    pub async fn set_language(&self, language: &str) -> Result<PluginConfig, BridgeError> {
        self.bridge.call(&SET_LANGUAGE, &language.to_string()).await
    }

    pub async fn reset_config(&self) -> Result<PluginConfig, BridgeError> {
        self.bridge.call(&RESET_CONFIG, &()).await
    }
}
