//! Endpoints shared by the document and interface contexts.
//!
//! | endpoint          | input                     | output              |
//! |-------------------|---------------------------|---------------------|
//! | `GET_NODES`       | [`NodeQuery`]             | [`NodeSelection`]   |
//! | `SET_NODES_DATA`  | [`NodeBatch`]             | nodes written       |
//! | `UPDATE_NODES`    | [`NodeBatch`]             | nodes updated       |
//! | `HIGHLIGHT_NODE`  | [`HighlightRequest`]      | `()`                |
//! | `GET_SCREENSHOTS` | `()`                      | [`FrameScreenshot`]s|
//! | `COPY_PAGE`       | [`CopyPageRequest`]       | [`CopiedPage`]      |
//! | `GET_CONFIG`      | `()`                      | [`PluginConfig`]    |
//! | `SET_CONFIG`      | [`PluginConfig`]          | [`PluginConfig`]    |
//! | `SET_LANGUAGE`    | language tag              | [`PluginConfig`]    |
//! | `RESET_CONFIG`    | `()`                      | [`PluginConfig`]    |

use lingo_bridge::Endpoint;
use lingo_core::{PluginConfig, TextNode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const GET_NODES: Endpoint<NodeQuery, NodeSelection> = Endpoint::new("GET_NODES");
pub const SET_NODES_DATA: Endpoint<NodeBatch, usize> = Endpoint::new("SET_NODES_DATA");
pub const UPDATE_NODES: Endpoint<NodeBatch, usize> = Endpoint::new("UPDATE_NODES");
pub const HIGHLIGHT_NODE: Endpoint<HighlightRequest, ()> = Endpoint::new("HIGHLIGHT_NODE");
pub const GET_SCREENSHOTS: Endpoint<(), Vec<FrameScreenshot>> = Endpoint::exclusive("GET_SCREENSHOTS");
pub const COPY_PAGE: Endpoint<CopyPageRequest, CopiedPage> = Endpoint::exclusive("COPY_PAGE");
pub const GET_CONFIG: Endpoint<(), PluginConfig> = Endpoint::new("GET_CONFIG");
pub const SET_CONFIG: Endpoint<PluginConfig, PluginConfig> = Endpoint::new("SET_CONFIG");
pub const SET_LANGUAGE: Endpoint<String, PluginConfig> = Endpoint::new("SET_LANGUAGE");
pub const RESET_CONFIG: Endpoint<(), PluginConfig> = Endpoint::new("RESET_CONFIG");

/// Which text nodes to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeQuery {
    /// Read the whole current page even when something is selected.
    #[serde(default)]
    pub ignore_selection: bool,
    /// Only nodes whose linkage is marked connected.
    #[serde(default)]
    pub connected_only: bool,
}

impl NodeQuery {
    pub fn page() -> Self {
        Self {
            ignore_selection: true,
            connected_only: false,
        }
    }

    pub fn connected(mut self) -> Self {
        self.connected_only = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSelection {
    pub items: Vec<TextNode>,
    pub something_selected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeBatch {
    pub nodes: Vec<TextNode>,
}

impl From<Vec<TextNode>> for NodeBatch {
    fn from(nodes: Vec<TextNode>) -> Self {
        Self { nodes }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightRequest {
    pub id: Uuid,
}

/// Rendered preview of one frame and the text it contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameScreenshot {
    pub id: Uuid,
    pub name: String,
    pub width: f32,
    pub height: f32,
    /// SVG document bytes
    pub image: Vec<u8>,
    pub nodes: Vec<TextNode>,
}

/// Text to place into nodes bound to `(key, ns)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyedText {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,
    pub characters: String,
}

/// Page copy request. Without a language the copy shows keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyPageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub texts: Vec<KeyedText>,
}

impl CopyPageRequest {
    pub fn keys() -> Self {
        Self::default()
    }

    pub fn translated(language: impl Into<String>, texts: Vec<KeyedText>) -> Self {
        Self {
            language: Some(language.into()),
            texts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopiedPage {
    pub page_id: Uuid,
    pub name: String,
    /// Connected text nodes rewritten on the copy.
    pub updated: usize,
    /// Earlier copies with the same name that were removed.
    pub replaced: usize,
}
