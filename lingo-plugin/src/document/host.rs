//! The document tree as seen by the handlers.
//!
//! [`DocumentHost`] is the seam between the handlers and whatever owns the
//! editable tree. [`lingo_core::Document`] implements it in memory.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use lingo_core::{Document, DocumentError, FrameInfo, NodeLinkage, TextNode};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub id: Uuid,
    pub name: String,
}

pub trait DocumentHost: Send + Sync + 'static {
    // --- text nodes ---

    /// Text nodes under the current selection.
    fn selection_nodes(&self) -> Vec<TextNode>;
    /// Every text node on the current page.
    fn page_nodes(&self) -> Vec<TextNode>;
    fn something_selected(&self) -> bool;
    fn set_node_linkage(&mut self, id: Uuid, linkage: &NodeLinkage) -> Result<(), DocumentError>;
    /// Replace visible text. Fonts must have been loaded.
    fn set_node_text(&mut self, id: Uuid, characters: &str) -> Result<(), DocumentError>;
    fn load_fonts<'a>(&'a mut self, ids: &'a [Uuid]) -> BoxFuture<'a, Result<usize, DocumentError>>;
    fn highlight(&mut self, id: Uuid) -> Result<(), DocumentError>;

    // --- previews ---

    fn preview_frames(&self) -> Vec<FrameInfo>;
    fn render_frame(&self, id: Uuid) -> Result<Vec<u8>, DocumentError>;

    // --- pages ---

    fn pages(&self) -> Vec<PageSummary>;
    fn current_page(&self) -> Result<PageSummary, DocumentError>;
    /// Clone the current page under `name`; returns the new page id.
    fn duplicate_current_page(&mut self, name: &str) -> Result<Uuid, DocumentError>;
    fn remove_page(&mut self, id: Uuid) -> Result<(), DocumentError>;
    fn nodes_on_page(&self, page: Uuid) -> Result<Vec<TextNode>, DocumentError>;

    // --- plugin data ---

    fn document_data(&self) -> String;
    fn set_document_data(&mut self, data: String);
    fn page_data(&self, page: Uuid) -> Result<String, DocumentError>;
    fn set_page_data(&mut self, page: Uuid, data: String) -> Result<(), DocumentError>;
}

impl DocumentHost for Document {
    fn selection_nodes(&self) -> Vec<TextNode> {
        self.selection_text_nodes()
    }

    fn page_nodes(&self) -> Vec<TextNode> {
        self.page_text_nodes()
    }

    fn something_selected(&self) -> bool {
        Document::something_selected(self)
    }

    fn set_node_linkage(&mut self, id: Uuid, linkage: &NodeLinkage) -> Result<(), DocumentError> {
        self.set_linkage(id, linkage)
    }

    fn set_node_text(&mut self, id: Uuid, characters: &str) -> Result<(), DocumentError> {
        self.set_text(id, characters)
    }

    fn load_fonts<'a>(&'a mut self, ids: &'a [Uuid]) -> BoxFuture<'a, Result<usize, DocumentError>> {
        let loaded = Document::load_fonts(self, ids);
        async move { loaded }.boxed()
    }

    fn highlight(&mut self, id: Uuid) -> Result<(), DocumentError> {
        self.select(&[id])
    }

    fn preview_frames(&self) -> Vec<FrameInfo> {
        self.screenshot_frames()
    }

    fn render_frame(&self, id: Uuid) -> Result<Vec<u8>, DocumentError> {
        self.export_svg(id)
    }

    fn pages(&self) -> Vec<PageSummary> {
        self.pages
            .iter()
            .map(|page| PageSummary {
                id: page.id,
                name: page.name.clone(),
            })
            .collect()
    }

    fn current_page(&self) -> Result<PageSummary, DocumentError> {
        let page = Document::current_page(self)?;
        Ok(PageSummary {
            id: page.id,
            name: page.name.clone(),
        })
    }

    fn duplicate_current_page(&mut self, name: &str) -> Result<Uuid, DocumentError> {
        Document::duplicate_current_page(self, name)
    }

    fn remove_page(&mut self, id: Uuid) -> Result<(), DocumentError> {
        Document::remove_page(self, id)
    }

    fn nodes_on_page(&self, page: Uuid) -> Result<Vec<TextNode>, DocumentError> {
        Ok(self.page(page)?.text_nodes())
    }

    fn document_data(&self) -> String {
        self.plugin_data.clone()
    }

    fn set_document_data(&mut self, data: String) {
        self.plugin_data = data;
    }

    fn page_data(&self, page: Uuid) -> Result<String, DocumentError> {
        Ok(self.page(page)?.plugin_data.clone())
    }

    fn set_page_data(&mut self, page: Uuid, data: String) -> Result<(), DocumentError> {
        self.page_mut(page)?.plugin_data = data;
        Ok(())
    }
}
