//! In-memory document tree.
//!
//! Mirrors the subset of a design document the sync layer touches: pages,
//! frames, and text layers. Each text layer carries its linkage as a JSON
//! plugin-data string, and pages / the document root carry settings blobs
//! the same way.

use std::collections::HashSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::{NodeLinkage, TextNode};

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Node not found: {0}")]
    NodeNotFound(Uuid),
    #[error("Node {0} is not a text layer")]
    NotAText(Uuid),
    #[error("Node {0} is not a frame")]
    NotAFrame(Uuid),
    #[error("Font '{family} {style}' is not loaded")]
    FontNotLoaded { family: String, style: String },
    #[error("Page not found: {0}")]
    PageNotFound(Uuid),
    #[error("Document has no pages")]
    NoPages,
    #[error("Page {0} is the current page and cannot be removed")]
    CurrentPage(Uuid),
    #[error("Linkage encoding failed: {0}")]
    Linkage(#[from] serde_json::Error),
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub struct FontName {
    pub family: String,
    pub style: String,
}

impl Default for FontName {
    fn default() -> Self {
        Self {
            family: "Inter".to_string(),
            style: "Regular".to_string(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Layer {
    Frame(FrameLayer),
    Text(TextLayer),
}

impl Layer {
    pub fn id(&self) -> Uuid {
        match self {
            Layer::Frame(frame) => frame.id,
            Layer::Text(text) => text.id,
        }
    }

    fn find(&self, id: Uuid) -> Option<&Layer> {
        if self.id() == id {
            return Some(self);
        }
        match self {
            Layer::Frame(frame) => frame.children.iter().find_map(|child| child.find(id)),
            Layer::Text(_) => None,
        }
    }

    fn find_text_mut(&mut self, id: Uuid) -> Option<&mut TextLayer> {
        match self {
            Layer::Text(text) if text.id == id => Some(text),
            Layer::Text(_) => None,
            Layer::Frame(frame) => frame
                .children
                .iter_mut()
                .find_map(|child| child.find_text_mut(id)),
        }
    }

    fn collect_text<'a>(&'a self, out: &mut Vec<&'a TextLayer>) {
        match self {
            Layer::Text(text) => out.push(text),
            Layer::Frame(frame) => {
                for child in &frame.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Deep copy with freshly generated ids.
    fn duplicate(&self) -> Layer {
        match self {
            Layer::Text(text) => Layer::Text(TextLayer {
                id: Uuid::new_v4(),
                ..text.clone()
            }),
            Layer::Frame(frame) => Layer::Frame(FrameLayer {
                id: Uuid::new_v4(),
                name: frame.name.clone(),
                bounds: frame.bounds.clone(),
                children: frame.children.iter().map(Layer::duplicate).collect(),
            }),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct FrameLayer {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bounds: Rect,
    #[serde(default)]
    pub children: Vec<Layer>,
}

impl FrameLayer {
    pub fn new(name: impl Into<String>, bounds: Rect) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            bounds,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, layer: impl Into<Layer>) -> Self {
        self.children.push(layer.into());
        self
    }

    fn text_layers(&self) -> Vec<&TextLayer> {
        let mut out = Vec::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    pub characters: String,
    #[serde(default)]
    pub font: FontName,
    #[serde(default)]
    pub bounds: Rect,
    /// Whether the layer name follows its content.
    #[serde(default = "default_auto_rename")]
    pub auto_rename: bool,
    /// Serialized [`NodeLinkage`], empty when never linked.
    #[serde(default)]
    pub plugin_data: String,
}

fn default_auto_rename() -> bool {
    true
}

impl TextLayer {
    pub fn new(characters: impl Into<String>) -> Self {
        let characters = characters.into();
        Self {
            id: Uuid::new_v4(),
            name: characters.clone(),
            characters,
            font: FontName::default(),
            bounds: Rect::default(),
            auto_rename: true,
            plugin_data: String::new(),
        }
    }

    pub fn with_linkage(mut self, linkage: &NodeLinkage) -> Self {
        self.plugin_data = serde_json::to_string(linkage).unwrap_or_default();
        self
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    /// Decode the stored linkage; anything unreadable counts as unlinked.
    pub fn linkage(&self) -> NodeLinkage {
        if self.plugin_data.is_empty() {
            return NodeLinkage::default();
        }
        serde_json::from_str(&self.plugin_data).unwrap_or_else(|e| {
            log::debug!("Ignoring unreadable linkage on {}: {e}", self.id);
            NodeLinkage::default()
        })
    }

    pub fn snapshot(&self) -> TextNode {
        let linkage = self.linkage();
        TextNode {
            id: self.id,
            name: self.name.clone(),
            key: linkage.key,
            ns: linkage.ns,
            connected: linkage.connected,
            characters: self.characters.clone(),
        }
    }
}

impl From<TextLayer> for Layer {
    fn from(text: TextLayer) -> Self {
        Layer::Text(text)
    }
}

impl From<FrameLayer> for Layer {
    fn from(frame: FrameLayer) -> Self {
        Layer::Frame(frame)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub layers: Vec<Layer>,
    /// Serialized page settings.
    #[serde(default)]
    pub plugin_data: String,
}

impl Page {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            layers: Vec::new(),
            plugin_data: String::new(),
        }
    }

    pub fn with_layer(mut self, layer: impl Into<Layer>) -> Self {
        self.layers.push(layer.into());
        self
    }

    pub fn find(&self, id: Uuid) -> Option<&Layer> {
        self.layers.iter().find_map(|layer| layer.find(id))
    }

    pub fn text_layers(&self) -> Vec<&TextLayer> {
        let mut out = Vec::new();
        for layer in &self.layers {
            layer.collect_text(&mut out);
        }
        out
    }

    pub fn text_nodes(&self) -> Vec<TextNode> {
        self.text_layers().into_iter().map(TextLayer::snapshot).collect()
    }
}

/// A frame prepared for preview export.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameInfo {
    pub id: Uuid,
    pub name: String,
    pub bounds: Rect,
    /// Text nodes inside the frame.
    pub nodes: Vec<TextNode>,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    pub pages: Vec<Page>,
    #[serde(default)]
    pub current_page: usize,
    #[serde(default)]
    pub selection: Vec<Uuid>,
    /// Serialized document settings.
    #[serde(default)]
    pub plugin_data: String,
    #[serde(skip)]
    loaded_fonts: HashSet<FontName>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: "Untitled".to_string(),
            pages: vec![Page::new("Page 1")],
            current_page: 0,
            selection: Vec::new(),
            plugin_data: String::new(),
            loaded_fonts: HashSet::new(),
        }
    }

    pub fn with_pages(pages: Vec<Page>) -> Self {
        Self {
            pages,
            ..Self::new()
        }
    }

    // ---------------------------------------------------------------
    // Pages
    // ---------------------------------------------------------------

    pub fn current_page(&self) -> Result<&Page, DocumentError> {
        self.pages.get(self.current_page).ok_or(DocumentError::NoPages)
    }

    pub fn page(&self, id: Uuid) -> Result<&Page, DocumentError> {
        self.pages
            .iter()
            .find(|page| page.id == id)
            .ok_or(DocumentError::PageNotFound(id))
    }

    pub fn page_mut(&mut self, id: Uuid) -> Result<&mut Page, DocumentError> {
        self.pages
            .iter_mut()
            .find(|page| page.id == id)
            .ok_or(DocumentError::PageNotFound(id))
    }

    pub fn set_current_page(&mut self, id: Uuid) -> Result<(), DocumentError> {
        let index = self
            .pages
            .iter()
            .position(|page| page.id == id)
            .ok_or(DocumentError::PageNotFound(id))?;
        self.current_page = index;
        self.selection.clear();
        Ok(())
    }

    /// Clone the current page (fresh layer ids) and insert it right after.
    pub fn duplicate_current_page(&mut self, name: impl Into<String>) -> Result<Uuid, DocumentError> {
        let source = self.current_page()?;
        let copy = Page {
            id: Uuid::new_v4(),
            name: name.into(),
            layers: source.layers.iter().map(Layer::duplicate).collect(),
            plugin_data: source.plugin_data.clone(),
        };
        let id = copy.id;
        self.pages.insert(self.current_page + 1, copy);
        Ok(id)
    }

    /// Remove a page; the current page itself cannot be removed.
    pub fn remove_page(&mut self, id: Uuid) -> Result<(), DocumentError> {
        let index = self
            .pages
            .iter()
            .position(|page| page.id == id)
            .ok_or(DocumentError::PageNotFound(id))?;
        if index == self.current_page {
            return Err(DocumentError::CurrentPage(id));
        }
        self.pages.remove(index);
        if index < self.current_page {
            self.current_page -= 1;
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// All text nodes on the current page.
    pub fn page_text_nodes(&self) -> Vec<TextNode> {
        self.current_page().map(Page::text_nodes).unwrap_or_default()
    }

    /// Text nodes under the current selection, in selection order.
    pub fn selection_text_nodes(&self) -> Vec<TextNode> {
        let Ok(page) = self.current_page() else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for id in &self.selection {
            let Some(layer) = page.find(*id) else { continue };
            let mut texts = Vec::new();
            layer.collect_text(&mut texts);
            for text in texts {
                if seen.insert(text.id) {
                    out.push(text.snapshot());
                }
            }
        }
        out
    }

    pub fn something_selected(&self) -> bool {
        !self.selection.is_empty()
    }

    pub fn find(&self, id: Uuid) -> Option<&Layer> {
        self.pages.iter().find_map(|page| page.find(id))
    }

    fn text_mut(&mut self, id: Uuid) -> Result<&mut TextLayer, DocumentError> {
        if !matches!(self.find(id), Some(Layer::Text(_))) {
            return match self.find(id) {
                Some(_) => Err(DocumentError::NotAText(id)),
                None => Err(DocumentError::NodeNotFound(id)),
            };
        }
        self.pages
            .iter_mut()
            .flat_map(|page| page.layers.iter_mut())
            .find_map(|layer| layer.find_text_mut(id))
            .ok_or(DocumentError::NodeNotFound(id))
    }

    // ---------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------

    pub fn select(&mut self, ids: &[Uuid]) -> Result<(), DocumentError> {
        let page = self.current_page()?;
        if let Some(missing) = ids.iter().find(|id| page.find(**id).is_none()) {
            return Err(DocumentError::NodeNotFound(*missing));
        }
        self.selection = ids.to_vec();
        Ok(())
    }

    pub fn set_linkage(&mut self, id: Uuid, linkage: &NodeLinkage) -> Result<(), DocumentError> {
        let encoded = serde_json::to_string(linkage)?;
        self.text_mut(id)?.plugin_data = encoded;
        Ok(())
    }

    /// Make the fonts used by `ids` available for text edits.
    pub fn load_fonts(&mut self, ids: &[Uuid]) -> Result<usize, DocumentError> {
        let mut fonts = Vec::with_capacity(ids.len());
        for id in ids {
            match self.find(*id) {
                Some(Layer::Text(text)) => fonts.push(text.font.clone()),
                Some(_) => return Err(DocumentError::NotAText(*id)),
                None => return Err(DocumentError::NodeNotFound(*id)),
            }
        }
        let before = self.loaded_fonts.len();
        self.loaded_fonts.extend(fonts);
        Ok(self.loaded_fonts.len() - before)
    }

    pub fn is_font_loaded(&self, font: &FontName) -> bool {
        self.loaded_fonts.contains(font)
    }

    /// Replace the text of a layer. Its font must be loaded first.
    pub fn set_text(&mut self, id: Uuid, characters: &str) -> Result<(), DocumentError> {
        let loaded = match self.find(id) {
            Some(Layer::Text(text)) => self.is_font_loaded(&text.font),
            Some(_) => return Err(DocumentError::NotAText(id)),
            None => return Err(DocumentError::NodeNotFound(id)),
        };
        let text = self.text_mut(id)?;
        if !loaded {
            return Err(DocumentError::FontNotLoaded {
                family: text.font.family.clone(),
                style: text.font.style.clone(),
            });
        }
        text.auto_rename = false;
        text.characters = characters.to_string();
        Ok(())
    }

    // ---------------------------------------------------------------
    // Previews
    // ---------------------------------------------------------------

    /// Frames to preview: selected frames, or every top-level frame on
    /// the current page that contains text.
    pub fn screenshot_frames(&self) -> Vec<FrameInfo> {
        let Ok(page) = self.current_page() else {
            return Vec::new();
        };
        let info = |frame: &FrameLayer| FrameInfo {
            id: frame.id,
            name: frame.name.clone(),
            bounds: frame.bounds.clone(),
            nodes: frame.text_layers().into_iter().map(TextLayer::snapshot).collect(),
        };

        if self.something_selected() {
            return self
                .selection
                .iter()
                .filter_map(|id| match page.find(*id) {
                    Some(Layer::Frame(frame)) => Some(info(frame)),
                    _ => None,
                })
                .collect();
        }

        page.layers
            .iter()
            .filter_map(|layer| match layer {
                Layer::Frame(frame) if !frame.text_layers().is_empty() => Some(info(frame)),
                _ => None,
            })
            .collect()
    }

    /// Render a frame as SVG bytes.
    pub fn export_svg(&self, id: Uuid) -> Result<Vec<u8>, DocumentError> {
        let frame = match self.find(id) {
            Some(Layer::Frame(frame)) => frame,
            Some(_) => return Err(DocumentError::NotAFrame(id)),
            None => return Err(DocumentError::NodeNotFound(id)),
        };
        let (w, h) = (frame.bounds.width, frame.bounds.height);
        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        );
        let _ = write!(svg, r##"<rect width="{w}" height="{h}" fill="#ffffff"/>"##);
        for child in &frame.children {
            render_layer(child, 0.0, 0.0, &mut svg);
        }
        svg.push_str("</svg>");
        Ok(svg.into_bytes())
    }
}

fn render_layer(layer: &Layer, dx: f32, dy: f32, out: &mut String) {
    match layer {
        Layer::Text(text) => {
            let x = dx + text.bounds.x;
            let y = dy + text.bounds.y + text.bounds.height;
            let _ = write!(
                out,
                r#"<text x="{x}" y="{y}" font-family="{}">{}</text>"#,
                escape_xml(&text.font.family),
                escape_xml(&text.characters)
            );
        }
        Layer::Frame(frame) => {
            for child in &frame.children {
                render_layer(child, dx + frame.bounds.x, dy + frame.bounds.y, out);
            }
        }
    }
}

fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, Uuid, Uuid, Uuid) {
        let greet = TextLayer::new("Hi").with_linkage(&NodeLinkage::new("greet", None, true));
        let free = TextLayer::new("free");
        let (greet_id, free_id) = (greet.id, free.id);
        let frame = FrameLayer::new("Card", Rect::new(0.0, 0.0, 200.0, 100.0))
            .with_child(greet)
            .with_child(free);
        let frame_id = frame.id;
        let doc = Document::with_pages(vec![Page::new("Page 1").with_layer(frame)]);
        (doc, frame_id, greet_id, free_id)
    }

    #[test]
    fn test_document_creation() {
        let doc = Document::new();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.current_page().unwrap().name, "Page 1");
        assert!(!doc.something_selected());
    }

    #[test]
    fn test_linkage_roundtrip_through_plugin_data() {
        let (mut doc, _, greet, free) = sample();
        let nodes = doc.page_text_nodes();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].key, "greet");
        assert!(nodes[0].connected);
        assert!(!nodes[1].connected);

        doc.set_linkage(free, &NodeLinkage::new("bye", Some("auth".into()), true))
            .unwrap();
        let free_node = doc
            .page_text_nodes()
            .into_iter()
            .find(|n| n.id == free)
            .unwrap();
        assert_eq!(free_node.key, "bye");
        assert_eq!(free_node.ns.as_deref(), Some("auth"));
        assert!(doc.set_linkage(Uuid::new_v4(), &NodeLinkage::default()).is_err());
        assert!(doc.find(greet).is_some());
    }

    #[test]
    fn test_garbled_linkage_reads_as_unlinked() {
        let mut text = TextLayer::new("x");
        text.plugin_data = "{not json".into();
        assert_eq!(text.linkage(), NodeLinkage::default());
    }

    #[test]
    fn test_selection_expands_frames() {
        let (mut doc, frame, greet, _) = sample();
        doc.select(&[greet]).unwrap();
        assert_eq!(doc.selection_text_nodes().len(), 1);

        doc.select(&[greet, frame]).unwrap();
        let ids: Vec<_> = doc.selection_text_nodes().iter().map(|n| n.id).collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], greet);

        assert!(doc.select(&[Uuid::new_v4()]).is_err());
    }

    #[test]
    fn test_set_text_requires_font() {
        let (mut doc, frame, greet, _) = sample();
        let err = doc.set_text(greet, "Hello").unwrap_err();
        assert!(matches!(err, DocumentError::FontNotLoaded { .. }));

        assert_eq!(doc.load_fonts(&[greet]).unwrap(), 1);
        doc.set_text(greet, "Hello").unwrap();
        match doc.find(greet) {
            Some(Layer::Text(text)) => {
                assert_eq!(text.characters, "Hello");
                assert!(!text.auto_rename);
            }
            other => panic!("Expected text layer, got {other:?}"),
        }
        assert!(matches!(doc.set_text(frame, "x"), Err(DocumentError::NotAText(_))));
    }

    #[test]
    fn test_duplicate_and_remove_page() {
        let (mut doc, _, greet, _) = sample();
        let copy = doc.duplicate_current_page("Page 1 - de").unwrap();
        assert_eq!(doc.pages.len(), 2);
        let copied = doc.page(copy).unwrap();
        assert_eq!(copied.text_layers().len(), 2);
        assert!(copied.find(greet).is_none(), "ids must be fresh");
        assert_eq!(copied.text_nodes()[0].key, "greet");

        doc.remove_page(copy).unwrap();
        assert_eq!(doc.pages.len(), 1);
    }

    #[test]
    fn test_remove_current_page_is_refused() {
        let (mut doc, _, _, _) = sample();
        let current = doc.current_page().unwrap().id;
        assert!(matches!(
            doc.remove_page(current),
            Err(DocumentError::CurrentPage(id)) if id == current
        ));
        assert_eq!(doc.pages.len(), 1);
        assert!(matches!(
            doc.remove_page(Uuid::new_v4()),
            Err(DocumentError::PageNotFound(_))
        ));
    }

    #[test]
    fn test_screenshot_frames() {
        let (mut doc, frame, greet, _) = sample();
        let frames = doc.screenshot_frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].id, frame);
        assert_eq!(frames[0].nodes.len(), 2);

        doc.select(&[greet]).unwrap();
        assert!(doc.screenshot_frames().is_empty());
    }

    #[test]
    fn test_export_svg_escapes_text() {
        let text = TextLayer::new("Tom & <Jerry>").with_bounds(Rect::new(10.0, 5.0, 50.0, 20.0));
        let frame = FrameLayer::new("F", Rect::new(0.0, 0.0, 100.0, 40.0)).with_child(text);
        let id = frame.id;
        let doc = Document::with_pages(vec![Page::new("P").with_layer(frame)]);

        let svg = String::from_utf8(doc.export_svg(id).unwrap()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Tom &amp; &lt;Jerry&gt;"));
        assert!(svg.contains(r#"x="10" y="25""#));
    }

    #[test]
    fn test_document_json_roundtrip_keeps_linkage() {
        let (doc, _, greet, _) = sample();
        let json = serde_json::to_string(&doc).unwrap();
        let parsed: Document = serde_json::from_str(&json).unwrap();
        let node = parsed
            .page_text_nodes()
            .into_iter()
            .find(|n| n.id == greet)
            .unwrap();
        assert_eq!(node.key, "greet");
    }
}
