//! HTML parsing and serialization for the editable document.

use lm_core::EditorResult;
use lm_dom::Document;
use lm_dom::NodeId;
use lm_dom::Position;

mod entities;
mod serialize;
mod tokenizer;
mod tree;

pub use entities::decode_entities;
pub use serialize::is_overlay_element;
pub use serialize::plain_text;
pub use serialize::serialize_children;
pub use serialize::serialize_node;
pub use tree::parse_into;

/// The document used whenever content is missing or cannot be loaded.
pub const EMPTY_DOCUMENT: &str = "<p><br></p>";

/// Bounds applied when loading untrusted HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadLimits {
    pub max_bytes: usize,
    pub max_depth: usize,
}

impl Default for LoadLimits {
    fn default() -> Self {
        Self {
            max_bytes: 8 * 1024 * 1024,
            max_depth: 256,
        }
    }
}

/// Replaces the document content with `html`. On failure the document is
/// reset to [`EMPTY_DOCUMENT`] and the error is returned.
pub fn load_document(doc: &mut Document, html: &str, limits: &LoadLimits) -> EditorResult<()> {
    let root = doc.root();
    doc.clear_children(root);
    if let Err(error) = parse_into(doc, root, html, limits) {
        doc.reset_to_empty();
        return Err(error);
    }
    doc.normalize_text(root);
    doc.normalize_root();
    set_caret_initial(doc);
    Ok(())
}

/// Serialized inner HTML of the editable root.
pub fn serialize_document(doc: &Document) -> String {
    serialize_children(doc, doc.root())
}

/// Parses `html` into detached nodes owned by `doc`.
pub fn parse_fragment(
    doc: &mut Document,
    html: &str,
    limits: &LoadLimits,
) -> EditorResult<Vec<NodeId>> {
    let holder = doc.create_element("div");
    parse_into(doc, holder, html, limits)?;
    let nodes = doc.children(holder).to_vec();
    for node in &nodes {
        doc.detach(*node);
    }
    doc.remove(holder);
    Ok(nodes)
}

/// Caret at the start of the first text node, or inside the first block.
pub fn set_caret_initial(doc: &mut Document) {
    let root = doc.root();
    if let Some(text) = doc.text_nodes_under(root).into_iter().next() {
        doc.set_caret(Position::new(text, 0));
    } else if let Some(block) = doc.first_child(root) {
        doc.set_caret(Position::new(block, 0));
    }
}
