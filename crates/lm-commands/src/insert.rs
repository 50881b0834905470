//! Placing new nodes at the caret.

use crate::range::closest_block;
use crate::range::context_node;
use crate::range::drop_placeholder;
use crate::range::is_empty_block;
use crate::range::require_selection;
use crate::text::delete_contents;
use lm_core::EditorResult;
use lm_dom::Document;
use lm_dom::NodeId;
use lm_dom::Position;

/// Inserts `node` at `at`, splitting a text node when the position falls
/// inside one. A lone `<br>` placeholder at an element position is dropped.
pub fn insert_inline_at(doc: &mut Document, at: Position, node: NodeId) {
    if doc.is_text(at.node) {
        let len = doc.node_length(at.node);
        if at.offset == 0 {
            doc.insert_before(at.node, node);
        } else if at.offset >= len {
            doc.insert_after(at.node, node);
        } else if let Some(right) = doc.split_text(at.node, at.offset) {
            doc.insert_before(right, node);
        }
        return;
    }

    let before = doc.child_count(at.node);
    drop_placeholder(doc, at.node);
    let offset = if doc.child_count(at.node) < before {
        0
    } else {
        at.offset
    };
    doc.insert_child(at.node, offset, node);
}

/// Position right after `node` in its parent.
pub fn position_after(doc: &Document, node: NodeId) -> Option<Position> {
    let parent = doc.parent(node)?;
    let index = doc.index_in_parent(node)?;
    Some(Position::new(parent, index + 1))
}

/// Replaces the selection with an inline node and puts the caret after it.
pub fn insert_inline_at_caret(doc: &mut Document, node: NodeId) -> EditorResult<()> {
    if !require_selection(doc)?.is_collapsed() {
        delete_contents(doc)?;
    }
    let at = require_selection(doc)?.start;
    insert_inline_at(doc, at, node);
    if let Some(after) = position_after(doc, node) {
        doc.set_caret(after);
    }
    Ok(())
}

/// Replaces the selection with a block-level node. The enclosing block is
/// split at the caret and empty halves are dropped. Inside a table cell the
/// node goes into the cell itself.
pub fn insert_block_at_caret(doc: &mut Document, node: NodeId) -> EditorResult<()> {
    if !require_selection(doc)?.is_collapsed() {
        delete_contents(doc)?;
    }
    let at = require_selection(doc)?.start;
    let context = context_node(doc, at);
    let root = doc.root();

    let block = closest_block(doc, context);
    let in_cell = block.is_some_and(|block| matches!(doc.tag(block), Some("td" | "th")));
    match block {
        Some(_) if in_cell => insert_inline_at(doc, at, node),
        Some(block) => {
            let container = outermost_list(doc, block).unwrap_or(block);
            let right = doc.split_subtree(container, at);
            doc.insert_after(container, node);
            if is_empty_block(doc, container) {
                doc.remove(container);
            }
            if let Some(right) = right {
                if is_empty_block(doc, right) {
                    doc.remove(right);
                }
            }
        }
        None if at.node == root => doc.insert_child(root, at.offset, node),
        None => match doc.top_level_ancestor(context) {
            Some(top) => doc.insert_after(top, node),
            None => doc.append_child(root, node),
        },
    }

    if doc.is_element(node, "table") && !in_cell {
        let trailing = doc.create_element("p");
        let br = doc.create_element("br");
        doc.append_child(trailing, br);
        doc.insert_after(node, trailing);
        doc.set_caret(Position::new(trailing, 0));
    } else if let Some(after) = position_after(doc, node) {
        doc.set_caret(after);
    }
    Ok(())
}

/// Splitting a list item splits the whole list.
fn outermost_list(doc: &Document, block: NodeId) -> Option<NodeId> {
    let root = doc.root();
    doc.ancestors(block)
        .into_iter()
        .take_while(|ancestor| *ancestor != root)
        .filter(|ancestor| matches!(doc.tag(*ancestor), Some("ul" | "ol")))
        .last()
}

#[cfg(test)]
mod tests {
    use super::insert_block_at_caret;
    use super::insert_inline_at_caret;
    use lm_dom::Document;
    use lm_dom::Position;
    use lm_html::LoadLimits;
    use lm_html::load_document;
    use lm_html::serialize_document;

    fn load(html: &str) -> Document {
        let mut doc = Document::new();
        assert!(load_document(&mut doc, html, &LoadLimits::default()).is_ok());
        doc
    }

    #[test]
    fn block_insert_splits_the_paragraph() {
        let mut doc = load("<p>abcd</p>");
        let text = doc.text_nodes_under(doc.root())[0];
        doc.set_caret(Position::new(text, 2));
        let hr = doc.create_element("hr");
        assert!(insert_block_at_caret(&mut doc, hr).is_ok());
        assert_eq!(serialize_document(&doc), "<p>ab</p><hr><p>cd</p>");
    }

    #[test]
    fn table_gets_a_trailing_paragraph() {
        let mut doc = load("<p>ab</p>");
        let text = doc.text_nodes_under(doc.root())[0];
        doc.set_caret(Position::new(text, 2));
        let table = doc.create_element("table");
        assert!(insert_block_at_caret(&mut doc, table).is_ok());
        assert_eq!(
            serialize_document(&doc),
            "<p>ab</p><table></table><p><br></p>"
        );
        let caret = doc.selection().map(|range| range.start.node);
        assert_eq!(caret, doc.last_child(doc.root()));
    }

    #[test]
    fn block_in_empty_document_replaces_the_placeholder_paragraph() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        assert!(insert_block_at_caret(&mut doc, div).is_ok());
        assert_eq!(serialize_document(&doc), "<div></div>");
    }

    #[test]
    fn inline_insert_lands_between_characters() {
        let mut doc = load("<p>ab</p>");
        let text = doc.text_nodes_under(doc.root())[0];
        doc.set_caret(Position::new(text, 1));
        let img = doc.create_element("img");
        assert!(insert_inline_at_caret(&mut doc, img).is_ok());
        assert_eq!(serialize_document(&doc), "<p>a<img>b</p>");
    }
}
