//! Typing primitives: text insertion, deletion, Enter and Shift-Enter.

use crate::insert::insert_inline_at;
use crate::insert::position_after;
use crate::range::closest_block;
use crate::range::context_node;
use crate::range::drop_placeholder;
use crate::range::ensure_placeholder;
use crate::range::fully_contains;
use crate::range::is_empty_block;
use crate::range::is_object_wrapper;
use crate::range::is_visually_empty;
use crate::range::require_selection;
use crate::range::split_selection_boundaries;
use crate::range::synthesize_block;
use lm_core::EditorError;
use lm_core::EditorResult;
use lm_dom::Document;
use lm_dom::NodeId;
use lm_dom::Position;
use lm_dom::Range;
use lm_dom::ZERO_WIDTH_SPACE;
use std::cmp::Ordering;

/// Removes the selected content and collapses the caret to its start. When
/// the selection spans blocks, the last block is merged into the first.
pub fn delete_contents(doc: &mut Document) -> EditorResult<()> {
    let range = split_selection_boundaries(doc)?;
    if range.is_collapsed() {
        return Ok(());
    }
    let root = doc.root();
    let start_block = closest_block(doc, context_node(doc, range.start));
    let end_block = closest_block(doc, context_node(doc, range.end));

    let contained = doc
        .descendants(root)
        .into_iter()
        .filter(|node| fully_contains(doc, range, *node))
        .collect::<Vec<_>>();
    for node in &contained {
        let parent_contained = doc
            .parent(*node)
            .is_some_and(|parent| contained.contains(&parent));
        if !parent_contained && doc.contains(*node) && Some(*node) != start_block {
            doc.remove(*node);
        }
    }

    let caret = require_selection(doc)?.start;
    doc.set_caret(caret);

    if let (Some(start), Some(end)) = (start_block, end_block) {
        let separate = start != end
            && doc.contains(start)
            && doc.contains(end)
            && !doc.is_inclusive_ancestor(start, end)
            && !doc.is_inclusive_ancestor(end, start);
        let cells = [start, end]
            .iter()
            .any(|block| matches!(doc.tag(*block), Some("td" | "th")));
        if separate && !cells {
            drop_placeholder(doc, end);
            doc.move_children(end, start);
            remove_with_empty_parents(doc, end);
        }
    }

    let scope = start_block.filter(|block| doc.contains(*block)).unwrap_or(root);
    if scope != root && doc.child_count(scope) == 0 {
        ensure_placeholder(doc, scope);
        doc.set_caret(Position::new(scope, 0));
    }
    doc.normalize_text(scope);
    Ok(())
}

/// Types `value` at the caret, replacing any selected content. Typing into
/// a zero-width formatting anchor replaces the anchor character.
pub fn insert_text(doc: &mut Document, value: &str) -> EditorResult<()> {
    if value.is_empty() {
        return Ok(());
    }
    if !require_selection(doc)?.is_collapsed() {
        delete_contents(doc)?;
    }
    let at = require_selection(doc)?.start;
    let added = value.chars().count();

    if doc.is_text(at.node) {
        if doc
            .text(at.node)
            .is_some_and(|text| text.chars().eq([ZERO_WIDTH_SPACE]))
        {
            doc.set_text(at.node, value);
            doc.set_caret(Position::new(at.node, added));
        } else {
            doc.insert_text(at.node, at.offset, value);
            doc.set_caret(Position::new(at.node, at.offset + added));
        }
        return Ok(());
    }

    // Continue a text node that ends right at the caret.
    if let Some(prev) = at
        .offset
        .checked_sub(1)
        .and_then(|index| doc.child_at(at.node, index))
        .filter(|prev| doc.is_text(*prev))
    {
        let len = doc.node_length(prev);
        doc.insert_text(prev, len, value);
        doc.set_caret(Position::new(prev, len + added));
        return Ok(());
    }

    let node = doc.create_text(value);
    insert_inline_at(doc, at, node);
    doc.set_caret(Position::new(node, added));
    Ok(())
}

/// Backspace.
pub fn delete_backward(doc: &mut Document) -> EditorResult<()> {
    let range = require_selection(doc)?;
    if !range.is_collapsed() {
        return delete_contents(doc);
    }
    let at = range.start;
    if doc.is_text(at.node) && at.offset > 0 {
        doc.delete_text(at.node, at.offset - 1, at.offset);
        return settle_block(doc, at.node);
    }

    let Some(block) = closest_block(doc, context_node(doc, at)) else {
        return Ok(());
    };
    if !is_empty_block(doc, block) {
        if let Some(leaf) = leaf_before(doc, block, at) {
            delete_leaf_end(doc, leaf);
            return settle_block(doc, block);
        }
    }
    merge_into_previous(doc, block);
    Ok(())
}

/// Forward delete.
pub fn delete_forward(doc: &mut Document) -> EditorResult<()> {
    let range = require_selection(doc)?;
    if !range.is_collapsed() {
        return delete_contents(doc);
    }
    let at = range.start;
    if doc.is_text(at.node) && at.offset < doc.node_length(at.node) {
        doc.delete_text(at.node, at.offset, at.offset + 1);
        return settle_block(doc, at.node);
    }

    let Some(block) = closest_block(doc, context_node(doc, at)) else {
        return Ok(());
    };
    if !is_empty_block(doc, block) {
        if let Some(leaf) = leaf_after(doc, block, at) {
            delete_leaf_start(doc, leaf);
            return settle_block(doc, block);
        }
    }
    if let Some(next) = doc.next_sibling(block).filter(|next| is_mergeable_block(doc, *next)) {
        merge_blocks(doc, block, next);
    }
    Ok(())
}

/// Enter: splits the block at the caret. An empty list item leaves the
/// list; inside a table cell a line break is inserted instead.
pub fn insert_paragraph(doc: &mut Document) -> EditorResult<()> {
    if !require_selection(doc)?.is_collapsed() {
        delete_contents(doc)?;
    }
    let at = require_selection(doc)?.start;
    let context = context_node(doc, at);
    let block = match closest_block(doc, context) {
        Some(block) => block,
        None => synthesize_block(doc, context),
    };
    if matches!(doc.tag(block), Some("td" | "th")) {
        return insert_line_break(doc);
    }
    if doc.is_element(block, "li") && is_empty_block(doc, block) {
        exit_list(doc, block);
        return Ok(());
    }

    let at = require_selection(doc)?.start;
    let Some(mut right) = doc.split_subtree(block, at) else {
        return Ok(());
    };
    let heading = doc
        .tag(block)
        .is_some_and(|tag| matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6"));
    if heading && is_visually_empty(doc, right) {
        right = doc.rename(right, "p").unwrap_or(right);
    }
    for half in [block, right] {
        if is_visually_empty(doc, half) {
            doc.clear_children(half);
            ensure_placeholder(doc, half);
        }
    }
    let caret = match doc.text_nodes_under(right).into_iter().next() {
        Some(text) => Position::new(text, 0),
        None => Position::new(right, 0),
    };
    doc.set_caret(caret);
    Ok(())
}

/// Shift-Enter.
pub fn insert_line_break(doc: &mut Document) -> EditorResult<()> {
    if !require_selection(doc)?.is_collapsed() {
        delete_contents(doc)?;
    }
    let at = require_selection(doc)?.start;
    let br = doc.create_element("br");
    insert_inline_at(doc, at, br);
    if doc.next_sibling(br).is_none() {
        // A trailing break needs a second one to render the new line.
        let filler = doc.create_element("br");
        doc.insert_after(br, filler);
    }
    if let Some(after) = position_after(doc, br) {
        doc.set_caret(after);
    }
    Ok(())
}

/// Selects the whole editing host of the caret: the text box being edited,
/// or the document.
pub fn select_all(doc: &mut Document) {
    let root = doc
        .selection_in_root()
        .and_then(|range| doc.editing_host(range.start.node))
        .unwrap_or_else(|| doc.root());
    let texts = doc.text_nodes_under(root);
    let range = match (texts.first(), texts.last()) {
        (Some(first), Some(last)) => Range::new(
            Position::new(*first, 0),
            Position::new(*last, doc.node_length(*last)),
        ),
        _ => Range::new(Position::new(root, 0), Position::new(root, doc.child_count(root))),
    };
    doc.set_selection(Some(range));
}

/// Sets the selection from host coordinates. Positions outside the editable
/// root are rejected.
pub fn set_selection(doc: &mut Document, range: Range) -> EditorResult<()> {
    if !doc.is_valid_position(range.start) || !doc.is_valid_position(range.end) {
        return Err(EditorError::no_selection());
    }
    doc.set_selection(Some(range));
    Ok(())
}

pub fn collapse_to(doc: &mut Document, position: Position) -> EditorResult<()> {
    set_selection(doc, Range::collapsed(position))
}

/// Restores the placeholder once a block loses its last visible content.
fn settle_block(doc: &mut Document, node: NodeId) -> EditorResult<()> {
    let Some(block) = closest_block(doc, node) else {
        return Ok(());
    };
    if is_visually_empty(doc, block) {
        doc.clear_children(block);
        ensure_placeholder(doc, block);
        doc.set_caret(Position::new(block, 0));
    }
    Ok(())
}

/// Atomic pieces of inline content: text, void elements and objects.
fn leaves(doc: &Document, block: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = doc.children(block).iter().rev().copied().collect::<Vec<_>>();
    while let Some(node) = stack.pop() {
        let atomic = is_object_wrapper(doc, node)
            || doc.tag(node).is_some_and(lm_dom::is_void_tag)
            || doc.text(node).is_some_and(|text| !text.is_empty());
        if atomic {
            out.push(node);
        } else {
            stack.extend(doc.children(node).iter().rev().copied());
        }
    }
    out
}

fn leaf_end(doc: &Document, leaf: NodeId) -> Option<Position> {
    if doc.is_text(leaf) {
        return Some(Position::new(leaf, doc.node_length(leaf)));
    }
    position_after(doc, leaf)
}

fn leaf_start(doc: &Document, leaf: NodeId) -> Option<Position> {
    if doc.is_text(leaf) {
        return Some(Position::new(leaf, 0));
    }
    let parent = doc.parent(leaf)?;
    Some(Position::new(parent, doc.index_in_parent(leaf)?))
}

fn leaf_before(doc: &Document, block: NodeId, at: Position) -> Option<NodeId> {
    leaves(doc, block).into_iter().rev().find(|leaf| {
        leaf_end(doc, *leaf).is_some_and(|end| doc.compare_positions(end, at) != Ordering::Greater)
    })
}

fn leaf_after(doc: &Document, block: NodeId, at: Position) -> Option<NodeId> {
    leaves(doc, block).into_iter().find(|leaf| {
        leaf_start(doc, *leaf).is_some_and(|start| doc.compare_positions(start, at) != Ordering::Less)
    })
}

fn delete_leaf_end(doc: &mut Document, leaf: NodeId) {
    let len = doc.node_length(leaf);
    if doc.is_text(leaf) && len > 0 {
        doc.delete_text(leaf, len - 1, len);
        doc.set_caret(Position::new(leaf, len - 1));
    } else {
        doc.remove(leaf);
    }
}

fn delete_leaf_start(doc: &mut Document, leaf: NodeId) {
    if doc.is_text(leaf) && doc.node_length(leaf) > 0 {
        doc.delete_text(leaf, 0, 1);
        doc.set_caret(Position::new(leaf, 0));
    } else {
        doc.remove(leaf);
    }
}

/// Blocks whose children can be merged into another text block.
fn is_mergeable_block(doc: &Document, block: NodeId) -> bool {
    !is_object_wrapper(doc, block)
        && matches!(
            doc.tag(block),
            Some("p" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "li" | "blockquote" | "pre")
        )
}

/// Backspace at the start of a block joins it to the preceding one.
fn merge_into_previous(doc: &mut Document, block: NodeId) {
    if matches!(doc.tag(block), Some("td" | "th")) {
        return;
    }
    let Some(mut previous) = doc.previous_sibling(block) else {
        return;
    };
    while matches!(doc.tag(previous), Some("ul" | "ol")) {
        match doc.last_child(previous) {
            Some(item) => previous = item,
            None => return,
        }
    }
    if is_mergeable_block(doc, previous) {
        merge_blocks(doc, previous, block);
    } else if is_empty_block(doc, block) {
        // Empty paragraph after an object: drop it and sit after the object.
        let after = position_after(doc, previous);
        remove_with_empty_parents(doc, block);
        if let Some(after) = after {
            doc.set_caret(after);
        }
    }
}

/// Appends the content of `source` to `target` and removes `source`. The
/// caret lands at the join.
fn merge_blocks(doc: &mut Document, target: NodeId, source: NodeId) {
    if doc.is_inclusive_ancestor(source, target) || doc.is_inclusive_ancestor(target, source) {
        return;
    }
    let source = match doc.tag(source) {
        Some("ul" | "ol") => match doc.first_child(source) {
            Some(item) => item,
            None => return,
        },
        _ => source,
    };
    drop_placeholder(doc, target);
    drop_placeholder(doc, source);
    let caret = match doc.last_child(target) {
        Some(last) if doc.is_text(last) => Position::new(last, doc.node_length(last)),
        _ => Position::new(target, doc.child_count(target)),
    };
    doc.move_children(source, target);
    remove_with_empty_parents(doc, source);
    ensure_placeholder(doc, target);
    doc.set_caret(caret);
    doc.normalize_text(target);
}

/// Removes `node` and any list containers it leaves empty.
fn remove_with_empty_parents(doc: &mut Document, node: NodeId) {
    let parent = doc.parent(node);
    doc.remove(node);
    if let Some(parent) = parent {
        if matches!(doc.tag(parent), Some("ul" | "ol")) && doc.child_count(parent) == 0 {
            doc.remove(parent);
        }
    }
}

/// Enter in an empty list item turns it into a paragraph after the list.
fn exit_list(doc: &mut Document, item: NodeId) {
    let (Some(list), Some(index)) = (doc.parent(item), doc.index_in_parent(item)) else {
        return;
    };
    let tail = doc.split_subtree(list, Position::new(list, index + 1));
    doc.insert_after(list, item);
    let paragraph = doc.rename(item, "p").unwrap_or(item);
    doc.clear_children(paragraph);
    ensure_placeholder(doc, paragraph);
    for container in [Some(list), tail].into_iter().flatten() {
        if doc.contains(container) && doc.child_count(container) == 0 {
            doc.remove(container);
        }
    }
    doc.set_caret(Position::new(paragraph, 0));
}
