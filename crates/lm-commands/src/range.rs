//! Selection helpers shared by the command modules.

use lm_core::EditorError;
use lm_core::EditorResult;
use lm_dom::Document;
use lm_dom::NodeId;
use lm_dom::Position;
use lm_dom::Range;
use lm_dom::ZERO_WIDTH_SPACE;
use std::cmp::Ordering;

/// Role markers of embedded objects.
const OBJECT_ROLES: &[&str] = &["image-wrapper", "text-box", "table"];

pub fn is_object_wrapper(doc: &Document, id: NodeId) -> bool {
    doc.attr(id, "data-role")
        .is_some_and(|role| OBJECT_ROLES.contains(&role))
}

/// The selection, or `NoSelection` when it is missing, outside the root,
/// or not inside a single editing host.
pub fn require_selection(doc: &Document) -> EditorResult<Range> {
    doc.editable_selection().ok_or_else(EditorError::no_selection)
}

/// Splits text nodes at the selection edges so every selected text node is
/// selected whole. Returns the updated selection.
pub fn split_selection_boundaries(doc: &mut Document) -> EditorResult<Range> {
    let range = require_selection(doc)?;
    if range.is_collapsed() {
        return Ok(range);
    }
    if doc.is_text(range.end.node) {
        let _ = doc.split_text(range.end.node, range.end.offset);
    }
    let range = require_selection(doc)?;
    if doc.is_text(range.start.node) {
        let _ = doc.split_text(range.start.node, range.start.offset);
    }
    require_selection(doc)
}

/// True when `node` lies entirely inside `range`. Boundaries at the edges
/// of a text node count as the matching boundary in its parent.
pub fn fully_contains(doc: &Document, range: Range, node: NodeId) -> bool {
    let (Some(parent), Some(index)) = (doc.parent(node), doc.index_in_parent(node)) else {
        return false;
    };
    let start = outer_boundary(doc, range.start);
    let end = outer_boundary(doc, range.end);
    doc.compare_positions(Position::new(parent, index), start) != Ordering::Less
        && doc.compare_positions(Position::new(parent, index + 1), end) != Ordering::Greater
}

fn outer_boundary(doc: &Document, position: Position) -> Position {
    if !doc.is_text(position.node) {
        return position;
    }
    let (Some(parent), Some(index)) = (doc.parent(position.node), doc.index_in_parent(position.node))
    else {
        return position;
    };
    if position.offset == 0 {
        Position::new(parent, index)
    } else if position.offset >= doc.node_length(position.node) {
        Position::new(parent, index + 1)
    } else {
        position
    }
}

/// Non-empty text nodes entirely inside `range`, in document order.
pub fn selected_text_nodes(doc: &Document, range: Range) -> Vec<NodeId> {
    if range.is_collapsed() {
        return Vec::new();
    }
    doc.text_nodes_under(doc.root())
        .into_iter()
        .filter(|node| doc.node_length(*node) > 0)
        .filter(|node| {
            let len = doc.node_length(*node);
            doc.compare_positions(Position::new(*node, 0), range.start) != Ordering::Less
                && doc.compare_positions(Position::new(*node, len), range.end) != Ordering::Greater
        })
        .collect()
}

/// The node whose formatting applies at `position`.
pub fn context_node(doc: &Document, position: Position) -> NodeId {
    if doc.is_text(position.node) {
        return position.node;
    }
    let descend = |mut node: NodeId, last: bool| {
        loop {
            let next = if last {
                doc.last_child(node)
            } else {
                doc.first_child(node)
            };
            match next {
                Some(child) => node = child,
                None => return node,
            }
        }
    };
    if let Some(child) = doc.child_at(position.node, position.offset) {
        return descend(child, false);
    }
    match position
        .offset
        .checked_sub(1)
        .and_then(|prev| doc.child_at(position.node, prev))
    {
        Some(child) => descend(child, true),
        None => position.node,
    }
}

/// Closest block ancestor of `node` below the root, object wrappers excluded.
pub fn closest_block(doc: &Document, node: NodeId) -> Option<NodeId> {
    let root = doc.root();
    doc.closest(node, |doc, candidate| {
        candidate != root
            && doc.is_block(candidate)
            && !is_object_wrapper(doc, candidate)
            && !matches!(
                doc.tag(candidate),
                Some("ul" | "ol" | "tbody" | "thead" | "tfoot" | "tr")
            )
    })
}

/// Blocks touched by the selection, in document order without duplicates.
pub fn selected_blocks(doc: &mut Document) -> EditorResult<Vec<NodeId>> {
    let range = require_selection(doc)?;
    let mut nodes = selected_text_nodes(doc, range);
    nodes.insert(0, context_node(doc, range.start));
    if !range.is_collapsed() {
        nodes.push(context_node(doc, range.end));
    }

    let mut out = Vec::new();
    for node in nodes {
        let block = match closest_block(doc, node) {
            Some(block) => block,
            None => synthesize_block(doc, node),
        };
        if !out.contains(&block) {
            out.push(block);
        }
    }
    Ok(out)
}

/// Wraps the inline run around a root-level node into a paragraph.
pub fn synthesize_block(doc: &mut Document, node: NodeId) -> NodeId {
    doc.normalize_root();
    closest_block(doc, node).unwrap_or_else(|| {
        let block = doc.create_element("p");
        let root = doc.root();
        doc.append_child(root, block);
        block
    })
}

/// Elements with no text and no replaced content.
pub fn is_visually_empty(doc: &Document, id: NodeId) -> bool {
    doc.text_content(id).is_empty()
        && !doc.descendants(id).into_iter().any(|node| {
            matches!(doc.tag(node), Some("img" | "br" | "hr" | "table")) || is_object_wrapper(doc, node)
        })
}

/// Whitespace-only blocks with no objects count as empty.
pub fn is_empty_block(doc: &Document, id: NodeId) -> bool {
    doc.text_content(id)
        .chars()
        .all(|ch| ch.is_whitespace() || ch == ZERO_WIDTH_SPACE)
        && !doc.descendants(id).into_iter().any(|node| {
            matches!(doc.tag(node), Some("img" | "hr" | "table")) || is_object_wrapper(doc, node)
        })
}

/// Gives an empty block a `<br>` so it keeps its line.
pub fn ensure_placeholder(doc: &mut Document, block: NodeId) {
    if doc.child_count(block) == 0 {
        let br = doc.create_element("br");
        doc.append_child(block, br);
    }
}

/// Removes `<br>` placeholders from a block that is about to gain content.
pub fn drop_placeholder(doc: &mut Document, block: NodeId) {
    let children = doc.children(block).to_vec();
    if children.len() == 1 && children.iter().all(|child| doc.is_element(*child, "br")) {
        doc.clear_children(block);
    }
}

/// Moves `node` out of its closest ancestor matching `matches` (searching up
/// to the enclosing block) until no such ancestor remains.
pub fn lift_out_of(doc: &mut Document, node: NodeId, predicate: impl Fn(&Document, NodeId) -> bool) {
    loop {
        let Some(container) = inline_ancestors(doc, node)
            .into_iter()
            .find(|ancestor| predicate(doc, *ancestor))
        else {
            return;
        };
        let Some(middle) = isolate(doc, container, node) else {
            return;
        };
        doc.unwrap(middle);
    }
}

/// Inline ancestors of `node` from the parent up to the enclosing block.
pub fn inline_ancestors(doc: &Document, node: NodeId) -> Vec<NodeId> {
    let root = doc.root();
    doc.ancestors(node)
        .into_iter()
        .take_while(|ancestor| {
            *ancestor != root && !doc.is_block(*ancestor) && !is_object_wrapper(doc, *ancestor)
        })
        .collect()
}

/// Splits `container` around the branch holding `node`, returning the copy
/// of `container` that holds only that branch.
fn isolate(doc: &mut Document, container: NodeId, node: NodeId) -> Option<NodeId> {
    let parent = doc.parent(node)?;
    let index = doc.index_in_parent(node)?;
    let after = doc.split_subtree(container, Position::new(parent, index + 1));

    let parent = doc.parent(node)?;
    let index = doc.index_in_parent(node)?;
    let middle = doc.split_subtree(container, Position::new(parent, index))?;

    prune_if_empty(doc, container);
    if let Some(after) = after {
        prune_if_empty(doc, after);
    }
    Some(middle)
}

fn prune_if_empty(doc: &mut Document, id: NodeId) {
    if doc.contains(id) && is_visually_empty(doc, id) {
        doc.remove(id);
    }
}

/// Merges adjacent identical inline wrappers and collapses directly nested
/// ones below `scope`.
pub fn coalesce_inline(doc: &mut Document, scope: NodeId) {
    let mut stack = vec![scope];
    while let Some(parent) = stack.pop() {
        let mut index = 0;
        while index + 1 < doc.child_count(parent) {
            let (Some(left), Some(right)) =
                (doc.child_at(parent, index), doc.child_at(parent, index + 1))
            else {
                break;
            };
            if mergeable(doc, left, right) {
                doc.move_children(right, left);
                doc.remove(right);
                continue;
            }
            index += 1;
        }

        for child in doc.children(parent).to_vec() {
            if doc.is_text(child) {
                continue;
            }
            let only = doc.children(child).to_vec();
            if let [inner] = only.as_slice() {
                if mergeable(doc, child, *inner) {
                    doc.unwrap(*inner);
                }
            }
            stack.push(child);
        }
    }
    doc.normalize_text(scope);
}

fn mergeable(doc: &Document, left: NodeId, right: NodeId) -> bool {
    let Some(tag) = doc.tag(left) else {
        return false;
    };
    lm_dom::is_inline_formatting_tag(tag)
        && !is_object_wrapper(doc, left)
        && doc.data(left) == doc.data(right)
}
