//! DOM tree data structures for the editable document.
//!
//! Nodes live in an id-addressed arena owned by [`Document`]. The document
//! also owns the single selection range and keeps it valid across every
//! structural mutation, the same way live ranges follow DOM surgery.

use lm_css::StyleDeclarations;
use std::cmp::Ordering;
use std::collections::HashMap;

mod selection;
mod tags;

pub use selection::Position;
pub use selection::Range;
pub use tags::is_block_tag;
pub use tags::is_inline_formatting_tag;
pub use tags::is_void_tag;

/// ID used to address nodes in the DOM arena.
pub type NodeId = u64;

/// Zero-width space used to anchor pending inline formatting.
pub const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// Element payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// The document: an editable root element and everything below it.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: HashMap<NodeId, Node>,
    next_id: NodeId,
    root: NodeId,
    selection: Option<Range>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates the empty document `<p><br></p>` with the caret in it.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: HashMap::new(),
            next_id: 1,
            root: 0,
            selection: None,
        };
        let root = doc.create_element("div");
        doc.set_attr(root, "contenteditable", "true");
        doc.set_attr(root, "class", "editor-root");
        doc.root = root;
        doc.reset_to_empty();
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Replaces all content with the empty-document template.
    pub fn reset_to_empty(&mut self) {
        self.clear_children(self.root);
        let block = self.create_element("p");
        let br = self.create_element("br");
        self.append_child(block, br);
        self.append_child(self.root, block);
        self.selection = Some(Range::collapsed(Position::new(block, 0)));
    }

    /// True when the root holds nothing but empty blocks.
    pub fn is_blank(&self) -> bool {
        self.text_content(self.root)
            .chars()
            .all(|ch| ch.is_whitespace() || ch == ZERO_WIDTH_SPACE)
            && !self
                .descendants(self.root)
                .into_iter()
                .any(|id| matches!(self.tag(id), Some("img" | "table" | "hr")))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// True for nodes reachable from the editable root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root, id)
    }

    // ---------------------------------------------------------------------
    // Creation
    // ---------------------------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.insert_node(NodeData::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }))
    }

    pub fn create_element_with_attrs(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.create_element(tag);
        for (name, value) in attrs {
            self.set_attr(id, name, value);
        }
        id
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.insert_node(NodeData::Text(text.to_owned()))
    }

    fn insert_node(&mut self, data: NodeData) -> NodeId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        self.nodes.insert(
            id,
            Node {
                data,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    /// Copies an element without its children.
    pub fn shallow_clone(&mut self, id: NodeId) -> Option<NodeId> {
        let data = self.nodes.get(&id)?.data.clone();
        Some(self.insert_node(data))
    }

    pub fn deep_clone(&mut self, id: NodeId) -> Option<NodeId> {
        let copy = self.shallow_clone(id)?;
        for child in self.children(id).to_vec() {
            if let Some(child_copy) = self.deep_clone(child) {
                self.append_child(copy, child_copy);
            }
        }
        Some(copy)
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(&id).map(|node| &node.data)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|child| *child == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.child_at(parent, index + 1)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index.checked_sub(1).and_then(|prev| self.child_at(parent, prev))
    }

    /// Ancestors from the parent upwards.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(id);
        while let Some(node) = cursor {
            out.push(node);
            cursor = self.parent(node);
        }
        out
    }

    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Closest inclusive ancestor matching `predicate`, stopping at the root.
    pub fn closest(&self, id: NodeId, predicate: impl Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if predicate(self, current) {
                return Some(current);
            }
            if current == self.root {
                return None;
            }
            cursor = self.parent(current);
        }
        None
    }

    /// The child of the root that contains `id`.
    pub fn top_level_ancestor(&self, id: NodeId) -> Option<NodeId> {
        let mut cursor = id;
        loop {
            let parent = self.parent(cursor)?;
            if parent == self.root {
                return Some(cursor);
            }
            cursor = parent;
        }
    }

    /// Preorder descendants, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = self.children(id).iter().rev().copied().collect::<Vec<_>>();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    pub fn text_nodes_under(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|node| self.is_text(*node))
            .collect()
    }

    pub fn last_text_node(&self, id: NodeId) -> Option<NodeId> {
        self.text_nodes_under(id).into_iter().next_back()
    }

    /// Index path from the topmost ancestor.
    fn path(&self, id: NodeId) -> Vec<usize> {
        let mut out = Vec::new();
        let mut cursor = id;
        while let Some(index) = self.index_in_parent(cursor) {
            out.push(index);
            match self.parent(cursor) {
                Some(parent) => cursor = parent,
                None => break,
            }
        }
        out.reverse();
        out
    }

    /// Document order of two nodes; ancestors precede descendants.
    pub fn tree_order(&self, a: NodeId, b: NodeId) -> Ordering {
        self.path(a).cmp(&self.path(b))
    }

    // ---------------------------------------------------------------------
    // Element and text accessors
    // ---------------------------------------------------------------------

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element(element) => Some(element.tag.as_str()),
            NodeData::Text(_) => None,
        }
    }

    pub fn is_element(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Text(_)))
    }

    pub fn is_block(&self, id: NodeId) -> bool {
        self.tag(id).is_some_and(is_block_tag)
    }

    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        match self.data(id) {
            Some(NodeData::Element(element)) => &element.attrs,
            _ => &[],
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(NodeData::Element(element)) = self.nodes.get_mut(&id).map(|node| &mut node.data)
        else {
            return;
        };
        let name = name.to_ascii_lowercase();
        if let Some(entry) = element.attrs.iter_mut().find(|(key, _)| *key == name) {
            entry.1 = value.to_owned();
        } else {
            element.attrs.push((name, value.to_owned()));
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        let Some(NodeData::Element(element)) = self.nodes.get_mut(&id).map(|node| &mut node.data)
        else {
            return None;
        };
        let index = element.attrs.iter().position(|(key, _)| key == name)?;
        Some(element.attrs.remove(index).1)
    }

    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.attr(id, "class")
            .map(|value| value.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).contains(&class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let mut classes = self
            .classes(id)
            .into_iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        classes.push(class.to_owned());
        self.set_attr(id, "class", &classes.join(" "));
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            return;
        }
        let classes = self
            .classes(id)
            .into_iter()
            .filter(|existing| *existing != class)
            .map(str::to_owned)
            .collect::<Vec<_>>();
        if classes.is_empty() {
            self.remove_attr(id, "class");
        } else {
            self.set_attr(id, "class", &classes.join(" "));
        }
    }

    pub fn style(&self, id: NodeId) -> StyleDeclarations {
        self.attr(id, "style")
            .map(StyleDeclarations::parse)
            .unwrap_or_default()
    }

    pub fn style_property(&self, id: NodeId, name: &str) -> Option<String> {
        self.style(id).get(name).map(str::to_owned)
    }

    pub fn set_style(&mut self, id: NodeId, style: &StyleDeclarations) {
        if style.is_empty() {
            self.remove_attr(id, "style");
        } else {
            self.set_attr(id, "style", &style.to_attribute());
        }
    }

    pub fn set_style_property(&mut self, id: NodeId, name: &str, value: &str) {
        let mut style = self.style(id);
        style.set(name, value);
        self.set_style(id, &style);
    }

    pub fn remove_style_property(&mut self, id: NodeId, name: &str) -> Option<String> {
        let mut style = self.style(id);
        let removed = style.remove(name);
        if removed.is_some() {
            self.set_style(id, &style);
        }
        removed
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Text(text) => Some(text.as_str()),
            NodeData::Element(_) => None,
        }
    }

    /// Character count of a text node, child count of an element.
    pub fn node_length(&self, id: NodeId) -> usize {
        match self.text(id) {
            Some(text) => text.chars().count(),
            None => self.child_count(id),
        }
    }

    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_owned();
        }
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Replaces the text of a text node, clamping selection offsets.
    pub fn set_text(&mut self, id: NodeId, value: &str) {
        let Some(NodeData::Text(text)) = self.nodes.get_mut(&id).map(|node| &mut node.data) else {
            return;
        };
        *text = value.to_owned();
        let len = value.chars().count();
        self.map_positions(|_, pos, _| {
            if pos.node == id && pos.offset > len {
                Position::new(id, len)
            } else {
                pos
            }
        });
    }

    /// Inserts characters into a text node; selection boundaries after the
    /// insertion point shift right.
    pub fn insert_text(&mut self, id: NodeId, offset: usize, value: &str) {
        let Some(current) = self.text(id) else {
            return;
        };
        let byte = char_to_byte(current, offset);
        let mut updated = current.to_owned();
        updated.insert_str(byte, value);
        let added = value.chars().count();
        if let Some(NodeData::Text(text)) = self.nodes.get_mut(&id).map(|node| &mut node.data) {
            *text = updated;
        }
        self.map_positions(|_, pos, _| {
            if pos.node == id && pos.offset > offset {
                Position::new(id, pos.offset + added)
            } else {
                pos
            }
        });
    }

    /// Removes the characters `[start, end)` from a text node.
    pub fn delete_text(&mut self, id: NodeId, start: usize, end: usize) {
        let Some(current) = self.text(id) else {
            return;
        };
        let len = current.chars().count();
        let end = end.min(len);
        if start >= end {
            return;
        }
        let from = char_to_byte(current, start);
        let to = char_to_byte(current, end);
        let mut updated = current.to_owned();
        updated.replace_range(from..to, "");
        if let Some(NodeData::Text(text)) = self.nodes.get_mut(&id).map(|node| &mut node.data) {
            *text = updated;
        }
        let removed = end - start;
        self.map_positions(|_, pos, _| {
            if pos.node != id || pos.offset <= start {
                pos
            } else if pos.offset <= end {
                Position::new(id, start)
            } else {
                Position::new(id, pos.offset - removed)
            }
        });
    }

    // ---------------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------------

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.child_count(parent);
        self.insert_child(parent, index, child);
    }

    /// Inserts `child` at `index`, moving it out of any previous parent.
    /// Selection boundaries inside `child` travel with it.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) || self.is_inclusive_ancestor(child, parent)
        {
            return;
        }

        let mut index = index;
        if let Some(old_parent) = self.parent(child) {
            if old_parent == parent && self.index_in_parent(child).is_some_and(|old| old < index) {
                index = index.saturating_sub(1);
            }
            self.unlink(child, true);
        }

        let Some(node) = self.nodes.get_mut(&parent) else {
            return;
        };
        let index = index.min(node.children.len());
        node.children.insert(index, child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        self.map_positions(|_, pos, _| {
            if pos.node == parent && pos.offset > index {
                Position::new(parent, pos.offset + 1)
            } else {
                pos
            }
        });
    }

    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        let (Some(parent), Some(index)) = (self.parent(reference), self.index_in_parent(reference))
        else {
            return;
        };
        self.insert_child(parent, index, node);
    }

    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        let (Some(parent), Some(index)) = (self.parent(reference), self.index_in_parent(reference))
        else {
            return;
        };
        self.insert_child(parent, index + 1, node);
    }

    /// Detaches and drops a subtree. Boundaries inside it collapse to the
    /// position it occupied.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        self.unlink(id, false);
        for node in self.descendants(id) {
            self.nodes.remove(&node);
        }
        self.nodes.remove(&id);
    }

    /// Detaches a subtree but keeps it in the arena for reinsertion.
    pub fn detach(&mut self, id: NodeId) {
        if id != self.root {
            self.unlink(id, false);
        }
    }

    pub fn clear_children(&mut self, id: NodeId) {
        for child in self.children(id).to_vec() {
            self.remove(child);
        }
    }

    /// Moves every child of `from` to the end of `to`.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        for child in self.children(from).to_vec() {
            self.append_child(to, child);
        }
    }

    /// Replaces an element by its children.
    pub fn unwrap(&mut self, id: NodeId) {
        let (Some(parent), Some(index)) = (self.parent(id), self.index_in_parent(id)) else {
            return;
        };
        let children = self.children(id).to_vec();
        for (offset, child) in children.into_iter().enumerate() {
            self.insert_child(parent, index + offset, child);
        }
        self.map_positions(|_, pos, _| {
            if pos.node == id {
                Position::new(parent, index + pos.offset)
            } else {
                pos
            }
        });
        self.remove(id);
    }

    /// Puts `wrapper` where `node` is and moves `node` into it.
    pub fn wrap(&mut self, node: NodeId, wrapper: NodeId) {
        self.insert_before(node, wrapper);
        self.append_child(wrapper, node);
    }

    /// Replaces an element with a new element of another tag, keeping
    /// attributes and children.
    pub fn rename(&mut self, id: NodeId, tag: &str) -> Option<NodeId> {
        if self.tag(id)? == tag {
            return Some(id);
        }
        let attrs = self.attrs(id).to_vec();
        let replacement = self.create_element(tag);
        for (name, value) in &attrs {
            self.set_attr(replacement, name, value);
        }
        self.insert_before(id, replacement);
        self.move_children(id, replacement);
        self.map_positions(|_, pos, _| {
            if pos.node == id {
                Position::new(replacement, pos.offset)
            } else {
                pos
            }
        });
        self.remove(id);
        Some(replacement)
    }

    /// Splits a text node at `offset`, returning the new right-hand node.
    /// Returns `None` when the offset is at either edge.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Option<NodeId> {
        let text = self.text(id)?.to_owned();
        let len = text.chars().count();
        if offset == 0 || offset >= len {
            return None;
        }
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        let byte = char_to_byte(&text, offset);
        let (left, right) = text.split_at(byte);
        let right_id = self.create_text(right);
        if let Some(NodeData::Text(value)) = self.nodes.get_mut(&id).map(|node| &mut node.data) {
            *value = left.to_owned();
        }

        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.insert(index + 1, right_id);
        }
        if let Some(node) = self.nodes.get_mut(&right_id) {
            node.parent = Some(parent);
        }

        self.map_positions(|_, pos, role| {
            if pos.node == parent && pos.offset > index {
                Position::new(parent, pos.offset + 1)
            } else if pos.node == id && pos.offset > offset {
                Position::new(right_id, pos.offset - offset)
            } else if pos.node == id && pos.offset == offset && role == BoundaryRole::Start {
                Position::new(right_id, 0)
            } else {
                pos
            }
        });
        Some(right_id)
    }

    /// Splits the subtree of `container` at `at`, returning the right half
    /// (a shallow copy of `container` inserted after it).
    pub fn split_subtree(&mut self, container: NodeId, at: Position) -> Option<NodeId> {
        if !self.is_inclusive_ancestor(container, at.node) || container == self.root {
            return None;
        }

        let (mut parent, mut index) = if self.is_text(at.node) {
            let text_parent = self.parent(at.node)?;
            let text_index = self.index_in_parent(at.node)?;
            if at.offset == 0 {
                (text_parent, text_index)
            } else if at.offset >= self.node_length(at.node) {
                (text_parent, text_index + 1)
            } else {
                let right = self.split_text(at.node, at.offset)?;
                (text_parent, self.index_in_parent(right)?)
            }
        } else {
            (at.node, at.offset.min(self.child_count(at.node)))
        };

        loop {
            let copy = self.shallow_clone(parent)?;
            let moving = self.children(parent)[index..].to_vec();
            self.insert_after(parent, copy);
            for child in moving {
                self.append_child(copy, child);
            }
            if parent == container {
                return Some(copy);
            }
            index = self.index_in_parent(parent)? + 1;
            parent = self.parent(parent)?;
        }
    }

    /// Removes empty text nodes and merges adjacent ones below `id`.
    pub fn normalize_text(&mut self, id: NodeId) {
        let mut index = 0;
        while index < self.child_count(id) {
            let Some(child) = self.child_at(id, index) else {
                break;
            };
            if self.text(child).is_some_and(str::is_empty) {
                self.remove(child);
                continue;
            }
            if self.is_text(child) {
                while let Some(next) = self.child_at(id, index + 1) {
                    if !self.is_text(next) {
                        break;
                    }
                    self.merge_text_into(child, next);
                }
            } else {
                self.normalize_text(child);
            }
            index += 1;
        }
    }

    fn merge_text_into(&mut self, left: NodeId, right: NodeId) {
        let left_len = self.node_length(left);
        let right_text = self.text(right).unwrap_or_default().to_owned();
        let parent = self.parent(right);
        let right_index = self.index_in_parent(right);
        if let Some(NodeData::Text(text)) = self.nodes.get_mut(&left).map(|node| &mut node.data) {
            text.push_str(&right_text);
        }
        self.map_positions(|_, pos, _| {
            if pos.node == right {
                Position::new(left, left_len + pos.offset)
            } else if Some(pos.node) == parent && Some(pos.offset) == right_index {
                Position::new(left, left_len)
            } else {
                pos
            }
        });
        self.remove(right);
    }

    /// Ensures no text sits directly under the root and that the root is
    /// never empty. Inline runs are wrapped into paragraphs.
    pub fn normalize_root(&mut self) {
        let root = self.root;
        let mut index = 0;
        while index < self.child_count(root) {
            let Some(child) = self.child_at(root, index) else {
                break;
            };
            if self.is_block(child) {
                index += 1;
                continue;
            }
            if self.text(child).is_some_and(|text| text.trim().is_empty()) {
                self.remove(child);
                continue;
            }

            let block = self.create_element("p");
            self.insert_child(root, index, block);
            while let Some(next) = self.child_at(root, index + 1) {
                if self.is_block(next) {
                    break;
                }
                self.append_child(block, next);
            }
            index += 1;
        }

        if self.child_count(root) == 0 {
            self.reset_to_empty();
        }
    }

    fn unlink(&mut self, id: NodeId, keep_inner_positions: bool) {
        let (Some(parent), Some(index)) = (self.parent(id), self.index_in_parent(id)) else {
            return;
        };
        self.map_positions(|doc, pos, _| {
            if !keep_inner_positions && doc.is_inclusive_ancestor(id, pos.node) {
                Position::new(parent, index)
            } else if pos.node == parent && pos.offset > index {
                Position::new(parent, pos.offset - 1)
            } else {
                pos
            }
        });
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.remove(index);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = None;
        }
    }

    // ---------------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------------

    pub fn selection(&self) -> Option<Range> {
        self.selection
    }

    /// Sets the selection, ordering the boundaries in document order.
    /// Ranges outside the editable root clear the selection.
    pub fn set_selection(&mut self, range: Option<Range>) {
        self.selection = range.and_then(|range| {
            if !self.is_valid_position(range.start) || !self.is_valid_position(range.end) {
                return None;
            }
            if self.compare_positions(range.start, range.end) == Ordering::Greater {
                Some(Range::new(range.end, range.start))
            } else {
                Some(range)
            }
        });
    }

    pub fn set_caret(&mut self, position: Position) {
        self.set_selection(Some(Range::collapsed(position)));
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// A position is valid when it is attached under the root and its
    /// offset fits the node.
    pub fn is_valid_position(&self, position: Position) -> bool {
        self.contains(position.node)
            && self.is_attached(position.node)
            && position.offset <= self.node_length(position.node)
    }

    /// Selection only when both boundaries sit inside the editable root.
    pub fn selection_in_root(&self) -> Option<Range> {
        let range = self.selection?;
        (self.is_valid_position(range.start) && self.is_valid_position(range.end)).then_some(range)
    }

    /// The element that makes `node` editable: the nearest inclusive
    /// ancestor carrying `contenteditable`, when its value is not
    /// `"false"`. The root counts as a host even without the attribute.
    pub fn editing_host(&self, node: NodeId) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            match self.attr(id, "contenteditable") {
                Some(value) if value.trim().eq_ignore_ascii_case("false") => return None,
                Some(_) => return Some(id),
                None if id == self.root => return Some(id),
                None => current = self.parent(id),
            }
        }
        None
    }

    /// Selection only when both boundaries share one editing host.
    pub fn editable_selection(&self) -> Option<Range> {
        let range = self.selection_in_root()?;
        let host = self.editing_host(range.start.node)?;
        (self.editing_host(range.end.node) == Some(host)).then_some(range)
    }

    /// Places the caret at the end of the last text node under the root,
    /// or inside the last block when there is no text.
    pub fn caret_to_end(&mut self) {
        if let Some(text) = self.last_text_node(self.root) {
            let len = self.node_length(text);
            self.set_caret(Position::new(text, len));
            return;
        }
        match self.last_child(self.root) {
            Some(block) => {
                let len = self.child_count(block);
                self.set_caret(Position::new(block, len));
            }
            None => self.reset_to_empty(),
        }
    }

    /// Moves an invalid selection to the end of the document. Returns true
    /// when a correction happened.
    pub fn repair_selection(&mut self) -> bool {
        let Some(range) = self.selection else {
            return false;
        };
        if self.is_valid_position(range.start) && self.is_valid_position(range.end) {
            return false;
        }
        self.caret_to_end();
        true
    }

    /// Boundary-point comparison in document order.
    pub fn compare_positions(&self, a: Position, b: Position) -> Ordering {
        if a.node == b.node {
            return a.offset.cmp(&b.offset);
        }

        if self.is_inclusive_ancestor(a.node, b.node) {
            let child_index = self.child_index_towards(a.node, b.node);
            return if a.offset <= child_index {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }

        if self.is_inclusive_ancestor(b.node, a.node) {
            let child_index = self.child_index_towards(b.node, a.node);
            return if b.offset <= child_index {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        self.tree_order(a.node, b.node)
    }

    fn child_index_towards(&self, ancestor: NodeId, node: NodeId) -> usize {
        let mut cursor = node;
        while let Some(parent) = self.parent(cursor) {
            if parent == ancestor {
                return self.index_in_parent(cursor).unwrap_or(0);
            }
            cursor = parent;
        }
        0
    }

    fn map_positions(&mut self, map: impl Fn(&Self, Position, BoundaryRole) -> Position) {
        let Some(range) = self.selection else {
            return;
        };
        let start_role = if range.is_collapsed() {
            BoundaryRole::Caret
        } else {
            BoundaryRole::Start
        };
        let end_role = if range.is_collapsed() {
            BoundaryRole::Caret
        } else {
            BoundaryRole::End
        };
        let start = map(self, range.start, start_role);
        let end = map(self, range.end, end_role);
        self.selection = Some(Range::new(start, end));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundaryRole {
    Start,
    End,
    Caret,
}

/// Byte index of the `offset`-th character.
pub fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::Document;
    use super::Position;
    use super::Range;
    use std::cmp::Ordering;

    fn paragraph(doc: &mut Document, text: &str) -> (u64, u64) {
        doc.clear_children(doc.root());
        let block = doc.create_element("p");
        let text = doc.create_text(text);
        doc.append_child(block, text);
        doc.append_child(doc.root(), block);
        (block, text)
    }

    #[test]
    fn new_document_is_the_empty_template() {
        let doc = Document::new();
        let root = doc.root();
        assert_eq!(doc.child_count(root), 1);
        let block = doc.first_child(root).unwrap_or_default();
        assert!(doc.is_element(block, "p"));
        assert!(doc.first_child(block).is_some_and(|br| doc.is_element(br, "br")));
        assert!(doc.is_blank());
    }

    #[test]
    fn split_text_moves_selection_into_right_half() {
        let mut doc = Document::new();
        let (block, text) = paragraph(&mut doc, "abc");
        doc.set_selection(Some(Range::new(
            Position::new(text, 1),
            Position::new(text, 2),
        )));

        let right = doc.split_text(text, 1).unwrap_or_default();
        assert_eq!(doc.text(text), Some("a"));
        assert_eq!(doc.text(right), Some("bc"));
        assert_eq!(doc.child_count(block), 2);
        let selection = doc.selection().unwrap_or_else(|| unreachable!());
        assert_eq!(selection.start, Position::new(right, 0));
        assert_eq!(selection.end, Position::new(right, 1));
    }

    #[test]
    fn collapsed_caret_stays_left_of_split() {
        let mut doc = Document::new();
        let (_, text) = paragraph(&mut doc, "abc");
        doc.set_caret(Position::new(text, 1));
        let _ = doc.split_text(text, 1);
        assert_eq!(
            doc.selection().map(|range| range.start),
            Some(Position::new(text, 1))
        );
    }

    #[test]
    fn normalize_text_merges_and_remaps_selection() {
        let mut doc = Document::new();
        let (block, text) = paragraph(&mut doc, "abc");
        let mid = doc.split_text(text, 1).unwrap_or_default();
        let _ = doc.split_text(mid, 1);
        doc.set_selection(Some(Range::new(
            Position::new(mid, 0),
            Position::new(mid, 1),
        )));

        doc.normalize_text(block);
        assert_eq!(doc.child_count(block), 1);
        assert_eq!(doc.text(text), Some("abc"));
        let selection = doc.selection().unwrap_or_else(|| unreachable!());
        assert_eq!(selection.start, Position::new(text, 1));
        assert_eq!(selection.end, Position::new(text, 2));
    }

    #[test]
    fn removing_a_subtree_collapses_inner_boundaries() {
        let mut doc = Document::new();
        let (block, text) = paragraph(&mut doc, "abc");
        let root = doc.root();
        doc.set_caret(Position::new(text, 2));
        doc.remove(block);
        assert_eq!(
            doc.selection().map(|range| range.start),
            Some(Position::new(root, 0))
        );
        assert!(!doc.contains(text));
    }

    #[test]
    fn compares_boundary_points() {
        let mut doc = Document::new();
        let (block, text) = paragraph(&mut doc, "abc");
        assert_eq!(
            doc.compare_positions(Position::new(block, 0), Position::new(text, 2)),
            Ordering::Less
        );
        assert_eq!(
            doc.compare_positions(Position::new(block, 1), Position::new(text, 2)),
            Ordering::Greater
        );
        assert_eq!(
            doc.compare_positions(Position::new(text, 2), Position::new(text, 1)),
            Ordering::Greater
        );
    }

    #[test]
    fn split_subtree_clones_the_ancestor_chain() {
        let mut doc = Document::new();
        let (block, text) = paragraph(&mut doc, "hello");
        let bold = doc.create_element("b");
        doc.wrap(text, bold);

        let right = doc.split_subtree(block, Position::new(text, 2));
        let right = right.unwrap_or_else(|| unreachable!());
        assert_eq!(doc.text_content(block), "he");
        assert_eq!(doc.text_content(right), "llo");
        assert!(doc.first_child(right).is_some_and(|b| doc.is_element(b, "b")));
        assert_eq!(doc.next_sibling(block), Some(right));
    }

    #[test]
    fn normalize_root_wraps_stray_inline_content() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.clear_children(root);
        let text = doc.create_text("loose");
        let bold = doc.create_element("b");
        let inner = doc.create_text("!");
        doc.append_child(bold, inner);
        doc.append_child(root, text);
        doc.append_child(root, bold);

        doc.normalize_root();
        assert_eq!(doc.child_count(root), 1);
        let block = doc.first_child(root).unwrap_or_default();
        assert!(doc.is_element(block, "p"));
        assert_eq!(doc.text_content(block), "loose!");
    }

    #[test]
    fn class_helpers_keep_attribute_tidy() {
        let mut doc = Document::new();
        let span = doc.create_element("span");
        doc.add_class(span, "image-wrapper");
        doc.add_class(span, "floating");
        doc.add_class(span, "floating");
        assert_eq!(doc.attr(span, "class"), Some("image-wrapper floating"));
        doc.remove_class(span, "image-wrapper");
        doc.remove_class(span, "floating");
        assert_eq!(doc.attr(span, "class"), None);
    }

    #[test]
    fn insert_and_delete_text_shift_the_caret() {
        let mut doc = Document::new();
        let (_, text) = paragraph(&mut doc, "Hello");
        doc.set_caret(Position::new(text, 5));
        doc.insert_text(text, 0, ">> ");
        assert_eq!(
            doc.selection().map(|range| range.start),
            Some(Position::new(text, 8))
        );
        doc.delete_text(text, 0, 3);
        assert_eq!(doc.text(text), Some("Hello"));
        assert_eq!(
            doc.selection().map(|range| range.start),
            Some(Position::new(text, 5))
        );
    }

    #[test]
    fn editing_host_follows_contenteditable() {
        let mut doc = Document::new();
        let (block, text) = paragraph(&mut doc, "root");
        let wrapper = doc.create_element_with_attrs("div", &[("contenteditable", "false")]);
        let inner = doc.create_text("boxed");
        doc.append_child(wrapper, inner);
        doc.append_child(doc.root(), wrapper);

        assert_eq!(doc.editing_host(text), Some(doc.root()));
        assert_eq!(doc.editing_host(inner), None);

        doc.set_caret(Position::new(inner, 2));
        assert!(doc.selection_in_root().is_some());
        assert_eq!(doc.editable_selection(), None);

        doc.set_attr(wrapper, "contenteditable", "true");
        doc.set_attr(doc.root(), "contenteditable", "false");
        assert_eq!(doc.editing_host(inner), Some(wrapper));
        assert_eq!(doc.editing_host(block), None);
        assert!(doc.editable_selection().is_some());

        doc.set_selection(Some(Range::new(Position::new(text, 0), Position::new(inner, 1))));
        assert_eq!(doc.editable_selection(), None);
    }

    #[test]
    fn rename_carries_a_caret_on_the_element() {
        let mut doc = Document::new();
        let block = doc.first_child(doc.root()).unwrap_or_default();
        doc.set_caret(Position::new(block, 0));
        let heading = doc.rename(block, "h2").unwrap_or_default();
        assert!(doc.is_element(heading, "h2"));
        assert_eq!(
            doc.selection().map(|range| range.start),
            Some(Position::new(heading, 0))
        );
    }
}
