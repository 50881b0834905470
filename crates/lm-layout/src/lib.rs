//! Approximate box layout for the editable document.
//!
//! Boxes are estimated from element styles and text length. They drive
//! pointer hit testing, overlay placement and drag reordering; they are
//! not used for painting.

use lm_css::parse_px;
use lm_dom::Document;
use lm_dom::NodeId;
use std::collections::HashMap;
use std::collections::HashSet;

mod geometry;

pub use geometry::Point;
pub use geometry::Rect;
pub use geometry::Size;
pub use geometry::Viewport;

/// Role marker carried by every embedded object wrapper.
pub const OBJECT_ROLES: &[&str] = &["image-wrapper", "text-box", "table"];

/// Laid-out boxes keyed by node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutTree {
    boxes: HashMap<NodeId, Rect>,
    flow: Vec<(NodeId, Rect)>,
    floating: Vec<(NodeId, Rect, i32)>,
    objects: HashSet<NodeId>,
    pub content_height: f32,
}

impl LayoutTree {
    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        self.boxes.get(&id).copied()
    }

    /// Root children in flow order with their boxes.
    pub fn flow_blocks(&self) -> &[(NodeId, Rect)] {
        &self.flow
    }

    /// Index among flow blocks where something dropped at `y` lands.
    pub fn insertion_index(&self, y: f32) -> usize {
        self.flow
            .iter()
            .take_while(|(_, rect)| rect.center().y < y)
            .count()
    }

    /// Topmost object wrapper under `point`; floating objects first.
    pub fn object_at(&self, point: Point) -> Option<NodeId> {
        let mut floating = self.floating.clone();
        floating.sort_by(|a, b| b.2.cmp(&a.2));
        if let Some((id, _, _)) = floating.iter().find(|(_, rect, _)| rect.contains(point)) {
            return Some(*id);
        }
        self.boxes
            .iter()
            .filter(|(id, rect)| {
                self.objects.contains(*id)
                    && rect.contains(point)
                    && !self.floating.iter().any(|(f, _, _)| f == *id)
            })
            .min_by(|a, b| {
                (a.1.width * a.1.height)
                    .partial_cmp(&(b.1.width * b.1.height))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(id, _)| *id)
    }
}

/// Block-flow estimator.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    pub content_width: f32,
    pub padding: f32,
    pub line_height: f32,
    pub char_width: f32,
    pub block_gap: f32,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self {
            content_width: 800.0,
            padding: 16.0,
            line_height: 20.0,
            char_width: 8.0,
            block_gap: 8.0,
        }
    }
}

impl LayoutEngine {
    pub fn for_viewport(viewport: &Viewport) -> Self {
        Self {
            content_width: viewport.width,
            ..Self::default()
        }
    }

    pub fn compute(&self, doc: &Document) -> LayoutTree {
        let mut tree = LayoutTree::default();
        let inner_width = (self.content_width - self.padding * 2.0).max(1.0);
        let mut y = self.padding;

        for child in doc.children(doc.root()).to_vec() {
            if is_floating(doc, child) {
                let rect = self.floating_rect(doc, child);
                let z = doc
                    .style_property(child, "z-index")
                    .and_then(|z| z.trim().parse::<i32>().ok())
                    .unwrap_or(0);
                tree.floating.push((child, rect, z));
                tree.boxes.insert(child, rect);
                tree.objects.insert(child);
                continue;
            }

            let height = self.block_height(doc, child, inner_width);
            let rect = Rect::new(self.padding, y, inner_width, height);
            tree.boxes.insert(child, rect);
            tree.flow.push((child, rect));
            if is_object(doc, child) {
                tree.objects.insert(child);
            }
            self.place_inline_objects(doc, child, rect, &mut tree);
            y += height + self.block_gap;
        }

        tree.content_height = y + self.padding;
        tree
    }

    fn floating_rect(&self, doc: &Document, id: NodeId) -> Rect {
        let left = doc
            .style_property(id, "left")
            .and_then(|v| parse_px(&v))
            .unwrap_or(0.0);
        let top = doc
            .style_property(id, "top")
            .and_then(|v| parse_px(&v))
            .unwrap_or(0.0);
        let size = self.object_size(doc, id);
        Rect::from_origin(Point::new(left, top), size)
    }

    fn place_inline_objects(&self, doc: &Document, block: NodeId, rect: Rect, tree: &mut LayoutTree) {
        let mut x = rect.x;
        for node in doc.descendants(block) {
            if !is_object(doc, node) {
                continue;
            }
            tree.objects.insert(node);
            if is_floating(doc, node) {
                let floating = self.floating_rect(doc, node);
                let z = doc
                    .style_property(node, "z-index")
                    .and_then(|z| z.trim().parse::<i32>().ok())
                    .unwrap_or(0);
                tree.floating.push((node, floating, z));
                tree.boxes.insert(node, floating);
                continue;
            }
            let size = self.object_size(doc, node);
            let inline = Rect::new(x, rect.y, size.width.min(rect.width), size.height);
            tree.boxes.insert(node, inline);
            x += inline.width;
        }
    }

    fn block_height(&self, doc: &Document, id: NodeId, width: f32) -> f32 {
        if is_object(doc, id) {
            return self.object_size(doc, id).height;
        }
        if let Some(height) = doc.style_property(id, "height").and_then(|v| parse_px(&v)) {
            return height;
        }

        let mut height = 0.0_f32;
        let mut text_run = 0_usize;
        let flush = |run: &mut usize, height: &mut f32| {
            if *run > 0 {
                let per_line = (width / self.char_width).max(1.0);
                *height += (*run as f32 / per_line).ceil() * self.line_height;
                *run = 0;
            }
        };

        for child in doc.children(id).to_vec() {
            if let Some(text) = doc.text(child) {
                text_run += text.chars().count();
            } else if doc.is_block(child) || is_object(doc, child) {
                flush(&mut text_run, &mut height);
                height += self.block_height(doc, child, width);
            } else if doc.is_element(child, "br") {
                flush(&mut text_run, &mut height);
                height += self.line_height;
            } else {
                text_run += doc.text_content(child).chars().count();
            }
        }
        flush(&mut text_run, &mut height);

        height.max(self.line_height)
    }

    fn object_size(&self, doc: &Document, id: NodeId) -> Size {
        let measured = |node: NodeId, name: &str| {
            doc.style_property(node, name)
                .and_then(|v| parse_px(&v))
                .or_else(|| doc.attr(node, name).and_then(parse_px))
        };

        let image = doc
            .descendants(id)
            .into_iter()
            .find(|node| doc.is_element(*node, "img"));
        let (default_width, default_height) = match doc.attr(id, "data-role") {
            Some("image-wrapper") => (200.0, 150.0),
            Some("text-box") => (200.0, 100.0),
            _ => {
                let rows = doc
                    .descendants(id)
                    .into_iter()
                    .filter(|node| doc.is_element(*node, "tr"))
                    .count()
                    .max(1);
                (self.content_width - self.padding * 2.0, rows as f32 * (self.line_height + 8.0))
            }
        };

        let width = measured(id, "width")
            .or_else(|| image.and_then(|img| measured(img, "width")))
            .or_else(|| doc.attr(id, "data-original-width").and_then(parse_px))
            .unwrap_or(default_width);
        let height = measured(id, "height")
            .or_else(|| image.and_then(|img| measured(img, "height")))
            .or_else(|| doc.attr(id, "data-original-height").and_then(parse_px))
            .unwrap_or(default_height);
        Size::new(width, height)
    }
}

/// Wrapper elements of embedded objects.
pub fn is_object(doc: &Document, id: NodeId) -> bool {
    doc.attr(id, "data-role")
        .is_some_and(|role| OBJECT_ROLES.contains(&role))
}

/// Absolute-positioned objects leave the block flow.
pub fn is_floating(doc: &Document, id: NodeId) -> bool {
    doc.has_class(id, "floating") || doc.attr(id, "data-floating") == Some("true")
}

#[cfg(test)]
mod tests {
    use super::LayoutEngine;
    use super::Point;
    use lm_dom::Document;

    fn doc_with_blocks(count: usize) -> Document {
        let mut doc = Document::new();
        let root = doc.root();
        doc.clear_children(root);
        for index in 0..count {
            let block = doc.create_element("p");
            let text = doc.create_text(&format!("block {index}"));
            doc.append_child(block, text);
            doc.append_child(root, block);
        }
        doc
    }

    #[test]
    fn blocks_stack_vertically() {
        let doc = doc_with_blocks(3);
        let tree = LayoutEngine::default().compute(&doc);
        let blocks = tree.flow_blocks();
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].1.bottom() < blocks[1].1.y);
        assert_eq!(tree.insertion_index(0.0), 0);
        assert_eq!(tree.insertion_index(10_000.0), 3);
    }

    #[test]
    fn floating_objects_use_their_offsets_and_win_hit_tests() {
        let mut doc = doc_with_blocks(1);
        let root = doc.root();
        let wrapper = doc.create_element_with_attrs(
            "span",
            &[
                ("data-role", "image-wrapper"),
                ("class", "image-wrapper floating"),
                ("style", "left: 40px; top: 10px; width: 100px; height: 50px;"),
            ],
        );
        doc.append_child(root, wrapper);

        let tree = LayoutEngine::default().compute(&doc);
        let rect = tree.rect(wrapper).unwrap_or_default();
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (40.0, 10.0, 100.0, 50.0));
        assert_eq!(tree.object_at(Point::new(60.0, 30.0)), Some(wrapper));
        assert_eq!(tree.flow_blocks().len(), 1);
    }
}
