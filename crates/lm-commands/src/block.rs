//! Block-level commands: block style, alignment, lists, indentation,
//! spacing and column layout.

use crate::range::ensure_placeholder;
use crate::range::is_object_wrapper;
use crate::range::selected_blocks;
use lm_core::Alignment;
use lm_core::BlockStyle;
use lm_core::EditorResult;
use lm_core::ListKind;
use lm_core::SpacingScope;
use lm_css::format_px;
use lm_css::parse_px;
use lm_dom::Document;
use lm_dom::NodeId;
use lm_dom::Position;

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Wrapper class used by the column layout command.
pub const COLUMN_LAYOUT_CLASS: &str = "column-layout";

fn is_heading(doc: &Document, id: NodeId) -> bool {
    doc.tag(id).is_some_and(|tag| HEADINGS.contains(&tag))
}

fn is_list(doc: &Document, id: NodeId) -> bool {
    matches!(doc.tag(id), Some("ul" | "ol"))
}

fn is_container_cell(doc: &Document, id: NodeId) -> bool {
    matches!(doc.tag(id), Some("li" | "td" | "th"))
}

/// Blocks carrying running text.
fn is_text_block(doc: &Document, id: NodeId) -> bool {
    !is_object_wrapper(doc, id)
        && matches!(
            doc.tag(id),
            Some("p" | "div" | "li" | "blockquote" | "pre" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
        )
        && !doc.has_class(id, COLUMN_LAYOUT_CLASS)
        && !doc.has_class(id, "text-box")
}

/// Retargets every selected block to `style`. List items and table cells
/// keep their element and gain or lose an inner heading instead.
pub fn set_block_style(doc: &mut Document, style: BlockStyle) -> EditorResult<()> {
    for block in selected_blocks(doc)? {
        if !doc.contains(block) {
            continue;
        }
        let in_container = doc
            .parent(block)
            .is_some_and(|parent| is_container_cell(doc, parent));

        if is_heading(doc, block) && in_container && style == BlockStyle::Normal {
            doc.unwrap(block);
        } else if is_container_cell(doc, block) {
            if style != BlockStyle::Normal {
                let heading = doc.create_element(style.tag());
                doc.move_children(block, heading);
                doc.append_child(block, heading);
                ensure_placeholder(doc, heading);
            }
        } else {
            let _ = doc.rename(block, style.tag());
        }
    }
    Ok(())
}

pub fn set_alignment(doc: &mut Document, alignment: Alignment) -> EditorResult<()> {
    for block in selected_blocks(doc)? {
        let _ = doc.remove_attr(block, "align");
        if alignment == Alignment::Left {
            let _ = doc.remove_style_property(block, "text-align");
        } else {
            doc.set_style_property(block, "text-align", alignment.as_css());
        }
    }
    Ok(())
}

/// Turns the selected blocks into a list of `kind`, switches an existing
/// list to `kind`, or removes the list when it already is `kind`.
pub fn toggle_list(doc: &mut Document, kind: ListKind) -> EditorResult<()> {
    let blocks = selected_blocks(doc)?;
    let mut items = Vec::new();
    for block in &blocks {
        let item = doc.closest(*block, |doc, id| doc.is_element(id, "li"));
        if let Some(item) = item {
            if !items.contains(&item) {
                items.push(item);
            }
        }
    }

    if !items.is_empty() && items.len() >= blocks.len() {
        let all_same = items.iter().all(|item| {
            doc.parent(*item)
                .and_then(|list| doc.tag(list))
                .and_then(ListKind::from_tag)
                == Some(kind)
        });
        if all_same {
            for item in items {
                unlist_item(doc, item);
            }
        } else {
            for item in items {
                if let Some(list) = doc.parent(item).filter(|list| is_list(doc, *list)) {
                    let _ = doc.rename(list, kind.tag());
                }
            }
        }
        return Ok(());
    }

    let Some(first) = blocks.first().copied() else {
        return Ok(());
    };
    let list = doc.create_element(kind.tag());
    doc.insert_before(first, list);
    for block in blocks {
        if !doc.contains(block) || doc.is_element(block, "li") {
            continue;
        }
        if is_heading(doc, block) || is_container_cell(doc, block) {
            let item = doc.create_element("li");
            doc.append_child(list, item);
            doc.append_child(item, block);
        } else if let Some(item) = doc.rename(block, "li") {
            doc.append_child(list, item);
        }
    }
    if doc.child_count(list) == 0 {
        doc.remove(list);
    }
    Ok(())
}

/// Moves a list item out of its list, turning it into a paragraph placed
/// between the two halves of the split list.
fn unlist_item(doc: &mut Document, item: NodeId) {
    let (Some(list), Some(index)) = (doc.parent(item), doc.index_in_parent(item)) else {
        return;
    };
    let tail = doc.split_subtree(list, Position::new(list, index + 1));
    doc.insert_after(list, item);
    let holds_blocks = doc
        .children(item)
        .iter()
        .any(|child| doc.is_block(*child));
    if holds_blocks {
        doc.unwrap(item);
    } else {
        let _ = doc.rename(item, "p");
    }
    for container in [Some(list), tail].into_iter().flatten() {
        if doc.contains(container) && doc.child_count(container) == 0 {
            doc.remove(container);
        }
    }
}

fn margin_left(doc: &Document, block: NodeId) -> f32 {
    doc.style_property(block, "margin-left")
        .and_then(|value| parse_px(&value))
        .unwrap_or(0.0)
}

/// Nests list items under their previous sibling, or adds left margin to
/// other blocks.
pub fn indent(doc: &mut Document, step_px: f32) -> EditorResult<()> {
    let mut handled = Vec::new();
    for block in selected_blocks(doc)? {
        match doc.closest(block, |doc, id| doc.is_element(id, "li")) {
            Some(item) => {
                if handled.contains(&item) {
                    continue;
                }
                handled.push(item);
                nest_item(doc, item);
            }
            None => {
                let margin = margin_left(doc, block) + step_px;
                doc.set_style_property(block, "margin-left", &format_px(margin));
            }
        }
    }
    Ok(())
}

fn nest_item(doc: &mut Document, item: NodeId) {
    let Some(list) = doc.parent(item) else {
        return;
    };
    let Some(previous) = doc
        .previous_sibling(item)
        .filter(|previous| doc.is_element(*previous, "li"))
    else {
        return;
    };
    let tag = doc.tag(list).unwrap_or("ul").to_owned();
    let nested = match doc.last_child(previous) {
        Some(last) if doc.is_element(last, &tag) => last,
        _ => {
            let nested = doc.create_element(&tag);
            doc.append_child(previous, nested);
            nested
        }
    };
    doc.append_child(nested, item);
}

/// Lifts list items one level, or reduces the left margin of other blocks.
pub fn outdent(doc: &mut Document, step_px: f32) -> EditorResult<()> {
    let mut handled = Vec::new();
    for block in selected_blocks(doc)? {
        match doc.closest(block, |doc, id| doc.is_element(id, "li")) {
            Some(item) => {
                if handled.contains(&item) {
                    continue;
                }
                handled.push(item);
                lift_item(doc, item);
            }
            None => {
                let margin = margin_left(doc, block) - step_px;
                if margin <= 0.0 {
                    let _ = doc.remove_style_property(block, "margin-left");
                } else {
                    doc.set_style_property(block, "margin-left", &format_px(margin));
                }
            }
        }
    }
    Ok(())
}

fn lift_item(doc: &mut Document, item: NodeId) {
    let Some(list) = doc.parent(item) else {
        return;
    };
    let Some(outer) = doc
        .parent(list)
        .filter(|outer| doc.is_element(*outer, "li"))
    else {
        unlist_item(doc, item);
        return;
    };
    let Some(index) = doc.index_in_parent(item) else {
        return;
    };
    // Later siblings stay nested, now under the lifted item.
    if let Some(tail) = doc.split_subtree(list, Position::new(list, index + 1)) {
        if doc.child_count(tail) == 0 {
            doc.remove(tail);
        } else {
            doc.append_child(item, tail);
        }
    }
    doc.insert_after(outer, item);
    if doc.child_count(list) == 0 {
        doc.remove(list);
    }
}

fn spacing_targets(doc: &mut Document, scope: SpacingScope) -> EditorResult<Vec<NodeId>> {
    match scope {
        SpacingScope::Current => selected_blocks(doc),
        SpacingScope::All => {
            let root = doc.root();
            Ok(doc
                .descendants(root)
                .into_iter()
                .filter(|id| is_text_block(doc, *id))
                .collect())
        }
    }
}

/// Bottom margin after paragraphs.
pub fn set_paragraph_spacing(doc: &mut Document, px: f32, scope: SpacingScope) -> EditorResult<()> {
    let value = format_px(px.max(0.0));
    for block in spacing_targets(doc, scope)? {
        doc.set_style_property(block, "margin-bottom", &value);
    }
    Ok(())
}

pub fn set_line_spacing(doc: &mut Document, multiplier: f32, scope: SpacingScope) -> EditorResult<()> {
    let value = format!("{multiplier}");
    for block in spacing_targets(doc, scope)? {
        doc.set_style_property(block, "line-height", &value);
    }
    Ok(())
}

/// Wraps the top-level blocks of the selection in a multi-column container,
/// updates an existing one, or removes it for a count of zero.
pub fn set_columns(doc: &mut Document, count: u32, gap_px: f32) -> EditorResult<()> {
    let blocks = selected_blocks(doc)?;
    let root = doc.root();
    let existing = blocks.iter().find_map(|block| {
        doc.closest(*block, |doc, id| {
            id != root && doc.has_class(id, COLUMN_LAYOUT_CLASS)
        })
    });

    if count == 0 {
        if let Some(layout) = existing {
            doc.unwrap(layout);
        }
        return Ok(());
    }

    let layout = match existing {
        Some(layout) => layout,
        None => {
            let mut tops = Vec::new();
            for block in &blocks {
                let top = if doc.parent(*block) == Some(root) {
                    Some(*block)
                } else {
                    doc.top_level_ancestor(*block)
                };
                if let Some(top) = top.filter(|top| !tops.contains(top)) {
                    tops.push(top);
                }
            }
            let Some(first) = tops.first().copied() else {
                return Ok(());
            };
            let layout = doc.create_element("div");
            doc.add_class(layout, COLUMN_LAYOUT_CLASS);
            doc.insert_before(first, layout);
            for top in tops {
                doc.append_child(layout, top);
            }
            layout
        }
    };
    doc.set_attr(layout, "data-columns", &count.to_string());
    doc.set_style_property(layout, "column-count", &count.to_string());
    doc.set_style_property(layout, "column-gap", &format_px(gap_px));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::indent;
    use super::outdent;
    use super::set_alignment;
    use super::set_block_style;
    use super::set_columns;
    use super::set_line_spacing;
    use super::set_paragraph_spacing;
    use super::toggle_list;
    use lm_core::Alignment;
    use lm_core::BlockStyle;
    use lm_core::ListKind;
    use lm_core::SpacingScope;
    use lm_dom::Document;
    use lm_dom::Position;
    use lm_dom::Range;
    use lm_html::LoadLimits;
    use lm_html::load_document;
    use lm_html::serialize_document;

    fn load(html: &str) -> Document {
        let mut doc = Document::new();
        assert!(load_document(&mut doc, html, &LoadLimits::default()).is_ok());
        doc
    }

    fn select_texts(doc: &mut Document, first: usize, last: usize) {
        let texts = doc.text_nodes_under(doc.root());
        doc.set_selection(Some(Range::new(
            Position::new(texts[first], 0),
            Position::new(texts[last], doc.node_length(texts[last])),
        )));
    }

    #[test]
    fn heading_round_trip() {
        let mut doc = load("<p>abc</p>");
        select_texts(&mut doc, 0, 0);
        assert!(set_block_style(&mut doc, BlockStyle::H2).is_ok());
        assert_eq!(serialize_document(&doc), "<h2>abc</h2>");
        assert!(set_block_style(&mut doc, BlockStyle::Normal).is_ok());
        assert_eq!(serialize_document(&doc), "<p>abc</p>");
    }

    #[test]
    fn heading_inside_list_item_wraps_and_unwraps() {
        let mut doc = load("<ul><li>abc</li></ul>");
        select_texts(&mut doc, 0, 0);
        assert!(set_block_style(&mut doc, BlockStyle::H1).is_ok());
        assert_eq!(serialize_document(&doc), "<ul><li><h1>abc</h1></li></ul>");
        assert!(set_block_style(&mut doc, BlockStyle::Normal).is_ok());
        assert_eq!(serialize_document(&doc), "<ul><li>abc</li></ul>");
    }

    #[test]
    fn alignment_sets_and_clears_text_align() {
        let mut doc = load("<p>abc</p>");
        select_texts(&mut doc, 0, 0);
        assert!(set_alignment(&mut doc, Alignment::Center).is_ok());
        assert_eq!(
            serialize_document(&doc),
            "<p style=\"text-align: center;\">abc</p>"
        );
        assert!(set_alignment(&mut doc, Alignment::Left).is_ok());
        assert_eq!(serialize_document(&doc), "<p>abc</p>");
    }

    #[test]
    fn list_toggle_switch_and_remove() {
        let mut doc = load("<p>a</p><p>b</p>");
        select_texts(&mut doc, 0, 1);
        assert!(toggle_list(&mut doc, ListKind::Unordered).is_ok());
        assert_eq!(serialize_document(&doc), "<ul><li>a</li><li>b</li></ul>");
        assert!(toggle_list(&mut doc, ListKind::Ordered).is_ok());
        assert_eq!(serialize_document(&doc), "<ol><li>a</li><li>b</li></ol>");
        assert!(toggle_list(&mut doc, ListKind::Ordered).is_ok());
        assert_eq!(serialize_document(&doc), "<p>a</p><p>b</p>");
    }

    #[test]
    fn indent_nests_and_outdent_lifts() {
        let mut doc = load("<ul><li>a</li><li>b</li></ul>");
        select_texts(&mut doc, 1, 1);
        assert!(indent(&mut doc, 40.0).is_ok());
        assert_eq!(
            serialize_document(&doc),
            "<ul><li>a<ul><li>b</li></ul></li></ul>"
        );
        assert!(outdent(&mut doc, 40.0).is_ok());
        assert_eq!(serialize_document(&doc), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn paragraph_indent_uses_margin() {
        let mut doc = load("<p>a</p>");
        select_texts(&mut doc, 0, 0);
        assert!(indent(&mut doc, 40.0).is_ok());
        assert!(indent(&mut doc, 40.0).is_ok());
        assert_eq!(
            serialize_document(&doc),
            "<p style=\"margin-left: 80px;\">a</p>"
        );
        assert!(outdent(&mut doc, 40.0).is_ok());
        assert!(outdent(&mut doc, 40.0).is_ok());
        assert_eq!(serialize_document(&doc), "<p>a</p>");
    }

    #[test]
    fn spacing_for_all_blocks() {
        let mut doc = load("<p>a</p><h1>b</h1>");
        select_texts(&mut doc, 0, 0);
        assert!(set_paragraph_spacing(&mut doc, 12.0, SpacingScope::All).is_ok());
        assert!(set_line_spacing(&mut doc, 1.5, SpacingScope::Current).is_ok());
        assert_eq!(
            serialize_document(&doc),
            "<p style=\"margin-bottom: 12px; line-height: 1.5;\">a</p>\
             <h1 style=\"margin-bottom: 12px;\">b</h1>"
        );
    }

    #[test]
    fn columns_wrap_and_unwrap() {
        let mut doc = load("<p>a</p>");
        select_texts(&mut doc, 0, 0);
        assert!(set_columns(&mut doc, 2, 24.0).is_ok());
        assert_eq!(
            serialize_document(&doc),
            "<div class=\"column-layout\" data-columns=\"2\" \
             style=\"column-count: 2; column-gap: 24px;\"><p>a</p></div>"
        );
        assert!(set_columns(&mut doc, 0, 24.0).is_ok());
        assert_eq!(serialize_document(&doc), "<p>a</p>");
    }
}
