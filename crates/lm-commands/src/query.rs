//! Formatting queries behind the selection snapshot.

use crate::inline::has_inline_style;
use crate::range::context_node;
use crate::range::require_selection;
use lm_core::Alignment;
use lm_core::BlockStyle;
use lm_core::EditorResult;
use lm_core::FormattingSnapshot;
use lm_core::InlineStyle;
use lm_core::ListKind;
use lm_core::ListState;
use lm_css::DEFAULT_FONT_SIZE_PT;
use lm_css::font_size_to_pt;
use lm_css::legacy_size_to_pt;
use lm_css::split_top_level;
use lm_dom::Document;
use lm_dom::NodeId;

/// Node whose formatting is reported: the context of the selection start.
fn anchor(doc: &Document) -> EditorResult<NodeId> {
    let range = require_selection(doc)?;
    Ok(context_node(doc, range.start))
}

/// Inclusive ancestors of `node` below the editable root.
fn lineage(doc: &Document, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    let root = doc.root();
    std::iter::once(node)
        .chain(doc.ancestors(node))
        .take_while(move |id| *id != root)
}

pub fn query_block_style(doc: &Document) -> EditorResult<BlockStyle> {
    let node = anchor(doc)?;
    Ok(lineage(doc, node)
        .find_map(|id| {
            let style = BlockStyle::from_tag(doc.tag(id)?);
            (style != BlockStyle::Normal).then_some(style)
        })
        .unwrap_or_default())
}

pub fn query_inline_style(doc: &Document, style: InlineStyle) -> EditorResult<bool> {
    let node = anchor(doc)?;
    Ok(has_inline_style(doc, node, style))
}

/// First family named by a `font-family` declaration or `<font face>`,
/// unquoted. Falls back to `default_family`.
pub fn query_font_family(doc: &Document, default_family: &str) -> EditorResult<String> {
    let node = anchor(doc)?;
    let declared = lineage(doc, node).find_map(|id| {
        doc.style_property(id, "font-family")
            .or_else(|| {
                doc.is_element(id, "font")
                    .then(|| doc.attr(id, "face").map(str::to_owned))
                    .flatten()
            })
    });
    let family = declared
        .as_deref()
        .and_then(|value| split_top_level(value, ',').into_iter().next())
        .map(|first| first.trim().trim_matches(|ch| ch == '"' || ch == '\'').trim().to_owned())
        .filter(|family| !family.is_empty());
    Ok(family.unwrap_or_else(|| default_family.to_owned()))
}

fn heading_size(tag: &str) -> Option<u32> {
    match tag {
        "h1" => Some(24),
        "h2" => Some(18),
        "h3" => Some(14),
        "h4" => Some(12),
        "h5" => Some(10),
        "h6" => Some(8),
        _ => None,
    }
}

/// Font size in whole points from the nearest declaration.
pub fn query_font_size(doc: &Document) -> EditorResult<u32> {
    let node = anchor(doc)?;
    let size = lineage(doc, node).find_map(|id| {
        if let Some(size) = doc
            .style_property(id, "font-size")
            .and_then(|value| font_size_to_pt(&value))
        {
            return Some(size);
        }
        if doc.is_element(id, "font") {
            if let Some(size) = doc.attr(id, "size").and_then(legacy_size_to_pt) {
                return Some(size);
            }
        }
        doc.tag(id).and_then(heading_size)
    });
    Ok(size.unwrap_or(DEFAULT_FONT_SIZE_PT))
}

pub fn query_list_state(doc: &Document) -> EditorResult<ListState> {
    let node = anchor(doc)?;
    let kind = lineage(doc, node)
        .find(|id| doc.is_element(*id, "li"))
        .and_then(|item| doc.parent(item))
        .and_then(|list| doc.tag(list))
        .and_then(ListKind::from_tag);
    Ok(ListState::from(kind))
}

pub fn query_alignment(doc: &Document) -> EditorResult<Alignment> {
    let node = anchor(doc)?;
    Ok(lineage(doc, node)
        .filter(|id| doc.is_block(*id))
        .find_map(|id| {
            doc.style_property(id, "text-align")
                .as_deref()
                .and_then(Alignment::from_css)
                .or_else(|| doc.attr(id, "align").and_then(Alignment::from_css))
        })
        .unwrap_or_default())
}

/// Full formatting snapshot at the selection start.
pub fn snapshot(doc: &Document, default_family: &str) -> EditorResult<FormattingSnapshot> {
    let node = anchor(doc)?;
    Ok(FormattingSnapshot {
        bold: has_inline_style(doc, node, InlineStyle::Bold),
        italic: has_inline_style(doc, node, InlineStyle::Italic),
        underline: has_inline_style(doc, node, InlineStyle::Underline),
        strikethrough: has_inline_style(doc, node, InlineStyle::Strikethrough),
        subscript: has_inline_style(doc, node, InlineStyle::Subscript),
        superscript: has_inline_style(doc, node, InlineStyle::Superscript),
        block_style: query_block_style(doc)?,
        font_family: query_font_family(doc, default_family)?,
        font_size: query_font_size(doc)?,
        list_state: query_list_state(doc)?,
        alignment: query_alignment(doc)?,
    })
}

#[cfg(test)]
mod tests {
    use super::query_alignment;
    use super::query_font_family;
    use super::query_font_size;
    use super::snapshot;
    use lm_core::Alignment;
    use lm_core::BlockStyle;
    use lm_core::ListState;
    use lm_dom::Document;
    use lm_dom::Position;
    use lm_html::LoadLimits;
    use lm_html::load_document;

    fn caret_in(html: &str, text_index: usize) -> Document {
        let mut doc = Document::new();
        assert!(load_document(&mut doc, html, &LoadLimits::default()).is_ok());
        let text = doc.text_nodes_under(doc.root())[text_index];
        doc.set_caret(Position::new(text, 1));
        doc
    }

    #[test]
    fn font_size_normalizes_units() {
        let doc = caret_in("<p><span style=\"font-size: 24px\">a</span></p>", 0);
        assert_eq!(query_font_size(&doc).unwrap_or_default(), 18);
        let doc = caret_in("<p><font size=\"5\">a</font></p>", 0);
        assert_eq!(query_font_size(&doc).unwrap_or_default(), 18);
        let doc = caret_in("<h1>a</h1>", 0);
        assert_eq!(query_font_size(&doc).unwrap_or_default(), 24);
        let doc = caret_in("<p>a</p>", 0);
        assert_eq!(query_font_size(&doc).unwrap_or_default(), 12);
    }

    #[test]
    fn font_family_strips_quotes_and_falls_back() {
        let doc = caret_in(
            "<p style=\"font-family: 'Times New Roman', serif\">a</p>",
            0,
        );
        assert_eq!(
            query_font_family(&doc, "Arial").unwrap_or_default(),
            "Times New Roman"
        );
        let doc = caret_in("<p><font face=\"Courier\">a</font></p>", 0);
        assert_eq!(query_font_family(&doc, "Arial").unwrap_or_default(), "Courier");
        let doc = caret_in("<p>a</p>", 0);
        assert_eq!(query_font_family(&doc, "Arial").unwrap_or_default(), "Arial");
    }

    #[test]
    fn alignment_reads_legacy_attribute() {
        let doc = caret_in("<p align=\"right\">a</p>", 0);
        assert_eq!(query_alignment(&doc).unwrap_or_default(), Alignment::Right);
    }

    #[test]
    fn snapshot_collects_every_field() {
        let doc = caret_in("<ol><li><h2><b><i>ab</i></b></h2></li></ol>", 0);
        let Ok(snapshot) = snapshot(&doc, "Arial") else {
            unreachable!();
        };
        assert!(snapshot.bold && snapshot.italic && !snapshot.underline);
        assert_eq!(snapshot.block_style, BlockStyle::H2);
        assert_eq!(snapshot.list_state, ListState::Ordered);
        assert_eq!(snapshot.font_size, 18);
    }

    #[test]
    fn missing_selection_is_reported() {
        let mut doc = Document::new();
        doc.clear_selection();
        assert!(snapshot(&doc, "Arial").is_err_and(|error| error.is_no_selection()));
    }
}
