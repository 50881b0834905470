//! Inline formatting: toggled styles, span styles and clear formatting.

use crate::insert::insert_inline_at;
use crate::range::closest_block;
use crate::range::coalesce_inline;
use crate::range::lift_out_of;
use crate::range::selected_text_nodes;
use crate::range::split_selection_boundaries;
use lm_core::EditorResult;
use lm_core::InlineStyle;
use lm_dom::Document;
use lm_dom::NodeId;
use lm_dom::Position;
use lm_dom::ZERO_WIDTH_SPACE;

/// True when the element carries `style` through its tag.
fn tag_has_style(doc: &Document, id: NodeId, style: InlineStyle) -> bool {
    let Some(tag) = doc.tag(id) else {
        return false;
    };
    match style {
        InlineStyle::Bold => matches!(tag, "b" | "strong"),
        InlineStyle::Italic => matches!(tag, "i" | "em"),
        InlineStyle::Underline => matches!(tag, "u" | "ins"),
        InlineStyle::Strikethrough => matches!(tag, "s" | "strike" | "del"),
        InlineStyle::Subscript => tag == "sub",
        InlineStyle::Superscript => tag == "sup",
    }
}

/// True when the element carries `style` through its inline CSS.
fn css_has_style(doc: &Document, id: NodeId, style: InlineStyle) -> bool {
    let css = doc.style(id);
    let decoration = || {
        css.get("text-decoration-line")
            .or_else(|| css.get("text-decoration"))
            .unwrap_or_default()
            .to_ascii_lowercase()
    };
    match style {
        InlineStyle::Bold => css.get("font-weight").is_some_and(|weight| {
            let weight = weight.trim().to_ascii_lowercase();
            weight == "bold" || weight == "bolder" || weight.parse::<u32>().is_ok_and(|w| w >= 600)
        }),
        InlineStyle::Italic => css
            .get("font-style")
            .is_some_and(|value| matches!(value.trim(), "italic" | "oblique")),
        InlineStyle::Underline => decoration().contains("underline"),
        InlineStyle::Strikethrough => decoration().contains("line-through"),
        InlineStyle::Subscript => css.get("vertical-align").is_some_and(|v| v.trim() == "sub"),
        InlineStyle::Superscript => css
            .get("vertical-align")
            .is_some_and(|v| v.trim() == "super"),
    }
}

/// Whether `node` renders with `style`, looking at every ancestor below
/// the root.
pub fn has_inline_style(doc: &Document, node: NodeId, style: InlineStyle) -> bool {
    let root = doc.root();
    std::iter::once(node)
        .chain(doc.ancestors(node))
        .take_while(|id| *id != root)
        .any(|id| tag_has_style(doc, id, style) || css_has_style(doc, id, style))
}

/// Flips `style` over the selection. A collapsed selection gets an anchor
/// so the next typed text picks up the new state.
pub fn toggle_inline(doc: &mut Document, style: InlineStyle) -> EditorResult<()> {
    let range = split_selection_boundaries(doc)?;
    if range.is_collapsed() {
        let anchor = anchor_text_at(doc, range.start);
        flip(doc, &[anchor], style);
        doc.set_caret(Position::new(anchor, 1));
        return Ok(());
    }

    let nodes = selected_text_nodes(doc, range);
    if nodes.is_empty() {
        return Ok(());
    }
    flip(doc, &nodes, style);
    coalesce_around(doc, &nodes);
    Ok(())
}

fn flip(doc: &mut Document, nodes: &[NodeId], style: InlineStyle) {
    let active = nodes.iter().all(|node| has_inline_style(doc, *node, style));
    if active {
        for node in nodes {
            remove_style(doc, *node, style);
        }
        return;
    }

    if let Some(partner) = style.exclusive_partner() {
        for node in nodes {
            remove_style(doc, *node, partner);
        }
    }
    for node in nodes {
        if !has_inline_style(doc, *node, style) {
            let wrapper = doc.create_element(style.tag());
            doc.wrap(*node, wrapper);
        }
    }
}

fn remove_style(doc: &mut Document, node: NodeId, style: InlineStyle) {
    lift_out_of(doc, node, |doc, ancestor| tag_has_style(doc, ancestor, style));
    if has_inline_style(doc, node, style) {
        // Inherited through CSS: override locally.
        let (property, value) = match style {
            InlineStyle::Bold => ("font-weight", "normal"),
            InlineStyle::Italic => ("font-style", "normal"),
            InlineStyle::Underline | InlineStyle::Strikethrough => ("text-decoration", "none"),
            InlineStyle::Subscript | InlineStyle::Superscript => ("vertical-align", "baseline"),
        };
        let span = doc.create_element("span");
        doc.set_style_property(span, property, value);
        doc.wrap(node, span);
    }
}

/// Applies one CSS property to the selection through spans. A collapsed
/// selection gets a zero-width anchor span carrying the property.
pub fn apply_span_style(doc: &mut Document, property: &str, value: &str) -> EditorResult<()> {
    let range = split_selection_boundaries(doc)?;
    if range.is_collapsed() {
        let anchor = anchor_text_at(doc, range.start);
        let span = own_span(doc, anchor);
        doc.set_style_property(span, property, value);
        doc.set_caret(Position::new(anchor, 1));
        return Ok(());
    }

    let nodes = selected_text_nodes(doc, range);
    for node in &nodes {
        let span = own_span(doc, *node);
        doc.set_style_property(span, property, value);
        for inner in doc.descendants(span) {
            let _ = doc.remove_style_property(inner, property);
        }
    }
    coalesce_around(doc, &nodes);
    Ok(())
}

/// The span wrapping exactly `node`, created when missing.
fn own_span(doc: &mut Document, node: NodeId) -> NodeId {
    if let Some(parent) = doc.parent(node) {
        if doc.is_element(parent, "span")
            && doc.child_count(parent) == 1
            && doc.attr(parent, "data-role").is_none()
        {
            return parent;
        }
    }
    let span = doc.create_element("span");
    doc.wrap(node, span);
    span
}

/// Strips presentational inline markup from the selection. Links stay.
pub fn clear_formatting(doc: &mut Document) -> EditorResult<()> {
    let range = split_selection_boundaries(doc)?;
    let nodes = selected_text_nodes(doc, range);
    for node in &nodes {
        lift_out_of(doc, *node, |doc, ancestor| {
            doc.tag(ancestor)
                .is_some_and(lm_dom::is_inline_formatting_tag)
        });
    }
    coalesce_around(doc, &nodes);
    Ok(())
}

/// Reuses a zero-width anchor at the caret or inserts a new one.
pub(crate) fn anchor_text_at(doc: &mut Document, at: Position) -> NodeId {
    if doc
        .text(at.node)
        .is_some_and(|text| text.chars().eq([ZERO_WIDTH_SPACE]))
    {
        return at.node;
    }
    let anchor = doc.create_text(&ZERO_WIDTH_SPACE.to_string());
    insert_inline_at(doc, at, anchor);
    anchor
}

fn coalesce_around(doc: &mut Document, nodes: &[NodeId]) {
    let mut scopes = Vec::new();
    for node in nodes {
        if !doc.contains(*node) {
            continue;
        }
        let scope = closest_block(doc, *node).unwrap_or(doc.root());
        if !scopes.contains(&scope) {
            scopes.push(scope);
        }
    }
    for scope in scopes {
        if doc.contains(scope) {
            coalesce_inline(doc, scope);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::apply_span_style;
    use super::clear_formatting;
    use super::toggle_inline;
    use lm_core::InlineStyle;
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

    fn select_chars(doc: &mut Document, start: usize, end: usize) {
        let text = doc.text_nodes_under(doc.root())[0];
        doc.set_selection(Some(Range::new(
            Position::new(text, start),
            Position::new(text, end),
        )));
    }

    #[test]
    fn bold_toggles_on_and_off() {
        let mut doc = load("<p>abc</p>");
        select_chars(&mut doc, 1, 2);
        assert!(toggle_inline(&mut doc, InlineStyle::Bold).is_ok());
        assert_eq!(serialize_document(&doc), "<p>a<b>b</b>c</p>");
        assert!(toggle_inline(&mut doc, InlineStyle::Bold).is_ok());
        assert_eq!(serialize_document(&doc), "<p>abc</p>");
    }

    #[test]
    fn superscript_replaces_subscript() {
        let mut doc = load("<p>x2</p>");
        select_chars(&mut doc, 1, 2);
        assert!(toggle_inline(&mut doc, InlineStyle::Subscript).is_ok());
        assert!(toggle_inline(&mut doc, InlineStyle::Superscript).is_ok());
        assert_eq!(serialize_document(&doc), "<p>x<sup>2</sup></p>");
        assert!(toggle_inline(&mut doc, InlineStyle::Superscript).is_ok());
        assert_eq!(serialize_document(&doc), "<p>x2</p>");
    }

    #[test]
    fn partial_unbold_splits_the_wrapper() {
        let mut doc = load("<p><b>abc</b></p>");
        select_chars(&mut doc, 1, 2);
        assert!(toggle_inline(&mut doc, InlineStyle::Bold).is_ok());
        assert_eq!(serialize_document(&doc), "<p><b>a</b>b<b>c</b></p>");
    }

    #[test]
    fn collapsed_font_size_creates_anchor() {
        let mut doc = load("<p>Hello</p>");
        let text = doc.text_nodes_under(doc.root())[0];
        doc.set_caret(Position::new(text, 5));
        assert!(apply_span_style(&mut doc, "font-size", "18pt").is_ok());
        assert_eq!(
            serialize_document(&doc),
            "<p>Hello<span style=\"font-size: 18pt;\">\u{200B}</span></p>"
        );
    }

    #[test]
    fn repeated_span_styles_reuse_the_span() {
        let mut doc = load("<p>abc</p>");
        select_chars(&mut doc, 0, 3);
        assert!(apply_span_style(&mut doc, "color", "#ff0000").is_ok());
        assert!(apply_span_style(&mut doc, "color", "#00ff00").is_ok());
        assert_eq!(
            serialize_document(&doc),
            "<p><span style=\"color: #00ff00;\">abc</span></p>"
        );
    }

    #[test]
    fn clear_formatting_keeps_links() {
        let mut doc = load("<p><a href=\"x\"><b><i>abc</i></b></a></p>");
        select_chars(&mut doc, 0, 3);
        assert!(clear_formatting(&mut doc).is_ok());
        assert_eq!(serialize_document(&doc), "<p><a href=\"x\">abc</a></p>");
    }
}
