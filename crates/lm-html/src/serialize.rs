use crate::entities::escape_attribute;
use crate::entities::escape_text;
use lm_dom::Document;
use lm_dom::NodeData;
use lm_dom::NodeId;
use lm_dom::is_void_tag;

const OVERLAY_MARKERS: &[&str] = &["drag-handle", "resize-handle"];

/// Objects whose wrapper is only editable during an edit session.
const EDIT_SESSION_ROLES: &[&str] = &["text-box"];

/// True for handle elements that must never reach exported HTML.
pub fn is_overlay_element(doc: &Document, id: NodeId) -> bool {
    doc.attr(id, "data-role")
        .is_some_and(|role| OVERLAY_MARKERS.contains(&role))
        || OVERLAY_MARKERS.iter().any(|marker| doc.has_class(id, marker))
}

/// Inner HTML of `id`.
pub fn serialize_children(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    for child in doc.children(id) {
        write_node(doc, *child, &mut out);
    }
    out
}

/// Outer HTML of `id`.
pub fn serialize_node(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, &mut out);
    out
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.data(id) {
        Some(NodeData::Text(text)) => escape_text(text, out),
        Some(NodeData::Element(element)) => {
            if is_overlay_element(doc, id) {
                return;
            }
            out.push('<');
            out.push_str(&element.tag);
            let at_rest = doc
                .attr(id, "data-role")
                .is_some_and(|role| EDIT_SESSION_ROLES.contains(&role));
            for (name, value) in &element.attrs {
                let value = if at_rest && name.as_str() == "contenteditable" { "false" } else { value.as_str() };
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_attribute(value, out);
                out.push('"');
            }
            out.push('>');
            if is_void_tag(&element.tag) {
                return;
            }
            for child in doc.children(id) {
                write_node(doc, *child, out);
            }
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
        None => {}
    }
}

/// Visible text with block boundaries as newlines.
pub fn plain_text(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    collect_text(doc, id, &mut out);
    out.replace(lm_dom::ZERO_WIDTH_SPACE, "")
        .trim_end_matches('\n')
        .to_owned()
}

fn collect_text(doc: &Document, id: NodeId, out: &mut String) {
    for child in doc.children(id) {
        if let Some(text) = doc.text(*child) {
            out.push_str(text);
            continue;
        }
        if is_overlay_element(doc, *child) {
            continue;
        }
        if doc.is_element(*child, "br") {
            out.push('\n');
            continue;
        }
        collect_text(doc, *child, out);
        let is_cell = matches!(doc.tag(*child), Some("td" | "th"));
        if is_cell {
            out.push('\t');
        } else if doc.is_block(*child) && !out.ends_with('\n') {
            out.push('\n');
        }
    }
}
