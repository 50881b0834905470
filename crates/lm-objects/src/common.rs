//! Attribute storage shared by every object kind.
//!
//! Each visual property is written twice: as CSS for rendering and as a
//! `data-*` attribute so it survives a reload or a theme change.

use crate::config::MarginUpdate;
use crate::config::Margins;
use lm_core::EditorError;
use lm_core::EditorResult;
use lm_css::BorderStyle;
use lm_css::BorderValue;
use lm_css::CssColor;
use lm_css::format_px;
use lm_css::parse_px;
use lm_dom::Document;
use lm_dom::NodeId;
use lm_layout::Point;
use serde::Deserialize;
use serde::Serialize;

/// Mutually exclusive placement classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    #[default]
    LeftAlign,
    RightAlign,
    CenterAlign,
    NoWrap,
    Floating,
}

impl LayoutMode {
    pub const ALL: [Self; 5] = [
        Self::LeftAlign,
        Self::RightAlign,
        Self::CenterAlign,
        Self::NoWrap,
        Self::Floating,
    ];

    pub fn class(self) -> &'static str {
        match self {
            Self::LeftAlign => "left-align",
            Self::RightAlign => "right-align",
            Self::CenterAlign => "center-align",
            Self::NoWrap => "no-wrap",
            Self::Floating => "floating",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "left-align" => Some(Self::LeftAlign),
            "right" | "right-align" => Some(Self::RightAlign),
            "center" | "center-align" => Some(Self::CenterAlign),
            "no-wrap" | "nowrap" | "block" => Some(Self::NoWrap),
            "floating" | "float" => Some(Self::Floating),
            _ => None,
        }
    }

    /// Mode carried by the element's classes.
    pub fn of(doc: &Document, id: NodeId) -> Self {
        Self::ALL
            .into_iter()
            .rev()
            .find(|mode| doc.has_class(id, mode.class()))
            .unwrap_or_default()
    }
}

/// Partial border update; `None` keeps the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BorderUpdate {
    pub style: Option<BorderStyle>,
    pub width_px: Option<u32>,
    pub color: Option<String>,
}

impl BorderUpdate {
    /// Parses shorthand like `2px dashed #ff0000`.
    pub fn parse(value: &str) -> Self {
        let parsed = BorderValue::parse(value);
        let lowered = value.to_ascii_lowercase();
        Self {
            style: (parsed.is_visible() || lowered.contains("none")).then_some(parsed.style),
            width_px: value
                .split_whitespace()
                .any(|token| parse_px(token).is_some())
                .then_some(parsed.width_px),
            color: parsed.color.map(|color| color.as_css().to_owned()),
        }
    }
}

/// Border properties reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderInfo {
    pub style: String,
    pub width: u32,
    pub color: Option<String>,
}

impl From<&BorderValue> for BorderInfo {
    fn from(value: &BorderValue) -> Self {
        Self {
            style: value.style.as_str().to_owned(),
            width: value.width_px,
            color: value.color.as_ref().map(|color| color.as_css().to_owned()),
        }
    }
}

/// Numbers in data attributes carry no unit.
pub(crate) fn number(value: f32) -> String {
    format_px(value).trim_end_matches("px").to_owned()
}

pub(crate) fn data_number(doc: &Document, id: NodeId, name: &str) -> Option<f32> {
    doc.attr(id, name)
        .and_then(|value| value.trim().parse::<f32>().ok())
        .filter(|value| value.is_finite())
}

pub(crate) fn parse_color(value: &str) -> EditorResult<CssColor> {
    CssColor::parse(value).ok_or_else(|| {
        EditorError::invalid_argument("objects.color", format!("unrecognized color {value:?}"))
    })
}

pub(crate) fn set_layout_class(doc: &mut Document, id: NodeId, mode: LayoutMode) {
    for other in LayoutMode::ALL {
        doc.remove_class(id, other.class());
    }
    doc.add_class(id, mode.class());
}

pub(crate) fn is_floating(doc: &Document, id: NodeId) -> bool {
    lm_layout::is_floating(doc, id)
}

pub(crate) fn z_index(doc: &Document, id: NodeId) -> Option<i32> {
    doc.attr(id, "data-z-index")
        .map(str::to_owned)
        .or_else(|| doc.style_property(id, "z-index"))
        .and_then(|value| value.trim().parse::<i32>().ok())
}

pub(crate) fn set_z_index(doc: &mut Document, id: NodeId, z: i32) {
    doc.set_attr(id, "data-z-index", &z.to_string());
    doc.set_style_property(id, "z-index", &z.to_string());
}

pub(crate) fn floating_origin(doc: &Document, id: NodeId) -> Point {
    let read = |data: &str, css: &str| {
        data_number(doc, id, data)
            .or_else(|| doc.style_property(id, css).and_then(|value| parse_px(&value)))
            .unwrap_or(0.0)
    };
    Point::new(read("data-left", "left"), read("data-top", "top"))
}

pub(crate) fn set_floating_origin(doc: &mut Document, id: NodeId, origin: Point) {
    let x = origin.x.max(0.0);
    let y = origin.y.max(0.0);
    doc.set_attr(id, "data-left", &number(x));
    doc.set_attr(id, "data-top", &number(y));
    doc.set_style_property(id, "left", &format_px(x));
    doc.set_style_property(id, "top", &format_px(y));
}

/// Takes the object out of flow at `origin` with stacking order `z`.
pub(crate) fn enter_floating(doc: &mut Document, id: NodeId, origin: Point, z: i32) {
    set_layout_class(doc, id, LayoutMode::Floating);
    doc.set_attr(id, "data-floating", "true");
    doc.set_style_property(id, "position", "absolute");
    set_floating_origin(doc, id, origin);
    set_z_index(doc, id, z);
}

pub(crate) fn leave_floating(doc: &mut Document, id: NodeId) {
    let _ = doc.remove_attr(id, "data-floating");
    for name in ["data-left", "data-top", "data-z-index"] {
        let _ = doc.remove_attr(id, name);
    }
    for property in ["position", "left", "top", "z-index"] {
        let _ = doc.remove_style_property(id, property);
    }
}

pub(crate) fn margins(doc: &Document, id: NodeId, fallback: Margins) -> Margins {
    let side = |name: &str, fallback: f32| {
        data_number(doc, id, &format!("data-margin-{name}")).unwrap_or(fallback)
    };
    Margins {
        top: side("top", fallback.top),
        right: side("right", fallback.right),
        bottom: side("bottom", fallback.bottom),
        left: side("left", fallback.left),
    }
}

pub(crate) fn write_margins(doc: &mut Document, id: NodeId, margins: &Margins) {
    for (name, value) in [
        ("top", margins.top),
        ("right", margins.right),
        ("bottom", margins.bottom),
        ("left", margins.left),
    ] {
        doc.set_attr(id, &format!("data-margin-{name}"), &number(value));
        doc.set_style_property(id, &format!("margin-{name}"), &format_px(value));
    }
}

pub(crate) fn merge_margins(current: Margins, update: &MarginUpdate) -> EditorResult<Margins> {
    let merged = Margins {
        top: update.top.unwrap_or(current.top),
        right: update.right.unwrap_or(current.right),
        bottom: update.bottom.unwrap_or(current.bottom),
        left: update.left.unwrap_or(current.left),
    };
    let sides = [merged.top, merged.right, merged.bottom, merged.left];
    if sides.iter().any(|side| !side.is_finite()) {
        return Err(EditorError::invalid_argument(
            "objects.margins",
            "margins must be finite pixel values",
        ));
    }
    Ok(merged)
}

/// Border stored in the `data-border-*` attributes.
pub(crate) fn stored_border(doc: &Document, id: NodeId, fallback: &BorderValue) -> BorderValue {
    let style = doc
        .attr(id, "data-border-style")
        .and_then(BorderStyle::from_name)
        .unwrap_or(fallback.style);
    let width_px = doc
        .attr(id, "data-border-width")
        .and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(fallback.width_px);
    let color = doc
        .attr(id, "data-border-color")
        .and_then(CssColor::parse)
        .or_else(|| fallback.color.clone());
    BorderValue {
        width_px,
        style,
        color,
    }
}

pub(crate) fn merge_border(current: &BorderValue, update: &BorderUpdate) -> EditorResult<BorderValue> {
    let color = match &update.color {
        Some(value) => Some(parse_color(value)?),
        None => current.color.clone(),
    };
    let mut merged = BorderValue {
        width_px: update.width_px.unwrap_or(current.width_px),
        style: update.style.unwrap_or(current.style),
        color,
    };
    // A width on an invisible border implies a solid one.
    if update.style.is_none() && update.width_px.is_some_and(|w| w > 0) && !merged.is_visible() {
        merged.style = BorderStyle::Solid;
    }
    Ok(merged)
}

pub(crate) fn write_border_data(doc: &mut Document, id: NodeId, border: &BorderValue) {
    doc.set_attr(id, "data-border-style", border.style.as_str());
    doc.set_attr(id, "data-border-width", &border.width_px.to_string());
    match &border.color {
        Some(color) => doc.set_attr(id, "data-border-color", color.as_css()),
        None => {
            let _ = doc.remove_attr(id, "data-border-color");
        }
    }
}

pub(crate) fn has_shadow(doc: &Document, id: NodeId) -> bool {
    doc.attr(id, "data-shadow") == Some("true")
}

pub(crate) fn radius(doc: &Document, id: NodeId) -> f32 {
    data_number(doc, id, "data-radius").unwrap_or(0.0)
}

/// Writes shadow and corner radius CSS from the stored data attributes.
pub(crate) fn write_decorations(doc: &mut Document, data: NodeId, target: NodeId, shadow_css: &str) {
    if has_shadow(doc, data) {
        doc.set_style_property(target, "box-shadow", shadow_css);
    } else {
        let _ = doc.remove_style_property(target, "box-shadow");
    }
    let radius = radius(doc, data);
    if radius > 0.0 {
        doc.set_style_property(target, "border-radius", &format_px(radius));
    } else {
        let _ = doc.remove_style_property(target, "border-radius");
    }
}

pub(crate) fn background(doc: &Document, id: NodeId) -> Option<CssColor> {
    doc.attr(id, "data-bg-color").and_then(CssColor::parse)
}
