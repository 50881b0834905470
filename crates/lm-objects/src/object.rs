//! The seam every embedded object implements.

use crate::common;
use crate::common::BorderUpdate;
use crate::common::LayoutMode;
use crate::config::MarginUpdate;
use crate::config::ObjectConfig;
use crate::image::ImageObject;
use crate::table::TableObject;
use crate::text_box::TextBoxObject;
use lm_core::EditorError;
use lm_core::EditorResult;
use lm_core::Modifiers;
use lm_core::ObjectKind;
use lm_core::Theme;
use lm_css::parse_px;
use lm_dom::Document;
use lm_dom::NodeId;
use lm_layout::LayoutTree;
use lm_layout::Point;
use lm_layout::Rect;
use lm_layout::Size;
use lm_layout::Viewport;
use lm_overlay::HandleShape;
use serde::Serialize;

/// Environment an object operation runs in.
#[derive(Debug, Clone, Copy)]
pub struct ObjectContext<'a> {
    pub config: &'a ObjectConfig,
    pub layout: &'a LayoutTree,
    pub viewport: Viewport,
    pub theme: Theme,
}

/// CSS filter presets for images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorEffect {
    #[default]
    None,
    Grayscale,
    Sepia,
    Invert,
    Brightness,
    Contrast,
    Blur,
}

impl ColorEffect {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Grayscale => "grayscale",
            Self::Sepia => "sepia",
            Self::Invert => "invert",
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
            Self::Blur => "blur",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Some(Self::None),
            "grayscale" | "greyscale" => Some(Self::Grayscale),
            "sepia" => Some(Self::Sepia),
            "invert" => Some(Self::Invert),
            "brightness" | "brighten" => Some(Self::Brightness),
            "contrast" => Some(Self::Contrast),
            "blur" => Some(Self::Blur),
            _ => None,
        }
    }

    pub fn filter(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Grayscale => Some("grayscale(100%)"),
            Self::Sepia => Some("sepia(100%)"),
            Self::Invert => Some("invert(100%)"),
            Self::Brightness => Some("brightness(130%)"),
            Self::Contrast => Some("contrast(150%)"),
            Self::Blur => Some("blur(2px)"),
        }
    }
}

/// A property change addressed to the active object.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProperty {
    Layout(LayoutMode),
    Border(BorderUpdate),
    Shadow(bool),
    Radius(f32),
    Margins(MarginUpdate),
    Background(String),
    ColorEffect(ColorEffect),
}

impl ObjectProperty {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Layout(_) => "layout",
            Self::Border(_) => "border",
            Self::Shadow(_) => "shadow",
            Self::Radius(_) => "radius",
            Self::Margins(_) => "margins",
            Self::Background(_) => "background",
            Self::ColorEffect(_) => "effect",
        }
    }

    /// Parses the host's string form, e.g. `("radius", "8px")`.
    pub fn parse(name: &str, value: &str) -> EditorResult<Self> {
        let invalid = || {
            EditorError::invalid_argument(
                "objects.property",
                format!("invalid value {value:?} for property {name:?}"),
            )
        };
        match name.trim().to_ascii_lowercase().as_str() {
            "layout" | "alignment" => LayoutMode::from_name(value).map(Self::Layout).ok_or_else(invalid),
            "border" => Ok(Self::Border(BorderUpdate::parse(value))),
            "shadow" => match value.trim() {
                "true" | "on" | "1" => Ok(Self::Shadow(true)),
                "false" | "off" | "0" => Ok(Self::Shadow(false)),
                _ => Err(invalid()),
            },
            "radius" => parse_px(value)
                .filter(|radius| *radius >= 0.0)
                .map(Self::Radius)
                .ok_or_else(invalid),
            "margins" => {
                let sides = value
                    .split([' ', ','])
                    .filter(|part| !part.is_empty())
                    .map(parse_px)
                    .collect::<Option<Vec<f32>>>()
                    .ok_or_else(invalid)?;
                let [top, right, bottom, left] = sides[..] else {
                    return Err(invalid());
                };
                Ok(Self::Margins(MarginUpdate {
                    top: Some(top),
                    right: Some(right),
                    bottom: Some(bottom),
                    left: Some(left),
                }))
            }
            "background" | "background-color" => Ok(Self::Background(value.trim().to_owned())),
            "effect" | "color-effect" => ColorEffect::from_name(value)
                .map(Self::ColorEffect)
                .ok_or_else(invalid),
            _ => Err(EditorError::invalid_argument(
                "objects.property",
                format!("unknown object property {name:?}"),
            )),
        }
    }
}

pub(crate) fn unsupported(kind: ObjectKind, property: &ObjectProperty) -> EditorError {
    EditorError::invalid_argument(
        "objects.unsupported_property",
        format!("{} does not support {}", kind.as_str(), property.name()),
    )
}

/// Behavior shared by images, text boxes and tables.
pub trait SelectableObject {
    fn node(&self) -> NodeId;

    fn kind(&self) -> ObjectKind;

    /// Element carrying the visual CSS (border, shadow, radius).
    fn style_target(&self, doc: &Document) -> NodeId {
        let _ = doc;
        self.node()
    }

    fn resize_shape(&self) -> HandleShape {
        HandleShape::Square
    }

    /// Prepares the markup for interaction. Idempotent.
    fn activate(&self, doc: &mut Document, ctx: &ObjectContext<'_>);

    fn deactivate(&self, doc: &mut Document) {
        let _ = doc;
    }

    fn hit_test(&self, ctx: &ObjectContext<'_>, point: Point) -> bool {
        ctx.layout
            .rect(self.node())
            .is_some_and(|rect| rect.contains(point))
    }

    /// Moves a floating object so its top-left corner sits at `origin`.
    fn move_to(&self, doc: &mut Document, origin: Point) {
        common::set_floating_origin(doc, self.node(), origin);
    }

    /// Size the object is displayed at.
    fn size(&self, doc: &Document, ctx: &ObjectContext<'_>) -> Size;

    /// Resizes from `start` by the pointer travel `delta`; returns the
    /// size applied.
    fn resize(
        &self,
        doc: &mut Document,
        start: Size,
        delta: Point,
        modifiers: Modifiers,
        ctx: &ObjectContext<'_>,
    ) -> Size;

    fn apply_property(
        &self,
        doc: &mut Document,
        property: &ObjectProperty,
        ctx: &ObjectContext<'_>,
    ) -> EditorResult<()>;

    /// Rewrites CSS from the stored data attributes for `ctx.theme`.
    fn reassert(&self, doc: &mut Document, ctx: &ObjectContext<'_>);

    fn properties(&self, doc: &Document, ctx: &ObjectContext<'_>) -> serde_json::Value;

    /// Box used for overlay placement.
    fn bounds(&self, doc: &Document, ctx: &ObjectContext<'_>) -> Rect {
        let size = self.size(doc, ctx);
        if common::is_floating(doc, self.node()) {
            return Rect::from_origin(common::floating_origin(doc, self.node()), size);
        }
        ctx.layout
            .rect(self.node())
            .map(|rect| Rect::from_origin(rect.origin(), size))
            .unwrap_or_else(|| Rect::from_origin(Point::default(), size))
    }
}

/// Applies the properties every object kind supports. Returns `Ok(false)`
/// for properties left to the object itself.
pub(crate) fn apply_shared(
    object: &dyn SelectableObject,
    doc: &mut Document,
    property: &ObjectProperty,
    ctx: &ObjectContext<'_>,
) -> EditorResult<bool> {
    let node = object.node();
    match property {
        ObjectProperty::Layout(mode) => {
            set_layout(object, doc, *mode, ctx);
            Ok(true)
        }
        ObjectProperty::Shadow(on) => {
            doc.set_attr(node, "data-shadow", if *on { "true" } else { "false" });
            let target = object.style_target(doc);
            common::write_decorations(doc, node, target, &ctx.config.shadow_css);
            Ok(true)
        }
        ObjectProperty::Radius(radius) => {
            if !(radius.is_finite() && *radius >= 0.0) {
                return Err(EditorError::invalid_argument(
                    "objects.radius",
                    "radius must be a non-negative pixel value",
                ));
            }
            doc.set_attr(node, "data-radius", &common::number(*radius));
            let target = object.style_target(doc);
            common::write_decorations(doc, node, target, &ctx.config.shadow_css);
            Ok(true)
        }
        ObjectProperty::Margins(update) => {
            let current = common::margins(doc, node, ctx.config.default_margins);
            let merged = common::merge_margins(current, update)?;
            common::write_margins(doc, node, &merged);
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Switches placement class; floating objects start centered in the
/// viewport at the base z-index.
pub(crate) fn set_layout(
    object: &dyn SelectableObject,
    doc: &mut Document,
    mode: LayoutMode,
    ctx: &ObjectContext<'_>,
) {
    let node = object.node();
    let was_floating = common::is_floating(doc, node);
    match mode {
        LayoutMode::Floating if was_floating => {}
        LayoutMode::Floating => {
            let size = object.size(doc, ctx);
            let origin = ctx.viewport.centered_origin(size);
            common::enter_floating(doc, node, origin, ctx.config.base_z_index);
        }
        other => {
            if was_floating {
                common::leave_floating(doc, node);
            }
            common::set_layout_class(doc, node, other);
        }
    }
}

/// Stacking order change; a non-floating object is promoted first.
pub(crate) fn shift_z(
    object: &dyn SelectableObject,
    doc: &mut Document,
    step: i32,
    ctx: &ObjectContext<'_>,
) -> i32 {
    let node = object.node();
    if !common::is_floating(doc, node) {
        set_layout(object, doc, LayoutMode::Floating, ctx);
    }
    let current = common::z_index(doc, node).unwrap_or(ctx.config.base_z_index);
    let next = (current + step).max(ctx.config.z_floor);
    common::set_z_index(doc, node, next);
    next
}

/// Concrete object behind a wrapper element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnyObject {
    Image(ImageObject),
    TextBox(TextBoxObject),
    Table(TableObject),
}

impl AnyObject {
    /// Object whose wrapper is `node`, from its `data-role`.
    pub fn from_node(doc: &Document, node: NodeId) -> Option<Self> {
        let kind = doc.attr(node, "data-role").and_then(ObjectKind::from_role)?;
        Some(match kind {
            ObjectKind::Image => Self::Image(ImageObject::new(node)),
            ObjectKind::TextBox => Self::TextBox(TextBoxObject::new(node)),
            ObjectKind::Table => Self::Table(TableObject::new(node)),
        })
    }

    pub fn as_selectable(&self) -> &dyn SelectableObject {
        match self {
            Self::Image(image) => image,
            Self::TextBox(text_box) => text_box,
            Self::Table(table) => table,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ColorEffect;
    use super::ObjectProperty;
    use crate::common::LayoutMode;
    use lm_core::ErrorKind;

    #[test]
    fn properties_parse_from_host_strings() {
        assert_eq!(
            ObjectProperty::parse("alignment", "center").unwrap_or_else(|_| unreachable!()),
            ObjectProperty::Layout(LayoutMode::CenterAlign)
        );
        assert_eq!(
            ObjectProperty::parse("radius", "8px").unwrap_or_else(|_| unreachable!()),
            ObjectProperty::Radius(8.0)
        );
        let Ok(ObjectProperty::Margins(margins)) = ObjectProperty::parse("margins", "1 2 3 4") else {
            unreachable!();
        };
        assert_eq!((margins.top, margins.left), (Some(1.0), Some(4.0)));
        assert!(ObjectProperty::parse("margins", "1 2")
            .is_err_and(|error| error.kind == ErrorKind::InvalidArgument));
        assert!(ObjectProperty::parse("sparkle", "yes").is_err());
    }

    #[test]
    fn effects_map_to_filters() {
        assert_eq!(ColorEffect::from_name("sepia"), Some(ColorEffect::Sepia));
        assert_eq!(ColorEffect::Blur.filter(), Some("blur(2px)"));
        assert_eq!(ColorEffect::None.filter(), None);
        assert_eq!(ColorEffect::from_name("brighten"), Some(ColorEffect::Brightness));
        assert_eq!(ColorEffect::Brightness.as_str(), "brightness");
        assert_eq!(
            serde_json::to_value(ColorEffect::Brightness).unwrap_or_default(),
            "brightness"
        );
    }
}
