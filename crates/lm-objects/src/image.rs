//! Images: an `img` inside a non-editable `span.image-wrapper`.
//!
//! The wrapper owns placement and the stored `data-*` state; the image
//! itself carries its display size and the visual CSS.

use crate::common;
use crate::common::BorderInfo;
use crate::common::LayoutMode;
use crate::config::Margins;
use crate::config::ObjectConfig;
use crate::object::ColorEffect;
use crate::object::ObjectContext;
use crate::object::ObjectProperty;
use crate::object::SelectableObject;
use crate::object::apply_shared;
use crate::object::unsupported;
use lm_core::EditorError;
use lm_core::EditorResult;
use lm_core::Modifiers;
use lm_core::ObjectKind;
use lm_css::BorderValue;
use lm_css::format_px;
use lm_css::parse_px;
use lm_dom::Document;
use lm_dom::NodeId;
use lm_layout::Point;
use lm_layout::Size;
use serde::Deserialize;
use serde::Serialize;

pub const IMAGE_WRAPPER_CLASS: &str = "image-wrapper";

/// Arguments of an image insertion.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    pub source: String,
    #[serde(default)]
    pub alt: String,
    pub width: Option<f32>,
    pub height: Option<f32>,
    /// Decoded pixel size, when the host probed it.
    pub intrinsic: Option<Size>,
    #[serde(default)]
    pub floating: bool,
}

impl ImageSpec {
    pub fn validate(&self) -> EditorResult<()> {
        if self.source.trim().is_empty() {
            return Err(EditorError::invalid_argument(
                "objects.image.source",
                "image source must not be empty",
            ));
        }
        let sizes = [self.width, self.height]
            .into_iter()
            .flatten()
            .chain(self.intrinsic.into_iter().flat_map(|size| [size.width, size.height]));
        for value in sizes {
            if !(value.is_finite() && value > 0.0) {
                return Err(EditorError::invalid_argument(
                    "objects.image.size",
                    format!("image dimension {value} must be positive"),
                ));
            }
        }
        Ok(())
    }

    fn original_size(&self, fallback: Size) -> Size {
        match (self.intrinsic, self.width, self.height) {
            (Some(size), _, _) => size,
            (None, Some(width), Some(height)) => Size::new(width, height),
            _ => fallback,
        }
    }

    fn display_size(&self, original: Size) -> Size {
        match (self.width, self.height) {
            (Some(width), Some(height)) => Size::new(width, height),
            (Some(width), None) => Size::new(width, width * original.height / original.width),
            (None, Some(height)) => Size::new(height * original.width / original.height, height),
            (None, None) => original,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageObject {
    node: NodeId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageProperties {
    src: String,
    alt: String,
    width: f32,
    height: f32,
    original_width: f32,
    original_height: f32,
    layout: LayoutMode,
    floating: bool,
    z_index: Option<i32>,
    border: BorderInfo,
    shadow: bool,
    radius: f32,
    effect: ColorEffect,
    margins: Margins,
}

impl ImageObject {
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }

    pub fn image(&self, doc: &Document) -> Option<NodeId> {
        doc.descendants(self.node)
            .into_iter()
            .find(|id| doc.is_element(*id, "img"))
    }

    /// Size recorded when the image was first seen.
    pub fn original_size(&self, doc: &Document, fallback: Size) -> Size {
        let Some(img) = self.image(doc) else {
            return fallback;
        };
        let width = common::data_number(doc, img, "data-original-width");
        let height = common::data_number(doc, img, "data-original-height");
        match (width, height) {
            (Some(width), Some(height)) if width > 0.0 && height > 0.0 => Size::new(width, height),
            _ => display_size(doc, img).unwrap_or(fallback),
        }
    }

    /// Restores the recorded original dimensions.
    pub fn reset_size(&self, doc: &mut Document, config: &ObjectConfig) -> Size {
        let original = self.original_size(doc, config.default_image_size);
        if let Some(img) = self.image(doc) {
            set_display_size(doc, img, original);
        }
        original
    }

    pub fn effect(&self, doc: &Document) -> ColorEffect {
        doc.attr(self.node, "data-effect")
            .and_then(ColorEffect::from_name)
            .unwrap_or_default()
    }

    pub fn set_effect(&self, doc: &mut Document, effect: ColorEffect) {
        if effect == ColorEffect::None {
            let _ = doc.remove_attr(self.node, "data-effect");
        } else {
            doc.set_attr(self.node, "data-effect", effect.as_str());
        }
        self.write_filter(doc);
    }

    fn write_filter(&self, doc: &mut Document) {
        let Some(img) = self.image(doc) else {
            return;
        };
        match self.effect(doc).filter() {
            Some(filter) => doc.set_style_property(img, "filter", filter),
            None => {
                let _ = doc.remove_style_property(img, "filter");
            }
        }
    }

    fn write_border(&self, doc: &mut Document) {
        let Some(img) = self.image(doc) else {
            return;
        };
        let border = common::stored_border(doc, self.node, &BorderValue::none());
        if border.is_visible() {
            doc.set_style_property(img, "border", &border.to_css());
        } else {
            let _ = doc.remove_style_property(img, "border");
        }
    }
}

fn display_size(doc: &Document, img: NodeId) -> Option<Size> {
    let read = |name: &str| {
        doc.style_property(img, name)
            .and_then(|value| parse_px(&value))
            .or_else(|| doc.attr(img, name).and_then(parse_px))
    };
    Some(Size::new(read("width")?, read("height")?))
}

fn set_display_size(doc: &mut Document, img: NodeId, size: Size) {
    doc.set_style_property(img, "width", &format_px(size.width));
    doc.set_style_property(img, "height", &format_px(size.height));
}

/// Originals are written once and never overwritten.
fn record_originals(doc: &mut Document, img: NodeId, size: Size) {
    if !doc.has_attr(img, "data-original-width") {
        doc.set_attr(img, "data-original-width", &common::number(size.width));
    }
    if !doc.has_attr(img, "data-original-height") {
        doc.set_attr(img, "data-original-height", &common::number(size.height));
    }
}

fn new_wrapper(doc: &mut Document, config: &ObjectConfig) -> NodeId {
    let wrapper = doc.create_element_with_attrs(
        "span",
        &[
            ("class", IMAGE_WRAPPER_CLASS),
            ("data-role", ObjectKind::Image.role()),
            ("contenteditable", "false"),
        ],
    );
    common::set_layout_class(doc, wrapper, LayoutMode::LeftAlign);
    common::write_margins(doc, wrapper, &config.default_margins);
    wrapper
}

/// Builds a detached wrapper and image for `spec`.
pub(crate) fn create_image(doc: &mut Document, spec: &ImageSpec, config: &ObjectConfig) -> NodeId {
    let wrapper = new_wrapper(doc, config);
    let img = doc.create_element_with_attrs("img", &[("src", spec.source.as_str()), ("alt", spec.alt.as_str())]);
    let original = spec.original_size(config.default_image_size);
    record_originals(doc, img, original);
    set_display_size(doc, img, spec.display_size(original));
    doc.append_child(wrapper, img);
    wrapper
}

/// Gives a bare `img` found in loaded markup its wrapper.
pub(crate) fn wrap_bare_image(doc: &mut Document, img: NodeId, config: &ObjectConfig) -> NodeId {
    let wrapper = new_wrapper(doc, config);
    doc.wrap(img, wrapper);
    wrapper
}

impl SelectableObject for ImageObject {
    fn node(&self) -> NodeId {
        self.node
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Image
    }

    fn style_target(&self, doc: &Document) -> NodeId {
        self.image(doc).unwrap_or(self.node)
    }

    fn activate(&self, doc: &mut Document, ctx: &ObjectContext<'_>) {
        doc.set_attr(self.node, "contenteditable", "false");
        doc.add_class(self.node, IMAGE_WRAPPER_CLASS);
        let Some(img) = self.image(doc) else {
            return;
        };
        let current = display_size(doc, img).unwrap_or(ctx.config.default_image_size);
        record_originals(doc, img, current);
        if display_size(doc, img).is_none() {
            let original = self.original_size(doc, current);
            set_display_size(doc, img, original);
        }
    }

    fn size(&self, doc: &Document, ctx: &ObjectContext<'_>) -> Size {
        self.image(doc)
            .and_then(|img| display_size(doc, img))
            .unwrap_or(ctx.config.default_image_size)
    }

    /// Aspect ratio follows the original dimensions unless Shift is held.
    fn resize(
        &self,
        doc: &mut Document,
        start: Size,
        delta: Point,
        modifiers: Modifiers,
        ctx: &ObjectContext<'_>,
    ) -> Size {
        let min = ctx.config.min_size_px;
        let original = self.original_size(doc, start);
        let has_ratio = [original.width, original.height]
            .iter()
            .all(|side| side.is_finite() && *side > 0.0);
        let size = if modifiers.shift || !has_ratio {
            Size::new(
                (start.width + delta.x).max(min),
                (start.height + delta.y).max(min),
            )
        } else {
            let mut width = (start.width + delta.x).max(min);
            let mut height = width * original.height / original.width;
            if height < min {
                height = min;
                width = height * original.width / original.height;
            }
            Size::new(width, height)
        };
        if let Some(img) = self.image(doc) {
            set_display_size(doc, img, size);
        }
        size
    }

    fn apply_property(
        &self,
        doc: &mut Document,
        property: &ObjectProperty,
        ctx: &ObjectContext<'_>,
    ) -> EditorResult<()> {
        if apply_shared(self, doc, property, ctx)? {
            return Ok(());
        }
        match property {
            ObjectProperty::Border(update) => {
                let current = common::stored_border(doc, self.node, &BorderValue::none());
                let merged = common::merge_border(&current, update)?;
                common::write_border_data(doc, self.node, &merged);
                self.write_border(doc);
                Ok(())
            }
            ObjectProperty::ColorEffect(effect) => {
                self.set_effect(doc, *effect);
                Ok(())
            }
            other => Err(unsupported(self.kind(), other)),
        }
    }

    fn reassert(&self, doc: &mut Document, ctx: &ObjectContext<'_>) {
        self.write_border(doc);
        self.write_filter(doc);
        let target = self.style_target(doc);
        common::write_decorations(doc, self.node, target, &ctx.config.shadow_css);
    }

    fn properties(&self, doc: &Document, ctx: &ObjectContext<'_>) -> serde_json::Value {
        let img = self.image(doc);
        let attr = |name: &str| {
            img.and_then(|img| doc.attr(img, name))
                .unwrap_or_default()
                .to_owned()
        };
        let size = self.size(doc, ctx);
        let original = self.original_size(doc, size);
        let properties = ImageProperties {
            src: attr("src"),
            alt: attr("alt"),
            width: size.width,
            height: size.height,
            original_width: original.width,
            original_height: original.height,
            layout: LayoutMode::of(doc, self.node),
            floating: common::is_floating(doc, self.node),
            z_index: common::z_index(doc, self.node),
            border: BorderInfo::from(&common::stored_border(doc, self.node, &BorderValue::none())),
            shadow: common::has_shadow(doc, self.node),
            radius: common::radius(doc, self.node),
            effect: self.effect(doc),
            margins: common::margins(doc, self.node, ctx.config.default_margins),
        };
        serde_json::to_value(properties).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::ImageObject;
    use super::ImageSpec;
    use super::create_image;
    use super::wrap_bare_image;
    use crate::common::BorderUpdate;
    use crate::config::ObjectConfig;
    use crate::object::ColorEffect;
    use crate::object::ObjectContext;
    use crate::object::ObjectProperty;
    use crate::object::SelectableObject;
    use lm_core::Modifiers;
    use lm_core::Theme;
    use lm_dom::Document;
    use lm_layout::LayoutTree;
    use lm_layout::Point;
    use lm_layout::Size;
    use lm_layout::Viewport;

    fn context<'a>(config: &'a ObjectConfig, layout: &'a LayoutTree) -> ObjectContext<'a> {
        ObjectContext {
            config,
            layout,
            viewport: Viewport::default(),
            theme: Theme::Light,
        }
    }

    fn inserted(doc: &mut Document, spec: &ImageSpec) -> ImageObject {
        let wrapper = create_image(doc, spec, &ObjectConfig::default());
        let root = doc.root();
        doc.append_child(root, wrapper);
        ImageObject::new(wrapper)
    }

    #[test]
    fn insertion_records_originals_and_display_size() {
        let mut doc = Document::new();
        let spec = ImageSpec {
            source: "cat.png".to_owned(),
            width: Some(100.0),
            intrinsic: Some(Size::new(400.0, 300.0)),
            ..ImageSpec::default()
        };
        let image = inserted(&mut doc, &spec);
        let Some(img) = image.image(&doc) else {
            unreachable!();
        };
        assert_eq!(doc.attr(img, "data-original-width"), Some("400"));
        assert_eq!(doc.style_property(img, "height").as_deref(), Some("75px"));
        assert_eq!(doc.attr(image.node(), "data-role"), Some("image-wrapper"));
        assert_eq!(doc.attr(image.node(), "contenteditable"), Some("false"));
    }

    #[test]
    fn resize_keeps_aspect_unless_shift() {
        let mut doc = Document::new();
        let config = ObjectConfig::default();
        let layout = LayoutTree::default();
        let ctx = context(&config, &layout);
        let spec = ImageSpec {
            source: "a.png".to_owned(),
            intrinsic: Some(Size::new(400.0, 300.0)),
            ..ImageSpec::default()
        };
        let image = inserted(&mut doc, &spec);
        let start = Size::new(400.0, 300.0);

        let locked = image.resize(&mut doc, start, Point::new(-200.0, 0.0), Modifiers::NONE, &ctx);
        assert_eq!(locked, Size::new(200.0, 150.0));

        let free = image.resize(&mut doc, start, Point::new(-200.0, 10.0), Modifiers::SHIFT, &ctx);
        assert_eq!(free, Size::new(200.0, 310.0));

        let tiny = image.resize(&mut doc, start, Point::new(-1000.0, 0.0), Modifiers::NONE, &ctx);
        assert!(tiny.width >= 20.0 && tiny.height >= 20.0);

        assert_eq!(image.reset_size(&mut doc, &config), Size::new(400.0, 300.0));
        assert_eq!(image.size(&doc, &ctx), Size::new(400.0, 300.0));
    }

    #[test]
    fn zero_sized_original_resizes_freely() {
        let mut doc = Document::new();
        let config = ObjectConfig::default();
        let layout = LayoutTree::default();
        let ctx = context(&config, &layout);
        let spec = ImageSpec {
            source: "a.png".to_owned(),
            ..ImageSpec::default()
        };
        let image = inserted(&mut doc, &spec);
        let Some(img) = image.image(&doc) else {
            unreachable!();
        };
        doc.set_attr(img, "data-original-width", "0");
        doc.set_attr(img, "data-original-height", "0");
        doc.set_style_property(img, "width", "0px");
        doc.set_style_property(img, "height", "0px");

        let size = image.resize(&mut doc, Size::new(0.0, 0.0), Point::new(50.0, 5.0), Modifiers::NONE, &ctx);
        assert_eq!(size, Size::new(50.0, 20.0));
        assert_eq!(doc.style_property(img, "width").as_deref(), Some("50px"));
    }

    #[test]
    fn bare_image_gets_wrapped_and_originals_once() {
        let mut doc = Document::new();
        let config = ObjectConfig::default();
        let layout = LayoutTree::default();
        let ctx = context(&config, &layout);
        let root = doc.root();
        let paragraph = doc.create_element("p");
        let img = doc.create_element_with_attrs("img", &[("src", "x.png"), ("width", "64"), ("height", "32")]);
        doc.append_child(paragraph, img);
        doc.append_child(root, paragraph);

        let wrapper = wrap_bare_image(&mut doc, img, &config);
        let image = ImageObject::new(wrapper);
        image.activate(&mut doc, &ctx);
        assert_eq!(doc.parent(img), Some(wrapper));
        assert_eq!(doc.attr(img, "data-original-width"), Some("64"));

        image.resize(&mut doc, Size::new(64.0, 32.0), Point::new(64.0, 0.0), Modifiers::NONE, &ctx);
        image.activate(&mut doc, &ctx);
        assert_eq!(doc.attr(img, "data-original-width"), Some("64"));
        assert_eq!(doc.style_property(img, "width").as_deref(), Some("128px"));
    }

    #[test]
    fn visual_properties_land_on_the_image() {
        let mut doc = Document::new();
        let config = ObjectConfig::default();
        let layout = LayoutTree::default();
        let ctx = context(&config, &layout);
        let image = inserted(&mut doc, &ImageSpec {
            source: "a.png".to_owned(),
            ..ImageSpec::default()
        });
        let Some(img) = image.image(&doc) else {
            unreachable!();
        };

        let border = ObjectProperty::Border(BorderUpdate::parse("2px dashed #ff0000"));
        assert!(image.apply_property(&mut doc, &border, &ctx).is_ok());
        assert!(image.apply_property(&mut doc, &ObjectProperty::Radius(8.0), &ctx).is_ok());
        assert!(image
            .apply_property(&mut doc, &ObjectProperty::ColorEffect(ColorEffect::Grayscale), &ctx)
            .is_ok());
        assert_eq!(doc.style_property(img, "border").as_deref(), Some("2px dashed #ff0000"));
        assert_eq!(doc.style_property(img, "border-radius").as_deref(), Some("8px"));
        assert_eq!(doc.style_property(img, "filter").as_deref(), Some("grayscale(100%)"));
        assert_eq!(doc.attr(image.node(), "data-effect"), Some("grayscale"));

        let properties = image.properties(&doc, &ctx);
        assert_eq!(properties["effect"], "grayscale");
        assert_eq!(properties["border"]["style"], "dashed");
        assert!(image
            .apply_property(&mut doc, &ObjectProperty::Background("red".to_owned()), &ctx)
            .is_err());
    }
}
