//! Text boxes: a non-editable `div.text-box` holding editable content.

use crate::common;
use crate::common::BorderInfo;
use crate::common::LayoutMode;
use crate::config::Margins;
use crate::config::ObjectConfig;
use crate::object::ObjectContext;
use crate::object::ObjectProperty;
use crate::object::SelectableObject;
use crate::object::apply_shared;
use crate::object::unsupported;
use lm_core::EditorResult;
use lm_core::Modifiers;
use lm_core::ObjectKind;
use lm_core::Theme;
use lm_css::BorderStyle;
use lm_css::BorderValue;
use lm_css::CssColor;
use lm_css::format_px;
use lm_css::parse_px;
use lm_dom::Document;
use lm_dom::NodeId;
use lm_dom::Position;
use lm_layout::Point;
use lm_layout::Size;
use serde::Serialize;

pub const TEXT_BOX_CLASS: &str = "text-box";
pub const TEXT_BOX_CONTENT_CLASS: &str = "text-box-content";

fn theme_border_color(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "#999999",
        Theme::Dark => "#777777",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBoxObject {
    node: NodeId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextBoxProperties {
    width: f32,
    height: f32,
    text: String,
    layout: LayoutMode,
    floating: bool,
    z_index: Option<i32>,
    border: BorderInfo,
    shadow: bool,
    radius: f32,
    background_color: Option<String>,
    margins: Margins,
}

impl TextBoxObject {
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }

    /// Element whose children are the editable content.
    pub fn content(&self, doc: &Document) -> NodeId {
        doc.children(self.node)
            .iter()
            .copied()
            .find(|child| doc.has_class(*child, TEXT_BOX_CONTENT_CLASS))
            .unwrap_or(self.node)
    }

    /// Makes the content editable and returns a detached copy of it.
    pub(crate) fn begin_edit(&self, doc: &mut Document) -> Option<NodeId> {
        let content = self.content(doc);
        let saved = doc.deep_clone(content)?;
        let root = doc.root();
        doc.set_attr(root, "contenteditable", "false");
        doc.set_attr(self.node, "contenteditable", "true");
        let caret = match doc.last_text_node(content) {
            Some(text) => Position::new(text, doc.node_length(text)),
            None => Position::new(content, doc.child_count(content)),
        };
        doc.set_caret(caret);
        Some(saved)
    }

    pub(crate) fn end_edit(&self, doc: &mut Document) {
        let root = doc.root();
        doc.set_attr(root, "contenteditable", "true");
        doc.set_attr(self.node, "contenteditable", "false");
    }

    /// Puts the content saved by [`Self::begin_edit`] back.
    pub(crate) fn restore(&self, doc: &mut Document, saved: NodeId) {
        let content = self.content(doc);
        doc.clear_children(content);
        doc.move_children(saved, content);
        doc.remove(saved);
        if doc.child_count(content) == 0 {
            let filler = doc.create_element("br");
            doc.append_child(content, filler);
        }
    }

    fn write_border(&self, doc: &mut Document, theme: Theme) {
        let mut border = common::stored_border(doc, self.node, &BorderValue::none());
        if border.color.is_none() {
            border.color = CssColor::parse(theme_border_color(theme));
        }
        doc.set_style_property(self.node, "border", &border.to_css());
    }

    fn write_background(&self, doc: &mut Document) {
        match common::background(doc, self.node) {
            Some(color) => doc.set_style_property(self.node, "background-color", color.as_css()),
            None => {
                let _ = doc.remove_style_property(self.node, "background-color");
            }
        }
    }
}

/// Builds a detached text box holding `text`.
pub(crate) fn create_text_box(doc: &mut Document, text: &str, config: &ObjectConfig, theme: Theme) -> NodeId {
    let wrapper = doc.create_element_with_attrs(
        "div",
        &[
            ("class", TEXT_BOX_CLASS),
            ("data-role", ObjectKind::TextBox.role()),
            ("contenteditable", "false"),
        ],
    );
    common::set_layout_class(doc, wrapper, LayoutMode::LeftAlign);
    common::write_margins(doc, wrapper, &config.default_margins);
    let size = config.default_text_box_size;
    doc.set_style_property(wrapper, "width", &format_px(size.width));
    doc.set_style_property(wrapper, "height", &format_px(size.height));
    doc.set_style_property(wrapper, "padding", &format_px(config.cell_padding_px));
    doc.set_style_property(wrapper, "overflow", "hidden");
    common::write_border_data(
        doc,
        wrapper,
        &BorderValue {
            width_px: 1,
            style: BorderStyle::Solid,
            color: None,
        },
    );

    let content = doc.create_element_with_attrs("div", &[("class", TEXT_BOX_CONTENT_CLASS)]);
    if text.is_empty() {
        let filler = doc.create_element("br");
        doc.append_child(content, filler);
    } else {
        let node = doc.create_text(text);
        doc.append_child(content, node);
    }
    doc.append_child(wrapper, content);
    TextBoxObject::new(wrapper).write_border(doc, theme);
    wrapper
}

impl SelectableObject for TextBoxObject {
    fn node(&self) -> NodeId {
        self.node
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::TextBox
    }

    fn activate(&self, doc: &mut Document, _ctx: &ObjectContext<'_>) {
        doc.add_class(self.node, TEXT_BOX_CLASS);
        if doc.attr(self.node, "contenteditable") != Some("true") {
            doc.set_attr(self.node, "contenteditable", "false");
        }
    }

    fn size(&self, doc: &Document, ctx: &ObjectContext<'_>) -> Size {
        let read = |name: &str| doc.style_property(self.node, name).and_then(|value| parse_px(&value));
        let fallback = ctx.config.default_text_box_size;
        Size::new(
            read("width").unwrap_or(fallback.width),
            read("height").unwrap_or(fallback.height),
        )
    }

    fn resize(
        &self,
        doc: &mut Document,
        start: Size,
        delta: Point,
        _modifiers: Modifiers,
        ctx: &ObjectContext<'_>,
    ) -> Size {
        let min = ctx.config.min_size_px;
        let size = Size::new(
            (start.width + delta.x).max(min),
            (start.height + delta.y).max(min),
        );
        doc.set_style_property(self.node, "width", &format_px(size.width));
        doc.set_style_property(self.node, "height", &format_px(size.height));
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
                self.write_border(doc, ctx.theme);
                Ok(())
            }
            ObjectProperty::Background(value) => {
                let color = common::parse_color(value)?;
                doc.set_attr(self.node, "data-bg-color", color.as_css());
                self.write_background(doc);
                Ok(())
            }
            other => Err(unsupported(self.kind(), other)),
        }
    }

    fn reassert(&self, doc: &mut Document, ctx: &ObjectContext<'_>) {
        self.write_border(doc, ctx.theme);
        self.write_background(doc);
        common::write_decorations(doc, self.node, self.node, &ctx.config.shadow_css);
    }

    fn properties(&self, doc: &Document, ctx: &ObjectContext<'_>) -> serde_json::Value {
        let size = self.size(doc, ctx);
        let properties = TextBoxProperties {
            width: size.width,
            height: size.height,
            text: doc.text_content(self.content(doc)),
            layout: LayoutMode::of(doc, self.node),
            floating: common::is_floating(doc, self.node),
            z_index: common::z_index(doc, self.node),
            border: BorderInfo::from(&common::stored_border(doc, self.node, &BorderValue::none())),
            shadow: common::has_shadow(doc, self.node),
            radius: common::radius(doc, self.node),
            background_color: common::background(doc, self.node).map(|color| color.as_css().to_owned()),
            margins: common::margins(doc, self.node, ctx.config.default_margins),
        };
        serde_json::to_value(properties).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::TextBoxObject;
    use super::create_text_box;
    use crate::config::ObjectConfig;
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

    fn inserted(doc: &mut Document, text: &str) -> TextBoxObject {
        let wrapper = create_text_box(doc, text, &ObjectConfig::default(), Theme::Light);
        let root = doc.root();
        doc.clear_children(root);
        doc.append_child(root, wrapper);
        TextBoxObject::new(wrapper)
    }

    #[test]
    fn new_box_has_default_size_and_border() {
        let mut doc = Document::new();
        let text_box = inserted(&mut doc, "hello");
        let node = text_box.node();
        assert_eq!(doc.style_property(node, "width").as_deref(), Some("200px"));
        assert_eq!(doc.style_property(node, "border").as_deref(), Some("1px solid #999999"));
        assert_eq!(doc.text_content(text_box.content(&doc)), "hello");
    }

    #[test]
    fn cancel_restores_saved_content() {
        let mut doc = Document::new();
        let text_box = inserted(&mut doc, "before");
        let Some(saved) = text_box.begin_edit(&mut doc) else {
            unreachable!();
        };
        assert_eq!(doc.attr(doc.root(), "contenteditable"), Some("false"));
        assert_eq!(doc.attr(text_box.node(), "contenteditable"), Some("true"));

        let content = text_box.content(&doc);
        let Some(text) = doc.last_text_node(content) else {
            unreachable!();
        };
        doc.set_text(text, "after");
        text_box.restore(&mut doc, saved);
        text_box.end_edit(&mut doc);
        assert_eq!(doc.text_content(content), "before");
        assert_eq!(doc.attr(doc.root(), "contenteditable"), Some("true"));
        assert_eq!(doc.attr(text_box.node(), "contenteditable"), Some("false"));
    }

    #[test]
    fn transparent_background_round_trips() {
        let mut doc = Document::new();
        let config = ObjectConfig::default();
        let layout = LayoutTree::default();
        let ctx = ObjectContext {
            config: &config,
            layout: &layout,
            viewport: Viewport::default(),
            theme: Theme::Dark,
        };
        let text_box = inserted(&mut doc, "x");
        let background = ObjectProperty::Background("transparent".to_owned());
        assert!(text_box.apply_property(&mut doc, &background, &ctx).is_ok());
        assert_eq!(text_box.properties(&doc, &ctx)["backgroundColor"], "transparent");

        text_box.reassert(&mut doc, &ctx);
        assert_eq!(
            doc.style_property(text_box.node(), "border").as_deref(),
            Some("1px solid #777777")
        );

        let size = text_box.resize(&mut doc, Size::new(200.0, 100.0), Point::new(-500.0, 40.0), Modifiers::NONE, &ctx);
        assert_eq!(size, Size::new(20.0, 140.0));
    }
}
