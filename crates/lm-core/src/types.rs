//! Value types exchanged between the engine crates and the host.

use serde::Deserialize;
use serde::Serialize;

/// Block-level paragraph style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStyle {
    #[default]
    Normal,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl BlockStyle {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Normal => "p",
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::H4 => "h4",
            Self::H5 => "h5",
            Self::H6 => "h6",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            other => other.tag(),
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "h1" => Self::H1,
            "h2" => Self::H2,
            "h3" => Self::H3,
            "h4" => Self::H4,
            "h5" => Self::H5,
            "h6" => Self::H6,
            _ => Self::Normal,
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" | "p" | "paragraph" => Some(Self::Normal),
            "h1" => Some(Self::H1),
            "h2" => Some(Self::H2),
            "h3" => Some(Self::H3),
            "h4" => Some(Self::H4),
            "h5" => Some(Self::H5),
            "h6" => Some(Self::H6),
            _ => None,
        }
    }
}

/// Toggleable inline styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Subscript,
    Superscript,
}

impl InlineStyle {
    /// Element emitted when the style is applied.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Bold => "b",
            Self::Italic => "i",
            Self::Underline => "u",
            Self::Strikethrough => "s",
            Self::Subscript => "sub",
            Self::Superscript => "sup",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Strikethrough => "strikethrough",
            Self::Subscript => "subscript",
            Self::Superscript => "superscript",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bold" => Some(Self::Bold),
            "italic" => Some(Self::Italic),
            "underline" => Some(Self::Underline),
            "strike" | "strikethrough" => Some(Self::Strikethrough),
            "sub" | "subscript" => Some(Self::Subscript),
            "sup" | "superscript" => Some(Self::Superscript),
            _ => None,
        }
    }

    /// The style that cannot be active together with this one.
    pub fn exclusive_partner(self) -> Option<Self> {
        match self {
            Self::Subscript => Some(Self::Superscript),
            Self::Superscript => Some(Self::Subscript),
            _ => None,
        }
    }
}

/// List kind requested by the list toggle commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Unordered => "ul",
            Self::Ordered => "ol",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ul" => Some(Self::Unordered),
            "ol" => Some(Self::Ordered),
            _ => None,
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unordered" | "ul" | "bullet" => Some(Self::Unordered),
            "ordered" | "ol" | "numbered" => Some(Self::Ordered),
            _ => None,
        }
    }
}

/// List state reported in the formatting snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListState {
    #[default]
    None,
    Unordered,
    Ordered,
}

impl From<Option<ListKind>> for ListState {
    fn from(kind: Option<ListKind>) -> Self {
        match kind {
            None => Self::None,
            Some(ListKind::Unordered) => Self::Unordered,
            Some(ListKind::Ordered) => Self::Ordered,
        }
    }
}

/// Block alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
        }
    }

    /// Parses `text-align` values and legacy `align` attributes.
    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Self::Left),
            "center" | "middle" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            "justify" => Some(Self::Justify),
            _ => None,
        }
    }
}

/// Formatting state derived from the start of the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattingSnapshot {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub subscript: bool,
    pub superscript: bool,
    pub block_style: BlockStyle,
    pub font_family: String,
    pub font_size: u32,
    pub list_state: ListState,
    pub alignment: Alignment,
}

impl Default for FormattingSnapshot {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            underline: false,
            strikethrough: false,
            subscript: false,
            superscript: false,
            block_style: BlockStyle::Normal,
            font_family: String::new(),
            font_size: 12,
            list_state: ListState::None,
            alignment: Alignment::Left,
        }
    }
}

/// Kinds of embedded objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Image,
    TextBox,
    Table,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::TextBox => "textbox",
            Self::Table => "table",
        }
    }

    /// Role marker stored in `data-role` on the wrapper element.
    pub fn role(self) -> &'static str {
        match self {
            Self::Image => "image-wrapper",
            Self::TextBox => "text-box",
            Self::Table => "table",
        }
    }

    pub fn from_role(role: &str) -> Option<Self> {
        match role {
            "image-wrapper" => Some(Self::Image),
            "text-box" => Some(Self::TextBox),
            "table" => Some(Self::Table),
            _ => None,
        }
    }
}

/// Rendering color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

/// Which color the set-color command changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorTarget {
    Text,
    Background,
}

impl ColorTarget {
    pub fn css_property(self) -> &'static str {
        match self {
            Self::Text => "color",
            Self::Background => "background-color",
        }
    }
}

/// Change-case variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseMode {
    Upper,
    Lower,
    Title,
    Sentence,
    Toggle,
}

impl CaseMode {
    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "upper" | "uppercase" => Some(Self::Upper),
            "lower" | "lowercase" => Some(Self::Lower),
            "title" | "titlecase" => Some(Self::Title),
            "sentence" | "sentencecase" => Some(Self::Sentence),
            "toggle" | "togglecase" => Some(Self::Toggle),
            _ => None,
        }
    }
}

/// Which blocks a spacing command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpacingScope {
    Current,
    All,
}

/// Keyboard modifier state attached to gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
    };
}

/// Keys the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Char(char),
}

#[cfg(test)]
mod tests {
    use super::Alignment;
    use super::BlockStyle;
    use super::FormattingSnapshot;
    use super::InlineStyle;
    use super::ObjectKind;

    #[test]
    fn block_style_names_round_trip_through_tags() {
        for style in [BlockStyle::Normal, BlockStyle::H1, BlockStyle::H6] {
            assert_eq!(BlockStyle::from_tag(style.tag()), style);
            assert_eq!(BlockStyle::from_name(style.as_str()), Some(style));
        }
        assert_eq!(BlockStyle::from_tag("div"), BlockStyle::Normal);
    }

    #[test]
    fn sub_and_superscript_are_exclusive_partners() {
        assert_eq!(
            InlineStyle::Subscript.exclusive_partner(),
            Some(InlineStyle::Superscript)
        );
        assert_eq!(InlineStyle::Bold.exclusive_partner(), None);
    }

    #[test]
    fn alignment_accepts_logical_keywords() {
        assert_eq!(Alignment::from_css("start"), Some(Alignment::Left));
        assert_eq!(Alignment::from_css(" END "), Some(Alignment::Right));
        assert_eq!(Alignment::from_css("middle"), Some(Alignment::Center));
        assert_eq!(Alignment::from_css("diagonal"), None);
    }

    #[test]
    fn default_snapshot_is_plain_twelve_point_text() {
        let snapshot = FormattingSnapshot::default();
        assert!(!snapshot.bold && !snapshot.subscript);
        assert_eq!(snapshot.font_size, 12);
        assert_eq!(snapshot.block_style, BlockStyle::Normal);
    }

    #[test]
    fn object_roles_map_back_to_kinds() {
        for kind in [ObjectKind::Image, ObjectKind::TextBox, ObjectKind::Table] {
            assert_eq!(ObjectKind::from_role(kind.role()), Some(kind));
        }
    }
}
