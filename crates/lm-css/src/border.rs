//! Border shorthand values.

use crate::CssColor;
use crate::declarations::split_top_level;
use crate::length::format_px;
use crate::length::parse_px;

/// CSS `border-style` keywords the editor offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BorderStyle {
    None,
    Solid,
    Dashed,
    Dotted,
    Double,
    Groove,
    Ridge,
    Inset,
    Outset,
}

impl BorderStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Solid => "solid",
            Self::Dashed => "dashed",
            Self::Dotted => "dotted",
            Self::Double => "double",
            Self::Groove => "groove",
            Self::Ridge => "ridge",
            Self::Inset => "inset",
            Self::Outset => "outset",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "hidden" => Some(Self::None),
            "solid" => Some(Self::Solid),
            "dashed" => Some(Self::Dashed),
            "dotted" => Some(Self::Dotted),
            "double" => Some(Self::Double),
            "groove" => Some(Self::Groove),
            "ridge" => Some(Self::Ridge),
            "inset" => Some(Self::Inset),
            "outset" => Some(Self::Outset),
            _ => None,
        }
    }
}

/// Box sides in CSS order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BorderSide {
    Top,
    Right,
    Bottom,
    Left,
}

impl BorderSide {
    pub const ALL: [Self; 4] = [Self::Top, Self::Right, Self::Bottom, Self::Left];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Left => "left",
        }
    }

    /// Longhand property, e.g. `border-top`.
    pub fn border_property(self) -> &'static str {
        match self {
            Self::Top => "border-top",
            Self::Right => "border-right",
            Self::Bottom => "border-bottom",
            Self::Left => "border-left",
        }
    }
}

/// A parsed `border` / `border-<side>` shorthand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorderValue {
    pub width_px: u32,
    pub style: BorderStyle,
    pub color: Option<CssColor>,
}

impl BorderValue {
    pub fn none() -> Self {
        Self {
            width_px: 0,
            style: BorderStyle::None,
            color: None,
        }
    }

    pub fn parse(value: &str) -> Self {
        let mut width: Option<f32> = None;
        let mut style: Option<BorderStyle> = None;
        let mut color: Option<CssColor> = None;
        for token in split_top_level(value, ' ') {
            if width.is_none() {
                if let Some(px) = parse_px(token) {
                    width = Some(px);
                    continue;
                }
            }
            if style.is_none() {
                if let Some(parsed) = BorderStyle::from_name(token) {
                    style = Some(parsed);
                    continue;
                }
            }
            if color.is_none() {
                color = CssColor::parse(token);
            }
        }

        Self {
            width_px: width.map(|px| px.max(0.0).round() as u32).unwrap_or(0),
            style: style.unwrap_or(BorderStyle::None),
            color,
        }
    }

    /// A border is visible when it has a non-`none` style.
    pub fn is_visible(&self) -> bool {
        self.style != BorderStyle::None
    }

    pub fn to_css(&self) -> String {
        if !self.is_visible() {
            return "none".to_owned();
        }

        let mut out = format!(
            "{} {}",
            format_px(self.width_px as f32),
            self.style.as_str()
        );
        if let Some(color) = &self.color {
            out.push(' ');
            out.push_str(color.as_css());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::BorderStyle;
    use super::BorderValue;

    #[test]
    fn parses_shorthand_in_any_order() {
        let border = BorderValue::parse("dashed #00ccff 3px");
        assert_eq!(border.width_px, 3);
        assert_eq!(border.style, BorderStyle::Dashed);
        assert_eq!(border.to_css(), "3px dashed #00ccff");
    }

    #[test]
    fn none_shorthand_is_invisible() {
        let border = BorderValue::parse("none");
        assert!(!border.is_visible());
        assert_eq!(border.to_css(), "none");
    }

    #[test]
    fn functional_colors_survive_tokenizing() {
        let border = BorderValue::parse("1px solid rgb(1, 2, 3)");
        assert_eq!(
            border.color.as_ref().map(|color| color.as_css()),
            Some("rgb(1, 2, 3)")
        );
    }
}
