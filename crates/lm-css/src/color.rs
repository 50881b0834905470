//! CSS color values that keep their source spelling.

use core::fmt;

/// Resolved channel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// A color accepted from the host.
///
/// Hex input and the `transparent` keyword render back byte-for-byte; a
/// functional color with zero alpha collapses to `transparent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssColor {
    source: String,
    value: Rgba,
}

impl CssColor {
    pub fn parse(input: &str) -> Option<Self> {
        let source = input.trim();
        let raw = source.to_ascii_lowercase();

        if raw == "transparent" {
            return Some(Self::transparent());
        }

        if let Some(hex) = raw.strip_prefix('#') {
            let value = parse_hex(hex)?;
            return Some(Self {
                source: source.to_owned(),
                value,
            });
        }

        let value = if raw.starts_with("rgb(") && raw.ends_with(')') {
            parse_rgb_function(&raw, false)?
        } else if raw.starts_with("rgba(") && raw.ends_with(')') {
            parse_rgb_function(&raw, true)?
        } else {
            named_color(&raw)?
        };

        if value.a == 0 {
            return Some(Self::transparent());
        }

        Some(Self {
            source: source.to_owned(),
            value,
        })
    }

    pub fn transparent() -> Self {
        Self {
            source: "transparent".to_owned(),
            value: Rgba::TRANSPARENT,
        }
    }

    pub fn rgba(&self) -> Rgba {
        self.value
    }

    pub fn is_transparent(&self) -> bool {
        self.value.a == 0
    }

    pub fn as_css(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for CssColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_hex(v: &str) -> Option<Rgba> {
    if !v.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }

    let short = |idx: usize| u8::from_str_radix(&v[idx..idx + 1].repeat(2), 16).ok();
    let long = |idx: usize| u8::from_str_radix(&v[idx..idx + 2], 16).ok();

    match v.len() {
        3 => Some(Rgba::opaque(short(0)?, short(1)?, short(2)?)),
        4 => Some(Rgba {
            r: short(0)?,
            g: short(1)?,
            b: short(2)?,
            a: short(3)?,
        }),
        6 => Some(Rgba::opaque(long(0)?, long(2)?, long(4)?)),
        8 => Some(Rgba {
            r: long(0)?,
            g: long(2)?,
            b: long(4)?,
            a: long(6)?,
        }),
        _ => None,
    }
}

fn parse_rgb_function(v: &str, with_alpha: bool) -> Option<Rgba> {
    let inside = if with_alpha {
        v.strip_prefix("rgba(")?.strip_suffix(')')?
    } else {
        v.strip_prefix("rgb(")?.strip_suffix(')')?
    };
    let parts = inside.split(',').map(str::trim).collect::<Vec<_>>();
    if (with_alpha && parts.len() != 4) || (!with_alpha && parts.len() != 3) {
        return None;
    }

    Some(Rgba {
        r: parse_rgb_channel(parts[0])?,
        g: parse_rgb_channel(parts[1])?,
        b: parse_rgb_channel(parts[2])?,
        a: if with_alpha {
            parse_alpha_channel(parts[3])?
        } else {
            255
        },
    })
}

fn parse_rgb_channel(value: &str) -> Option<u8> {
    let raw = value.trim();
    if let Some(percent) = raw.strip_suffix('%') {
        let value = percent.trim().parse::<f32>().ok()?.clamp(0.0, 100.0);
        return Some(((value / 100.0) * 255.0).round() as u8);
    }
    let value = raw.parse::<f32>().ok()?.clamp(0.0, 255.0);
    Some(value.round() as u8)
}

fn parse_alpha_channel(value: &str) -> Option<u8> {
    let raw = value.trim();
    if let Some(percent) = raw.strip_suffix('%') {
        let value = percent.trim().parse::<f32>().ok()?.clamp(0.0, 100.0);
        return Some(((value / 100.0) * 255.0).round() as u8);
    }
    let value = raw.parse::<f32>().ok()?.clamp(0.0, 1.0);
    Some((value * 255.0).round() as u8)
}

fn named_color(name: &str) -> Option<Rgba> {
    let value = match name {
        "black" => Rgba::opaque(0, 0, 0),
        "white" => Rgba::opaque(255, 255, 255),
        "gray" | "grey" => Rgba::opaque(128, 128, 128),
        "silver" => Rgba::opaque(192, 192, 192),
        "red" => Rgba::opaque(255, 0, 0),
        "maroon" => Rgba::opaque(128, 0, 0),
        "orange" => Rgba::opaque(255, 165, 0),
        "yellow" => Rgba::opaque(255, 255, 0),
        "olive" => Rgba::opaque(128, 128, 0),
        "lime" => Rgba::opaque(0, 255, 0),
        "green" => Rgba::opaque(0, 128, 0),
        "aqua" | "cyan" => Rgba::opaque(0, 255, 255),
        "teal" => Rgba::opaque(0, 128, 128),
        "blue" => Rgba::opaque(0, 0, 255),
        "navy" => Rgba::opaque(0, 0, 128),
        "fuchsia" | "magenta" => Rgba::opaque(255, 0, 255),
        "purple" => Rgba::opaque(128, 0, 128),
        "pink" => Rgba::opaque(255, 192, 203),
        "brown" => Rgba::opaque(165, 42, 42),
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::CssColor;
    use super::Rgba;

    #[test]
    fn hex_keeps_source_spelling() {
        let color = CssColor::parse(" #FFcc00 ");
        assert_eq!(color.as_ref().map(CssColor::as_css), Some("#FFcc00"));
        assert_eq!(
            color.map(|color| color.rgba()),
            Some(Rgba::opaque(255, 204, 0))
        );
    }

    #[test]
    fn short_hex_expands_channels() {
        let color = CssColor::parse("#0cf");
        assert_eq!(
            color.map(|color| color.rgba()),
            Some(Rgba::opaque(0, 204, 255))
        );
    }

    #[test]
    fn zero_alpha_collapses_to_transparent() {
        let color = CssColor::parse("rgba(10, 20, 30, 0)");
        assert_eq!(color.as_ref().map(CssColor::as_css), Some("transparent"));
        assert!(color.is_some_and(|color| color.is_transparent()));
    }

    #[test]
    fn transparent_keyword_round_trips() {
        let color = CssColor::parse("TRANSPARENT");
        assert_eq!(color.map(|color| color.to_string()).as_deref(), Some("transparent"));
    }

    #[test]
    fn functional_and_named_colors_parse() {
        assert_eq!(
            CssColor::parse("rgb(100%, 0%, 0%)").map(|color| color.rgba()),
            Some(Rgba::opaque(255, 0, 0))
        );
        assert_eq!(
            CssColor::parse("navy").map(|color| color.rgba()),
            Some(Rgba::opaque(0, 0, 128))
        );
    }

    #[test]
    fn rejects_malformed_colors() {
        assert!(CssColor::parse("#12").is_none());
        assert!(CssColor::parse("#zzzzzz").is_none());
        assert!(CssColor::parse("rgb(1,2)").is_none());
        assert!(CssColor::parse("blurple").is_none());
    }
}
