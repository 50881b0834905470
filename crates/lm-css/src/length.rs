//! Length parsing and font-size normalization.

/// Point size reported when nothing in the ancestor chain sets a size.
pub const DEFAULT_FONT_SIZE_PT: u32 = 12;

const LEGACY_SIZES_PT: [u32; 7] = [8, 10, 12, 14, 18, 24, 36];
const BASE_FONT_PX: f32 = 16.0;

/// Parses a CSS length into pixels. Percentages and `auto` yield `None`.
pub fn parse_px(value: &str) -> Option<f32> {
    let raw = value.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("auto") || raw.ends_with('%') {
        return None;
    }

    if let Some(px) = raw.strip_suffix("px") {
        return px.trim().parse::<f32>().ok();
    }
    if let Some(rem) = raw.strip_suffix("rem") {
        return rem.trim().parse::<f32>().ok().map(|v| v * BASE_FONT_PX);
    }
    if let Some(em) = raw.strip_suffix("em") {
        return em.trim().parse::<f32>().ok().map(|v| v * BASE_FONT_PX);
    }
    if let Some(pt) = raw.strip_suffix("pt") {
        return pt.trim().parse::<f32>().ok().map(|v| v * (96.0 / 72.0));
    }

    raw.parse::<f32>().ok()
}

/// `pt = round(px * 0.75)`.
pub fn px_to_pt(px: f32) -> u32 {
    (px * 0.75).round().max(0.0) as u32
}

/// Maps a legacy `<font size>` value (1-7, optionally relative) to points.
pub fn legacy_size_to_pt(value: &str) -> Option<u32> {
    let raw = value.trim();
    let size = if let Some(delta) = raw.strip_prefix('+') {
        3 + delta.trim().parse::<i32>().ok()?
    } else if let Some(delta) = raw.strip_prefix('-') {
        3 - delta.trim().parse::<i32>().ok()?
    } else {
        raw.parse::<i32>().ok()?
    };

    let index = usize::try_from(size.clamp(1, 7) - 1).ok()?;
    LEGACY_SIZES_PT.get(index).copied()
}

/// Nearest legacy size for a point value.
pub fn pt_to_legacy_size(pt: u32) -> u8 {
    let mut best = 1_u8;
    let mut best_distance = u32::MAX;
    for (index, candidate) in LEGACY_SIZES_PT.iter().enumerate() {
        let distance = candidate.abs_diff(pt);
        if distance < best_distance {
            best_distance = distance;
            best = u8::try_from(index + 1).unwrap_or(7);
        }
    }
    best
}

/// Resolves a `font-size` declaration to whole points.
pub fn font_size_to_pt(value: &str) -> Option<u32> {
    let raw = value.trim().to_ascii_lowercase();
    let keyword = match raw.as_str() {
        "xx-small" => Some(7),
        "x-small" => Some(8),
        "small" => Some(10),
        "medium" => Some(12),
        "large" => Some(14),
        "x-large" => Some(18),
        "xx-large" => Some(24),
        "xxx-large" => Some(36),
        _ => None,
    };
    if keyword.is_some() {
        return keyword;
    }

    if let Some(pt) = raw.strip_suffix("pt") {
        let value = pt.trim().parse::<f32>().ok()?;
        return Some(value.round().max(0.0) as u32);
    }

    if let Some(percent) = raw.strip_suffix('%') {
        let value = percent.trim().parse::<f32>().ok()?;
        return Some(px_to_pt(BASE_FONT_PX * value / 100.0));
    }

    parse_px(&raw).map(px_to_pt)
}

/// Formats a pixel value without a trailing `.0`.
pub fn format_px(px: f32) -> String {
    let rounded = (px * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}px", rounded as i64)
    } else {
        format!("{rounded}px")
    }
}

#[cfg(test)]
mod tests {
    use super::font_size_to_pt;
    use super::format_px;
    use super::legacy_size_to_pt;
    use super::parse_px;
    use super::pt_to_legacy_size;
    use super::px_to_pt;

    #[test]
    fn converts_pixels_to_points() {
        assert_eq!(px_to_pt(24.0), 18);
        assert_eq!(px_to_pt(16.0), 12);
        assert_eq!(px_to_pt(13.0), 10);
    }

    #[test]
    fn maps_legacy_sizes() {
        let mapped = (1..=7)
            .filter_map(|size| legacy_size_to_pt(&size.to_string()))
            .collect::<Vec<_>>();
        assert_eq!(mapped, vec![8, 10, 12, 14, 18, 24, 36]);
        assert_eq!(legacy_size_to_pt("+2"), Some(18));
        assert_eq!(legacy_size_to_pt("9"), Some(36));
        assert_eq!(legacy_size_to_pt("big"), None);
    }

    #[test]
    fn picks_nearest_legacy_size() {
        assert_eq!(pt_to_legacy_size(18), 5);
        assert_eq!(pt_to_legacy_size(11), 2);
        assert_eq!(pt_to_legacy_size(72), 7);
    }

    #[test]
    fn resolves_font_size_declarations() {
        assert_eq!(font_size_to_pt("18pt"), Some(18));
        assert_eq!(font_size_to_pt("24px"), Some(18));
        assert_eq!(font_size_to_pt("1.5em"), Some(18));
        assert_eq!(font_size_to_pt("medium"), Some(12));
        assert_eq!(font_size_to_pt("150%"), Some(18));
        assert_eq!(font_size_to_pt("inherit"), None);
    }

    #[test]
    fn parses_lengths_and_formats_pixels() {
        assert_eq!(parse_px("12px"), Some(12.0));
        assert_eq!(parse_px("auto"), None);
        assert_eq!(parse_px("50%"), None);
        assert_eq!(format_px(40.0), "40px");
        assert_eq!(format_px(12.5), "12.5px");
    }
}
