use image::GenericImageView;
use lm_core::EditorError;
use lm_core::EditorResult;
use lm_layout::Size;
use std::path::Path;
use tracing::debug;
use url::Url;

const MAX_IMAGE_PIXELS: u64 = 64 * 1024 * 1024;

/// An image reference resolved for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub url: String,
    /// Decoded pixel size; `None` for remote sources and undecodable files.
    pub intrinsic: Option<Size>,
}

/// Remote and data URLs are passed through unprobed. Anything else is a
/// path relative to `base_dir`, read and probed for its pixel size.
pub fn resolve_image(reference: &str, base_dir: &Path) -> EditorResult<ImageAsset> {
    let reference = reference.trim();
    if let Ok(url) = Url::parse(reference)
        && matches!(url.scheme(), "http" | "https" | "data")
    {
        return Ok(ImageAsset {
            url: url.into(),
            intrinsic: None,
        });
    }

    let path = std::path::absolute(base_dir.join(reference)).map_err(|error| {
        EditorError::io("app.image.path", format!("cannot resolve {reference}: {error}"))
    })?;
    let body = std::fs::read(&path).map_err(|error| {
        EditorError::io("app.image.read", format!("cannot read {}: {error}", path.display()))
    })?;
    let url = Url::from_file_path(&path).map_err(|()| {
        EditorError::invalid_argument(
            "app.image.url",
            format!("{} cannot be expressed as a file URL", path.display()),
        )
    })?;

    let lower_name = path.to_string_lossy().to_ascii_lowercase();
    let intrinsic = probe_size(&lower_name, &body);
    debug!(url = url.as_str(), ?intrinsic, "resolved image");
    Ok(ImageAsset {
        url: url.into(),
        intrinsic,
    })
}

/// Pixel size of an encoded raster or SVG image.
pub fn probe_size(lower_name: &str, body: &[u8]) -> Option<Size> {
    let (width, height) = if lower_name.ends_with(".svg") || looks_like_svg_document(body) {
        let options = resvg::usvg::Options::default();
        let tree = resvg::usvg::Tree::from_data(body, &options).ok()?;
        let size = tree.size().to_int_size();
        (size.width(), size.height())
    } else {
        image::load_from_memory(body).ok()?.dimensions()
    };

    let pixels = u64::from(width) * u64::from(height);
    if pixels == 0 || pixels > MAX_IMAGE_PIXELS {
        return None;
    }
    Some(Size::new(width as f32, height as f32))
}

fn looks_like_svg_document(body: &[u8]) -> bool {
    let mut bytes = body.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(body);
    while let Some((first, rest)) = bytes.split_first() {
        if !first.is_ascii_whitespace() {
            break;
        }
        bytes = rest;
    }

    if bytes.starts_with(b"<svg") {
        return true;
    }
    bytes.starts_with(b"<?xml") && bytes.windows(4).any(|window| window == b"<svg")
}

#[cfg(test)]
mod tests {
    use super::probe_size;
    use super::resolve_image;
    use image::ImageFormat;
    use image::RgbaImage;
    use lm_layout::Size;
    use std::io::Cursor;
    use std::path::Path;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        let written = RgbaImage::new(width, height).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png);
        assert!(written.is_ok());
        bytes
    }

    #[test]
    fn probes_raster_dimensions() {
        assert_eq!(probe_size("a.png", &png(12, 7)), Some(Size::new(12.0, 7.0)));
        assert_eq!(probe_size("a.png", b"not an image"), None);
    }

    #[test]
    fn probes_svg_by_content_or_extension() {
        let svg = br#"  <svg xmlns="http://www.w3.org/2000/svg" width="40" height="20"></svg>"#;
        assert_eq!(probe_size("drawing", svg), Some(Size::new(40.0, 20.0)));

        let svg = br#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg" width="5" height="9"/>"#;
        assert_eq!(probe_size("drawing.svg", svg), Some(Size::new(5.0, 9.0)));
    }

    #[test]
    fn remote_sources_pass_through() {
        let asset = resolve_image("https://example.com/a.png", Path::new("/nowhere"));
        assert!(asset.is_ok_and(|asset| asset.url == "https://example.com/a.png" && asset.intrinsic.is_none()));
    }

    #[test]
    fn local_files_become_file_urls_with_size() {
        let dir = std::env::temp_dir().join(format!("lumen-assets-{}", std::process::id()));
        assert!(std::fs::create_dir_all(&dir).is_ok());
        assert!(std::fs::write(dir.join("dot.png"), png(3, 4)).is_ok());

        let asset = resolve_image("dot.png", &dir).unwrap_or_else(|_| unreachable!());
        assert!(asset.url.starts_with("file://"));
        assert!(asset.url.ends_with("/dot.png"));
        assert_eq!(asset.intrinsic, Some(Size::new(3.0, 4.0)));

        let missing = resolve_image("missing.png", &dir);
        assert!(missing.is_err_and(|error| error.code == "app.image.read"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
