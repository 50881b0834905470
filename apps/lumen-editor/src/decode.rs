use encoding_rs::Encoding;
use encoding_rs::UTF_8;
use tracing::debug;
use tracing::warn;

const META_SCAN_BYTES: usize = 8192;

/// Decodes an HTML file. A byte-order mark wins, then the declared label,
/// then a `charset=` found near the top of the document, then UTF-8.
pub fn decode_html(body: &[u8], declared: Option<&str>) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(body) {
        debug!(encoding = encoding.name(), "decoding by byte-order mark");
        let (decoded, _) = encoding.decode_without_bom_handling(&body[bom_len..]);
        return decoded.into_owned();
    }

    let encoding = declared
        .map(str::to_owned)
        .or_else(|| parse_charset_from_html_prefix(body))
        .and_then(|label| {
            let encoding = Encoding::for_label(label.trim().as_bytes());
            if encoding.is_none() {
                warn!(label = label.as_str(), "unknown charset label, falling back to UTF-8");
            }
            encoding
        })
        .unwrap_or(UTF_8);

    let (decoded, _, had_errors) = encoding.decode(body);
    if had_errors {
        warn!(encoding = encoding.name(), "document contains malformed byte sequences");
    }
    decoded.into_owned()
}

fn parse_charset_from_html_prefix(body: &[u8]) -> Option<String> {
    let prefix_len = body.len().min(META_SCAN_BYTES);
    let prefix = String::from_utf8_lossy(&body[..prefix_len]);
    let lower = prefix.to_ascii_lowercase();
    let mut search_start = 0_usize;

    while let Some(relative) = lower[search_start..].find("charset=") {
        let charset_start = search_start + relative + "charset=".len();
        if let Some(label) = parse_charset_label(&prefix[charset_start..]) {
            return Some(label);
        }
        search_start = charset_start;
    }

    None
}

fn parse_charset_label(input: &str) -> Option<String> {
    let trimmed = input.trim_start();
    let first = trimmed.chars().next()?;

    let label = if first == '"' || first == '\'' {
        let rest = &trimmed[first.len_utf8()..];
        let end = rest.find(first)?;
        rest[..end].trim()
    } else {
        let end = trimmed
            .find(|ch: char| ch.is_whitespace() || matches!(ch, '"' | '\'' | ';' | '>' | '/'))
            .unwrap_or(trimmed.len());
        trimmed[..end].trim()
    };

    (!label.is_empty()).then(|| label.to_owned())
}

#[cfg(test)]
mod tests {
    use super::decode_html;
    use super::parse_charset_from_html_prefix;

    #[test]
    fn finds_meta_charset_in_either_form() {
        let html = b"<html><head><meta charset=\"windows-1251\"></head></html>";
        assert_eq!(parse_charset_from_html_prefix(html).as_deref(), Some("windows-1251"));

        let html = b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=ISO-8859-2\">";
        assert_eq!(parse_charset_from_html_prefix(html).as_deref(), Some("ISO-8859-2"));

        assert_eq!(parse_charset_from_html_prefix(b"<p>charset= ;</p>"), None);
    }

    #[test]
    fn meta_charset_decodes_legacy_bytes() {
        let html = b"<meta charset=latin1><p>caf\xE9</p>";
        assert_eq!(decode_html(html, None), "<meta charset=latin1><p>caf\u{e9}</p>");
    }

    #[test]
    fn declared_label_overrides_meta() {
        let html = b"<meta charset=\"UTF-8\"><p>\xE9</p>";
        assert_eq!(decode_html(html, Some("iso-8859-1")), "<meta charset=\"UTF-8\"><p>\u{e9}</p>");
    }

    #[test]
    fn byte_order_mark_wins_and_is_stripped() {
        let html = b"\xEF\xBB\xBF<p>\xE2\x82\xAC</p>";
        assert_eq!(decode_html(html, Some("iso-8859-1")), "<p>\u{20ac}</p>");
    }

    #[test]
    fn unknown_labels_fall_back_to_utf8() {
        let html = "<meta charset=klingon><p>\u{20ac}</p>";
        assert_eq!(decode_html(html.as_bytes(), None), html);
    }
}
