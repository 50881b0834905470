const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "center",
    "dd",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
    "ul",
];

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const INLINE_FORMATTING_TAGS: &[&str] = &[
    "b", "strong", "i", "em", "u", "ins", "s", "strike", "del", "sub", "sup", "span", "font",
];

pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

/// Elements without an end tag or children.
pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// Presentational inline elements that clear-formatting removes.
pub fn is_inline_formatting_tag(tag: &str) -> bool {
    INLINE_FORMATTING_TAGS.contains(&tag)
}

#[cfg(test)]
mod tests {
    use super::is_block_tag;
    use super::is_inline_formatting_tag;
    use super::is_void_tag;

    #[test]
    fn classifies_common_tags() {
        assert!(is_block_tag("h3"));
        assert!(is_block_tag("table"));
        assert!(!is_block_tag("span"));
        assert!(is_void_tag("br"));
        assert!(is_inline_formatting_tag("sup"));
        assert!(!is_inline_formatting_tag("a"));
    }
}
