//! A forgiving HTML tokenizer for editor documents.

use crate::entities::decode_entities;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    End {
        name: String,
    },
    Text(String),
}

pub(crate) fn tokenize(source: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let bytes = source.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if starts_with(bytes, i, b"<!--") {
            i = skip_comment(bytes, i);
            continue;
        }

        if bytes[i] == b'<' {
            if starts_with(bytes, i, b"</") {
                if let Some((token, next)) = parse_end_tag(bytes, i) {
                    out.push(token);
                    i = next;
                    continue;
                }
            } else if starts_with(bytes, i, b"<!") || starts_with(bytes, i, b"<?") {
                i = skip_declaration(bytes, i);
                continue;
            } else if let Some((token, next)) = parse_start_tag(bytes, i) {
                let raw_text_tag = match &token {
                    Token::Start {
                        name, self_closing, ..
                    } if !*self_closing && is_raw_text_tag(name) => Some(name.clone()),
                    _ => None,
                };
                out.push(token);
                i = next;

                // Script and style bodies are dropped whole.
                if let Some(tag) = raw_text_tag {
                    i = skip_raw_text(bytes, i, &tag);
                    out.push(Token::End { name: tag });
                }
                continue;
            }
        }

        let (text, next) = parse_text(bytes, i);
        if !text.is_empty() {
            out.push(Token::Text(decode_entities(&text)));
        }
        i = next;
    }

    out
}

fn starts_with(bytes: &[u8], i: usize, pattern: &[u8]) -> bool {
    let end = i.saturating_add(pattern.len());
    end <= bytes.len() && &bytes[i..end] == pattern
}

fn skip_comment(bytes: &[u8], start: usize) -> usize {
    let mut i = start.saturating_add(4);
    while i + 2 < bytes.len() {
        if &bytes[i..i + 3] == b"-->" {
            return i + 3;
        }
        i += 1;
    }
    bytes.len()
}

fn skip_declaration(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|byte| *byte == b'>')
        .map_or(bytes.len(), |pos| start + pos + 1)
}

fn parse_text(bytes: &[u8], start: usize) -> (String, usize) {
    // A lone '<' that opens no tag is literal text.
    let mut i = start.saturating_add(usize::from(bytes.get(start) == Some(&b'<')));
    while i < bytes.len() && bytes[i] != b'<' {
        i += 1;
    }
    (String::from_utf8_lossy(&bytes[start..i]).into_owned(), i)
}

fn skip_raw_text(bytes: &[u8], start: usize, tag: &str) -> usize {
    let tag = tag.as_bytes();
    let mut i = start;
    while i + 2 + tag.len() <= bytes.len() {
        if bytes[i] == b'<'
            && bytes[i + 1] == b'/'
            && bytes[i + 2..i + 2 + tag.len()].eq_ignore_ascii_case(tag)
        {
            return skip_declaration(bytes, i);
        }
        i += 1;
    }
    bytes.len()
}

fn parse_end_tag(bytes: &[u8], start: usize) -> Option<(Token, usize)> {
    let mut i = start + 2;
    skip_spaces(bytes, &mut i);
    let begin = i;
    while i < bytes.len() && is_name_char(bytes[i]) {
        i += 1;
    }
    if i == begin {
        return None;
    }

    let name = String::from_utf8_lossy(&bytes[begin..i]).to_ascii_lowercase();
    while i < bytes.len() && bytes[i] != b'>' {
        i += 1;
    }
    if i >= bytes.len() {
        return None;
    }
    Some((Token::End { name }, i + 1))
}

fn parse_start_tag(bytes: &[u8], start: usize) -> Option<(Token, usize)> {
    let mut i = start + 1;
    let begin = i;
    while i < bytes.len() && is_name_char(bytes[i]) {
        i += 1;
    }
    if i == begin || !bytes[begin].is_ascii_alphabetic() {
        return None;
    }

    let name = String::from_utf8_lossy(&bytes[begin..i]).to_ascii_lowercase();
    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;

    loop {
        skip_spaces(bytes, &mut i);
        if i >= bytes.len() {
            return None;
        }
        if bytes[i] == b'>' {
            i += 1;
            break;
        }
        if bytes[i] == b'/' {
            self_closing = true;
            i += 1;
            continue;
        }

        let attr_start = i;
        while i < bytes.len() && is_name_char(bytes[i]) {
            i += 1;
        }
        if i == attr_start {
            i += 1;
            continue;
        }
        let attr_name = String::from_utf8_lossy(&bytes[attr_start..i]).to_ascii_lowercase();
        skip_spaces(bytes, &mut i);

        let mut value = String::new();
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            skip_spaces(bytes, &mut i);
            if i < bytes.len() && matches!(bytes[i], b'"' | b'\'') {
                let quote = bytes[i];
                i += 1;
                let value_start = i;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
                value = String::from_utf8_lossy(&bytes[value_start..i]).into_owned();
                i = i.saturating_add(1);
            } else {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                value = String::from_utf8_lossy(&bytes[value_start..i]).into_owned();
            }
        }

        // First occurrence wins, as in browsers.
        if !attrs.iter().any(|(existing, _)| *existing == attr_name) {
            attrs.push((attr_name, decode_entities(&value)));
        }
    }

    Some((
        Token::Start {
            name,
            attrs,
            self_closing,
        },
        i,
    ))
}

fn skip_spaces(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn is_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b':')
}

fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

#[cfg(test)]
mod tests {
    use super::Token;
    use super::tokenize;

    #[test]
    fn tokenizes_attributes_and_entities() {
        let tokens = tokenize(r#"<p class="x" data-a='1 &amp; 2'>a &lt; b</p>"#);
        assert_eq!(
            tokens,
            vec![
                Token::Start {
                    name: "p".to_owned(),
                    attrs: vec![
                        ("class".to_owned(), "x".to_owned()),
                        ("data-a".to_owned(), "1 & 2".to_owned()),
                    ],
                    self_closing: false,
                },
                Token::Text("a < b".to_owned()),
                Token::End {
                    name: "p".to_owned()
                },
            ]
        );
    }

    #[test]
    fn drops_comments_and_script_bodies() {
        let tokens = tokenize("<!-- note --><script>if (a < b) {}</script>x");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens.last(), Some(&Token::Text("x".to_owned())));
    }

    #[test]
    fn stray_angle_bracket_is_text() {
        let tokens = tokenize("1 < 2");
        assert_eq!(
            tokens,
            vec![Token::Text("1 ".to_owned()), Token::Text("< 2".to_owned())]
        );
    }
}
