/// Decodes the character references editor documents actually contain.
pub fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0_usize;

    while let Some(relative) = input[cursor..].find('&') {
        let amp = cursor + relative;
        out.push_str(&input[cursor..amp]);

        let rest = &input[amp + 1..];
        let Some(semi) = rest.find(';').filter(|semi| *semi <= 10) else {
            out.push('&');
            cursor = amp + 1;
            continue;
        };

        match decode_entity(&rest[..semi]) {
            Some(ch) => {
                out.push(ch);
                cursor = amp + semi + 2;
            }
            None => {
                out.push('&');
                cursor = amp + 1;
            }
        }
    }

    out.push_str(&input[cursor..]);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "nbsp" => Some('\u{a0}'),
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "zwsp" | "ZeroWidthSpace" => Some('\u{200B}'),
        _ => {
            let value = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(value)
        }
    }
}

/// Escapes text content.
pub fn escape_text(input: &str, out: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
}

/// Escapes a double-quoted attribute value.
pub fn escape_attribute(input: &str, out: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::decode_entities;
    use super::escape_text;

    #[test]
    fn decodes_named_and_numeric_references() {
        assert_eq!(decode_entities("a&amp;b&#65;&#x42;&nbsp;"), "a&bAB\u{a0}");
        assert_eq!(decode_entities("fish & chips; yes"), "fish & chips; yes");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
    }

    #[test]
    fn escapes_markup_characters() {
        let mut out = String::new();
        escape_text("<b> & \u{a0}", &mut out);
        assert_eq!(out, "&lt;b&gt; &amp; &nbsp;");
    }
}
