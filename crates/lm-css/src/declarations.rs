//! Ordered `style` attribute declarations.

/// Declarations parsed from an inline `style` attribute, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleDeclarations {
    entries: Vec<(String, String)>,
}

impl StyleDeclarations {
    pub fn parse(input: &str) -> Self {
        let mut out = Self::default();

        for chunk in split_top_level(input, ';') {
            let trimmed = chunk.trim();
            let Some(colon_idx) = find_top_level_colon(trimmed) else {
                continue;
            };
            let name = trimmed[..colon_idx].trim().to_ascii_lowercase();
            let value = trimmed[(colon_idx + 1)..].trim();
            if name.is_empty() || value.is_empty() {
                continue;
            }
            out.set(&name, value);
        }

        out
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replaces an existing declaration in place or appends a new one.
    pub fn set(&mut self, name: &str, value: &str) {
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        if value.is_empty() {
            self.remove(&name);
            return;
        }

        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            entry.1 = value.to_owned();
        } else {
            self.entries.push((name, value.to_owned()));
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Renders the declarations back into `style` attribute syntax.
    pub fn to_attribute(&self) -> String {
        let mut out = String::new();
        for (index, (name, value)) in self.entries.iter().enumerate() {
            if index > 0 {
                out.push(' ');
            }
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push(';');
        }
        out
    }
}

/// Splits on `delimiter` outside strings, parentheses and brackets.
///
/// A delimiter of `' '` splits on any ASCII whitespace run instead.
pub fn split_top_level(input: &str, delimiter: char) -> Vec<&str> {
    let bytes = input.as_bytes();
    let split_ws = delimiter == ' ';
    let mut out = Vec::new();
    let mut start = 0_usize;
    let mut idx = 0_usize;
    let mut in_single = false;
    let mut in_double = false;
    let mut escape = false;
    let mut paren_depth = 0_u32;
    let mut bracket_depth = 0_u32;

    while idx < bytes.len() {
        let byte = bytes[idx];
        if in_single || in_double {
            let quote = if in_single { b'\'' } else { b'"' };
            if !escape && byte == b'\\' {
                escape = true;
            } else if !escape && byte == quote {
                in_single = false;
                in_double = false;
            } else {
                escape = false;
            }
            idx = idx.saturating_add(1);
            continue;
        }

        match byte {
            b'\'' => in_single = true,
            b'"' => in_double = true,
            b'(' => paren_depth = paren_depth.saturating_add(1),
            b')' => paren_depth = paren_depth.saturating_sub(1),
            b'[' => bracket_depth = bracket_depth.saturating_add(1),
            b']' => bracket_depth = bracket_depth.saturating_sub(1),
            _ => {
                let is_delimiter = if split_ws {
                    byte.is_ascii_whitespace()
                } else {
                    byte == delimiter as u8
                };
                if is_delimiter && paren_depth == 0 && bracket_depth == 0 {
                    out.push(&input[start..idx]);
                    start = idx.saturating_add(1);
                }
            }
        }

        idx = idx.saturating_add(1);
    }

    if start <= input.len() {
        out.push(&input[start..]);
    }

    if split_ws {
        out.retain(|part| !part.is_empty());
    }
    out
}

fn find_top_level_colon(input: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut in_single = false;
    let mut in_double = false;
    let mut paren_depth = 0_u32;

    for (idx, byte) in bytes.iter().copied().enumerate() {
        match byte {
            b'\'' if !in_double => in_single = !in_single,
            b'"' if !in_single => in_double = !in_double,
            b'(' if !in_single && !in_double => paren_depth = paren_depth.saturating_add(1),
            b')' if !in_single && !in_double => paren_depth = paren_depth.saturating_sub(1),
            b':' if !in_single && !in_double && paren_depth == 0 => return Some(idx),
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::StyleDeclarations;
    use super::split_top_level;

    #[test]
    fn parses_and_renders_declarations_in_order() {
        let style = StyleDeclarations::parse("Color: red;  font-size:18pt ;;bogus");
        assert_eq!(style.get("color"), Some("red"));
        assert_eq!(style.get("font-size"), Some("18pt"));
        assert_eq!(style.len(), 2);
        assert_eq!(style.to_attribute(), "color: red; font-size: 18pt;");
    }

    #[test]
    fn keeps_semicolons_inside_functions_and_strings() {
        let style = StyleDeclarations::parse(
            "background-image:url('a;b.png'); font-family: \"Foo; Bar\", serif",
        );
        assert_eq!(style.get("background-image"), Some("url('a;b.png')"));
        assert_eq!(style.get("font-family"), Some("\"Foo; Bar\", serif"));
    }

    #[test]
    fn set_replaces_in_place_and_empty_value_removes() {
        let mut style = StyleDeclarations::parse("margin-top: 6px; color: blue");
        style.set("margin-top", "12px");
        assert_eq!(style.to_attribute(), "margin-top: 12px; color: blue;");
        style.set("color", "");
        assert!(!style.contains("color"));
    }

    #[test]
    fn splits_whitespace_outside_parentheses() {
        let parts = split_top_level("1px  solid rgb(1, 2, 3)", ' ');
        assert_eq!(parts, vec!["1px", "solid", "rgb(1, 2, 3)"]);
    }
}
