use crate::LoadLimits;
use crate::tokenizer::Token;
use crate::tokenizer::tokenize;
use lm_core::EditorError;
use lm_core::EditorResult;
use lm_dom::Document;
use lm_dom::NodeId;
use lm_dom::is_void_tag;

/// Parses `html` and appends the resulting nodes to `parent`.
pub fn parse_into(
    doc: &mut Document,
    parent: NodeId,
    html: &str,
    limits: &LoadLimits,
) -> EditorResult<()> {
    if html.len() > limits.max_bytes {
        return Err(EditorError::serialization(
            "html.too_large",
            format!(
                "document is {} bytes, limit is {}",
                html.len(),
                limits.max_bytes
            ),
        ));
    }

    let tokens = body_tokens(tokenize(html));
    let mut stack: Vec<(String, NodeId)> = Vec::new();

    for token in tokens {
        let current = stack.last().map_or(parent, |(_, id)| *id);
        match token {
            Token::Text(text) => {
                let node = doc.create_text(&text);
                doc.append_child(current, node);
            }
            Token::Start {
                name,
                attrs,
                self_closing,
            } => {
                close_implied(&mut stack, &name);
                let current = stack.last().map_or(parent, |(_, id)| *id);
                let element = doc.create_element(&name);
                for (key, value) in &attrs {
                    doc.set_attr(element, key, value);
                }
                doc.append_child(current, element);
                if !self_closing && !is_void_tag(&name) {
                    if stack.len() >= limits.max_depth {
                        return Err(EditorError::serialization(
                            "html.too_deep",
                            format!("nesting exceeds {} levels", limits.max_depth),
                        ));
                    }
                    stack.push((name, element));
                }
            }
            Token::End { name } => {
                if let Some(index) = stack.iter().rposition(|(tag, _)| *tag == name) {
                    stack.truncate(index);
                }
            }
        }
    }

    Ok(())
}

/// Keeps `<body>` content when the input is a full document and strips
/// document-level chrome otherwise.
fn body_tokens(tokens: Vec<Token>) -> Vec<Token> {
    let body_start = tokens
        .iter()
        .position(|token| matches!(token, Token::Start { name, .. } if name == "body"));

    let mut out = Vec::with_capacity(tokens.len());
    let mut in_head = false;
    for token in tokens.into_iter().skip(body_start.map_or(0, |start| start + 1)) {
        match &token {
            Token::End { name } if name == "body" && body_start.is_some() => break,
            Token::Start { name, .. } if name == "head" => in_head = true,
            Token::End { name } if name == "head" => in_head = false,
            Token::Start { name, .. } | Token::End { name }
                if matches!(
                    name.as_str(),
                    "html" | "body" | "meta" | "link" | "title" | "script" | "style"
                ) => {}
            _ if in_head => {}
            _ => out.push(token),
        }
    }
    out
}

fn close_implied(stack: &mut Vec<(String, NodeId)>, opening: &str) {
    let Some((top, _)) = stack.last() else {
        return;
    };
    let closes = match top.as_str() {
        "p" => lm_dom::is_block_tag(opening) && opening != "li",
        "li" => opening == "li",
        "td" | "th" => matches!(opening, "td" | "th" | "tr"),
        "tr" => opening == "tr",
        _ => false,
    };
    if closes {
        stack.pop();
        if matches!(opening, "tr")
            && stack
                .last()
                .is_some_and(|(tag, _)| matches!(tag.as_str(), "tr"))
        {
            stack.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_into;
    use crate::LoadLimits;
    use crate::serialize_children;
    use lm_core::ErrorKind;
    use lm_dom::Document;

    fn parse(html: &str) -> String {
        let mut doc = Document::new();
        let root = doc.root();
        doc.clear_children(root);
        let result = parse_into(&mut doc, root, html, &LoadLimits::default());
        assert!(result.is_ok());
        serialize_children(&doc, root)
    }

    #[test]
    fn full_documents_keep_only_body_content() {
        let html = "<html><head><title>T</title></head><body><p>hi</p></body></html>";
        assert_eq!(parse(html), "<p>hi</p>");
    }

    #[test]
    fn stray_end_tags_do_not_close_ancestors() {
        assert_eq!(parse("<p><b>a</i>b</b></p>"), "<p><b>ab</b></p>");
    }

    #[test]
    fn paragraphs_close_implicitly() {
        assert_eq!(parse("<p>one<p>two"), "<p>one</p><p>two</p>");
        assert_eq!(
            parse("<ul><li>a<li>b</ul>"),
            "<ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn depth_limit_is_a_serialization_error() {
        let mut doc = Document::new();
        let root = doc.root();
        let limits = LoadLimits {
            max_depth: 3,
            ..LoadLimits::default()
        };
        let result = parse_into(&mut doc, root, "<div><div><div><div>x", &limits);
        assert!(matches!(
            result,
            Err(error) if error.kind == ErrorKind::SerializationError
        ));
    }
}
