//! Change-case over the selected text.

use crate::range::selected_text_nodes;
use crate::range::split_selection_boundaries;
use lm_core::CaseMode;
use lm_core::EditorResult;
use lm_dom::Document;

/// Rewrites the selected text in `mode`. Word and sentence boundaries carry
/// across text node edges.
pub fn change_case(doc: &mut Document, mode: CaseMode) -> EditorResult<()> {
    let range = split_selection_boundaries(doc)?;
    let mut state = CaseState::default();
    for node in selected_text_nodes(doc, range) {
        let Some(text) = doc.text(node) else {
            continue;
        };
        let converted = state.convert(text, mode);
        if converted != text {
            doc.set_text(node, &converted);
        }
    }
    Ok(())
}

struct CaseState {
    word_start: bool,
    sentence_start: bool,
}

impl Default for CaseState {
    fn default() -> Self {
        Self {
            word_start: true,
            sentence_start: true,
        }
    }
}

impl CaseState {
    fn convert(&mut self, text: &str, mode: CaseMode) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match mode {
                CaseMode::Upper => out.extend(ch.to_uppercase()),
                CaseMode::Lower => out.extend(ch.to_lowercase()),
                CaseMode::Toggle => {
                    if ch.is_uppercase() {
                        out.extend(ch.to_lowercase());
                    } else {
                        out.extend(ch.to_uppercase());
                    }
                }
                CaseMode::Title => {
                    if self.word_start {
                        out.extend(ch.to_uppercase());
                    } else {
                        out.extend(ch.to_lowercase());
                    }
                }
                CaseMode::Sentence => {
                    if self.sentence_start && ch.is_alphabetic() {
                        out.extend(ch.to_uppercase());
                        self.sentence_start = false;
                    } else {
                        out.extend(ch.to_lowercase());
                    }
                }
            }

            self.word_start = ch.is_whitespace() || ch == '-' || ch == '\u{200B}';
            if matches!(ch, '.' | '!' | '?') {
                self.sentence_start = true;
            } else if ch.is_alphanumeric() {
                self.sentence_start = false;
            }
        }
        out
    }
}
