//! Editing commands over the document model.
//!
//! [`CommandDispatcher::dispatch`] runs one [`Command`] against a
//! [`Document`] and leaves the tree normalized with a valid selection.

use lm_core::Alignment;
use lm_core::BlockStyle;
use lm_core::CaseMode;
use lm_core::ColorTarget;
use lm_core::EditorError;
use lm_core::EditorResult;
use lm_core::FormattingSnapshot;
use lm_core::InlineStyle;
use lm_core::ListKind;
use lm_core::SpacingScope;
use lm_css::CssColor;
use lm_dom::Document;
use tracing::debug;
use tracing::warn;

mod block;
mod case;
mod inline;
mod insert;
mod query;
mod range;
mod text;

pub use block::COLUMN_LAYOUT_CLASS;
pub use inline::has_inline_style;
pub use insert::insert_block_at_caret;
pub use insert::insert_inline_at_caret;
pub use insert::position_after;
pub use query::query_alignment;
pub use query::query_block_style;
pub use query::query_font_family;
pub use query::query_font_size;
pub use query::query_inline_style;
pub use query::query_list_state;
pub use range::closest_block;
pub use range::context_node;
pub use range::is_object_wrapper;
pub use range::require_selection;
pub use text::collapse_to;
pub use text::set_selection;

/// Largest accepted font size in points.
pub const MAX_FONT_SIZE_PT: u32 = 400;

/// One editing intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ToggleInline(InlineStyle),
    SetBlockStyle(BlockStyle),
    SetFontFamily(String),
    SetFontSize(u32),
    ToggleList(ListKind),
    Indent,
    Outdent,
    SetAlignment(Alignment),
    SetColor { target: ColorTarget, color: String },
    ClearFormatting,
    ChangeCase(CaseMode),
    SetParagraphSpacing { px: f32, scope: SpacingScope },
    SetLineSpacing { multiplier: f32, scope: SpacingScope },
    SetColumns(u32),
    InsertText(String),
    DeleteBackward,
    DeleteForward,
    InsertParagraph,
    InsertLineBreak,
    SelectAll,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToggleInline(_) => "toggle-inline",
            Self::SetBlockStyle(_) => "set-block-style",
            Self::SetFontFamily(_) => "set-font-family",
            Self::SetFontSize(_) => "set-font-size",
            Self::ToggleList(_) => "toggle-list",
            Self::Indent => "indent",
            Self::Outdent => "outdent",
            Self::SetAlignment(_) => "set-alignment",
            Self::SetColor { .. } => "set-color",
            Self::ClearFormatting => "clear-formatting",
            Self::ChangeCase(_) => "change-case",
            Self::SetParagraphSpacing { .. } => "set-paragraph-spacing",
            Self::SetLineSpacing { .. } => "set-line-spacing",
            Self::SetColumns(_) => "set-columns",
            Self::InsertText(_) => "insert-text",
            Self::DeleteBackward => "delete-backward",
            Self::DeleteForward => "delete-forward",
            Self::InsertParagraph => "insert-paragraph",
            Self::InsertLineBreak => "insert-line-break",
            Self::SelectAll => "select-all",
        }
    }

    /// Commands that only move the selection.
    pub fn is_selection_only(&self) -> bool {
        matches!(self, Self::SelectAll)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandConfig {
    /// Family reported when no declaration applies.
    pub default_font_family: String,
    pub indent_step_px: f32,
    pub column_gap_px: f32,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            default_font_family: "Arial".to_owned(),
            indent_step_px: 40.0,
            column_gap_px: 24.0,
        }
    }
}

impl CommandConfig {
    pub fn validate(&self) -> EditorResult<()> {
        if self.default_font_family.trim().is_empty() {
            return Err(EditorError::invalid_argument(
                "commands.config.font_family",
                "default font family must not be empty",
            ));
        }
        if !(self.indent_step_px.is_finite() && self.indent_step_px > 0.0) {
            return Err(EditorError::invalid_argument(
                "commands.config.indent_step",
                "indent step must be a positive pixel value",
            ));
        }
        if !(self.column_gap_px.is_finite() && self.column_gap_px >= 0.0) {
            return Err(EditorError::invalid_argument(
                "commands.config.column_gap",
                "column gap must be a non-negative pixel value",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandDispatcher {
    config: CommandConfig,
}

impl CommandDispatcher {
    pub fn new(config: CommandConfig) -> EditorResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CommandConfig {
        &self.config
    }

    /// Runs `command`. Argument errors surface before the document is
    /// touched; a missing selection yields `NoSelection`.
    pub fn dispatch(&self, doc: &mut Document, command: &Command) -> EditorResult<()> {
        debug!(command = command.name(), "dispatching command");
        let result = self.run(doc, command);
        let root = doc.root();
        doc.normalize_text(root);
        doc.normalize_root();
        if doc.repair_selection() {
            warn!(
                command = command.name(),
                "selection left the editable root; moved to document end"
            );
        }
        result
    }

    fn run(&self, doc: &mut Document, command: &Command) -> EditorResult<()> {
        match command {
            Command::ToggleInline(style) => inline::toggle_inline(doc, *style),
            Command::SetBlockStyle(style) => block::set_block_style(doc, *style),
            Command::SetFontFamily(family) => {
                let family = family.trim();
                if family.is_empty() {
                    return Err(EditorError::invalid_argument(
                        "commands.font_family",
                        "font family must not be empty",
                    ));
                }
                inline::apply_span_style(doc, "font-family", family)
            }
            Command::SetFontSize(points) => {
                if !(1..=MAX_FONT_SIZE_PT).contains(points) {
                    return Err(EditorError::invalid_argument(
                        "commands.font_size",
                        format!("font size {points}pt is out of range"),
                    ));
                }
                inline::apply_span_style(doc, "font-size", &format!("{points}pt"))
            }
            Command::ToggleList(kind) => block::toggle_list(doc, *kind),
            Command::Indent => block::indent(doc, self.config.indent_step_px),
            Command::Outdent => block::outdent(doc, self.config.indent_step_px),
            Command::SetAlignment(alignment) => block::set_alignment(doc, *alignment),
            Command::SetColor { target, color } => {
                let color = CssColor::parse(color).ok_or_else(|| {
                    EditorError::invalid_argument(
                        "commands.color",
                        format!("unrecognized color {color:?}"),
                    )
                })?;
                inline::apply_span_style(doc, target.css_property(), color.as_css())
            }
            Command::ClearFormatting => inline::clear_formatting(doc),
            Command::ChangeCase(mode) => case::change_case(doc, *mode),
            Command::SetParagraphSpacing { px, scope } => {
                if !px.is_finite() {
                    return Err(EditorError::invalid_argument(
                        "commands.paragraph_spacing",
                        "spacing must be a finite pixel value",
                    ));
                }
                block::set_paragraph_spacing(doc, *px, *scope)
            }
            Command::SetLineSpacing { multiplier, scope } => {
                if !(multiplier.is_finite() && *multiplier > 0.0) {
                    return Err(EditorError::invalid_argument(
                        "commands.line_spacing",
                        "line spacing must be a positive multiplier",
                    ));
                }
                block::set_line_spacing(doc, *multiplier, *scope)
            }
            Command::SetColumns(count) => block::set_columns(doc, *count, self.config.column_gap_px),
            Command::InsertText(value) => text::insert_text(doc, value),
            Command::DeleteBackward => text::delete_backward(doc),
            Command::DeleteForward => text::delete_forward(doc),
            Command::InsertParagraph => text::insert_paragraph(doc),
            Command::InsertLineBreak => text::insert_line_break(doc),
            Command::SelectAll => {
                text::select_all(doc);
                Ok(())
            }
        }
    }

    /// Formatting snapshot at the selection start.
    pub fn snapshot(&self, doc: &Document) -> EditorResult<FormattingSnapshot> {
        query::snapshot(doc, &self.config.default_font_family)
    }
}

#[cfg(test)]
mod tests {
    use super::Command;
    use super::CommandConfig;
    use super::CommandDispatcher;
    use lm_core::ColorTarget;
    use lm_core::ErrorKind;
    use lm_core::InlineStyle;
    use lm_dom::Document;
    use lm_dom::Position;
    use lm_dom::Range;
    use lm_html::LoadLimits;
    use lm_html::load_document;
    use lm_html::serialize_document;

    fn loaded(html: &str) -> Document {
        let mut doc = Document::new();
        assert!(load_document(&mut doc, html, &LoadLimits::default()).is_ok());
        doc
    }

    #[test]
    fn missing_selection_is_a_no_selection_error() {
        let dispatcher = CommandDispatcher::default();
        let mut doc = loaded("<p>abc</p>");
        doc.clear_selection();
        let result = dispatcher.dispatch(&mut doc, &Command::ToggleInline(InlineStyle::Bold));
        assert!(result.is_err_and(|error| error.is_no_selection()));
        assert_eq!(serialize_document(&doc), "<p>abc</p>");
    }

    #[test]
    fn invalid_arguments_are_rejected_before_mutation() {
        let dispatcher = CommandDispatcher::default();
        let mut doc = loaded("<p>abc</p>");
        let result = dispatcher.dispatch(
            &mut doc,
            &Command::SetColor {
                target: ColorTarget::Text,
                color: "not-a-color".to_owned(),
            },
        );
        assert!(result.is_err_and(|error| error.kind == ErrorKind::InvalidArgument));
        let result = dispatcher.dispatch(&mut doc, &Command::SetFontSize(0));
        assert!(result.is_err_and(|error| error.kind == ErrorKind::InvalidArgument));
        assert_eq!(serialize_document(&doc), "<p>abc</p>");
    }

    #[test]
    fn hex_colors_are_stored_verbatim() {
        let dispatcher = CommandDispatcher::default();
        let mut doc = loaded("<p>abc</p>");
        let text = doc.text_nodes_under(doc.root())[0];
        doc.set_selection(Some(Range::new(
            Position::new(text, 0),
            Position::new(text, 3),
        )));
        let command = Command::SetColor {
            target: ColorTarget::Background,
            color: "#FfCc00".to_owned(),
        };
        assert!(dispatcher.dispatch(&mut doc, &command).is_ok());
        assert_eq!(
            serialize_document(&doc),
            "<p><span style=\"background-color: #FfCc00;\">abc</span></p>"
        );
    }

    #[test]
    fn typing_after_a_size_anchor_uses_the_size() {
        let dispatcher = CommandDispatcher::default();
        let mut doc = loaded("<p>Hello</p>");
        let text = doc.text_nodes_under(doc.root())[0];
        doc.set_caret(Position::new(text, 5));
        assert!(dispatcher.dispatch(&mut doc, &Command::SetFontSize(18)).is_ok());
        assert!(dispatcher
            .dispatch(&mut doc, &Command::InsertText("!".to_owned()))
            .is_ok());
        assert_eq!(
            serialize_document(&doc),
            "<p>Hello<span style=\"font-size: 18pt;\">!</span></p>"
        );
        let snapshot = dispatcher.snapshot(&doc).unwrap_or_default();
        assert_eq!(snapshot.font_size, 18);
    }

    #[test]
    fn config_validation_rejects_blank_family() {
        let config = CommandConfig {
            default_font_family: " ".to_owned(),
            ..CommandConfig::default()
        };
        assert!(CommandDispatcher::new(config).is_err());
    }
}
