//! Host-facing editor: every editing command, undo/redo and status
//! reporting on top of one rendering surface.
//!
//! Commands that find no selection are ignored. Every other failure is
//! posted on the `status` channel and returned to the caller; none of
//! them is fatal to the editor.

use lm_commands::Command;
use lm_core::Alignment;
use lm_core::BlockStyle;
use lm_core::CaseMode;
use lm_core::ColorTarget;
use lm_core::EditorError;
use lm_core::EditorResult;
use lm_core::FormattingSnapshot;
use lm_core::InlineStyle;
use lm_core::Key;
use lm_core::ListKind;
use lm_core::Modifiers;
use lm_core::SpacingScope;
use lm_core::Theme;
use lm_dom::NodeId;
use lm_dom::Position;
use lm_dom::Range;
use lm_history::History;
use lm_history::HistorySizes;
use lm_history::StepOutcome;
use lm_ipc::Channel;
use lm_ipc::EditorEvent;
use lm_ipc::LocalEndpoint;
use lm_layout::Point;
use lm_layout::Viewport;
use lm_objects::BorderUpdate;
use lm_objects::ColorEffect;
use lm_objects::ColumnPosition;
use lm_objects::ImageSpec;
use lm_objects::LayoutMode;
use lm_objects::MarginUpdate;
use lm_objects::Margins;
use lm_objects::ObjectInfo;
use lm_objects::ObjectProperty;
use lm_objects::RowPosition;
use lm_objects::TableBorderInfo;
use lm_objects::TableColorTarget;
use lm_objects::TableColors;
use lm_objects::TableSpec;
use lm_overlay::OverlayFrame;
use lm_surface::Evaluation;
use lm_surface::RenderingSurface;
use tracing::debug;
use tracing::warn;

mod config;

pub use config::EditorConfig;

/// Completion status of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Applied,
    /// Nothing to act on; the document is unchanged.
    Ignored,
}

/// One editing session.
#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    surface: RenderingSurface,
    history: History,
    events: Vec<EditorEvent>,
}

impl Editor {
    pub fn new(config: EditorConfig) -> EditorResult<Self> {
        config.validate()?;
        let surface = RenderingSurface::new(config.surface.clone())?;
        let mut history = History::new(config.history);
        history.reset(&surface.serialize());
        Ok(Self {
            config,
            surface,
            history,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn surface(&self) -> &RenderingSurface {
        &self.surface
    }

    /// Events emitted since the last call, in delivery order.
    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    // -----------------------------------------------------------------
    // Event plumbing
    // -----------------------------------------------------------------

    /// Moves surface events into the outbox and records history.
    fn absorb(&mut self) {
        for event in self.surface.take_events() {
            if event == EditorEvent::ContentChanged && !self.history.is_restoring() {
                let html = self.surface.serialize();
                if self.history.snapshot(&html) {
                    debug!(undo = self.history.sizes().undo, "history snapshot");
                }
            }
            self.events.push(event);
        }
    }

    /// Reports a failure on the status channel. `NoSelection` is returned
    /// as is; callers decide whether it counts as ignored.
    fn report<T>(&mut self, operation: &str, result: EditorResult<T>) -> EditorResult<T> {
        if let Err(error) = &result {
            if !error.is_no_selection() {
                warn!(operation, code = error.code, kind = error.kind.as_str(), "{}", error.message);
                self.surface.deliver(lm_ipc::status(error));
            }
        }
        self.absorb();
        result
    }

    fn finish(&mut self, operation: &str, result: EditorResult<()>) -> EditorResult<CommandStatus> {
        match self.report(operation, result) {
            Ok(()) => Ok(CommandStatus::Applied),
            Err(error) if error.is_no_selection() => {
                debug!(operation, "no selection; command ignored");
                Ok(CommandStatus::Ignored)
            }
            Err(error) => Err(error),
        }
    }

    /// Emits a selection change held back by debouncing.
    pub fn flush_pending(&mut self) {
        self.surface.flush_pending();
        self.absorb();
    }

    // -----------------------------------------------------------------
    // Document
    // -----------------------------------------------------------------

    /// Replaces the document and starts a fresh history. On failure the
    /// empty document is installed and the error is reported.
    pub fn load_initial(&mut self, html: &str) -> EditorResult<()> {
        let result = self.surface.load_initial(html);
        self.history.reset(&self.surface.serialize());
        self.report("loadInitial", result)
    }

    pub fn serialize(&self) -> String {
        self.surface.serialize()
    }

    pub fn plain_text(&self) -> String {
        self.surface.plain_text()
    }

    pub fn focus(&mut self) {
        self.surface.focus();
        self.absorb();
    }

    pub fn set_caret_initial(&mut self) {
        self.surface.set_caret_initial();
        self.absorb();
    }

    pub fn set_selection(&mut self, range: Range) -> EditorResult<()> {
        let result = self.surface.set_selection(range);
        self.report("setSelection", result)
    }

    pub fn collapse_to(&mut self, position: Position) -> EditorResult<()> {
        let result = self.surface.collapse_to(position);
        self.report("collapseTo", result)
    }

    pub fn selection(&self) -> Option<Range> {
        self.surface.selection()
    }

    /// Formatting state at the selection start.
    pub fn snapshot(&self) -> EditorResult<FormattingSnapshot> {
        self.surface.snapshot()
    }

    // -----------------------------------------------------------------
    // Formatting and text
    // -----------------------------------------------------------------

    /// Runs any dispatcher command.
    pub fn execute(&mut self, command: &Command) -> EditorResult<CommandStatus> {
        debug!(command = command.name(), "dispatch");
        let result = self.surface.dispatch(command);
        self.finish(command.name(), result)
    }

    pub fn toggle_bold(&mut self) -> EditorResult<CommandStatus> {
        self.execute(&Command::ToggleInline(InlineStyle::Bold))
    }

    pub fn toggle_italic(&mut self) -> EditorResult<CommandStatus> {
        self.execute(&Command::ToggleInline(InlineStyle::Italic))
    }

    pub fn toggle_underline(&mut self) -> EditorResult<CommandStatus> {
        self.execute(&Command::ToggleInline(InlineStyle::Underline))
    }

    pub fn toggle_strikethrough(&mut self) -> EditorResult<CommandStatus> {
        self.execute(&Command::ToggleInline(InlineStyle::Strikethrough))
    }

    pub fn toggle_subscript(&mut self) -> EditorResult<CommandStatus> {
        self.execute(&Command::ToggleInline(InlineStyle::Subscript))
    }

    pub fn toggle_superscript(&mut self) -> EditorResult<CommandStatus> {
        self.execute(&Command::ToggleInline(InlineStyle::Superscript))
    }

    pub fn set_block_style(&mut self, style: BlockStyle) -> EditorResult<CommandStatus> {
        self.execute(&Command::SetBlockStyle(style))
    }

    pub fn set_font_family(&mut self, family: &str) -> EditorResult<CommandStatus> {
        self.execute(&Command::SetFontFamily(family.to_owned()))
    }

    /// Point size. On a collapsed selection the next typed text gets it.
    pub fn set_font_size(&mut self, points: u32) -> EditorResult<CommandStatus> {
        self.execute(&Command::SetFontSize(points))
    }

    pub fn toggle_list(&mut self, kind: ListKind) -> EditorResult<CommandStatus> {
        self.execute(&Command::ToggleList(kind))
    }

    pub fn indent(&mut self) -> EditorResult<CommandStatus> {
        self.execute(&Command::Indent)
    }

    pub fn outdent(&mut self) -> EditorResult<CommandStatus> {
        self.execute(&Command::Outdent)
    }

    pub fn set_alignment(&mut self, alignment: Alignment) -> EditorResult<CommandStatus> {
        self.execute(&Command::SetAlignment(alignment))
    }

    pub fn set_color(&mut self, target: ColorTarget, color: &str) -> EditorResult<CommandStatus> {
        self.execute(&Command::SetColor {
            target,
            color: color.to_owned(),
        })
    }

    pub fn clear_formatting(&mut self) -> EditorResult<CommandStatus> {
        self.execute(&Command::ClearFormatting)
    }

    pub fn change_case(&mut self, mode: CaseMode) -> EditorResult<CommandStatus> {
        self.execute(&Command::ChangeCase(mode))
    }

    pub fn set_paragraph_spacing(&mut self, px: f32, scope: SpacingScope) -> EditorResult<CommandStatus> {
        self.execute(&Command::SetParagraphSpacing { px, scope })
    }

    pub fn set_line_spacing(&mut self, multiplier: f32, scope: SpacingScope) -> EditorResult<CommandStatus> {
        self.execute(&Command::SetLineSpacing { multiplier, scope })
    }

    /// Column count for the containing block; zero removes the layout.
    pub fn set_columns(&mut self, count: u32) -> EditorResult<CommandStatus> {
        self.execute(&Command::SetColumns(count))
    }

    pub fn insert_text(&mut self, text: &str) -> EditorResult<CommandStatus> {
        self.execute(&Command::InsertText(text.to_owned()))
    }

    pub fn delete_backward(&mut self) -> EditorResult<CommandStatus> {
        self.execute(&Command::DeleteBackward)
    }

    pub fn delete_forward(&mut self) -> EditorResult<CommandStatus> {
        self.execute(&Command::DeleteForward)
    }

    pub fn insert_paragraph(&mut self) -> EditorResult<CommandStatus> {
        self.execute(&Command::InsertParagraph)
    }

    pub fn insert_line_break(&mut self) -> EditorResult<CommandStatus> {
        self.execute(&Command::InsertLineBreak)
    }

    pub fn select_all(&mut self) -> EditorResult<CommandStatus> {
        self.execute(&Command::SelectAll)
    }

    // -----------------------------------------------------------------
    // Insertion
    // -----------------------------------------------------------------

    /// Inserts an image at the caret and makes it the active object.
    pub fn insert_image(&mut self, spec: &ImageSpec) -> EditorResult<CommandStatus> {
        let result = self.surface.with_objects(|objects, doc, layout| {
            let node = objects.insert_image(doc, layout, spec)?;
            objects.activate(doc, layout, node)
        });
        self.finish("insertImage", result)
    }

    pub fn insert_text_box(&mut self, text: &str) -> EditorResult<CommandStatus> {
        let result = self.surface.with_objects(|objects, doc, layout| {
            let node = objects.insert_text_box(doc, text)?;
            objects.activate(doc, layout, node)
        });
        self.finish("insertTextBox", result)
    }

    pub fn insert_table(&mut self, spec: &TableSpec) -> EditorResult<CommandStatus> {
        let result = self.surface.with_objects(|objects, doc, layout| {
            let node = objects.insert_table(doc, layout, spec)?;
            objects.activate(doc, layout, node)
        });
        self.finish("insertTable", result)
    }

    // -----------------------------------------------------------------
    // History
    // -----------------------------------------------------------------

    pub fn undo(&mut self) -> EditorResult<StepOutcome> {
        let (outcome, state) = self.history.undo();
        if let Some(html) = state {
            self.restore("undo", &html)?;
        }
        Ok(outcome)
    }

    pub fn redo(&mut self) -> EditorResult<StepOutcome> {
        let (outcome, state) = self.history.redo();
        if let Some(html) = state {
            self.restore("redo", &html)?;
        }
        Ok(outcome)
    }

    fn restore(&mut self, operation: &str, html: &str) -> EditorResult<()> {
        self.history.begin_restore();
        let result = self.surface.restore(html);
        self.absorb();
        self.history.end_restore();
        if result.is_ok() {
            self.history.replace_current(&self.surface.serialize());
        }
        self.report(operation, result)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn stack_sizes(&self) -> HistorySizes {
        self.history.sizes()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // -----------------------------------------------------------------
    // Active object
    // -----------------------------------------------------------------

    pub fn active_object(&self) -> Option<ObjectInfo> {
        self.surface.active_object()
    }

    pub fn object_properties(&mut self) -> EditorResult<serde_json::Value> {
        let result = self.surface.object_properties();
        self.report("objectProperties", result)
    }

    /// Applies a property in its string form, e.g. `("radius", "8px")`.
    pub fn object_apply(&mut self, name: &str, value: &str) -> EditorResult<()> {
        let result = ObjectProperty::parse(name, value).and_then(|property| {
            self.surface
                .with_objects(|objects, doc, layout| objects.apply(doc, layout, &property))
        });
        self.report("objectApply", result)
    }

    pub fn object_set_alignment(&mut self, mode: LayoutMode) -> EditorResult<()> {
        let result = self
            .surface
            .with_objects(|objects, doc, layout| objects.set_alignment(doc, layout, mode));
        self.report("objectSetAlignment", result)
    }

    pub fn object_set_floating(&mut self) -> EditorResult<()> {
        let result = self
            .surface
            .with_objects(|objects, doc, layout| objects.set_floating(doc, layout));
        self.report("objectSetFloating", result)
    }

    pub fn object_set_border(&mut self, update: BorderUpdate) -> EditorResult<()> {
        let result = self
            .surface
            .with_objects(|objects, doc, layout| objects.set_border(doc, layout, update));
        self.report("objectSetBorder", result)
    }

    pub fn object_set_shadow(&mut self, on: bool) -> EditorResult<()> {
        let result = self
            .surface
            .with_objects(|objects, doc, layout| objects.set_shadow(doc, layout, on));
        self.report("objectSetShadow", result)
    }

    pub fn object_set_radius(&mut self, px: f32) -> EditorResult<()> {
        let result = self
            .surface
            .with_objects(|objects, doc, layout| objects.set_radius(doc, layout, px));
        self.report("objectSetRadius", result)
    }

    pub fn object_set_margins(&mut self, update: MarginUpdate) -> EditorResult<()> {
        let result = self
            .surface
            .with_objects(|objects, doc, layout| objects.set_margins(doc, layout, update));
        self.report("objectSetMargins", result)
    }

    pub fn object_set_background(&mut self, color: &str) -> EditorResult<()> {
        let result = self
            .surface
            .with_objects(|objects, doc, layout| objects.set_background(doc, layout, color));
        self.report("objectSetBackground", result)
    }

    /// Images only.
    pub fn object_reset_size(&mut self) -> EditorResult<()> {
        let result = self
            .surface
            .with_objects(|objects, doc, layout| objects.reset_size(doc, layout));
        self.report("objectResetSize", result)
    }

    /// Returns the new z-index. Non-floating objects start floating.
    pub fn object_bring_forward(&mut self) -> EditorResult<i32> {
        let result = self
            .surface
            .with_objects(|objects, doc, layout| objects.bring_forward(doc, layout));
        self.report("objectBringForward", result)
    }

    pub fn object_send_backward(&mut self) -> EditorResult<i32> {
        let result = self
            .surface
            .with_objects(|objects, doc, layout| objects.send_backward(doc, layout));
        self.report("objectSendBackward", result)
    }

    pub fn object_delete(&mut self) -> EditorResult<()> {
        let result = self.surface.with_objects(|objects, doc, _| objects.delete(doc));
        self.report("objectDelete", result)
    }

    pub fn image_set_color_effect(&mut self, effect: ColorEffect) -> EditorResult<()> {
        let result = self
            .surface
            .with_objects(|objects, doc, layout| objects.image_set_color_effect(doc, layout, effect));
        self.report("imageSetColorEffect", result)
    }

    // -----------------------------------------------------------------
    // Text box
    // -----------------------------------------------------------------

    pub fn text_box_edit(&mut self) -> EditorResult<()> {
        let result = self.surface.with_objects(|objects, doc, _| objects.text_box_edit(doc));
        self.report("textBoxEdit", result)
    }

    pub fn text_box_commit(&mut self) -> EditorResult<()> {
        let result = self.surface.with_objects(|objects, doc, _| objects.text_box_commit(doc));
        self.report("textBoxCommit", result)
    }

    pub fn text_box_cancel(&mut self) -> EditorResult<()> {
        let result = self.surface.with_objects(|objects, doc, _| objects.text_box_cancel(doc));
        self.report("textBoxCancel", result)
    }

    // -----------------------------------------------------------------
    // Table
    // -----------------------------------------------------------------

    pub fn table_add_row(&mut self, position: RowPosition) -> EditorResult<()> {
        let result = self
            .surface
            .with_objects(|objects, doc, layout| objects.table_add_row(doc, layout, position));
        self.report("tableAddRow", result)
    }

    pub fn table_add_column(&mut self, position: ColumnPosition) -> EditorResult<()> {
        let result = self
            .surface
            .with_objects(|objects, doc, layout| objects.table_add_column(doc, layout, position));
        self.report("tableAddColumn", result)
    }

    /// Deletes row `index`, or the current cell's row.
    pub fn table_delete_row(&mut self, index: Option<usize>) -> EditorResult<()> {
        let result = self
            .surface
            .with_objects(|objects, doc, layout| objects.table_delete_row(doc, layout, index));
        self.report("tableDeleteRow", result)
    }

    pub fn table_delete_column(&mut self, index: Option<usize>) -> EditorResult<()> {
        let result = self
            .surface
            .with_objects(|objects, doc, layout| objects.table_delete_column(doc, layout, index));
        self.report("tableDeleteColumn", result)
    }

    pub fn table_delete(&mut self) -> EditorResult<()> {
        let result = self.surface.with_objects(|objects, doc, _| objects.table_delete(doc));
        self.report("tableDelete", result)
    }

    /// Each call replaces the visible line set.
    pub fn table_set_border_sides<S: AsRef<str>>(&mut self, sides: &[S]) -> EditorResult<()> {
        let result = self
            .surface
            .with_objects(|objects, doc, layout| objects.table_set_border_sides(doc, layout, sides));
        self.report("tableSetBorderSides", result)
    }

    pub fn table_set_color(&mut self, target: TableColorTarget, color: &str) -> EditorResult<()> {
        let result = self
            .surface
            .with_objects(|objects, doc, layout| objects.table_set_color(doc, layout, target, color));
        self.report("tableSetColor", result)
    }

    pub fn table_get_colors(&mut self) -> EditorResult<TableColors> {
        let result = self.surface.query_objects(|objects, doc| objects.table_colors(doc));
        self.report("tableGetColors", result)
    }

    pub fn table_get_border_style(&mut self) -> EditorResult<TableBorderInfo> {
        let result = self.surface.query_objects(|objects, doc| objects.table_border_style(doc));
        self.report("tableGetBorderStyle", result)
    }

    pub fn table_get_margins(&mut self) -> EditorResult<Margins> {
        let result = self.surface.query_objects(|objects, doc| objects.table_margins(doc));
        self.report("tableGetMargins", result)
    }

    // -----------------------------------------------------------------
    // Gestures
    // -----------------------------------------------------------------

    pub fn pointer_down(&mut self, target: Option<NodeId>, point: Point) -> EditorResult<()> {
        let result = self.surface.pointer_down(target, point);
        self.report("pointerDown", result)
    }

    pub fn pointer_move(&mut self, point: Point, modifiers: Modifiers) {
        self.surface.pointer_move(point, modifiers);
    }

    pub fn pointer_up(&mut self) {
        self.surface.pointer_up();
        self.absorb();
    }

    pub fn double_click(&mut self, target: NodeId) -> EditorResult<()> {
        let result = self.surface.double_click(target);
        self.report("doubleClick", result)
    }

    /// Editor shortcuts first, then object and text keys.
    pub fn key_down(&mut self, key: Key, modifiers: Modifiers) -> EditorResult<()> {
        if modifiers.ctrl && !modifiers.alt {
            if let Key::Char(ch) = key {
                match ch.to_ascii_lowercase() {
                    'z' if modifiers.shift => return self.redo().map(|_| ()),
                    'z' => return self.undo().map(|_| ()),
                    'y' => return self.redo().map(|_| ()),
                    'b' => return self.toggle_bold().map(|_| ()),
                    'i' => return self.toggle_italic().map(|_| ()),
                    'u' => return self.toggle_underline().map(|_| ()),
                    _ => {}
                }
            }
        }
        let result = self.surface.key_down(key, modifiers);
        match self.report("keyDown", result) {
            Err(error) if error.is_no_selection() => Ok(()),
            other => other,
        }
    }

    // -----------------------------------------------------------------
    // View
    // -----------------------------------------------------------------

    /// Re-derives object colors for `theme`. The switch is not an undo
    /// step; the current history entry is rewritten instead.
    pub fn set_theme(&mut self, theme: Theme) {
        self.config.surface.theme = theme;
        self.history.begin_restore();
        self.surface.set_theme(theme);
        self.absorb();
        self.history.end_restore();
        self.history.replace_current(&self.surface.serialize());
    }

    pub fn theme(&self) -> Theme {
        self.surface.theme()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.config.surface.viewport = viewport;
        self.surface.set_viewport(viewport);
    }

    pub fn overlay_frame(&self) -> OverlayFrame {
        self.surface.overlay_frame()
    }

    // -----------------------------------------------------------------
    // Scripts and host channel
    // -----------------------------------------------------------------

    /// Evaluates `expression` on the surface. Script failures are reported
    /// and returned; the editor keeps running.
    pub fn evaluate(&mut self, expression: &str) -> EditorResult<Evaluation> {
        let result = self.surface.evaluate(expression);
        if let Err(error) = &result {
            warn!(expression, code = error.code, "script evaluation failed");
        }
        self.report("evaluate", result)
    }

    pub fn on_message(&mut self, channel: Channel, handler: impl FnMut(&serde_json::Value) + 'static) {
        self.surface.on_message(channel, handler);
    }

    /// Posts an event as if a surface script had sent it.
    pub fn post_to_host(&mut self, channel: &str, payload: serde_json::Value) -> EditorResult<()> {
        let result = self.surface.post_to_host(channel, payload);
        self.report("postToHost", result)
    }

    /// Opens the framed in-process host channel. Every later event is also
    /// sent there.
    pub fn connect_host(&mut self) -> EditorResult<LocalEndpoint> {
        let result = self.surface.connect_host(self.config.max_message_bytes);
        self.report("connectHost", result)
    }

    /// Raises an advisory status message without a failing command.
    pub fn notify(&mut self, error: &EditorError) {
        self.surface.deliver(lm_ipc::status(error));
        self.absorb();
    }
}

#[cfg(test)]
mod tests {
    use super::CommandStatus;
    use super::Editor;
    use super::EditorConfig;
    use lm_core::ErrorKind;
    use lm_core::Key;
    use lm_core::Modifiers;
    use lm_dom::Position;
    use lm_ipc::EditorEvent;

    const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
        alt: false,
    };

    fn editor(html: &str) -> Editor {
        let mut editor = Editor::new(EditorConfig::default()).unwrap_or_else(|_| unreachable!());
        assert!(editor.load_initial(html).is_ok());
        let _ = editor.take_events();
        editor
    }

    fn first_text(editor: &Editor) -> u64 {
        let doc = editor.surface().document();
        doc.text_nodes_under(doc.root()).first().copied().unwrap_or_default()
    }

    #[test]
    fn selection_outside_the_document_is_not_reported() {
        let mut editor = editor("<p>abc</p>");
        let text = first_text(&editor);
        let result = editor.collapse_to(Position::new(text, 99));
        assert!(result.is_err_and(|error| error.is_no_selection()));
        assert!(!editor
            .take_events()
            .iter()
            .any(|event| matches!(event, EditorEvent::Status(_))));
    }

    #[test]
    fn object_commands_without_object_report_status() {
        let mut editor = editor("<p>abc</p>");
        let result = editor.object_set_shadow(true);
        assert!(result.is_err_and(|error| error.kind == ErrorKind::NoActiveObject));
        let events = editor.take_events();
        assert!(matches!(
            events.as_slice(),
            [EditorEvent::Status(status)] if status.code == "objects.no_active_object"
        ));
        assert_eq!(editor.serialize(), "<p>abc</p>");
    }

    #[test]
    fn typing_is_recorded_in_history() {
        let mut editor = editor("<p>ab</p>");
        let text = first_text(&editor);
        assert!(editor.collapse_to(Position::new(text, 2)).is_ok());
        assert_eq!(editor.insert_text("c").ok(), Some(CommandStatus::Applied));
        assert_eq!(editor.stack_sizes().undo, 2);

        assert!(editor.key_down(Key::Char('z'), CTRL).is_ok());
        assert_eq!(editor.serialize(), "<p>ab</p>");
        assert!(editor.can_redo());
        assert!(editor.key_down(Key::Char('y'), CTRL).is_ok());
        assert_eq!(editor.serialize(), "<p>abc</p>");
    }

    #[test]
    fn failed_scripts_are_reported_not_fatal() {
        let mut editor = editor("<p>abc</p>");
        let result = editor.evaluate("throw new Error('boom')");
        assert!(result.is_err_and(|error| error.kind == ErrorKind::ScriptError));
        assert!(matches!(editor.take_events().last(), Some(EditorEvent::Status(_))));
        assert!(editor.evaluate("1 + 1").is_ok());
    }
}
