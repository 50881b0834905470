//! The rendering surface: one editable document plus everything that
//! observes or manipulates it.
//!
//! Every public mutation runs as one input burst. When a burst ends the
//! layout is recomputed, the object controller re-syncs its handles and the
//! tracker emits `content-changed` then `selection-changed`; object
//! notifications follow in the same burst.

use lm_commands::Command;
use lm_commands::CommandConfig;
use lm_commands::CommandDispatcher;
use lm_core::EditorResult;
use lm_core::FormattingSnapshot;
use lm_core::Key;
use lm_core::Modifiers;
use lm_core::Theme;
use lm_dom::Document;
use lm_dom::NodeId;
use lm_dom::Position;
use lm_dom::Range;
use lm_html::LoadLimits;
use lm_ipc::Channel;
use lm_ipc::EditorEvent;
use lm_ipc::LocalEndpoint;
use lm_js::EditorGlobals;
use lm_js::EvaluationQueue;
use lm_js::ScriptRuntimeConfig;
use lm_js::ScriptValue;
use lm_layout::LayoutEngine;
use lm_layout::LayoutTree;
use lm_layout::Point;
use lm_layout::Viewport;
use lm_objects::KeyOutcome;
use lm_objects::ObjectConfig;
use lm_objects::ObjectController;
use lm_objects::ObjectEvent;
use lm_objects::ObjectInfo;
use lm_overlay::OverlayFrame;
use std::cmp::Ordering;
use std::time::Instant;
use tracing::info;
use tracing::warn;

mod bridge;
mod tracker;

pub use bridge::EventBridge;
pub use tracker::SelectionTracker;
pub use tracker::TrackerConfig;

/// Everything a surface needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceConfig {
    pub commands: CommandConfig,
    pub objects: ObjectConfig,
    pub scripts: ScriptRuntimeConfig,
    pub tracker: TrackerConfig,
    pub load_limits: LoadLimits,
    pub viewport: Viewport,
    pub theme: Theme,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            commands: CommandConfig::default(),
            objects: ObjectConfig::default(),
            scripts: ScriptRuntimeConfig::default(),
            tracker: TrackerConfig::default(),
            load_limits: LoadLimits::default(),
            viewport: Viewport::default(),
            theme: Theme::default(),
        }
    }
}

impl SurfaceConfig {
    pub fn validate(&self) -> EditorResult<()> {
        self.commands.validate()?;
        self.objects.validate()?;
        self.scripts.validate()?;
        self.tracker.validate()
    }
}

/// What the host receives back from `evaluate`.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: ScriptValue,
    pub replaced: bool,
}

#[derive(Debug)]
pub struct RenderingSurface {
    config: SurfaceConfig,
    doc: Document,
    dispatcher: CommandDispatcher,
    layout_engine: LayoutEngine,
    layout: LayoutTree,
    objects: ObjectController,
    scripts: Option<EvaluationQueue>,
    tracker: SelectionTracker,
    bridge: EventBridge,
}

impl RenderingSurface {
    pub fn new(config: SurfaceConfig) -> EditorResult<Self> {
        config.validate()?;
        let dispatcher = CommandDispatcher::new(config.commands.clone())?;
        let mut objects = ObjectController::new(config.objects.clone())?;
        objects.set_viewport(config.viewport);
        let mut tracker = SelectionTracker::new(config.tracker)?;
        let doc = Document::new();
        tracker.reset(&lm_html::serialize_document(&doc));
        let layout_engine = LayoutEngine::for_viewport(&config.viewport);
        let layout = layout_engine.compute(&doc);
        let mut surface = Self {
            config,
            doc,
            dispatcher,
            layout_engine,
            layout,
            objects,
            scripts: None,
            tracker,
            bridge: EventBridge::default(),
        };
        let theme = surface.config.theme;
        surface.objects.set_theme(&mut surface.doc, &surface.layout, theme);
        Ok(surface)
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn layout(&self) -> &LayoutTree {
        &self.layout
    }

    pub fn objects(&self) -> &ObjectController {
        &self.objects
    }

    pub fn theme(&self) -> Theme {
        self.objects.theme()
    }

    // -----------------------------------------------------------------
    // Bursts
    // -----------------------------------------------------------------

    fn relayout(&mut self) {
        self.layout = self.layout_engine.compute(&self.doc);
    }

    fn forward_object_events(&mut self) {
        for event in self.objects.take_events() {
            let event = match event {
                ObjectEvent::Clicked { kind, properties } => lm_ipc::object_clicked(kind, properties),
                ObjectEvent::Deleted => EditorEvent::ObjectDeleted,
                ObjectEvent::Deactivated => EditorEvent::ObjectsDeactivated,
            };
            self.bridge.deliver(event);
        }
    }

    fn finish_burst(&mut self) {
        self.relayout();
        self.objects.sync(&mut self.doc, &self.layout);
        if self.doc.repair_selection() {
            warn!(
                code = "surface.caret_outside_root",
                "selection left the editable root; moved to document end"
            );
        }
        let html = lm_html::serialize_document(&self.doc);
        let events = self
            .tracker
            .end_burst(&self.doc, &self.dispatcher, &html, Instant::now());
        for event in events {
            self.bridge.deliver(event);
        }
        self.forward_object_events();
    }

    /// Runs `op` against the object controller as one burst. Failed
    /// mutations emit no content events.
    fn object_burst<T>(
        &mut self,
        op: impl FnOnce(&mut ObjectController, &mut Document, &LayoutTree) -> EditorResult<T>,
    ) -> EditorResult<T> {
        let result = op(&mut self.objects, &mut self.doc, &self.layout);
        match result {
            Ok(value) => {
                self.finish_burst();
                Ok(value)
            }
            Err(error) => {
                self.forward_object_events();
                Err(error)
            }
        }
    }

    /// Emits a selection change held back by the debounce window.
    pub fn flush_pending(&mut self) {
        if let Some(event) = self.tracker.flush(&self.doc, &self.dispatcher, Instant::now()) {
            self.bridge.deliver(event);
        }
    }

    // -----------------------------------------------------------------
    // Document
    // -----------------------------------------------------------------

    /// Replaces the document. A load failure leaves the empty document in
    /// place and returns the error.
    pub fn load_initial(&mut self, html: &str) -> EditorResult<()> {
        self.objects.deactivate(&mut self.doc);
        let result = lm_html::load_document(&mut self.doc, html, &self.config.load_limits);
        match &result {
            Ok(()) => info!(bytes = html.len(), "document loaded"),
            Err(error) => warn!(%error, "document load failed; empty document installed"),
        }
        self.relayout();
        let theme = self.objects.theme();
        self.objects.set_theme(&mut self.doc, &self.layout, theme);
        self.tracker.reset(&lm_html::serialize_document(&self.doc));
        self.finish_burst();
        result
    }

    /// Puts back a serialized state without resetting the tracker, so the
    /// change is reported like any other burst. Objects take the current
    /// theme's defaults. The caret goes to the end.
    pub fn restore(&mut self, html: &str) -> EditorResult<()> {
        self.objects.deactivate(&mut self.doc);
        let result = lm_html::load_document(&mut self.doc, html, &self.config.load_limits);
        self.relayout();
        let theme = self.objects.theme();
        self.objects.set_theme(&mut self.doc, &self.layout, theme);
        self.doc.caret_to_end();
        self.finish_burst();
        result
    }

    pub fn serialize(&self) -> String {
        lm_html::serialize_document(&self.doc)
    }

    pub fn plain_text(&self) -> String {
        lm_html::plain_text(&self.doc, self.doc.root())
    }

    /// Gives the root a caret if it has none.
    pub fn focus(&mut self) {
        if self.doc.selection_in_root().is_none() {
            lm_html::set_caret_initial(&mut self.doc);
        }
        self.finish_burst();
    }

    pub fn set_caret_initial(&mut self) {
        lm_html::set_caret_initial(&mut self.doc);
        self.finish_burst();
    }

    pub fn set_selection(&mut self, range: Range) -> EditorResult<()> {
        lm_commands::set_selection(&mut self.doc, range)?;
        self.finish_burst();
        Ok(())
    }

    pub fn collapse_to(&mut self, position: Position) -> EditorResult<()> {
        lm_commands::collapse_to(&mut self.doc, position)?;
        self.finish_burst();
        Ok(())
    }

    pub fn selection(&self) -> Option<Range> {
        self.doc.selection_in_root()
    }

    pub fn dispatch(&mut self, command: &Command) -> EditorResult<()> {
        self.dispatcher.dispatch(&mut self.doc, command)?;
        self.finish_burst();
        Ok(())
    }

    pub fn snapshot(&self) -> EditorResult<FormattingSnapshot> {
        self.dispatcher.snapshot(&self.doc)
    }

    // -----------------------------------------------------------------
    // Scripts and channels
    // -----------------------------------------------------------------

    fn globals(&self) -> EditorGlobals {
        EditorGlobals {
            html: self.serialize(),
            text: self.plain_text(),
            selection_text: selected_text(&self.doc),
        }
    }

    /// Evaluates `expression` on the script worker. Messages it posted are
    /// delivered and an `editor.replaceHtml` call is applied as one burst.
    pub fn evaluate(&mut self, expression: &str) -> EditorResult<Evaluation> {
        let queue = match self.scripts.take() {
            Some(queue) => queue,
            None => EvaluationQueue::spawn(self.config.scripts.clone())?,
        };
        let outcome = queue.evaluate(expression, self.globals());
        self.scripts = Some(queue);
        let outcome = outcome?;

        for message in outcome.messages {
            if let Err(error) = self.bridge.post(&message.channel, message.payload) {
                warn!(channel = %message.channel, %error, "dropped script message");
            }
        }
        let replaced = match outcome.replacement_html {
            Some(html) => {
                self.restore(&html)?;
                true
            }
            None => false,
        };
        Ok(Evaluation {
            value: outcome.value,
            replaced,
        })
    }

    pub fn on_message(&mut self, channel: Channel, handler: impl FnMut(&serde_json::Value) + 'static) {
        self.bridge.on_message(channel, handler);
    }

    pub fn post_to_host(&mut self, channel: &str, payload: serde_json::Value) -> EditorResult<()> {
        self.bridge.post(channel, payload)
    }

    pub fn deliver(&mut self, event: EditorEvent) {
        self.bridge.deliver(event);
    }

    pub fn connect_host(&mut self, max_message_bytes: usize) -> EditorResult<LocalEndpoint> {
        self.bridge.connect(max_message_bytes)
    }

    /// Events delivered since the last call.
    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        self.bridge.take_events()
    }

    // -----------------------------------------------------------------
    // Gestures
    // -----------------------------------------------------------------

    pub fn pointer_down(&mut self, target: Option<NodeId>, point: Point) -> EditorResult<()> {
        self.object_burst(|objects, doc, layout| objects.pointer_down(doc, layout, point, target))
            .map(|_| ())
    }

    /// Moves are not bursts; the gesture's result is reported on release.
    pub fn pointer_move(&mut self, point: Point, modifiers: Modifiers) {
        if self.objects.pointer_move(&mut self.doc, &self.layout, point, modifiers) {
            self.relayout();
        }
    }

    pub fn pointer_up(&mut self) {
        self.objects.pointer_up(&mut self.doc, &self.layout);
        self.finish_burst();
    }

    pub fn double_click(&mut self, target: NodeId) -> EditorResult<()> {
        self.object_burst(|objects, doc, layout| objects.double_click(doc, layout, target))
            .map(|_| ())
    }

    /// Object keys first; otherwise the key edits text.
    pub fn key_down(&mut self, key: Key, modifiers: Modifiers) -> EditorResult<()> {
        if self.objects.key_down(&mut self.doc, key, modifiers)? == KeyOutcome::Handled {
            self.finish_burst();
            return Ok(());
        }
        let command = match key {
            Key::Enter if modifiers.shift => Command::InsertLineBreak,
            Key::Enter => Command::InsertParagraph,
            Key::Backspace => Command::DeleteBackward,
            Key::Delete => Command::DeleteForward,
            Key::Char(ch) if !modifiers.ctrl && !modifiers.alt => Command::InsertText(ch.to_string()),
            _ => return Ok(()),
        };
        self.dispatch(&command)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.config.viewport = viewport;
        self.layout_engine = LayoutEngine::for_viewport(&viewport);
        self.objects.set_viewport(viewport);
        self.relayout();
        self.objects.sync(&mut self.doc, &self.layout);
    }

    pub fn set_theme(&mut self, theme: Theme) {
        info!(theme = theme.as_str(), "theme changed");
        self.config.theme = theme;
        self.objects.set_theme(&mut self.doc, &self.layout, theme);
        self.finish_burst();
    }

    pub fn overlay_frame(&self) -> OverlayFrame {
        self.objects.overlay().frame()
    }

    // -----------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------

    pub fn with_objects<T>(
        &mut self,
        op: impl FnOnce(&mut ObjectController, &mut Document, &LayoutTree) -> EditorResult<T>,
    ) -> EditorResult<T> {
        self.object_burst(op)
    }

    pub fn active_object(&self) -> Option<ObjectInfo> {
        self.objects.active_info(&self.doc, &self.layout)
    }

    pub fn object_properties(&self) -> EditorResult<serde_json::Value> {
        self.objects.properties(&self.doc, &self.layout)
    }

    /// Read-only queries against the controller.
    pub fn query_objects<T>(&self, op: impl FnOnce(&ObjectController, &Document) -> T) -> T {
        op(&self.objects, &self.doc)
    }
}

/// Text covered by a non-collapsed selection.
fn selected_text(doc: &Document) -> String {
    let Some(range) = doc.selection_in_root().filter(|range| !range.is_collapsed()) else {
        return String::new();
    };
    let mut out = String::new();
    for text in doc.text_nodes_under(doc.root()) {
        let len = doc.node_length(text);
        let after_start = doc.compare_positions(Position::new(text, len), range.start) == Ordering::Greater;
        let before_end = doc.compare_positions(Position::new(text, 0), range.end) == Ordering::Less;
        if !(after_start && before_end) {
            continue;
        }
        let from = if range.start.node == text { range.start.offset } else { 0 };
        let to = if range.end.node == text { range.end.offset } else { len };
        let value = doc.text(text).unwrap_or_default();
        out.extend(value.chars().skip(from).take(to.saturating_sub(from)));
    }
    out
}
