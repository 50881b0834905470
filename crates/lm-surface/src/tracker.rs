use lm_commands::CommandDispatcher;
use lm_core::EditorError;
use lm_core::EditorResult;
use lm_core::FormattingSnapshot;
use lm_dom::Document;
use lm_dom::Range;
use lm_ipc::EditorEvent;
use std::time::Duration;
use std::time::Instant;
use tracing::trace;

const MAX_DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Selection-only changes closer together than this are merged.
    pub debounce: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            debounce: MAX_DEBOUNCE,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> EditorResult<()> {
        if self.debounce > MAX_DEBOUNCE {
            return Err(EditorError::invalid_argument(
                "surface.tracker.debounce",
                format!(
                    "selection debounce of {} ms exceeds {} ms",
                    self.debounce.as_millis(),
                    MAX_DEBOUNCE.as_millis()
                ),
            ));
        }
        Ok(())
    }
}

/// Derives `content-changed` and `selection-changed` at the end of each
/// input burst.
///
/// Content is compared by serialization, so a burst that leaves the HTML
/// untouched emits nothing. A content change is always followed by a
/// snapshot in the same burst; selection-only moves inside the debounce
/// window are held until [`SelectionTracker::flush`] or the next burst.
#[derive(Debug)]
pub struct SelectionTracker {
    config: TrackerConfig,
    last_html: Option<String>,
    last_selection: Option<Range>,
    last_snapshot: Option<FormattingSnapshot>,
    last_emit: Option<Instant>,
    pending: bool,
}

impl SelectionTracker {
    pub fn new(config: TrackerConfig) -> EditorResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            last_html: None,
            last_selection: None,
            last_snapshot: None,
            last_emit: None,
            pending: false,
        })
    }

    /// New baseline after a load; the next burst compares against `html`.
    pub fn reset(&mut self, html: &str) {
        self.last_html = Some(html.to_owned());
        self.last_selection = None;
        self.last_snapshot = None;
        self.last_emit = None;
        self.pending = false;
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }

    pub fn last_snapshot(&self) -> Option<&FormattingSnapshot> {
        self.last_snapshot.as_ref()
    }

    pub fn end_burst(
        &mut self,
        doc: &Document,
        dispatcher: &CommandDispatcher,
        html: &str,
        now: Instant,
    ) -> Vec<EditorEvent> {
        let mut events = Vec::new();
        let content_changed = self.last_html.as_deref() != Some(html);
        if content_changed {
            self.last_html = Some(html.to_owned());
            events.push(EditorEvent::ContentChanged);
        }

        let selection = doc.selection_in_root();
        let moved = selection != self.last_selection;
        if !(content_changed || moved || self.pending) {
            return events;
        }
        let within_window = self
            .last_emit
            .is_some_and(|at| now.saturating_duration_since(at) < self.config.debounce);
        if !content_changed && within_window {
            trace!("selection change debounced");
            self.pending = true;
            self.last_selection = selection;
            return events;
        }
        if let Some(event) = self.emit(doc, dispatcher, selection, now) {
            events.push(event);
        }
        events
    }

    /// Delivers a held selection change once the window has passed.
    pub fn flush(&mut self, doc: &Document, dispatcher: &CommandDispatcher, now: Instant) -> Option<EditorEvent> {
        if !self.pending {
            return None;
        }
        let ready = self
            .last_emit
            .is_none_or(|at| now.saturating_duration_since(at) >= self.config.debounce);
        if !ready {
            return None;
        }
        self.emit(doc, dispatcher, doc.selection_in_root(), now)
    }

    fn emit(
        &mut self,
        doc: &Document,
        dispatcher: &CommandDispatcher,
        selection: Option<Range>,
        now: Instant,
    ) -> Option<EditorEvent> {
        self.pending = false;
        self.last_selection = selection;
        // Selections outside the editable root are ignored.
        let snapshot = dispatcher.snapshot(doc).ok()?;
        self.last_emit = Some(now);
        self.last_snapshot = Some(snapshot.clone());
        Some(EditorEvent::SelectionChanged(snapshot))
    }
}
