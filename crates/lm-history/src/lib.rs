//! Snapshot-based undo/redo.
//!
//! Entries are serialized HTML of the editable root. The top of the undo
//! stack always mirrors the current document.

use lm_core::EditorError;
use lm_core::EditorResult;
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_entries: 100 }
    }
}

impl HistoryConfig {
    pub fn validate(&self) -> EditorResult<()> {
        if self.max_entries < 2 {
            return Err(EditorError::invalid_argument(
                "history.max_entries_invalid",
                "history needs room for at least two entries",
            ));
        }
        Ok(())
    }
}

/// Result of an undo or redo step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub ok: bool,
    pub at_initial: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistorySizes {
    pub undo: usize,
    pub redo: usize,
}

#[derive(Debug, Clone)]
pub struct History {
    config: HistoryConfig,
    undo: VecDeque<String>,
    redo: Vec<String>,
    restoring: bool,
}

impl Default for History {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl History {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            config,
            undo: VecDeque::new(),
            redo: Vec::new(),
            restoring: false,
        }
    }

    /// Drops both stacks and seeds `undo` with the loaded document.
    pub fn reset(&mut self, html: &str) {
        self.undo.clear();
        self.redo.clear();
        self.undo.push_back(html.to_owned());
        self.restoring = false;
    }

    /// Records a document state. Skipped while restoring and when the state
    /// equals the current top. Returns true when an entry was pushed.
    pub fn snapshot(&mut self, html: &str) -> bool {
        if self.restoring {
            tracing::trace!("snapshot suppressed during restore");
            return false;
        }
        if self.undo.back().is_some_and(|top| top == html) {
            return false;
        }

        self.undo.push_back(html.to_owned());
        self.redo.clear();
        while self.undo.len() > self.config.max_entries {
            self.undo.pop_front();
        }
        true
    }

    /// Steps back. Returns the state to restore, if any.
    pub fn undo(&mut self) -> (StepOutcome, Option<String>) {
        if self.undo.len() <= 1 {
            return (
                StepOutcome {
                    ok: false,
                    at_initial: true,
                },
                None,
            );
        }

        if let Some(top) = self.undo.pop_back() {
            self.redo.push(top);
        }
        let state = self.undo.back().cloned();
        (
            StepOutcome {
                ok: true,
                at_initial: self.undo.len() == 1,
            },
            state,
        )
    }

    pub fn redo(&mut self) -> (StepOutcome, Option<String>) {
        let Some(state) = self.redo.pop() else {
            return (
                StepOutcome {
                    ok: false,
                    at_initial: self.undo.len() <= 1,
                },
                None,
            );
        };

        self.undo.push_back(state.clone());
        while self.undo.len() > self.config.max_entries {
            self.undo.pop_front();
        }
        (
            StepOutcome {
                ok: true,
                at_initial: false,
            },
            Some(state),
        )
    }

    /// Rewrites the current state in place, leaving both stacks' depths
    /// and the redo entries untouched. Used for changes that are not edits.
    pub fn replace_current(&mut self, html: &str) {
        match self.undo.back_mut() {
            Some(top) => html.clone_into(top),
            None => self.undo.push_back(html.to_owned()),
        }
    }

    /// Suppresses snapshots until [`History::end_restore`].
    pub fn begin_restore(&mut self) {
        self.restoring = true;
    }

    pub fn end_restore(&mut self) {
        self.restoring = false;
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    pub fn sizes(&self) -> HistorySizes {
        HistorySizes {
            undo: self.undo.len(),
            redo: self.redo.len(),
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.undo.back().map(String::as_str)
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::History;
    use super::HistoryConfig;
    use super::HistorySizes;
    use proptest::prelude::*;

    #[test]
    fn undo_walks_back_to_initial() {
        let mut history = History::default();
        history.reset("<p>a</p>");
        assert!(history.snapshot("<p>ab</p>"));
        assert!(!history.snapshot("<p>ab</p>"));

        let (outcome, state) = history.undo();
        assert!(outcome.ok && outcome.at_initial);
        assert_eq!(state.as_deref(), Some("<p>a</p>"));

        let (outcome, state) = history.undo();
        assert!(!outcome.ok && outcome.at_initial);
        assert_eq!(state, None);

        let (outcome, state) = history.redo();
        assert!(outcome.ok);
        assert_eq!(state.as_deref(), Some("<p>ab</p>"));
        assert_eq!(history.current(), Some("<p>ab</p>"));
    }

    #[test]
    fn new_snapshot_clears_redo() {
        let mut history = History::default();
        history.reset("0");
        history.snapshot("1");
        let _ = history.undo();
        assert_eq!(history.sizes(), HistorySizes { undo: 1, redo: 1 });
        history.snapshot("2");
        assert_eq!(history.sizes(), HistorySizes { undo: 2, redo: 0 });
    }

    #[test]
    fn restore_suppresses_snapshots() {
        let mut history = History::default();
        history.reset("0");
        history.begin_restore();
        assert!(history.is_restoring());
        assert!(!history.snapshot("1"));
        history.end_restore();
        assert!(history.snapshot("1"));
    }

    #[test]
    fn replacing_the_current_state_keeps_redo() {
        let mut history = History::default();
        history.reset("0");
        history.snapshot("1");
        let _ = history.undo();
        history.replace_current("0-dark");
        assert_eq!(history.current(), Some("0-dark"));
        assert_eq!(history.sizes(), HistorySizes { undo: 1, redo: 1 });
        assert!(!history.snapshot("0-dark"));
    }

    #[test]
    fn overflow_drops_oldest_entries() {
        let mut history = History::new(HistoryConfig { max_entries: 3 });
        history.reset("0");
        for state in ["1", "2", "3", "4"] {
            history.snapshot(state);
        }
        assert_eq!(history.sizes().undo, 3);
        let _ = history.undo();
        let (outcome, state) = history.undo();
        assert!(outcome.at_initial);
        assert_eq!(state.as_deref(), Some("2"));
    }

    #[test]
    fn config_needs_two_entries() {
        assert!(HistoryConfig { max_entries: 1 }.validate().is_err());
        assert!(HistoryConfig::default().validate().is_ok());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Edit(u8),
        Undo,
        Redo,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0_u8..6).prop_map(Op::Edit),
            Just(Op::Undo),
            Just(Op::Redo),
        ]
    }

    proptest! {
        #[test]
        fn top_of_undo_tracks_the_document(ops in prop::collection::vec(op(), 0..200)) {
            let mut history = History::new(HistoryConfig { max_entries: 10 });
            let mut document = String::from("init");
            history.reset(&document);

            for op in ops {
                match op {
                    Op::Edit(value) => {
                        document = format!("doc-{value}");
                        history.snapshot(&document);
                    }
                    Op::Undo => {
                        if let (_, Some(state)) = history.undo() {
                            document = state;
                        }
                    }
                    Op::Redo => {
                        if let (_, Some(state)) = history.redo() {
                            document = state;
                        }
                    }
                }
                prop_assert_eq!(history.current(), Some(document.as_str()));
                prop_assert!(history.sizes().undo <= 10);
                prop_assert!(history.sizes().undo >= 1);
            }
        }
    }
}
