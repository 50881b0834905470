//! Shared primitives used across Lumen crates.

use core::fmt;

mod types;

pub use types::Alignment;
pub use types::BlockStyle;
pub use types::CaseMode;
pub use types::ColorTarget;
pub use types::FormattingSnapshot;
pub use types::InlineStyle;
pub use types::Key;
pub use types::ListKind;
pub use types::ListState;
pub use types::Modifiers;
pub use types::ObjectKind;
pub use types::SpacingScope;
pub use types::Theme;

/// Result alias used across the workspace.
pub type EditorResult<T> = Result<T, EditorError>;

/// Error categories the editing engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The command needs an anchored selection inside the editable root.
    NoSelection,
    /// The command targets the active object but none is selected.
    NoActiveObject,
    /// A script evaluated on the surface threw or could not run.
    ScriptError,
    /// A structural invariant was broken and had to be corrected.
    InvariantViolation,
    /// A document could not be loaded into the editable root.
    SerializationError,
    /// Command arguments could not be interpreted.
    InvalidArgument,
    /// Host-side file access failed.
    Io,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoSelection => "no-selection",
            Self::NoActiveObject => "no-active-object",
            Self::ScriptError => "script-error",
            Self::InvariantViolation => "invariant-violation",
            Self::SerializationError => "serialization-error",
            Self::InvalidArgument => "invalid-argument",
            Self::Io => "io",
        }
    }

    /// Fatal-free errors the host only shows as a status line.
    pub fn is_advisory(self) -> bool {
        !matches!(self, Self::Io)
    }
}

/// Top-level error type carried through every crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub message: String,
}

impl EditorError {
    pub fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    pub fn no_selection() -> Self {
        Self::new(
            ErrorKind::NoSelection,
            "commands.no_selection",
            "no selection inside the editable root",
        )
    }

    pub fn no_active_object(operation: &str) -> Self {
        Self::new(
            ErrorKind::NoActiveObject,
            "objects.no_active_object",
            format!("`{operation}` requires an active object"),
        )
    }

    pub fn invalid_argument(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, code, message)
    }

    pub fn script(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ScriptError, code, message)
    }

    pub fn serialization(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SerializationError, code, message)
    }

    pub fn invariant(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvariantViolation, code, message)
    }

    pub fn io(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, code, message)
    }

    pub fn is_no_selection(&self) -> bool {
        self.kind == ErrorKind::NoSelection
    }
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for EditorError {}
