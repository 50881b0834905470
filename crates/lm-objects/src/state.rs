use lm_dom::NodeId;
use lm_layout::Point;
use lm_layout::Size;

/// What the pointer and keyboard are currently doing to objects.
///
/// At most one object is ever the target; every variant except `Idle`
/// names it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Selected {
        target: NodeId,
    },
    Dragging {
        target: NodeId,
        start: Point,
        /// Floating origin when the drag began.
        origin: Point,
        current: Point,
    },
    Resizing {
        target: NodeId,
        start: Point,
        size: Size,
    },
    /// Text box content is editable; `saved` is a detached copy of the
    /// content for cancel.
    Editing {
        target: NodeId,
        saved: NodeId,
    },
}

impl InteractionState {
    pub fn target(&self) -> Option<NodeId> {
        match *self {
            Self::Idle => None,
            Self::Selected { target }
            | Self::Dragging { target, .. }
            | Self::Resizing { target, .. }
            | Self::Editing { target, .. } => Some(target),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Selected { .. } => "selected",
            Self::Dragging { .. } => "dragging",
            Self::Resizing { .. } => "resizing",
            Self::Editing { .. } => "editing",
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing { .. })
    }

    pub fn is_gesture(&self) -> bool {
        matches!(self, Self::Dragging { .. } | Self::Resizing { .. })
    }
}
