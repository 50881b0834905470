//! Overlay handles painted above the editing surface.
//!
//! Handles are never part of the document tree. The layer tracks which
//! object they decorate and where they sit in surface coordinates.

use lm_dom::NodeId;
use lm_layout::Point;
use lm_layout::Rect;

/// What a handle does when dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Drag,
    Resize,
}

impl HandleKind {
    /// Role name used when handles are mirrored into markup by a host.
    pub fn role(self) -> &'static str {
        match self {
            Self::Drag => "drag-handle",
            Self::Resize => "resize-handle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleShape {
    Square,
    /// Corner triangle used by tables.
    Triangle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub kind: HandleKind,
    pub shape: HandleShape,
    pub rect: Rect,
}

/// One paint instruction for the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCall {
    Outline(Rect),
    Handle(Handle),
}

/// Draw list for the current overlay state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayFrame {
    pub calls: Vec<DrawCall>,
}

impl OverlayFrame {
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// The parallel layer holding the handles of the active object.
#[derive(Debug, Clone)]
pub struct OverlayLayer {
    handle_size: f32,
    target: Option<NodeId>,
    bounds: Rect,
    resize_shape: HandleShape,
    hidden: bool,
}

impl Default for OverlayLayer {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl OverlayLayer {
    pub fn new(handle_size: f32) -> Self {
        Self {
            handle_size,
            target: None,
            bounds: Rect::default(),
            resize_shape: HandleShape::Square,
            hidden: false,
        }
    }

    /// Decorates `target`. Any previous target loses its handles.
    pub fn attach(&mut self, target: NodeId, bounds: Rect, resize_shape: HandleShape) {
        self.target = Some(target);
        self.bounds = bounds;
        self.resize_shape = resize_shape;
        self.hidden = false;
    }

    pub fn detach(&mut self) {
        self.target = None;
        self.hidden = false;
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.target.map(|_| self.bounds)
    }

    pub fn reposition(&mut self, bounds: Rect) {
        if self.target.is_some() {
            self.bounds = bounds;
        }
    }

    /// Handles stay attached but are not painted or hit while editing.
    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Zero handles when detached, exactly two otherwise.
    pub fn handles(&self) -> Vec<Handle> {
        if self.target.is_none() {
            return Vec::new();
        }
        let half = self.handle_size / 2.0;
        vec![
            Handle {
                kind: HandleKind::Drag,
                shape: HandleShape::Square,
                rect: Rect::new(
                    self.bounds.x - half,
                    self.bounds.y - half,
                    self.handle_size,
                    self.handle_size,
                ),
            },
            Handle {
                kind: HandleKind::Resize,
                shape: self.resize_shape,
                rect: Rect::new(
                    self.bounds.right() - half,
                    self.bounds.bottom() - half,
                    self.handle_size,
                    self.handle_size,
                ),
            },
        ]
    }

    pub fn hit_test(&self, point: Point) -> Option<HandleKind> {
        if self.hidden {
            return None;
        }
        self.handles()
            .into_iter()
            .find(|handle| handle.rect.contains(point))
            .map(|handle| handle.kind)
    }

    pub fn frame(&self) -> OverlayFrame {
        if self.hidden || self.target.is_none() {
            return OverlayFrame::default();
        }
        let mut calls = vec![DrawCall::Outline(self.bounds)];
        calls.extend(self.handles().into_iter().map(DrawCall::Handle));
        OverlayFrame { calls }
    }
}

#[cfg(test)]
mod tests {
    use super::DrawCall;
    use super::HandleKind;
    use super::HandleShape;
    use super::OverlayLayer;
    use lm_layout::Point;
    use lm_layout::Rect;

    #[test]
    fn detached_layer_has_no_handles() {
        let layer = OverlayLayer::default();
        assert!(layer.handles().is_empty());
        assert!(layer.frame().is_empty());
    }

    #[test]
    fn attached_layer_has_drag_and_resize_corners() {
        let mut layer = OverlayLayer::new(10.0);
        layer.attach(7, Rect::new(100.0, 50.0, 200.0, 100.0), HandleShape::Triangle);
        let handles = layer.handles();
        assert_eq!(handles.len(), 2);
        assert_eq!(layer.hit_test(Point::new(100.0, 50.0)), Some(HandleKind::Drag));
        assert_eq!(layer.hit_test(Point::new(300.0, 150.0)), Some(HandleKind::Resize));
        assert_eq!(handles[1].shape, HandleShape::Triangle);
        assert_eq!(layer.hit_test(Point::new(200.0, 100.0)), None);
    }

    #[test]
    fn hidden_handles_are_not_painted_or_hit() {
        let mut layer = OverlayLayer::default();
        layer.attach(3, Rect::new(0.0, 0.0, 50.0, 50.0), HandleShape::Square);
        assert!(matches!(layer.frame().calls.first(), Some(DrawCall::Outline(_))));
        layer.set_hidden(true);
        assert!(layer.frame().is_empty());
        assert_eq!(layer.hit_test(Point::new(0.0, 0.0)), None);
        assert_eq!(layer.handles().len(), 2);
    }
}
