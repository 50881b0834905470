//! One active object, its overlay handles and the gestures acting on it.

use crate::common;
use crate::common::BorderUpdate;
use crate::common::LayoutMode;
use crate::config::MarginUpdate;
use crate::config::Margins;
use crate::config::ObjectConfig;
use crate::image::ImageObject;
use crate::image::ImageSpec;
use crate::image::create_image;
use crate::image::wrap_bare_image;
use crate::object::AnyObject;
use crate::object::ColorEffect;
use crate::object::ObjectContext;
use crate::object::ObjectProperty;
use crate::object::SelectableObject;
use crate::object::shift_z;
use crate::state::InteractionState;
use crate::table::ColumnPosition;
use crate::table::RowPosition;
use crate::table::TableBorderInfo;
use crate::table::TableColorTarget;
use crate::table::TableColors;
use crate::table::TableObject;
use crate::table::TableSpec;
use crate::table::caret_into_cell;
use crate::table::create_table;
use crate::table::enclosing_cell;
use crate::table::owning_table;
use crate::text_box::TextBoxObject;
use crate::text_box::create_text_box;
use lm_commands::insert_block_at_caret;
use lm_commands::insert_inline_at_caret;
use lm_core::EditorError;
use lm_core::EditorResult;
use lm_core::Key;
use lm_core::Modifiers;
use lm_core::ObjectKind;
use lm_core::Theme;
use lm_dom::Document;
use lm_dom::NodeId;
use lm_layout::LayoutTree;
use lm_layout::Point;
use lm_layout::Rect;
use lm_layout::Viewport;
use lm_overlay::HandleKind;
use lm_overlay::OverlayLayer;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

/// Notifications for the event bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectEvent {
    Clicked {
        kind: ObjectKind,
        properties: serde_json::Value,
    },
    Deleted,
    Deactivated,
}

/// The active object as reported to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectInfo {
    pub kind: ObjectKind,
    pub properties: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    /// A handle gesture began.
    Handle(HandleKind),
    Activated(NodeId),
    /// The caret went into a table cell.
    CellFocused(NodeId),
    Deactivated,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
}

fn context<'a>(
    config: &'a ObjectConfig,
    layout: &'a LayoutTree,
    viewport: Viewport,
    theme: Theme,
) -> ObjectContext<'a> {
    ObjectContext {
        config,
        layout,
        viewport,
        theme,
    }
}

/// Wrapper of the object `node` belongs to; a bare `img` counts as its own
/// object until it is wrapped.
fn object_around(doc: &Document, node: NodeId) -> Option<NodeId> {
    let found = doc.closest(node, |doc, id| {
        lm_layout::is_object(doc, id) || doc.is_element(id, "img")
    })?;
    if doc.is_element(found, "img") {
        if let Some(wrapper) = doc
            .ancestors(found)
            .into_iter()
            .find(|id| lm_layout::is_object(doc, *id))
            .filter(|wrapper| doc.attr(*wrapper, "data-role") == Some(ObjectKind::Image.role()))
        {
            return Some(wrapper);
        }
    }
    Some(found)
}

#[derive(Debug)]
pub struct ObjectController {
    config: ObjectConfig,
    theme: Theme,
    viewport: Viewport,
    overlay: OverlayLayer,
    state: InteractionState,
    last_cell: Option<NodeId>,
    events: Vec<ObjectEvent>,
}

impl ObjectController {
    pub fn new(config: ObjectConfig) -> EditorResult<Self> {
        config.validate()?;
        let overlay = OverlayLayer::new(config.handle_size_px);
        Ok(Self {
            config,
            theme: Theme::default(),
            viewport: Viewport::default(),
            overlay,
            state: InteractionState::Idle,
            last_cell: None,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &ObjectConfig {
        &self.config
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn overlay(&self) -> &OverlayLayer {
        &self.overlay
    }

    pub fn active(&self) -> Option<NodeId> {
        self.state.target()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn take_events(&mut self) -> Vec<ObjectEvent> {
        std::mem::take(&mut self.events)
    }

    fn active_object(&self, doc: &Document, operation: &str) -> EditorResult<AnyObject> {
        self.active()
            .and_then(|node| AnyObject::from_node(doc, node))
            .ok_or_else(|| EditorError::no_active_object(operation))
    }

    fn push_clicked(&mut self, doc: &Document, layout: &LayoutTree, object: &AnyObject) {
        let ctx = context(&self.config, layout, self.viewport, self.theme);
        let selectable = object.as_selectable();
        let event = ObjectEvent::Clicked {
            kind: selectable.kind(),
            properties: selectable.properties(doc, &ctx),
        };
        self.events.push(event);
    }

    /// Overlay follows the object and the click payload is re-sent.
    fn after_change(&mut self, doc: &Document, layout: &LayoutTree, object: &AnyObject) {
        let bounds = {
            let ctx = context(&self.config, layout, self.viewport, self.theme);
            object.as_selectable().bounds(doc, &ctx)
        };
        self.overlay.reposition(bounds);
        self.push_clicked(doc, layout, object);
    }

    // -----------------------------------------------------------------
    // Insertion
    // -----------------------------------------------------------------

    pub fn insert_image(&mut self, doc: &mut Document, layout: &LayoutTree, spec: &ImageSpec) -> EditorResult<NodeId> {
        spec.validate()?;
        lm_commands::require_selection(doc)?;
        let wrapper = create_image(doc, spec, &self.config);
        insert_inline_at_caret(doc, wrapper)?;
        if spec.floating {
            self.float_new(doc, layout, AnyObject::Image(ImageObject::new(wrapper)));
        }
        debug!(node = wrapper, "image inserted");
        Ok(wrapper)
    }

    pub fn insert_text_box(&mut self, doc: &mut Document, text: &str) -> EditorResult<NodeId> {
        lm_commands::require_selection(doc)?;
        let wrapper = create_text_box(doc, text, &self.config, self.theme);
        insert_block_at_caret(doc, wrapper)?;
        debug!(node = wrapper, "text box inserted");
        Ok(wrapper)
    }

    pub fn insert_table(&mut self, doc: &mut Document, layout: &LayoutTree, spec: &TableSpec) -> EditorResult<NodeId> {
        spec.validate()?;
        lm_commands::require_selection(doc)?;
        let table = create_table(doc, spec, &self.config, self.theme);
        insert_block_at_caret(doc, table)?;
        if spec.floating {
            self.float_new(doc, layout, AnyObject::Table(TableObject::new(table)));
        }
        debug!(node = table, rows = spec.rows, cols = spec.cols, "table inserted");
        Ok(table)
    }

    fn float_new(&mut self, doc: &mut Document, layout: &LayoutTree, object: AnyObject) {
        let ctx = context(&self.config, layout, self.viewport, self.theme);
        crate::object::set_layout(object.as_selectable(), doc, LayoutMode::Floating, &ctx);
    }

    // -----------------------------------------------------------------
    // Activation
    // -----------------------------------------------------------------

    /// Makes `node` the active object and attaches its handles.
    pub fn activate(&mut self, doc: &mut Document, layout: &LayoutTree, node: NodeId) -> EditorResult<()> {
        let object = AnyObject::from_node(doc, node).ok_or_else(|| {
            EditorError::invalid_argument("objects.not_an_object", format!("node {node} is not an object"))
        })?;
        if self.active().is_some_and(|current| current != node) {
            self.release(doc);
        }
        let (bounds, shape) = {
            let ctx = context(&self.config, layout, self.viewport, self.theme);
            let selectable = object.as_selectable();
            selectable.activate(doc, &ctx);
            (selectable.bounds(doc, &ctx), selectable.resize_shape())
        };
        self.overlay.attach(node, bounds, shape);
        self.state = InteractionState::Selected { target: node };
        debug!(node, kind = object.as_selectable().kind().as_str(), "object activated");
        self.push_clicked(doc, layout, &object);
        Ok(())
    }

    /// Drops the active object without notifying.
    fn release(&mut self, doc: &mut Document) {
        if let InteractionState::Editing { target, saved } = self.state {
            let text_box = TextBoxObject::new(target);
            text_box.end_edit(doc);
            doc.remove(saved);
        }
        if let Some(object) = self.active().and_then(|node| AnyObject::from_node(doc, node)) {
            object.as_selectable().deactivate(doc);
        }
        self.overlay.detach();
        self.state = InteractionState::Idle;
    }

    pub fn deactivate(&mut self, doc: &mut Document) {
        if self.active().is_none() {
            return;
        }
        self.release(doc);
        self.events.push(ObjectEvent::Deactivated);
    }

    pub fn active_info(&self, doc: &Document, layout: &LayoutTree) -> Option<ObjectInfo> {
        let object = self.active().and_then(|node| AnyObject::from_node(doc, node))?;
        let ctx = context(&self.config, layout, self.viewport, self.theme);
        let selectable = object.as_selectable();
        Some(ObjectInfo {
            kind: selectable.kind(),
            properties: selectable.properties(doc, &ctx),
        })
    }

    pub fn properties(&self, doc: &Document, layout: &LayoutTree) -> EditorResult<serde_json::Value> {
        self.active_info(doc, layout)
            .map(|info| info.properties)
            .ok_or_else(|| EditorError::no_active_object("objectProperties"))
    }

    // -----------------------------------------------------------------
    // Gestures
    // -----------------------------------------------------------------

    /// Handles of the active object are hit first, then the object under
    /// `target` (or under `point`). Empty space deactivates.
    pub fn pointer_down(
        &mut self,
        doc: &mut Document,
        layout: &LayoutTree,
        point: Point,
        target: Option<NodeId>,
    ) -> EditorResult<PointerOutcome> {
        if let Some(active) = self.active().filter(|_| !self.state.is_editing()) {
            if let Some(kind) = self.overlay.hit_test(point) {
                let object = self.active_object(doc, "pointerDown")?;
                let ctx = context(&self.config, layout, self.viewport, self.theme);
                let selectable = object.as_selectable();
                self.state = match kind {
                    HandleKind::Drag => InteractionState::Dragging {
                        target: active,
                        start: point,
                        origin: selectable.bounds(doc, &ctx).origin(),
                        current: point,
                    },
                    HandleKind::Resize => InteractionState::Resizing {
                        target: active,
                        start: point,
                        size: selectable.size(doc, &ctx),
                    },
                };
                debug!(state = self.state.name(), "object gesture started");
                return Ok(PointerOutcome::Handle(kind));
            }
        }

        let hit = target
            .and_then(|node| object_around(doc, node))
            .or_else(|| layout.object_at(point));
        let Some(mut node) = hit else {
            if self.active().is_some() {
                self.deactivate(doc);
                return Ok(PointerOutcome::Deactivated);
            }
            return Ok(PointerOutcome::Ignored);
        };
        if let InteractionState::Editing { target: editing, .. } = self.state {
            if doc.is_inclusive_ancestor(editing, node) {
                return Ok(PointerOutcome::Ignored);
            }
        }
        if doc.is_element(node, "img") {
            node = wrap_bare_image(doc, node, &self.config);
        }
        if self.active() != Some(node) {
            self.activate(doc, layout, node)?;
        }

        if let Some(AnyObject::Table(table)) = AnyObject::from_node(doc, node) {
            if let Some(cell) = target.and_then(|target| table.cell_containing(doc, target)) {
                self.last_cell = Some(cell);
                caret_into_cell(doc, cell);
                self.overlay.set_hidden(true);
                return Ok(PointerOutcome::CellFocused(cell));
            }
        }
        self.overlay.set_hidden(false);
        Ok(PointerOutcome::Activated(node))
    }

    /// Returns true when the document changed.
    pub fn pointer_move(
        &mut self,
        doc: &mut Document,
        layout: &LayoutTree,
        point: Point,
        modifiers: Modifiers,
    ) -> bool {
        match self.state {
            InteractionState::Dragging {
                target,
                start,
                origin,
                ..
            } => {
                self.state = InteractionState::Dragging {
                    target,
                    start,
                    origin,
                    current: point,
                };
                if !common::is_floating(doc, target) {
                    return false;
                }
                let Some(object) = AnyObject::from_node(doc, target) else {
                    return false;
                };
                let moved = origin.offset(point.x - start.x, point.y - start.y);
                object.as_selectable().move_to(doc, moved);
                if let Some(bounds) = self.overlay.bounds() {
                    let origin = common::floating_origin(doc, target);
                    self.overlay.reposition(Rect::from_origin(origin, bounds.size()));
                }
                true
            }
            InteractionState::Resizing {
                target,
                start,
                size,
            } => {
                let Some(object) = AnyObject::from_node(doc, target) else {
                    return false;
                };
                let ctx = context(&self.config, layout, self.viewport, self.theme);
                let delta = Point::new(point.x - start.x, point.y - start.y);
                let applied = object.as_selectable().resize(doc, size, delta, modifiers, &ctx);
                if let Some(bounds) = self.overlay.bounds() {
                    self.overlay.reposition(Rect::from_origin(bounds.origin(), applied));
                }
                true
            }
            _ => false,
        }
    }

    /// Ends a gesture. Returns true when the document changed.
    pub fn pointer_up(&mut self, doc: &mut Document, layout: &LayoutTree) -> bool {
        let changed = match self.state {
            InteractionState::Dragging {
                target,
                start,
                current,
                ..
            } => {
                self.state = InteractionState::Selected { target };
                if common::is_floating(doc, target) {
                    current != start
                } else if (current.y - start.y).abs() >= self.config.move_threshold_px {
                    self.reorder(doc, layout, target, current.y)
                } else {
                    false
                }
            }
            InteractionState::Resizing { target, .. } => {
                self.state = InteractionState::Selected { target };
                true
            }
            _ => return false,
        };
        if doc.repair_selection() {
            warn!(
                code = "objects.caret_outside_root",
                "caret left the editable root during a gesture; moved to document end"
            );
        }
        if changed {
            if let Some(object) = self.active().and_then(|node| AnyObject::from_node(doc, node)) {
                self.after_change(doc, layout, &object);
            }
        }
        changed
    }

    /// Moves a non-floating object among the root's blocks.
    fn reorder(&mut self, doc: &mut Document, layout: &LayoutTree, target: NodeId, y: f32) -> bool {
        let root = doc.root();
        let Some(block) = doc.top_level_ancestor(target) else {
            return false;
        };
        let flow = layout.flow_blocks();
        let index = layout.insertion_index(y);
        let current = flow.iter().position(|(id, _)| *id == block);
        if current.is_some_and(|current| index == current || index == current + 1) {
            return false;
        }
        let anchor = flow.get(index).map(|(id, _)| *id);

        let moving = if block == target {
            doc.detach(target);
            target
        } else {
            let holder = doc.create_element("p");
            doc.detach(target);
            doc.append_child(holder, target);
            if doc.child_count(block) == 0 {
                let filler = doc.create_element("br");
                doc.append_child(block, filler);
            }
            holder
        };
        match anchor {
            Some(anchor) if doc.is_attached(anchor) => doc.insert_before(anchor, moving),
            _ => doc.append_child(root, moving),
        }
        debug!(node = target, index, "object reordered");
        true
    }

    /// Double-clicking a text box enters edit mode.
    pub fn double_click(&mut self, doc: &mut Document, layout: &LayoutTree, target: NodeId) -> EditorResult<PointerOutcome> {
        let Some(node) = object_around(doc, target) else {
            return Ok(PointerOutcome::Ignored);
        };
        if !matches!(AnyObject::from_node(doc, node), Some(AnyObject::TextBox(_))) {
            return Ok(PointerOutcome::Ignored);
        }
        if self.state.is_editing() && self.active() == Some(node) {
            return Ok(PointerOutcome::Ignored);
        }
        if self.active() != Some(node) {
            self.activate(doc, layout, node)?;
        }
        self.text_box_edit(doc)?;
        Ok(PointerOutcome::Activated(node))
    }

    pub fn key_down(&mut self, doc: &mut Document, key: Key, modifiers: Modifiers) -> EditorResult<KeyOutcome> {
        if self.state.is_editing() {
            return Ok(match key {
                Key::Enter if !modifiers.shift => {
                    self.text_box_commit(doc)?;
                    KeyOutcome::Handled
                }
                Key::Escape => {
                    self.text_box_cancel(doc)?;
                    KeyOutcome::Handled
                }
                _ => KeyOutcome::Ignored,
            });
        }
        if key == Key::Tab && self.tab(doc, modifiers.shift)? {
            return Ok(KeyOutcome::Handled);
        }
        match (key, self.active()) {
            (Key::Escape, Some(_)) => {
                self.deactivate(doc);
                Ok(KeyOutcome::Handled)
            }
            (Key::Delete | Key::Backspace, Some(target)) if !self.caret_inside(doc, target) => {
                self.delete(doc)?;
                Ok(KeyOutcome::Handled)
            }
            _ => Ok(KeyOutcome::Ignored),
        }
    }

    fn caret_inside(&self, doc: &Document, node: NodeId) -> bool {
        doc.selection()
            .is_some_and(|range| doc.is_inclusive_ancestor(node, range.start.node))
    }

    /// Tab moves to the next cell; Tab in the last cell adds a row.
    fn tab(&mut self, doc: &mut Document, backward: bool) -> EditorResult<bool> {
        let Some(range) = doc.selection() else {
            return Ok(false);
        };
        let Some(cell) = enclosing_cell(doc, range.start.node) else {
            return Ok(false);
        };
        let Some(table) = owning_table(doc, cell).map(TableObject::new) else {
            return Ok(false);
        };
        let next = match table.neighbor_cell(doc, cell, backward) {
            Some(next) => next,
            None if backward => return Ok(true),
            None => {
                let first = table.insert_row(doc, RowPosition::Below, Some(cell))?;
                table.refresh(doc, self.theme, &self.config);
                first
            }
        };
        self.last_cell = Some(next);
        caret_into_cell(doc, next);
        Ok(true)
    }

    // -----------------------------------------------------------------
    // Object commands
    // -----------------------------------------------------------------

    pub fn apply(&mut self, doc: &mut Document, layout: &LayoutTree, property: &ObjectProperty) -> EditorResult<()> {
        let object = self.active_object(doc, property.name())?;
        {
            let ctx = context(&self.config, layout, self.viewport, self.theme);
            object.as_selectable().apply_property(doc, property, &ctx)?;
        }
        self.after_change(doc, layout, &object);
        Ok(())
    }

    pub fn set_alignment(&mut self, doc: &mut Document, layout: &LayoutTree, mode: LayoutMode) -> EditorResult<()> {
        self.apply(doc, layout, &ObjectProperty::Layout(mode))
    }

    pub fn set_floating(&mut self, doc: &mut Document, layout: &LayoutTree) -> EditorResult<()> {
        self.apply(doc, layout, &ObjectProperty::Layout(LayoutMode::Floating))
    }

    pub fn set_border(&mut self, doc: &mut Document, layout: &LayoutTree, update: BorderUpdate) -> EditorResult<()> {
        self.apply(doc, layout, &ObjectProperty::Border(update))
    }

    pub fn set_shadow(&mut self, doc: &mut Document, layout: &LayoutTree, on: bool) -> EditorResult<()> {
        self.apply(doc, layout, &ObjectProperty::Shadow(on))
    }

    pub fn set_radius(&mut self, doc: &mut Document, layout: &LayoutTree, px: f32) -> EditorResult<()> {
        self.apply(doc, layout, &ObjectProperty::Radius(px))
    }

    pub fn set_margins(&mut self, doc: &mut Document, layout: &LayoutTree, update: MarginUpdate) -> EditorResult<()> {
        self.apply(doc, layout, &ObjectProperty::Margins(update))
    }

    pub fn set_background(&mut self, doc: &mut Document, layout: &LayoutTree, color: &str) -> EditorResult<()> {
        self.apply(doc, layout, &ObjectProperty::Background(color.to_owned()))
    }

    pub fn image_set_color_effect(&mut self, doc: &mut Document, layout: &LayoutTree, effect: ColorEffect) -> EditorResult<()> {
        self.apply(doc, layout, &ObjectProperty::ColorEffect(effect))
    }

    /// Restores an image's recorded original dimensions.
    pub fn reset_size(&mut self, doc: &mut Document, layout: &LayoutTree) -> EditorResult<()> {
        let object = self.active_object(doc, "objectResetSize")?;
        let AnyObject::Image(image) = object else {
            return Err(EditorError::invalid_argument(
                "objects.unsupported_property",
                "reset size applies to images only",
            ));
        };
        image.reset_size(doc, &self.config);
        self.after_change(doc, layout, &object);
        Ok(())
    }

    pub fn bring_forward(&mut self, doc: &mut Document, layout: &LayoutTree) -> EditorResult<i32> {
        self.shift_layer(doc, layout, self.config.z_step, "objectBringForward")
    }

    pub fn send_backward(&mut self, doc: &mut Document, layout: &LayoutTree) -> EditorResult<i32> {
        self.shift_layer(doc, layout, -self.config.z_step, "objectSendBackward")
    }

    fn shift_layer(&mut self, doc: &mut Document, layout: &LayoutTree, step: i32, operation: &str) -> EditorResult<i32> {
        let object = self.active_object(doc, operation)?;
        let z = {
            let ctx = context(&self.config, layout, self.viewport, self.theme);
            shift_z(object.as_selectable(), doc, step, &ctx)
        };
        self.after_change(doc, layout, &object);
        Ok(z)
    }

    /// Removes the active object from the document.
    pub fn delete(&mut self, doc: &mut Document) -> EditorResult<()> {
        let object = self.active_object(doc, "objectDelete")?;
        let node = object.as_selectable().node();
        self.release(doc);
        let parent = doc.parent(node);
        doc.remove(node);
        if let Some(parent) = parent.filter(|parent| *parent != doc.root() && doc.child_count(*parent) == 0) {
            let filler = doc.create_element("br");
            doc.append_child(parent, filler);
        }
        doc.normalize_root();
        let _ = doc.repair_selection();
        debug!(node, "object deleted");
        self.events.push(ObjectEvent::Deleted);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Text box edit mode
    // -----------------------------------------------------------------

    pub fn text_box_edit(&mut self, doc: &mut Document) -> EditorResult<()> {
        let object = self.active_object(doc, "textBoxEdit")?;
        if self.state.is_editing() {
            return Ok(());
        }
        let AnyObject::TextBox(text_box) = object else {
            return Err(EditorError::invalid_argument(
                "objects.unsupported_property",
                "edit mode applies to text boxes only",
            ));
        };
        let saved = text_box.begin_edit(doc).ok_or_else(|| {
            EditorError::invariant("objects.text_box.content", "text box content could not be saved")
        })?;
        self.state = InteractionState::Editing {
            target: text_box.node(),
            saved,
        };
        self.overlay.set_hidden(true);
        Ok(())
    }

    pub fn text_box_commit(&mut self, doc: &mut Document) -> EditorResult<()> {
        let InteractionState::Editing { target, saved } = self.state else {
            return Err(EditorError::no_active_object("textBoxCommit"));
        };
        let text_box = TextBoxObject::new(target);
        text_box.end_edit(doc);
        doc.remove(saved);
        self.finish_edit(doc, target);
        Ok(())
    }

    pub fn text_box_cancel(&mut self, doc: &mut Document) -> EditorResult<()> {
        let InteractionState::Editing { target, saved } = self.state else {
            return Err(EditorError::no_active_object("textBoxCancel"));
        };
        let text_box = TextBoxObject::new(target);
        text_box.restore(doc, saved);
        text_box.end_edit(doc);
        self.finish_edit(doc, target);
        Ok(())
    }

    fn finish_edit(&mut self, doc: &mut Document, target: NodeId) {
        self.state = InteractionState::Selected { target };
        self.overlay.set_hidden(false);
        match lm_commands::position_after(doc, target) {
            Some(after) => doc.set_caret(after),
            None => doc.caret_to_end(),
        }
    }

    // -----------------------------------------------------------------
    // Tables
    // -----------------------------------------------------------------

    fn active_table(&self, doc: &Document, operation: &str) -> EditorResult<TableObject> {
        match self.active_object(doc, operation)? {
            AnyObject::Table(table) => Ok(table),
            _ => Err(EditorError::no_active_object(operation)),
        }
    }

    /// Cell under the caret, else the last clicked cell of `table`.
    fn current_cell(&self, doc: &Document, table: &TableObject) -> Option<NodeId> {
        doc.selection()
            .and_then(|range| table.cell_containing(doc, range.start.node))
            .or_else(|| {
                self.last_cell
                    .filter(|cell| doc.is_attached(*cell) && table.coordinates(doc, *cell).is_some())
            })
    }

    fn after_grid_change(&mut self, doc: &mut Document, layout: &LayoutTree, table: TableObject, focus: Option<(usize, usize)>) {
        table.refresh(doc, self.theme, &self.config);
        let grid = table.grid(doc);
        if let Some((row, col)) = focus {
            let cell = grid
                .get(row.min(grid.len().saturating_sub(1)))
                .and_then(|cells| cells.get(col.min(cells.len().saturating_sub(1))))
                .copied();
            if let Some(cell) = cell {
                self.last_cell = Some(cell);
                caret_into_cell(doc, cell);
            }
        }
        self.after_change(doc, layout, &AnyObject::Table(table));
    }

    fn table_removed(&mut self, doc: &mut Document) {
        self.overlay.detach();
        self.state = InteractionState::Idle;
        self.last_cell = None;
        doc.normalize_root();
        let _ = doc.repair_selection();
        self.events.push(ObjectEvent::Deleted);
    }

    pub fn table_add_row(&mut self, doc: &mut Document, layout: &LayoutTree, position: RowPosition) -> EditorResult<()> {
        let table = self.active_table(doc, "tableAddRow")?;
        let cell = self.current_cell(doc, &table);
        let first = table.insert_row(doc, position, cell)?;
        let focus = table.coordinates(doc, first);
        self.after_grid_change(doc, layout, table, focus);
        Ok(())
    }

    pub fn table_add_column(&mut self, doc: &mut Document, layout: &LayoutTree, position: ColumnPosition) -> EditorResult<()> {
        let table = self.active_table(doc, "tableAddColumn")?;
        let cell = self.current_cell(doc, &table);
        table.insert_column(doc, position, cell)?;
        let focus = cell.and_then(|cell| table.coordinates(doc, cell));
        self.after_grid_change(doc, layout, table, focus);
        Ok(())
    }

    fn reference_cell(&self, doc: &Document, table: &TableObject, index: Option<usize>, by_row: bool) -> EditorResult<Option<NodeId>> {
        let Some(index) = index else {
            return Ok(self.current_cell(doc, table));
        };
        let grid = table.grid(doc);
        let cell = if by_row {
            grid.get(index).and_then(|cells| cells.first())
        } else {
            grid.iter().find_map(|cells| cells.get(index))
        };
        cell.copied().map(Some).ok_or_else(|| {
            EditorError::invalid_argument(
                "objects.table.index",
                format!("{} {index} does not exist", if by_row { "row" } else { "column" }),
            )
        })
    }

    pub fn table_delete_row(&mut self, doc: &mut Document, layout: &LayoutTree, index: Option<usize>) -> EditorResult<()> {
        let table = self.active_table(doc, "tableDeleteRow")?;
        let reference = self.reference_cell(doc, &table, index, true)?;
        let focus = reference.and_then(|cell| table.coordinates(doc, cell));
        if table.delete_row(doc, reference) {
            self.table_removed(doc);
        } else {
            self.after_grid_change(doc, layout, table, focus.or(Some((usize::MAX, 0))));
        }
        Ok(())
    }

    pub fn table_delete_column(&mut self, doc: &mut Document, layout: &LayoutTree, index: Option<usize>) -> EditorResult<()> {
        let table = self.active_table(doc, "tableDeleteColumn")?;
        let reference = self.reference_cell(doc, &table, index, false)?;
        let focus = reference.and_then(|cell| table.coordinates(doc, cell));
        if table.delete_column(doc, reference) {
            self.table_removed(doc);
        } else {
            self.after_grid_change(doc, layout, table, focus.or(Some((0, usize::MAX))));
        }
        Ok(())
    }

    pub fn table_delete(&mut self, doc: &mut Document) -> EditorResult<()> {
        self.active_table(doc, "tableDelete")?;
        self.delete(doc)
    }

    pub fn table_set_border_sides<S: AsRef<str>>(&mut self, doc: &mut Document, layout: &LayoutTree, sides: &[S]) -> EditorResult<()> {
        let table = self.active_table(doc, "tableSetBorderSides")?;
        table.set_border_sides(doc, sides, self.theme, &self.config)?;
        self.after_change(doc, layout, &AnyObject::Table(table));
        Ok(())
    }

    pub fn table_set_color(
        &mut self,
        doc: &mut Document,
        layout: &LayoutTree,
        target: TableColorTarget,
        color: &str,
    ) -> EditorResult<()> {
        let table = self.active_table(doc, "tableSetColor")?;
        let cell = self.current_cell(doc, &table);
        table.set_color(doc, target, color, cell, self.theme, &self.config)?;
        self.after_change(doc, layout, &AnyObject::Table(table));
        Ok(())
    }

    pub fn table_colors(&self, doc: &Document) -> EditorResult<TableColors> {
        let table = self.active_table(doc, "tableGetColors")?;
        Ok(table.colors(doc, self.current_cell(doc, &table)))
    }

    pub fn table_border_style(&self, doc: &Document) -> EditorResult<TableBorderInfo> {
        let table = self.active_table(doc, "tableGetBorderStyle")?;
        Ok(table.border_info(doc, self.theme))
    }

    pub fn table_margins(&self, doc: &Document) -> EditorResult<Margins> {
        let table = self.active_table(doc, "tableGetMargins")?;
        Ok(table.margins(doc, &self.config))
    }

    // -----------------------------------------------------------------
    // Surface hooks
    // -----------------------------------------------------------------

    /// Re-derives every object's CSS for `theme`.
    pub fn set_theme(&mut self, doc: &mut Document, layout: &LayoutTree, theme: Theme) {
        self.theme = theme;
        let ctx = context(&self.config, layout, self.viewport, self.theme);
        let root = doc.root();
        for node in doc.descendants(root) {
            if let Some(object) = AnyObject::from_node(doc, node) {
                object.as_selectable().reassert(doc, &ctx);
            }
        }
    }

    /// Called after every input burst: drops a removed active object and
    /// keeps the handles on the object.
    pub fn sync(&mut self, doc: &mut Document, layout: &LayoutTree) {
        let Some(target) = self.active() else {
            return;
        };
        if !doc.is_attached(target) {
            if let InteractionState::Editing { saved, .. } = self.state {
                let root = doc.root();
                doc.set_attr(root, "contenteditable", "true");
                doc.remove(saved);
            }
            self.overlay.detach();
            self.state = InteractionState::Idle;
            self.last_cell = None;
            debug!(node = target, "active object left the document");
            self.events.push(ObjectEvent::Deleted);
            return;
        }
        let Some(object) = AnyObject::from_node(doc, target) else {
            return;
        };
        if !self.state.is_gesture() {
            let bounds = {
                let ctx = context(&self.config, layout, self.viewport, self.theme);
                object.as_selectable().bounds(doc, &ctx)
            };
            self.overlay.reposition(bounds);
        }
        let in_cell = matches!(object, AnyObject::Table(table) if doc
            .selection()
            .and_then(|range| table.cell_containing(doc, range.start.node))
            .is_some());
        self.overlay.set_hidden(self.state.is_editing() || in_cell);
    }

    pub fn is_text_box(&self, doc: &Document) -> bool {
        matches!(
            self.active().and_then(|node| AnyObject::from_node(doc, node)),
            Some(AnyObject::TextBox(_))
        )
    }

    pub fn is_image(&self, doc: &Document) -> bool {
        matches!(
            self.active().and_then(|node| AnyObject::from_node(doc, node)),
            Some(AnyObject::Image(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::KeyOutcome;
    use super::ObjectController;
    use super::ObjectEvent;
    use super::PointerOutcome;
    use crate::common;
    use crate::config::ObjectConfig;
    use crate::image::ImageSpec;
    use crate::state::InteractionState;
    use crate::table::TableObject;
    use crate::table::TableSpec;
    use crate::table::caret_into_cell;
    use crate::text_box::TextBoxObject;
    use lm_core::Key;
    use lm_core::Modifiers;
    use lm_core::ObjectKind;
    use lm_dom::Document;
    use lm_layout::LayoutTree;
    use lm_layout::Point;
    use lm_layout::Size;
    use lm_overlay::HandleKind;

    fn controller() -> ObjectController {
        ObjectController::new(ObjectConfig::default()).unwrap_or_else(|_| unreachable!())
    }

    fn photo() -> ImageSpec {
        ImageSpec {
            source: "photo.png".to_owned(),
            intrinsic: Some(Size::new(400.0, 300.0)),
            ..ImageSpec::default()
        }
    }

    #[test]
    fn activation_reports_kind_and_attaches_handles() {
        let mut doc = Document::new();
        let layout = LayoutTree::default();
        let mut objects = controller();
        let node = objects.insert_text_box(&mut doc, "note").unwrap_or_default();
        assert!(objects.activate(&mut doc, &layout, node).is_ok());

        assert_eq!(objects.active(), Some(node));
        assert_eq!(objects.overlay().target(), Some(node));
        assert_eq!(objects.overlay().handles().len(), 2);
        let events = objects.take_events();
        assert!(matches!(
            events.as_slice(),
            [ObjectEvent::Clicked { kind: ObjectKind::TextBox, .. }]
        ));

        objects.deactivate(&mut doc);
        assert_eq!(objects.take_events(), vec![ObjectEvent::Deactivated]);
        assert!(objects.overlay().handles().is_empty());
    }

    #[test]
    fn resize_handle_keeps_image_aspect() {
        let mut doc = Document::new();
        let layout = LayoutTree::default();
        let mut objects = controller();
        let node = objects.insert_image(&mut doc, &layout, &photo()).unwrap_or_default();
        assert!(objects.activate(&mut doc, &layout, node).is_ok());

        let corner = Point::new(400.0, 300.0);
        let outcome = objects.pointer_down(&mut doc, &layout, corner, None);
        assert_eq!(outcome.ok(), Some(PointerOutcome::Handle(HandleKind::Resize)));
        assert!(objects.pointer_move(&mut doc, &layout, corner.offset(-200.0, 0.0), Modifiers::NONE));
        assert!(objects.pointer_up(&mut doc, &layout));

        let info = objects.active_info(&doc, &layout).unwrap_or_else(|| unreachable!());
        assert_eq!(info.properties["width"], 200.0);
        assert_eq!(info.properties["height"], 150.0);
        assert_eq!(info.properties["originalWidth"], 400.0);
        assert!(matches!(objects.state(), InteractionState::Selected { .. }));
    }

    #[test]
    fn floating_drag_follows_pointer() {
        let mut doc = Document::new();
        let layout = LayoutTree::default();
        let mut objects = controller();
        let spec = TableSpec {
            rows: 2,
            cols: 2,
            ..TableSpec::default()
        };
        let node = objects.insert_table(&mut doc, &layout, &spec).unwrap_or_default();
        assert!(objects.activate(&mut doc, &layout, node).is_ok());
        assert!(objects.set_floating(&mut doc, &layout).is_ok());

        let start = common::floating_origin(&doc, node);
        let outcome = objects.pointer_down(&mut doc, &layout, start, None);
        assert_eq!(outcome.ok(), Some(PointerOutcome::Handle(HandleKind::Drag)));
        assert!(objects.pointer_move(&mut doc, &layout, start.offset(100.0, 50.0), Modifiers::NONE));
        assert!(objects.pointer_up(&mut doc, &layout));

        assert_eq!(common::floating_origin(&doc, node), start.offset(100.0, 50.0));
        let bounds = objects.overlay().bounds().unwrap_or_default();
        assert_eq!(bounds.origin(), start.offset(100.0, 50.0));
    }

    #[test]
    fn layer_order_stops_at_floor() {
        let mut doc = Document::new();
        let layout = LayoutTree::default();
        let mut objects = controller();
        let node = objects.insert_image(&mut doc, &layout, &photo()).unwrap_or_default();
        assert!(objects.activate(&mut doc, &layout, node).is_ok());

        assert_eq!(objects.bring_forward(&mut doc, &layout).ok(), Some(60));
        assert!(common::is_floating(&doc, node));
        let mut z = 0;
        for _ in 0..10 {
            z = objects.send_backward(&mut doc, &layout).unwrap_or_default();
        }
        assert_eq!(z, 10);
        assert_eq!(common::z_index(&doc, node), Some(10));
    }

    #[test]
    fn delete_removes_object_and_keeps_caret_valid() {
        let mut doc = Document::new();
        let layout = LayoutTree::default();
        let mut objects = controller();
        let node = objects.insert_image(&mut doc, &layout, &photo()).unwrap_or_default();
        assert!(objects.activate(&mut doc, &layout, node).is_ok());
        let _ = objects.take_events();

        assert!(objects.delete(&mut doc).is_ok());
        assert!(!doc.contains(node));
        assert_eq!(objects.take_events(), vec![ObjectEvent::Deleted]);
        assert_eq!(objects.state(), InteractionState::Idle);
        assert!(doc.selection_in_root().is_some());
        assert!(objects.delete(&mut doc).is_err());
    }

    #[test]
    fn sync_drops_an_object_removed_elsewhere() {
        let mut doc = Document::new();
        let layout = LayoutTree::default();
        let mut objects = controller();
        let node = objects.insert_text_box(&mut doc, "gone").unwrap_or_default();
        assert!(objects.activate(&mut doc, &layout, node).is_ok());
        let _ = objects.take_events();

        doc.remove(node);
        objects.sync(&mut doc, &layout);
        assert_eq!(objects.active(), None);
        assert_eq!(objects.overlay().target(), None);
        assert_eq!(objects.take_events(), vec![ObjectEvent::Deleted]);
    }

    #[test]
    fn root_is_editable_again_when_the_edited_box_disappears() {
        let mut doc = Document::new();
        let layout = LayoutTree::default();
        let mut objects = controller();
        let node = objects.insert_text_box(&mut doc, "draft").unwrap_or_default();
        assert!(objects.activate(&mut doc, &layout, node).is_ok());
        assert!(objects.text_box_edit(&mut doc).is_ok());
        assert_eq!(doc.attr(doc.root(), "contenteditable"), Some("false"));

        doc.remove(node);
        objects.sync(&mut doc, &layout);
        assert_eq!(objects.state(), InteractionState::Idle);
        assert_eq!(doc.attr(doc.root(), "contenteditable"), Some("true"));
    }

    #[test]
    fn escape_cancels_text_box_edit() {
        let mut doc = Document::new();
        let layout = LayoutTree::default();
        let mut objects = controller();
        let node = objects.insert_text_box(&mut doc, "draft").unwrap_or_default();
        let outcome = objects.double_click(&mut doc, &layout, node);
        assert_eq!(outcome.ok(), Some(PointerOutcome::Activated(node)));
        assert!(objects.state().is_editing());
        assert!(objects.overlay().is_hidden());

        let content = TextBoxObject::new(node).content(&doc);
        let Some(text) = doc.last_text_node(content) else {
            unreachable!();
        };
        doc.set_text(text, "rewritten");
        let outcome = objects.key_down(&mut doc, Key::Escape, Modifiers::NONE);
        assert_eq!(outcome.ok(), Some(KeyOutcome::Handled));

        let content = TextBoxObject::new(node).content(&doc);
        assert_eq!(doc.text_content(content), "draft");
        assert_eq!(objects.state(), InteractionState::Selected { target: node });
        assert_eq!(doc.attr(doc.root(), "contenteditable"), Some("true"));
    }

    #[test]
    fn tab_in_last_cell_appends_a_row() {
        let mut doc = Document::new();
        let layout = LayoutTree::default();
        let mut objects = controller();
        let spec = TableSpec {
            rows: 2,
            cols: 2,
            ..TableSpec::default()
        };
        let node = objects.insert_table(&mut doc, &layout, &spec).unwrap_or_default();
        let table = TableObject::new(node);
        let Some(last) = table.grid(&doc).last().and_then(|row| row.last()).copied() else {
            unreachable!();
        };
        caret_into_cell(&mut doc, last);

        let outcome = objects.key_down(&mut doc, Key::Tab, Modifiers::NONE);
        assert_eq!(outcome.ok(), Some(KeyOutcome::Handled));
        let grid = table.grid(&doc);
        assert_eq!(grid.len(), 3);
        let caret = doc.selection().map(|range| range.start.node);
        assert_eq!(caret, Some(grid[2][0]));

        let outcome = objects.key_down(&mut doc, Key::Tab, Modifiers::SHIFT);
        assert_eq!(outcome.ok(), Some(KeyOutcome::Handled));
        let caret = doc.selection().map(|range| range.start.node);
        assert_eq!(caret, Some(grid[1][1]));
    }
}
