use lm_core::Modifiers;
use lm_core::Theme;
use lm_dom::Document;
use lm_dom::NodeId;
use lm_dom::Position;
use lm_dom::Range;
use lm_editor::CommandStatus;
use lm_editor::Editor;
use lm_editor::EditorConfig;
use lm_ipc::EditorEvent;
use lm_layout::Rect;
use lm_layout::Size;
use lm_objects::ImageSpec;
use lm_objects::TableColorTarget;
use lm_objects::TableObject;
use lm_objects::TableSpec;

fn editor_with(config: EditorConfig, html: &str) -> Editor {
    let mut editor = Editor::new(config).unwrap_or_else(|_| unreachable!());
    assert!(editor.load_initial(html).is_ok());
    let _ = editor.take_events();
    editor
}

fn editor(html: &str) -> Editor {
    editor_with(EditorConfig::default(), html)
}

fn first_text(editor: &Editor) -> NodeId {
    let doc = editor.surface().document();
    doc.text_nodes_under(doc.root()).first().copied().unwrap_or_default()
}

fn text_with(editor: &Editor, content: &str) -> NodeId {
    let doc = editor.surface().document();
    doc.text_nodes_under(doc.root())
        .into_iter()
        .find(|node| doc.text(*node) == Some(content))
        .unwrap_or_default()
}

fn root_editable(editor: &Editor) -> Option<String> {
    let doc = editor.surface().document();
    doc.attr(doc.root(), "contenteditable").map(str::to_owned)
}

/// `<p>abc</p>` followed by an active text box holding `note`.
fn editor_with_text_box() -> Editor {
    let mut editor = editor("<p>abc</p>");
    let text = first_text(&editor);
    assert!(editor.collapse_to(Position::new(text, 3)).is_ok());
    assert_eq!(editor.insert_text_box("note").ok(), Some(CommandStatus::Applied));
    let _ = editor.take_events();
    editor
}

fn overlay_bounds(editor: &Editor) -> Rect {
    let Some(bounds) = editor.surface().objects().overlay().bounds() else {
        unreachable!("no active object");
    };
    bounds
}

fn number(editor: &mut Editor, name: &str) -> f64 {
    let properties = editor.object_properties().unwrap_or_default();
    properties[name].as_f64().unwrap_or(f64::NAN)
}

fn active_grid(editor: &Editor) -> Vec<Vec<NodeId>> {
    let Some(node) = editor.surface().objects().active() else {
        unreachable!("no active table");
    };
    TableObject::new(node).grid(editor.surface().document())
}

fn style(doc: &Document, node: NodeId, name: &str) -> String {
    doc.style_property(node, name).unwrap_or_default()
}

fn table(rows: usize, cols: usize, has_header: bool) -> TableSpec {
    TableSpec {
        rows,
        cols,
        has_header,
        border_width: 1,
        ..TableSpec::default()
    }
}

#[test]
fn bold_toggle_wraps_and_unwraps_one_character() {
    let mut editor = editor("<p>abc</p>");
    let text = first_text(&editor);
    let range = Range::new(Position::new(text, 1), Position::new(text, 2));
    assert!(editor.set_selection(range).is_ok());

    assert_eq!(editor.toggle_bold().ok(), Some(CommandStatus::Applied));
    assert_eq!(editor.serialize(), "<p>a<b>b</b>c</p>");
    assert!(editor.snapshot().is_ok_and(|snapshot| snapshot.bold));

    assert_eq!(editor.toggle_bold().ok(), Some(CommandStatus::Applied));
    assert_eq!(editor.serialize(), "<p>abc</p>");
}

#[test]
fn undo_after_font_size_peels_typing_then_anchor() {
    let mut editor = editor("<p>Hello</p>");
    let text = first_text(&editor);
    assert!(editor.collapse_to(Position::new(text, 5)).is_ok());

    assert_eq!(editor.set_font_size(18).ok(), Some(CommandStatus::Applied));
    assert_eq!(editor.insert_text("!").ok(), Some(CommandStatus::Applied));
    assert_eq!(
        editor.serialize(),
        "<p>Hello<span style=\"font-size: 18pt;\">!</span></p>"
    );
    assert!(editor.snapshot().is_ok_and(|snapshot| snapshot.font_size == 18));

    let first = editor.undo().unwrap_or_else(|_| unreachable!());
    assert!(first.ok && !first.at_initial);
    assert!(!editor.serialize().contains('!'));

    let second = editor.undo().unwrap_or_else(|_| unreachable!());
    assert!(second.ok && second.at_initial);
    assert_eq!(editor.serialize(), "<p>Hello</p>");
    assert_eq!(editor.stack_sizes().redo, 2);
}

#[test]
fn image_resize_keeps_aspect_and_reset_restores_original() {
    let mut editor = editor("<p>text</p>");
    let spec = ImageSpec {
        source: "photo.png".to_owned(),
        intrinsic: Some(Size::new(800.0, 600.0)),
        ..ImageSpec::default()
    };
    assert_eq!(editor.insert_image(&spec).ok(), Some(CommandStatus::Applied));

    let corner = overlay_bounds(&editor).bottom_right();
    assert!(editor.pointer_down(None, corner).is_ok());
    editor.pointer_move(corner.offset(-400.0, 0.0), Modifiers::NONE);
    editor.pointer_up();
    assert!((number(&mut editor, "width") - 400.0).abs() <= 1.0);
    assert!((number(&mut editor, "height") - 300.0).abs() <= 1.0);

    assert!(editor.object_reset_size().is_ok());
    assert_eq!(number(&mut editor, "width"), 800.0);
    assert_eq!(number(&mut editor, "height"), 600.0);
}

#[test]
fn outer_inner_horizontal_preset_drops_vertical_inner_lines() {
    let mut editor = editor("<p>before</p>");
    assert!(editor.insert_table(&table(3, 3, false)).is_ok());
    assert!(editor.table_set_border_sides(&["outer", "inner", "horizontal"]).is_ok());

    let grid = active_grid(&editor);
    let doc = editor.surface().document();
    let line = "1px solid #cccccc";
    for (r, row) in grid.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            assert_eq!(style(doc, *cell, "border-top"), line);
            assert_eq!(style(doc, *cell, "border-bottom"), line);
            let left = if c == 0 { line } else { "none" };
            let right = if c == 2 { line } else { "none" };
            assert_eq!(style(doc, *cell, "border-left"), left, "cell {r},{c}");
            assert_eq!(style(doc, *cell, "border-right"), right, "cell {r},{c}");
        }
    }

    assert!(editor.table_set_border_sides(&["all"]).is_ok());
    assert!(editor.table_set_border_sides(&["none"]).is_ok());
    let doc = editor.surface().document();
    for cell in grid.iter().flatten() {
        for side in ["border-top", "border-right", "border-bottom", "border-left"] {
            assert_eq!(style(doc, *cell, side), "none");
        }
    }
}

#[test]
fn floating_table_drag_and_send_backward() {
    let mut editor = editor("<p>anchor</p>");
    assert!(editor.insert_table(&table(3, 3, false)).is_ok());
    assert!(editor.object_set_floating().is_ok());

    let start = overlay_bounds(&editor).origin();
    assert!(editor.pointer_down(None, start).is_ok());
    editor.pointer_move(start.offset(100.0, 50.0), Modifiers::NONE);
    editor.pointer_up();

    assert_eq!(overlay_bounds(&editor).origin(), start.offset(100.0, 50.0));
    let z = number(&mut editor, "zIndex");
    assert!(z >= 50.0);

    let lowered = editor.object_send_backward().unwrap_or_default();
    assert_eq!(f64::from(lowered), (z - 10.0).max(10.0));
    assert!(lowered >= 10);
}

#[test]
fn theme_switches_keep_stored_table_colors() {
    let config = EditorConfig::default().with_theme(Theme::Dark);
    let mut editor = editor_with(config, "<p>x</p>");
    assert!(editor.insert_table(&table(3, 3, true)).is_ok());
    assert!(editor.table_set_color(TableColorTarget::Header, "#ffcc00").is_ok());
    let grid = active_grid(&editor);
    assert!(editor.collapse_to(Position::new(grid[1][1], 0)).is_ok());
    assert!(editor.table_set_color(TableColorTarget::Cell, "#00ccff").is_ok());

    for (theme, border) in [(Theme::Light, "#cccccc"), (Theme::Dark, "#555555")] {
        editor.set_theme(theme);
        let doc = editor.surface().document();
        assert_eq!(style(doc, grid[0][1], "background-color"), "#ffcc00");
        assert_eq!(style(doc, grid[1][1], "background-color"), "#00ccff");
        assert_eq!(style(doc, grid[2][2], "background-color"), "");
        assert_eq!(style(doc, grid[2][2], "border-top"), format!("1px solid {border}"));
    }
    let colors = editor.table_get_colors().unwrap_or_default();
    assert_eq!(colors.header.as_deref(), Some("#ffcc00"));
    assert_eq!(colors.cell.as_deref(), Some("#00ccff"));
}

#[test]
fn handles_exist_only_while_an_object_is_active() {
    let mut editor = editor("<p>x</p>");
    assert!(editor.insert_text_box("note").is_ok());
    assert_eq!(editor.surface().objects().overlay().handles().len(), 2);
    assert!(!editor.overlay_frame().is_empty());
    let html = editor.serialize();
    assert!(!html.contains("drag-handle") && !html.contains("resize-handle"));

    let far = overlay_bounds(&editor).bottom_right().offset(500.0, 500.0);
    assert!(editor.pointer_down(None, far).is_ok());
    editor.pointer_up();
    assert!(editor.surface().objects().overlay().handles().is_empty());
    assert!(editor.take_events().contains(&EditorEvent::ObjectsDeactivated));
}

#[test]
fn every_content_change_is_followed_by_a_snapshot() {
    let mut editor = editor("<p>abc</p>");
    let text = first_text(&editor);
    assert!(editor.collapse_to(Position::new(text, 3)).is_ok());
    let _ = editor.take_events();

    let steps: Vec<Box<dyn Fn(&mut Editor)>> = vec![
        Box::new(|editor| {
            let _ = editor.insert_text("d");
        }),
        Box::new(|editor| {
            let _ = editor.insert_paragraph();
        }),
        Box::new(|editor| {
            let _ = editor.insert_text("e");
        }),
        Box::new(|editor| {
            let _ = editor.delete_backward();
        }),
        Box::new(|editor| {
            let _ = editor.select_all();
        }),
        Box::new(|editor| {
            let _ = editor.toggle_italic();
        }),
        Box::new(|editor| {
            let _ = editor.undo();
        }),
    ];
    for step in steps {
        step(&mut editor);
        let events = editor.take_events();
        if let Some(changed) = events.iter().position(|event| *event == EditorEvent::ContentChanged) {
            assert!(
                events[changed..]
                    .iter()
                    .any(|event| matches!(event, EditorEvent::SelectionChanged(_))),
                "no snapshot after content change: {events:?}"
            );
        }
    }
}

#[test]
fn load_failure_installs_empty_document_and_reports() {
    let mut config = EditorConfig::default();
    config.surface.load_limits.max_bytes = 16;
    let mut editor = editor_with(config, "<p>ok</p>");

    let result = editor.load_initial("<p>this document is far too long</p>");
    assert!(result.is_err());
    assert_eq!(editor.serialize(), lm_html::EMPTY_DOCUMENT);
    assert!(matches!(editor.take_events().last(), Some(EditorEvent::Status(_))));
    assert!(!editor.can_undo());
}

#[test]
fn root_is_editable_again_after_commit_and_cancel() {
    let mut editor = editor_with_text_box();
    assert_eq!(root_editable(&editor).as_deref(), Some("true"));

    assert!(editor.text_box_edit().is_ok());
    assert_eq!(root_editable(&editor).as_deref(), Some("false"));
    assert!(editor.text_box_commit().is_ok());
    assert_eq!(root_editable(&editor).as_deref(), Some("true"));

    assert!(editor.text_box_edit().is_ok());
    assert!(editor.text_box_cancel().is_ok());
    assert_eq!(root_editable(&editor).as_deref(), Some("true"));

    let abc = text_with(&editor, "abc");
    assert!(editor.collapse_to(Position::new(abc, 3)).is_ok());
    assert_eq!(editor.insert_text("Z").ok(), Some(CommandStatus::Applied));
    assert!(editor.serialize().contains("abcZ"));
}

#[test]
fn typing_into_a_text_box_outside_edit_mode_is_ignored() {
    let mut editor = editor_with_text_box();
    let note = text_with(&editor, "note");
    assert!(editor.collapse_to(Position::new(note, 4)).is_ok());
    let before = editor.serialize();
    let undo_depth = editor.stack_sizes().undo;

    assert_eq!(editor.insert_text("Z").ok(), Some(CommandStatus::Ignored));
    assert_eq!(editor.delete_backward().ok(), Some(CommandStatus::Ignored));
    assert_eq!(editor.toggle_bold().ok(), Some(CommandStatus::Ignored));
    assert_eq!(editor.serialize(), before);
    assert_eq!(editor.stack_sizes().undo, undo_depth);
}

#[test]
fn edit_mode_confines_typing_to_the_text_box() {
    let mut editor = editor_with_text_box();
    assert!(editor.text_box_edit().is_ok());

    let abc = text_with(&editor, "abc");
    assert!(editor.collapse_to(Position::new(abc, 3)).is_ok());
    assert_eq!(editor.insert_text("Z").ok(), Some(CommandStatus::Ignored));
    assert!(!editor.serialize().contains("abcZ"));

    let note = text_with(&editor, "note");
    assert!(editor.collapse_to(Position::new(note, 4)).is_ok());
    assert_eq!(editor.insert_text("!").ok(), Some(CommandStatus::Applied));
    assert!(editor.text_box_commit().is_ok());
    let html = editor.serialize();
    assert!(html.contains("note!"));
    assert!(html.contains("<p>abc</p>"));
}

#[test]
fn snapshots_taken_in_edit_mode_are_at_rest() {
    let mut editor = editor_with_text_box();
    assert!(editor.text_box_edit().is_ok());
    let note = text_with(&editor, "note");
    assert!(editor.collapse_to(Position::new(note, 4)).is_ok());
    assert_eq!(editor.insert_text("s").ok(), Some(CommandStatus::Applied));

    let Some(current) = editor.history().current().map(str::to_owned) else {
        unreachable!("history is never empty");
    };
    assert!(current.contains("notes"));
    assert!(!current.contains("contenteditable=\"true\""));

    assert!(editor.undo().is_ok_and(|outcome| outcome.ok));
    assert_eq!(root_editable(&editor).as_deref(), Some("true"));
    assert!(!editor.serialize().contains("contenteditable=\"true\""));
    assert!(!editor.surface().objects().state().is_editing());
}

#[test]
fn undo_across_a_theme_switch_keeps_theme_defaults() {
    let mut editor = editor("<p>x</p>");
    assert!(editor.insert_table(&table(2, 2, false)).is_ok());
    let grid = active_grid(&editor);
    assert!(editor.collapse_to(Position::new(grid[0][0], 0)).is_ok());
    assert_eq!(editor.insert_text("q").ok(), Some(CommandStatus::Applied));
    let depth = editor.stack_sizes().undo;

    editor.set_theme(Theme::Dark);
    assert_eq!(editor.stack_sizes().undo, depth);
    assert_eq!(editor.history().current(), Some(editor.serialize().as_str()));

    assert!(editor.undo().is_ok_and(|outcome| outcome.ok));
    assert_eq!(editor.theme(), Theme::Dark);
    let html = editor.serialize();
    assert!(html.contains("<table"));
    assert!(!html.contains(">q<"));
    assert!(html.contains("#555555"));
    assert!(!html.contains("#cccccc"));
    assert_eq!(editor.history().current(), Some(html.as_str()));
}
