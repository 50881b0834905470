//! Line-based command scripts.
//!
//! One command per line; blank lines and lines starting with `#` are
//! skipped. The first word names the command and the rest are its
//! arguments, e.g. `size 18`, `table 3 3 header`, `object radius 8px`.

use crate::assets;
use lm_commands::Command;
use lm_core::Alignment;
use lm_core::BlockStyle;
use lm_core::CaseMode;
use lm_core::ColorTarget;
use lm_core::EditorError;
use lm_core::EditorResult;
use lm_core::InlineStyle;
use lm_core::Key;
use lm_core::ListKind;
use lm_core::Modifiers;
use lm_core::SpacingScope;
use lm_core::Theme;
use lm_dom::Position;
use lm_dom::Range;
use lm_editor::CommandStatus;
use lm_editor::Editor;
use lm_layout::Point;
use lm_layout::Viewport;
use lm_objects::ColumnPosition;
use lm_objects::ImageSpec;
use lm_objects::RowPosition;
use lm_objects::TableColorTarget;
use lm_objects::TableSpec;
use lm_objects::TableWidth;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caret {
    Start,
    End,
    Offset(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Html,
    Text,
    Snapshot,
    Object,
    History,
    TableColors,
    TableBorders,
    TableMargins,
}

/// Active-object commands without arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectAction {
    Float,
    Forward,
    Backward,
    ResetSize,
    Delete,
    EditText,
    CommitText,
    CancelText,
}

/// One parsed script line.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Edit(Command),
    Caret(Caret),
    Select { start: usize, end: usize },
    Undo,
    Redo,
    Theme(Theme),
    Viewport { width: f32, height: f32 },
    InsertImage { reference: String, width: Option<f32> },
    InsertTable(TableSpec),
    InsertTextBox(String),
    ObjectProperty { name: String, value: String },
    Object(ObjectAction),
    AddRow(RowPosition),
    AddColumn(ColumnPosition),
    DeleteRow(Option<usize>),
    DeleteColumn(Option<usize>),
    DeleteTable,
    BorderSides(Vec<String>),
    TableColor { target: TableColorTarget, color: String },
    Click(Point),
    Drag { from: Point, to: Point, modifiers: Modifiers },
    Key(Key, Modifiers),
    Eval(String),
    Print(Report),
}

fn invalid(line: &str, reason: &str) -> EditorError {
    EditorError::invalid_argument("app.script.syntax", format!("{reason}: {line:?}"))
}

fn number<T: std::str::FromStr>(line: &str, token: Option<&str>) -> EditorResult<T> {
    token
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| invalid(line, "expected a number"))
}

fn scope(token: Option<&str>) -> SpacingScope {
    match token {
        Some("all") => SpacingScope::All,
        _ => SpacingScope::Current,
    }
}

fn modifiers(tokens: &[&str]) -> Modifiers {
    Modifiers {
        shift: tokens.contains(&"shift"),
        ctrl: tokens.contains(&"ctrl"),
        alt: tokens.contains(&"alt"),
    }
}

fn key(line: &str, name: &str) -> EditorResult<Key> {
    let key = match name {
        "enter" => Key::Enter,
        "escape" | "esc" => Key::Escape,
        "tab" => Key::Tab,
        "backspace" => Key::Backspace,
        "delete" => Key::Delete,
        _ => {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Key::Char(ch),
                _ => return Err(invalid(line, "unknown key")),
            }
        }
    };
    Ok(key)
}

/// Parses one line. `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str) -> EditorResult<Option<Step>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = trimmed.split_once(char::is_whitespace).unwrap_or((trimmed, ""));
    let rest = rest.trim_start();
    let args: Vec<&str> = rest.split_whitespace().collect();
    let arg = |index: usize| args.get(index).copied();

    let step = match word {
        "type" => Step::Edit(Command::InsertText(rest.to_owned())),
        "enter" => Step::Edit(Command::InsertParagraph),
        "break" => Step::Edit(Command::InsertLineBreak),
        "backspace" => Step::Edit(Command::DeleteBackward),
        "delete" => Step::Edit(Command::DeleteForward),
        "indent" => Step::Edit(Command::Indent),
        "outdent" => Step::Edit(Command::Outdent),
        "clear-formatting" => Step::Edit(Command::ClearFormatting),
        "bold" | "italic" | "underline" | "strike" | "sub" | "sup" => match InlineStyle::from_name(word) {
            Some(style) => Step::Edit(Command::ToggleInline(style)),
            None => return Err(invalid(line, "unknown inline style")),
        },
        "block" => BlockStyle::from_name(rest)
            .map(|style| Step::Edit(Command::SetBlockStyle(style)))
            .ok_or_else(|| invalid(line, "unknown block style"))?,
        "font" if !rest.is_empty() => Step::Edit(Command::SetFontFamily(rest.to_owned())),
        "size" => Step::Edit(Command::SetFontSize(number(line, arg(0))?)),
        "list" => ListKind::from_name(rest)
            .map(|kind| Step::Edit(Command::ToggleList(kind)))
            .ok_or_else(|| invalid(line, "unknown list kind"))?,
        "align" => Alignment::from_css(rest)
            .map(|alignment| Step::Edit(Command::SetAlignment(alignment)))
            .ok_or_else(|| invalid(line, "unknown alignment"))?,
        "color" => {
            let target = match arg(0) {
                Some("text") => ColorTarget::Text,
                Some("background") => ColorTarget::Background,
                _ => return Err(invalid(line, "expected text or background")),
            };
            let color = arg(1).ok_or_else(|| invalid(line, "missing color"))?;
            Step::Edit(Command::SetColor {
                target,
                color: color.to_owned(),
            })
        }
        "case" => CaseMode::from_name(rest)
            .map(|mode| Step::Edit(Command::ChangeCase(mode)))
            .ok_or_else(|| invalid(line, "unknown case mode"))?,
        "paragraph-spacing" => Step::Edit(Command::SetParagraphSpacing {
            px: number(line, arg(0))?,
            scope: scope(arg(1)),
        }),
        "line-spacing" => Step::Edit(Command::SetLineSpacing {
            multiplier: number(line, arg(0))?,
            scope: scope(arg(1)),
        }),
        "columns" => Step::Edit(Command::SetColumns(number(line, arg(0))?)),
        "select" if rest == "all" => Step::Edit(Command::SelectAll),
        "select" => Step::Select {
            start: number(line, arg(0))?,
            end: number(line, arg(1))?,
        },
        "caret" => match arg(0) {
            Some("start") => Step::Caret(Caret::Start),
            Some("end") => Step::Caret(Caret::End),
            token => Step::Caret(Caret::Offset(number(line, token)?)),
        },
        "undo" => Step::Undo,
        "redo" => Step::Redo,
        "theme" => Theme::from_name(rest)
            .map(Step::Theme)
            .ok_or_else(|| invalid(line, "expected light or dark"))?,
        "viewport" => Step::Viewport {
            width: number(line, arg(0))?,
            height: number(line, arg(1))?,
        },
        "image" => Step::InsertImage {
            reference: arg(0).ok_or_else(|| invalid(line, "missing image path"))?.to_owned(),
            width: arg(1).map(|token| number(line, Some(token))).transpose()?,
        },
        "table" => {
            let flags = args.get(2..).unwrap_or_default();
            let width = flags
                .iter()
                .find_map(|flag| flag.strip_prefix("width=").and_then(TableWidth::from_name))
                .unwrap_or_default();
            Step::InsertTable(TableSpec {
                rows: number(line, arg(0))?,
                cols: number(line, arg(1))?,
                has_header: flags.contains(&"header"),
                width,
                floating: flags.contains(&"floating"),
                ..TableSpec::default()
            })
        }
        "text-box" => Step::InsertTextBox(rest.to_owned()),
        "object" => match args.as_slice() {
            ["float"] => Step::Object(ObjectAction::Float),
            ["forward"] => Step::Object(ObjectAction::Forward),
            ["backward"] => Step::Object(ObjectAction::Backward),
            ["reset-size"] => Step::Object(ObjectAction::ResetSize),
            ["delete"] => Step::Object(ObjectAction::Delete),
            [name, ..] if args.len() > 1 => Step::ObjectProperty {
                name: (*name).to_owned(),
                value: args[1..].join(" "),
            },
            _ => return Err(invalid(line, "unknown object command")),
        },
        "edit-text" => Step::Object(ObjectAction::EditText),
        "commit-text" => Step::Object(ObjectAction::CommitText),
        "cancel-text" => Step::Object(ObjectAction::CancelText),
        "row" => match arg(0) {
            Some("above") => Step::AddRow(RowPosition::Above),
            Some("below") => Step::AddRow(RowPosition::Below),
            _ => return Err(invalid(line, "expected above or below")),
        },
        "column" => match arg(0) {
            Some("before") => Step::AddColumn(ColumnPosition::Before),
            Some("after") => Step::AddColumn(ColumnPosition::After),
            _ => return Err(invalid(line, "expected before or after")),
        },
        "delete-row" => Step::DeleteRow(arg(0).map(|token| number(line, Some(token))).transpose()?),
        "delete-column" => Step::DeleteColumn(arg(0).map(|token| number(line, Some(token))).transpose()?),
        "delete-table" => Step::DeleteTable,
        "borders" if !args.is_empty() => {
            Step::BorderSides(args.iter().map(|side| (*side).to_owned()).collect())
        }
        "table-color" => Step::TableColor {
            target: arg(0)
                .and_then(TableColorTarget::from_name)
                .ok_or_else(|| invalid(line, "unknown table color target"))?,
            color: arg(1).ok_or_else(|| invalid(line, "missing color"))?.to_owned(),
        },
        "click" => Step::Click(Point::new(number(line, arg(0))?, number(line, arg(1))?)),
        "drag" => Step::Drag {
            from: Point::new(number(line, arg(0))?, number(line, arg(1))?),
            to: Point::new(number(line, arg(2))?, number(line, arg(3))?),
            modifiers: modifiers(args.get(4..).unwrap_or_default()),
        },
        "key" => Step::Key(
            key(line, arg(0).ok_or_else(|| invalid(line, "missing key"))?)?,
            modifiers(args.get(1..).unwrap_or_default()),
        ),
        "eval" if !rest.is_empty() => Step::Eval(rest.to_owned()),
        "print" => Step::Print(match arg(0) {
            Some("html") | None => Report::Html,
            Some("text") => Report::Text,
            Some("snapshot") => Report::Snapshot,
            Some("object") => Report::Object,
            Some("history") => Report::History,
            Some("colors") => Report::TableColors,
            Some("borders") => Report::TableBorders,
            Some("margins") => Report::TableMargins,
            Some(_) => return Err(invalid(line, "unknown report")),
        }),
        _ => return Err(invalid(line, "unknown command")),
    };
    Ok(Some(step))
}

/// Caret position `offset` characters into the document text.
fn locate(editor: &Editor, offset: usize) -> Option<Position> {
    let doc = editor.surface().document();
    let mut remaining = offset;
    let mut last = None;
    for text in doc.text_nodes_under(doc.root()) {
        let len = doc.node_length(text);
        if remaining <= len {
            return Some(Position::new(text, remaining));
        }
        remaining -= len;
        last = Some(Position::new(text, len));
    }
    last
}

fn json<T: serde::Serialize>(value: &T) -> EditorResult<String> {
    serde_json::to_string(value)
        .map_err(|error| EditorError::serialization("app.report", error.to_string()))
}

/// Runs one step. Returns text the host should print.
pub fn run_step(editor: &mut Editor, step: Step, base_dir: &Path) -> EditorResult<Option<String>> {
    match step {
        Step::Edit(command) => {
            if editor.execute(&command)? == CommandStatus::Ignored {
                debug!(command = command.name(), "ignored, nothing selected");
            }
        }
        Step::Caret(Caret::Start) => editor.set_caret_initial(),
        Step::Caret(Caret::End) => {
            let end = locate(editor, usize::MAX).ok_or_else(EditorError::no_selection)?;
            editor.collapse_to(end)?;
        }
        Step::Caret(Caret::Offset(offset)) => {
            let position = locate(editor, offset).ok_or_else(EditorError::no_selection)?;
            editor.collapse_to(position)?;
        }
        Step::Select { start, end } => {
            let (Some(start), Some(end)) = (locate(editor, start), locate(editor, end)) else {
                return Err(EditorError::no_selection());
            };
            editor.set_selection(Range::new(start, end))?;
        }
        Step::Undo => {
            let outcome = editor.undo()?;
            return Ok(outcome.at_initial.then(|| "at initial state".to_owned()));
        }
        Step::Redo => {
            editor.redo()?;
        }
        Step::Theme(theme) => editor.set_theme(theme),
        Step::Viewport { width, height } => editor.set_viewport(Viewport {
            width,
            height,
            ..Viewport::default()
        }),
        Step::InsertImage { reference, width } => {
            let asset = assets::resolve_image(&reference, base_dir)?;
            let spec = ImageSpec {
                source: asset.url,
                alt: reference,
                width,
                intrinsic: asset.intrinsic,
                ..ImageSpec::default()
            };
            editor.insert_image(&spec)?;
        }
        Step::InsertTable(spec) => {
            editor.insert_table(&spec)?;
        }
        Step::InsertTextBox(text) => {
            editor.insert_text_box(&text)?;
        }
        Step::ObjectProperty { name, value } => editor.object_apply(&name, &value)?,
        Step::Object(action) => match action {
            ObjectAction::Float => editor.object_set_floating()?,
            ObjectAction::Forward => return editor.object_bring_forward().map(|z| Some(format!("z-index {z}"))),
            ObjectAction::Backward => return editor.object_send_backward().map(|z| Some(format!("z-index {z}"))),
            ObjectAction::ResetSize => editor.object_reset_size()?,
            ObjectAction::Delete => editor.object_delete()?,
            ObjectAction::EditText => editor.text_box_edit()?,
            ObjectAction::CommitText => editor.text_box_commit()?,
            ObjectAction::CancelText => editor.text_box_cancel()?,
        },
        Step::AddRow(position) => editor.table_add_row(position)?,
        Step::AddColumn(position) => editor.table_add_column(position)?,
        Step::DeleteRow(index) => editor.table_delete_row(index)?,
        Step::DeleteColumn(index) => editor.table_delete_column(index)?,
        Step::DeleteTable => editor.table_delete()?,
        Step::BorderSides(sides) => editor.table_set_border_sides(&sides)?,
        Step::TableColor { target, color } => editor.table_set_color(target, &color)?,
        Step::Click(point) => {
            editor.pointer_down(None, point)?;
            editor.pointer_up();
        }
        Step::Drag { from, to, modifiers } => {
            editor.pointer_down(None, from)?;
            editor.pointer_move(to, modifiers);
            editor.pointer_up();
        }
        Step::Key(key, modifiers) => editor.key_down(key, modifiers)?,
        Step::Eval(expression) => {
            let evaluation = editor.evaluate(&expression)?;
            return Ok(Some(evaluation.value.to_display_string()));
        }
        Step::Print(report) => {
            let text = match report {
                Report::Html => editor.serialize(),
                Report::Text => editor.plain_text(),
                Report::Snapshot => json(&editor.snapshot()?)?,
                Report::Object => match editor.active_object() {
                    Some(info) => json(&info)?,
                    None => "no active object".to_owned(),
                },
                Report::History => {
                    let sizes = editor.stack_sizes();
                    format!("undo {} redo {}", sizes.undo, sizes.redo)
                }
                Report::TableColors => json(&editor.table_get_colors()?)?,
                Report::TableBorders => json(&editor.table_get_border_style()?)?,
                Report::TableMargins => json(&editor.table_get_margins()?)?,
            };
            return Ok(Some(text));
        }
    }
    Ok(None)
}
