use lm_dom::Position;
use lm_editor::Editor;
use lm_editor::EditorConfig;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Type(char),
    Backspace,
    Enter,
    SelectAll,
    Bold,
    FontSize(u32),
    Undo,
    Redo,
}

fn edit() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => proptest::char::range('a', 'z').prop_map(Op::Type),
        1 => Just(Op::Backspace),
        1 => Just(Op::Enter),
        1 => Just(Op::SelectAll),
        1 => Just(Op::Bold),
        1 => (8_u32..=36).prop_map(Op::FontSize),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => edit(),
        1 => Just(Op::Undo),
        1 => Just(Op::Redo),
    ]
}

fn editor() -> Editor {
    let mut editor = Editor::new(EditorConfig::default()).unwrap_or_else(|_| unreachable!());
    assert!(editor.load_initial("<p>seed</p>").is_ok());
    let doc = editor.surface().document();
    let text = doc.text_nodes_under(doc.root()).first().copied().unwrap_or_default();
    assert!(editor.collapse_to(Position::new(text, 4)).is_ok());
    editor
}

fn apply(editor: &mut Editor, op: &Op) {
    let _ = match op {
        Op::Type(ch) => editor.insert_text(&ch.to_string()).map(|_| ()),
        Op::Backspace => editor.delete_backward().map(|_| ()),
        Op::Enter => editor.insert_paragraph().map(|_| ()),
        Op::SelectAll => editor.select_all().map(|_| ()),
        Op::Bold => editor.toggle_bold().map(|_| ()),
        Op::FontSize(points) => editor.set_font_size(*points).map(|_| ()),
        Op::Undo => editor.undo().map(|_| ()),
        Op::Redo => editor.redo().map(|_| ()),
    };
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn top_of_undo_mirrors_the_document(ops in prop::collection::vec(op(), 0..40)) {
        let mut editor = editor();
        for op in &ops {
            apply(&mut editor, op);
            let html = editor.serialize();
            prop_assert_eq!(editor.history().current(), Some(html.as_str()), "after {:?}", op);
        }
    }

    #[test]
    fn undo_then_redo_restores_the_state(ops in prop::collection::vec(edit(), 1..30)) {
        let mut editor = editor();
        for op in &ops {
            apply(&mut editor, op);
        }
        let before = editor.serialize();
        let undone = editor.undo().unwrap_or_else(|_| unreachable!());
        if undone.ok {
            let redone = editor.redo().unwrap_or_else(|_| unreachable!());
            prop_assert!(redone.ok);
        }
        prop_assert_eq!(editor.serialize(), before);
    }
}
