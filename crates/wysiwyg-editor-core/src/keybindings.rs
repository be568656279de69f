//! Keyboard shortcuts and Enter handling.

use std::collections::HashMap;

use crate::actions::{EditorCommand, Key, KeyCombo, KeydownResult};
use crate::document::EditorDocument;
use crate::execute::execute_command;

/// Maps key combos to commands.
#[derive(Debug, Clone, Default)]
pub struct Keybindings {
    bindings: HashMap<KeyCombo, EditorCommand>,
}

impl Keybindings {
    /// Primary+B/I/U for bold, italic and underline (Cmd on mac, Ctrl elsewhere).
    pub fn default_for_platform(is_mac: bool) -> Self {
        let mut bindings = HashMap::new();
        bindings.insert(KeyCombo::primary(Key::character("b"), is_mac), EditorCommand::Bold);
        bindings.insert(KeyCombo::primary(Key::character("i"), is_mac), EditorCommand::Italic);
        bindings.insert(
            KeyCombo::primary(Key::character("u"), is_mac),
            EditorCommand::Underline,
        );
        Self { bindings }
    }

    pub fn bind(&mut self, combo: KeyCombo, command: EditorCommand) {
        self.bindings.insert(combo, command);
    }

    /// Command bound to `combo`. Letter case is ignored.
    pub fn lookup(&self, combo: &KeyCombo) -> Option<&EditorCommand> {
        self.bindings.get(combo).or_else(|| {
            let lowered = KeyCombo::with_modifiers(combo.key.to_lowercase(), combo.modifiers);
            self.bindings.get(&lowered)
        })
    }
}

/// Handle a keydown.
///
/// Enter inside a list item is left to the host so native list continuation
/// keeps working. Plain Enter anywhere else inserts a `<br>` instead of a new
/// block. Bound shortcuts run their command.
pub fn handle_keydown<D: EditorDocument>(
    doc: &mut D,
    bindings: &Keybindings,
    combo: KeyCombo,
) -> KeydownResult {
    if combo.key == Key::Enter {
        if doc.is_caret_in_list_item() {
            return KeydownResult::PassThrough;
        }
        if combo.modifiers.is_none() {
            if let Err(err) = execute_command(doc, &EditorCommand::InsertLineBreak) {
                tracing::warn!(%err, "line break failed");
            }
            return KeydownResult::Handled;
        }
        return KeydownResult::NotHandled;
    }

    if let Some(command) = bindings.lookup(&combo).cloned() {
        if let Err(err) = execute_command(doc, &command) {
            tracing::warn!(command = command.name(), %err, "keybinding command failed");
        }
        return KeydownResult::Handled;
    }
    KeydownResult::NotHandled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Modifiers;
    use crate::document::PlainEditor;
    use crate::types::Selection;

    fn editor(markup: &str, caret: usize) -> PlainEditor {
        let mut editor = PlainEditor::from_markup(markup);
        editor.set_selection(Some(Selection::collapsed(caret)));
        editor
    }

    #[test]
    fn test_enter_in_list_item_passes_through() {
        let bindings = Keybindings::default_for_platform(false);
        let mut ed = editor("<ul><li>one</li><li>two</li></ul>", 5);
        let before = ed.markup();
        let result = handle_keydown(&mut ed, &bindings, KeyCombo::new(Key::Enter));
        assert_eq!(result, KeydownResult::PassThrough);
        assert_eq!(ed.markup(), before);
        assert!(!ed.markup().contains("<br>"));
    }

    #[test]
    fn test_enter_in_nested_block_of_item_passes_through() {
        let bindings = Keybindings::default_for_platform(false);
        let mut ed = editor("<ul><li><p>para in item</p></li></ul>", 3);
        let result = handle_keydown(&mut ed, &bindings, KeyCombo::new(Key::Enter));
        assert_eq!(result, KeydownResult::PassThrough);
    }

    #[test]
    fn test_plain_enter_inserts_line_break() {
        let bindings = Keybindings::default_for_platform(false);
        let mut ed = editor("<p>Hello</p>", 5);
        let result = handle_keydown(&mut ed, &bindings, KeyCombo::new(Key::Enter));
        assert_eq!(result, KeydownResult::Handled);
        assert_eq!(ed.markup(), "<p>Hello<br><br></p>");
        assert_eq!(ed.markup().matches("<p>").count(), 1);
        assert_eq!(ed.selection(), Some(Selection::collapsed(6)));
    }

    #[test]
    fn test_modified_enter_left_alone() {
        let bindings = Keybindings::default_for_platform(false);
        let mut ed = editor("<p>Hello</p>", 5);
        let result = handle_keydown(&mut ed, &bindings, KeyCombo::shift(Key::Enter));
        assert_eq!(result, KeydownResult::NotHandled);
        assert_eq!(ed.markup(), "<p>Hello</p>");
    }

    #[test]
    fn test_primary_shortcuts() {
        let mut ed = PlainEditor::from_markup("<p>Hello</p>");
        ed.set_selection(Some(Selection::new(0, 5)));

        let mac = Keybindings::default_for_platform(true);
        let combo = KeyCombo::with_modifiers(Key::character("B"), Modifiers::META);
        assert_eq!(handle_keydown(&mut ed, &mac, combo), KeydownResult::Handled);
        assert_eq!(ed.markup(), "<p><b>Hello</b></p>");

        // Ctrl+B on mac isn't bound.
        let combo = KeyCombo::primary(Key::character("b"), false);
        assert_eq!(handle_keydown(&mut ed, &mac, combo), KeydownResult::NotHandled);
        assert_eq!(ed.markup(), "<p><b>Hello</b></p>");
    }

    #[test]
    fn test_plain_typing_not_handled() {
        let bindings = Keybindings::default_for_platform(false);
        let mut ed = editor("<p>Hello</p>", 5);
        let result = handle_keydown(&mut ed, &bindings, KeyCombo::new(Key::character("a")));
        assert_eq!(result, KeydownResult::NotHandled);
        let result = handle_keydown(&mut ed, &bindings, KeyCombo::new(Key::ArrowLeft));
        assert_eq!(result, KeydownResult::NotHandled);
        assert_eq!(ed.markup(), "<p>Hello</p>");
    }
}
