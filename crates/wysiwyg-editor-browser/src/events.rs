//! Browser event handling for the editor.
//!
//! Converts DOM keyboard events into core key combos and applies the
//! keydown contract: handled keys have their default prevented, everything
//! else is left to the browser.

use wysiwyg_editor_core::{
    EditorDocument, Key, KeyCombo, KeydownResult, Keybindings, Modifiers, handle_keydown,
};

/// Read the key and modifier state out of a keyboard event.
pub fn key_combo_from_event(event: &web_sys::KeyboardEvent) -> KeyCombo {
    KeyCombo::with_modifiers(
        Key::from_dom_key(&event.key()),
        Modifiers {
            ctrl: event.ctrl_key(),
            alt: event.alt_key(),
            shift: event.shift_key(),
            meta: event.meta_key(),
        },
    )
}

/// Handle a keydown event against `doc`.
///
/// Keys pressed during IME composition always belong to the browser.
pub fn handle_keydown_event<D: EditorDocument>(
    doc: &mut D,
    bindings: &Keybindings,
    event: &web_sys::KeyboardEvent,
) -> KeydownResult {
    if event.is_composing() {
        return KeydownResult::PassThrough;
    }

    let combo = key_combo_from_event(event);
    let result = handle_keydown(doc, bindings, combo);
    tracing::trace!(key = %event.key(), ?result, "keydown");
    if result == KeydownResult::Handled {
        event.prevent_default();
    }
    result
}
