//! Browser DOM layer for the wysiwyg editor.
//!
//! This crate provides DOM manipulation and browser event handling,
//! generic over any `EditorDocument` implementation. It assumes a
//! `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `dom_sync`: DOM ↔ document markup and selection synchronization
//! - `events`: keydown handling
//! - `list_style`: list styling on the live surface
//! - `output`: output mirror panel
//! - `prompt`: `window.prompt` and host-callback URL prompts
//! - `surface`: contenteditable setup and the listeners that drive it
//! - `platform`: OS detection for the shortcut modifier
//!
//! # Re-exports
//!
//! This crate re-exports `wysiwyg-editor-core` for convenience, so consumers
//! only need to depend on `wysiwyg-editor-browser`.

// Re-export core crate
pub use wysiwyg_editor_core;
pub use wysiwyg_editor_core::*;

pub mod dom_sync;
pub mod events;
pub mod list_style;
pub mod output;
pub mod platform;
pub mod prompt;
pub mod surface;

pub use dom_sync::{
    dom_position_to_offset, has_unsafe_content, offset_to_dom_position, read_markup,
    restore_selection, selection_from_dom, write_markup,
};
pub use events::{handle_keydown_event, key_combo_from_event};
pub use list_style::style_dom_lists;
pub use output::OutputPanel;
pub use platform::{Platform, platform};
pub use prompt::{CallbackPrompt, WindowPrompt};
pub use surface::SurfaceController;
