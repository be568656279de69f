//! wysiwyg-editor-core: framework-free logic for a rich-text editing surface.
//!
//! This crate provides:
//! - a content tree parsed (and sanitized) from surface markup, serialized back canonically
//! - `apply_command`, the selection-scoped formatting function
//! - `normalize_lists`, the list styling pass run after every mutation
//! - `OutputMirror`, the escaped markup echo with its character count
//! - `EditorDocument` / `PlainEditor` tying it together, plus key handling

pub mod actions;
pub mod attrs;
pub mod config;
pub mod document;
pub mod error;
pub mod execute;
pub mod format;
pub mod inline;
pub mod keybindings;
pub mod lists;
pub mod mirror;
pub mod parse;
pub mod prompt;
pub mod sanitize;
pub mod serialize;
pub mod tree;
pub mod types;

pub use actions::{
    Alignment, BlockFormat, EditorCommand, Key, KeyCombo, KeydownResult, Modifiers,
};
pub use attrs::Attributes;
pub use config::EditorConfig;
pub use document::{EditorDocument, PlainEditor};
pub use error::{EditorError, SanitizeError};
pub use execute::{
    CommandOutcome, command_from_answer, execute_at, execute_command, insert_with_prompt,
    prompt_request,
};
pub use format::{Applied, apply_command};
pub use keybindings::{Keybindings, handle_keydown};
pub use lists::{ListStyles, normalize_lists};
pub use mirror::OutputMirror;
pub use parse::parse_html;
pub use prompt::{FixedPrompt, PromptKind, PromptRequest, UrlPrompt};
pub use sanitize::{SafeUrl, SanitizePolicy, UrlContext, sanitize_url};
pub use smol_str::SmolStr;
pub use tree::{
    Atom, Block, BlockKind, Container, Document, Inline, LeafInfo, List, ListItem, ListKind,
    Mark, MarkKind,
};
pub use types::Selection;
