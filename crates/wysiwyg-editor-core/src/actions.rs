//! Editor commands and key input types.
//!
//! `EditorCommand` is the semantic formatting intent, decoupled from how it
//! was triggered (toolbar button, keybinding, host script). Names accepted by
//! [`EditorCommand::from_name`] follow the native editing directive names so
//! existing toolbars can keep sending them.

use smol_str::SmolStr;

use crate::error::EditorError;
use crate::tree::BlockKind;

/// Horizontal alignment for `justify*` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Full,
}

impl Alignment {
    /// Value for the `text-align` style property.
    pub fn css_value(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Full => "justify",
        }
    }
}

/// Target of a `formatBlock` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockFormat {
    Paragraph,
    Heading(u8),
    Division,
    Preformatted,
    Quote,
}

impl BlockFormat {
    /// Parse `h1`, `<h1>`, `P`, etc.
    pub fn parse(arg: &str) -> Result<Self, EditorError> {
        let tag = arg
            .trim()
            .trim_start_matches('<')
            .trim_end_matches('>')
            .to_ascii_lowercase();
        match BlockKind::from_tag(&tag) {
            Some(BlockKind::Paragraph) => Ok(Self::Paragraph),
            Some(BlockKind::Heading(level)) => Ok(Self::Heading(level)),
            Some(BlockKind::Division) => Ok(Self::Division),
            Some(BlockKind::Preformatted) => Ok(Self::Preformatted),
            Some(BlockKind::Quote) => Ok(Self::Quote),
            Some(BlockKind::Bare) | None => Err(EditorError::UnsupportedBlockFormat(arg.to_string())),
        }
    }

    pub fn block_kind(self) -> BlockKind {
        match self {
            Self::Paragraph => BlockKind::Paragraph,
            Self::Heading(level) => BlockKind::Heading(level.clamp(1, 6)),
            Self::Division => BlockKind::Division,
            Self::Preformatted => BlockKind::Preformatted,
            Self::Quote => BlockKind::Quote,
        }
    }
}

/// All formatting and editing intents the dispatcher understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommand {
    // === Inline toggles ===
    Bold,
    Italic,
    Underline,

    // === Links and images ===
    /// Wrap the selection in a link (or insert the URL as linked text).
    CreateLink { url: String },
    /// Replace the selection with an image.
    InsertImage { url: String },

    // === Block structure ===
    InsertUnorderedList,
    InsertOrderedList,
    FormatBlock(BlockFormat),
    Justify(Alignment),

    // === Text entry ===
    /// `<br>` at the caret.
    InsertLineBreak,
    /// Split the current block or list item.
    InsertParagraph,
    InsertText { text: String },
}

impl EditorCommand {
    /// Build a command from its directive name and optional argument.
    pub fn from_name(name: &str, arg: Option<&str>) -> Result<Self, EditorError> {
        let required = |command: &str| -> Result<String, EditorError> {
            arg.map(str::to_string)
                .ok_or_else(|| EditorError::MissingArgument {
                    command: command.to_string(),
                })
        };
        Ok(match name {
            "bold" => Self::Bold,
            "italic" => Self::Italic,
            "underline" => Self::Underline,
            "createLink" => Self::CreateLink {
                url: required(name)?,
            },
            "insertImage" => Self::InsertImage {
                url: required(name)?,
            },
            "insertUnorderedList" => Self::InsertUnorderedList,
            "insertOrderedList" => Self::InsertOrderedList,
            "formatBlock" => Self::FormatBlock(BlockFormat::parse(&required(name)?)?),
            "justifyLeft" => Self::Justify(Alignment::Left),
            "justifyCenter" => Self::Justify(Alignment::Center),
            "justifyRight" => Self::Justify(Alignment::Right),
            "justifyFull" => Self::Justify(Alignment::Full),
            "insertLineBreak" => Self::InsertLineBreak,
            "insertParagraph" => Self::InsertParagraph,
            "insertText" => Self::InsertText {
                text: required(name)?,
            },
            other => return Err(EditorError::UnknownCommand(other.to_string())),
        })
    }

    /// Directive name, as accepted by `from_name`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::CreateLink { .. } => "createLink",
            Self::InsertImage { .. } => "insertImage",
            Self::InsertUnorderedList => "insertUnorderedList",
            Self::InsertOrderedList => "insertOrderedList",
            Self::FormatBlock(_) => "formatBlock",
            Self::Justify(Alignment::Left) => "justifyLeft",
            Self::Justify(Alignment::Center) => "justifyCenter",
            Self::Justify(Alignment::Right) => "justifyRight",
            Self::Justify(Alignment::Full) => "justifyFull",
            Self::InsertLineBreak => "insertLineBreak",
            Self::InsertParagraph => "insertParagraph",
            Self::InsertText { .. } => "insertText",
        }
    }
}

/// Key values for keyboard input.
///
/// Platform-specific code converts native key events into this.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),
    Enter,
    Tab,
    Backspace,
    Delete,
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,
    Shift,
    Control,
    Alt,
    Meta,
    Unidentified,
}

impl Key {
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Convert a DOM `KeyboardEvent.key` value.
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "Escape" => Self::Escape,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "Home" => Self::Home,
            "End" => Self::End,
            "PageUp" => Self::PageUp,
            "PageDown" => Self::PageDown,
            "Shift" => Self::Shift,
            "Control" => Self::Control,
            "Alt" => Self::Alt,
            "Meta" => Self::Meta,
            k if k.chars().count() == 1 => Self::Character(SmolStr::new(k)),
            _ => Self::Unidentified,
        }
    }

    /// Same key ignoring letter case (`B` with Shift held is still `b`).
    pub fn to_lowercase(&self) -> Self {
        match self {
            Self::Character(s) => Self::Character(SmolStr::new(s.to_lowercase())),
            other => other.clone(),
        }
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    /// Primary modifier for the platform (Cmd on Mac, Ctrl elsewhere).
    pub fn primary(is_mac: bool) -> Self {
        if is_mac { Self::META } else { Self::CTRL }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

/// A key plus the modifiers held with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn shift(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::SHIFT,
        }
    }

    pub fn primary(key: Key, is_mac: bool) -> Self {
        Self {
            key,
            modifiers: Modifiers::primary(is_mac),
        }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Not a binding of ours, let the platform handle it.
    NotHandled,
    /// Deliberately left to the host's native behaviour (list continuation).
    PassThrough,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(EditorCommand::from_name("bold", None).unwrap(), EditorCommand::Bold);
        assert_eq!(
            EditorCommand::from_name("justifyFull", None).unwrap(),
            EditorCommand::Justify(Alignment::Full)
        );
        assert_eq!(
            EditorCommand::from_name("formatBlock", Some("<H2>")).unwrap(),
            EditorCommand::FormatBlock(BlockFormat::Heading(2))
        );
        assert_eq!(
            EditorCommand::from_name("createLink", Some("https://a.test")).unwrap(),
            EditorCommand::CreateLink {
                url: "https://a.test".into()
            }
        );
    }

    #[test]
    fn test_from_name_errors() {
        assert!(matches!(
            EditorCommand::from_name("fontSize", None),
            Err(EditorError::UnknownCommand(_))
        ));
        assert!(matches!(
            EditorCommand::from_name("createLink", None),
            Err(EditorError::MissingArgument { .. })
        ));
        assert!(matches!(
            EditorCommand::from_name("formatBlock", Some("table")),
            Err(EditorError::UnsupportedBlockFormat(_))
        ));
    }

    #[test]
    fn test_name_roundtrips() {
        for cmd in [
            EditorCommand::Italic,
            EditorCommand::InsertOrderedList,
            EditorCommand::Justify(Alignment::Center),
            EditorCommand::InsertParagraph,
        ] {
            assert_eq!(EditorCommand::from_name(cmd.name(), None).unwrap(), cmd);
        }
    }

    #[test]
    fn test_dom_keys() {
        assert_eq!(Key::from_dom_key("Enter"), Key::Enter);
        assert_eq!(Key::from_dom_key("B").to_lowercase(), Key::character("b"));
        assert_eq!(Key::from_dom_key("F13"), Key::Unidentified);
    }
}
