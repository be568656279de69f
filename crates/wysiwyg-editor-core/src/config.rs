//! Editor configuration.

use serde::{Deserialize, Serialize};

use crate::lists::ListStyles;
use crate::sanitize::SanitizePolicy;

/// Everything a host can configure when mounting an editor.
///
/// Field names are camelCase on the wire so the same shape works from
/// JSON and from a JS options object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Markup loaded into the surface at mount.
    pub initial_content: Option<String>,
    /// Whether the output mirror starts shown.
    pub output_visible: bool,
    pub list_styles: ListStyles,
    pub sanitize: SanitizePolicy,
    /// Bind Primary+B/I/U to bold, italic and underline.
    pub keybindings_enabled: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            initial_content: None,
            output_visible: true,
            list_styles: ListStyles::default(),
            sanitize: SanitizePolicy::default(),
            keybindings_enabled: true,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_initial_content(mut self, markup: impl Into<String>) -> Self {
        self.initial_content = Some(markup.into());
        self
    }
}
