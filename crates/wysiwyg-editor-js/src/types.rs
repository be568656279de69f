//! Types exposed to JavaScript via wasm-bindgen.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;
use wysiwyg_editor_core::{CommandOutcome, EditorConfig, ListStyles, SanitizePolicy, SmolStr};

/// Editor options. Every field is optional; missing ones take the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default, rename_all = "camelCase")]
pub struct JsEditorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keybindings_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_styles: Option<JsListStyles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanitize: Option<JsSanitizePolicy>,
}

/// Class sets for unstyled lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct JsListStyles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unordered: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordered: Option<String>,
}

/// URL policy for links and images.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default, rename_all = "camelCase")]
pub struct JsSanitizePolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_schemes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_relative: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_data_images: Option<bool>,
}

impl From<JsEditorConfig> for EditorConfig {
    fn from(js: JsEditorConfig) -> Self {
        let defaults = EditorConfig::default();
        Self {
            initial_content: js.initial_content,
            output_visible: js.output_visible.unwrap_or(defaults.output_visible),
            keybindings_enabled: js
                .keybindings_enabled
                .unwrap_or(defaults.keybindings_enabled),
            list_styles: js.list_styles.map(ListStyles::from).unwrap_or_default(),
            sanitize: js.sanitize.map(SanitizePolicy::from).unwrap_or_default(),
        }
    }
}

impl From<JsListStyles> for ListStyles {
    fn from(js: JsListStyles) -> Self {
        let defaults = ListStyles::default();
        Self {
            unordered: js.unordered.unwrap_or(defaults.unordered),
            ordered: js.ordered.unwrap_or(defaults.ordered),
        }
    }
}

impl From<JsSanitizePolicy> for SanitizePolicy {
    fn from(js: JsSanitizePolicy) -> Self {
        let defaults = SanitizePolicy::default();
        Self {
            allowed_schemes: js
                .allowed_schemes
                .map(|schemes| {
                    schemes
                        .iter()
                        .map(|s| SmolStr::new(s.to_ascii_lowercase()))
                        .collect()
                })
                .unwrap_or(defaults.allowed_schemes),
            allow_relative: js.allow_relative.unwrap_or(defaults.allow_relative),
            allow_data_images: js.allow_data_images.unwrap_or(defaults.allow_data_images),
        }
    }
}

/// What a command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum JsCommandOutcome {
    Applied,
    Unchanged,
    NoSelection,
    Cancelled,
}

impl From<CommandOutcome> for JsCommandOutcome {
    fn from(outcome: CommandOutcome) -> Self {
        match outcome {
            CommandOutcome::Applied => Self::Applied,
            CommandOutcome::Unchanged => Self::Unchanged,
            CommandOutcome::NoSelection => Self::NoSelection,
            CommandOutcome::Cancelled => Self::Cancelled,
        }
    }
}
