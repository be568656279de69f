//! JsEditor - the main editor wrapper for JavaScript.

use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use wysiwyg_editor_browser::{CallbackPrompt, OutputPanel, SurfaceController, WindowPrompt};
use wysiwyg_editor_core::{
    CommandOutcome, EditorCommand, EditorConfig, EditorDocument, EditorError, PlainEditor,
    PromptKind,
};

use crate::types::{JsCommandOutcome, JsEditorConfig};

type Controller = SurfaceController<PlainEditor>;

/// The main editor instance exposed to JavaScript.
///
/// Holds the configuration until `mount`, then drives the mounted surface.
#[wasm_bindgen]
pub struct JsEditor {
    config: EditorConfig,
    controller: Option<Controller>,
    prompt: Option<js_sys::Function>,
}

#[wasm_bindgen]
impl JsEditor {
    /// Create an editor. `config` may be omitted or partial.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<JsEditorConfig>) -> Self {
        Self {
            config: config.map(EditorConfig::from).unwrap_or_default(),
            controller: None,
            prompt: None,
        }
    }

    /// Create an editor from a JSON configuration string.
    #[wasm_bindgen(js_name = fromJson)]
    pub fn from_json(json: &str) -> Result<JsEditor, JsError> {
        let config = EditorConfig::from_json(json)
            .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?;
        Ok(Self {
            config,
            controller: None,
            prompt: None,
        })
    }

    // === Mounting ===

    /// Make `surface` editable and load the initial content into it.
    ///
    /// When `output` is given an output panel is built inside it. `onChange`
    /// is called with the current markup after every change.
    #[wasm_bindgen]
    pub fn mount(
        &mut self,
        surface: HtmlElement,
        output: Option<HtmlElement>,
        on_change: Option<js_sys::Function>,
    ) -> Result<(), JsError> {
        if self.controller.is_some() {
            return Err(JsError::new("Editor is already mounted"));
        }

        let controller = SurfaceController::mount(surface, PlainEditor::new(self.config.clone()));

        if let Some(container) = output {
            let panel = OutputPanel::create(&container)
                .map_err(|e| JsError::new(&format!("Failed to build output panel: {:?}", e)))?;
            controller.attach_output(panel);
        }
        if let Some(callback) = on_change {
            controller.set_on_change(move |mirror| {
                let this = JsValue::null();
                let _ = callback.call1(&this, &JsValue::from_str(mirror.markup()));
            });
        }

        self.controller = Some(controller);
        Ok(())
    }

    /// Check if the editor is mounted.
    #[wasm_bindgen(js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        self.controller.is_some()
    }

    /// Stop editing and remove the output panel.
    #[wasm_bindgen]
    pub fn unmount(&mut self) {
        if let Some(controller) = self.controller.take() {
            controller.unmount();
        }
    }

    /// Keep clicks on `toolbar` from stealing the selection.
    #[wasm_bindgen(js_name = guardToolbar)]
    pub fn guard_toolbar(&self, toolbar: &HtmlElement) -> Result<(), JsError> {
        self.controller()?.guard_toolbar(toolbar);
        Ok(())
    }

    /// Focus the editor.
    #[wasm_bindgen]
    pub fn focus(&self) {
        if let Some(controller) = &self.controller {
            controller.focus();
        }
    }

    // === Commands ===

    /// Run a formatting command by its directive name, e.g.
    /// `executeCommand("formatBlock", "h2")`.
    #[wasm_bindgen(js_name = executeCommand)]
    pub fn execute_command(
        &self,
        name: &str,
        value: Option<String>,
    ) -> Result<JsCommandOutcome, JsError> {
        let command = EditorCommand::from_name(name, value.as_deref()).map_err(to_js_error)?;
        let outcome = self.controller()?.execute(&command).map_err(to_js_error)?;
        Ok(outcome.into())
    }

    /// Prompt for a URL and link the selection to it.
    ///
    /// Resolves to the command outcome; rejects if the URL is refused.
    #[wasm_bindgen(js_name = insertLink)]
    pub fn insert_link(&self) -> Result<js_sys::Promise, JsError> {
        self.prompted(PromptKind::Link)
    }

    /// Prompt for an image URL and insert the image at the selection.
    #[wasm_bindgen(js_name = insertImage)]
    pub fn insert_image(&self) -> Result<js_sys::Promise, JsError> {
        self.prompted(PromptKind::Image)
    }

    /// Use `callback(message, kind, defaultValue)` instead of `window.prompt`
    /// for URLs. It may return a string, null, or a Promise of either.
    /// Pass `undefined` to go back to `window.prompt`.
    #[wasm_bindgen(js_name = setPrompt)]
    pub fn set_prompt(&mut self, callback: Option<js_sys::Function>) {
        self.prompt = callback;
    }

    // === Output ===

    /// Show or hide the output panel. Returns the new visibility.
    #[wasm_bindgen(js_name = toggleOutput)]
    pub fn toggle_output(&self) -> Result<bool, JsError> {
        Ok(self.controller()?.toggle_output())
    }

    #[wasm_bindgen(js_name = isOutputVisible)]
    pub fn is_output_visible(&self) -> bool {
        match &self.controller {
            Some(controller) => controller.is_output_visible(),
            None => self.config.output_visible,
        }
    }

    /// Current markup.
    #[wasm_bindgen(js_name = getHtml)]
    pub fn get_html(&self) -> String {
        match &self.controller {
            Some(controller) => controller.markup(),
            None => PlainEditor::new(self.config.clone()).markup(),
        }
    }

    /// Replace the content. The markup is sanitized first.
    #[wasm_bindgen(js_name = setHtml)]
    pub fn set_html(&mut self, markup: &str) {
        match &self.controller {
            Some(controller) => controller.load(markup),
            None => self.config.initial_content = Some(markup.to_string()),
        }
    }

    /// Length of the current markup in UTF-16 code units.
    #[wasm_bindgen(js_name = getCharCount)]
    pub fn get_char_count(&self) -> usize {
        match &self.controller {
            Some(controller) => controller.char_count(),
            None => PlainEditor::new(self.config.clone()).mirror().char_count(),
        }
    }
}

impl Default for JsEditor {
    fn default() -> Self {
        Self::new(None)
    }
}

// Internal methods (not exposed to JS)
impl JsEditor {
    fn controller(&self) -> Result<&Controller, JsError> {
        self.controller
            .as_ref()
            .ok_or_else(|| JsError::new("Editor is not mounted"))
    }

    fn prompted(&self, kind: PromptKind) -> Result<js_sys::Promise, JsError> {
        let controller = self.controller()?.clone();
        let prompt = self.prompt.clone();
        Ok(wasm_bindgen_futures::future_to_promise(async move {
            let result = match prompt {
                Some(callback) => {
                    controller
                        .insert_with_prompt(&CallbackPrompt::new(callback), kind)
                        .await
                }
                None => controller.insert_with_prompt(&WindowPrompt, kind).await,
            };
            outcome_to_js(result)
        }))
    }
}

fn outcome_to_js(result: Result<CommandOutcome, EditorError>) -> Result<JsValue, JsValue> {
    match result {
        Ok(outcome) => serde_wasm_bindgen::to_value(&JsCommandOutcome::from(outcome))
            .map_err(|e| JsError::new(&format!("Serialization error: {}", e)).into()),
        Err(err) => Err(to_js_error(err).into()),
    }
}

fn to_js_error(err: EditorError) -> JsError {
    JsError::new(&err.to_string())
}
