//! URL prompts backed by the browser.
//!
//! [`WindowPrompt`] uses the blocking `window.prompt` dialog. [`CallbackPrompt`]
//! hands the request to a host function that may answer synchronously or
//! with a Promise, so pages can use their own dialog components.

use std::future::Future;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use wysiwyg_editor_core::{PromptKind, PromptRequest, UrlPrompt};

/// `window.prompt`. Blocks the page until the dialog is dismissed.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowPrompt;

impl UrlPrompt for WindowPrompt {
    fn request_url(&self, request: &PromptRequest) -> impl Future<Output = Option<String>> {
        let answer = web_sys::window().and_then(|window| {
            window
                .prompt_with_message_and_default(
                    &request.message,
                    request.default_value.as_deref().unwrap_or_default(),
                )
                .ok()
                .flatten()
        });
        std::future::ready(answer)
    }
}

/// Host-supplied prompt function.
///
/// Called as `callback(message, kind, defaultValue)` where `kind` is `"link"`
/// or `"image"`. It returns a string, `null`/`undefined` for cancel, or a
/// Promise resolving to either.
#[derive(Debug, Clone)]
pub struct CallbackPrompt {
    callback: js_sys::Function,
}

impl CallbackPrompt {
    pub fn new(callback: js_sys::Function) -> Self {
        Self { callback }
    }
}

impl UrlPrompt for CallbackPrompt {
    fn request_url(&self, request: &PromptRequest) -> impl Future<Output = Option<String>> {
        let callback = self.callback.clone();
        let request = request.clone();
        async move {
            let kind = match request.kind {
                PromptKind::Link => "link",
                PromptKind::Image => "image",
            };
            let default_value = request
                .default_value
                .as_deref()
                .map(JsValue::from_str)
                .unwrap_or(JsValue::UNDEFINED);

            let returned = match callback.call3(
                &JsValue::NULL,
                &JsValue::from_str(&request.message),
                &JsValue::from_str(kind),
                &default_value,
            ) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(?err, "prompt callback threw");
                    return None;
                }
            };

            let value = match returned.dyn_into::<js_sys::Promise>() {
                Ok(promise) => match JsFuture::from(promise).await {
                    Ok(value) => value,
                    Err(err) => {
                        tracing::warn!(?err, "prompt promise rejected");
                        return None;
                    }
                },
                Err(value) => value,
            };
            value.as_string()
        }
    }
}
