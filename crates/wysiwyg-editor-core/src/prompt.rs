//! Asking the host for a URL.
//!
//! Link and image insertion need a URL from the user. The request goes out
//! through [`UrlPrompt`] and the answer comes back asynchronously, so hosts
//! can show a modal, a popover, or fall back to a blocking dialog.

use std::future::Future;

use crate::sanitize::UrlContext;

/// What the URL is being requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Link,
    Image,
}

impl PromptKind {
    pub fn message(self) -> &'static str {
        match self {
            Self::Link => "Enter URL:",
            Self::Image => "Enter image URL:",
        }
    }

    pub fn url_context(self) -> UrlContext {
        match self {
            Self::Link => UrlContext::Link,
            Self::Image => UrlContext::Image,
        }
    }
}

/// A pending URL request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub kind: PromptKind,
    pub message: String,
    /// Prefill for the input, e.g. the selected text when it looks like a URL.
    pub default_value: Option<String>,
}

impl PromptRequest {
    pub fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            message: kind.message().to_string(),
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Source of URLs for link and image commands.
///
/// `None` means the user cancelled.
pub trait UrlPrompt {
    fn request_url(&self, request: &PromptRequest) -> impl Future<Output = Option<String>>;
}

/// Prompt that answers immediately with a fixed value. Useful for scripted
/// hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct FixedPrompt(pub Option<String>);

impl UrlPrompt for FixedPrompt {
    fn request_url(&self, _request: &PromptRequest) -> impl Future<Output = Option<String>> {
        std::future::ready(self.0.clone())
    }
}
