//! Output mirror: a read-only echo of the surface markup.

use markdown_weaver_escape::escape_html;

/// Current markup plus whether the mirror panel is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputMirror {
    markup: String,
    visible: bool,
}

impl Default for OutputMirror {
    fn default() -> Self {
        Self::new(true)
    }
}

impl OutputMirror {
    pub fn new(visible: bool) -> Self {
        Self {
            markup: String::new(),
            visible,
        }
    }

    pub fn update(&mut self, markup: impl Into<String>) {
        self.markup = markup.into();
        tracing::trace!(chars = self.char_count(), "mirror updated");
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Markup escaped for display as text.
    pub fn escaped(&self) -> String {
        let mut out = String::with_capacity(self.markup.len());
        let _ = escape_html(&mut out, &self.markup);
        out
    }

    /// Length in UTF-16 code units, which is what the host reports as the
    /// string's length.
    pub fn char_count(&self) -> usize {
        self.markup.encode_utf16().count()
    }

    /// Label shown under the mirror, e.g. `19 characters`.
    pub fn count_label(&self) -> String {
        format!("{} characters", self.char_count())
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Flip visibility, returning the new state.
    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_and_escape() {
        let mut mirror = OutputMirror::default();
        mirror.update("<p><b>Hello</b></p>");
        assert_eq!(mirror.char_count(), 19);
        assert_eq!(mirror.count_label(), "19 characters");
        assert_eq!(mirror.escaped(), "&lt;p&gt;&lt;b&gt;Hello&lt;/b&gt;&lt;/p&gt;");
    }

    #[test]
    fn test_count_uses_utf16_units() {
        let mut mirror = OutputMirror::default();
        mirror.update("é😀");
        assert_eq!(mirror.char_count(), 3);
    }

    #[test]
    fn test_toggle_twice_restores() {
        let mut mirror = OutputMirror::new(true);
        assert!(!mirror.toggle());
        assert!(mirror.toggle());
        assert!(mirror.is_visible());
    }
}
