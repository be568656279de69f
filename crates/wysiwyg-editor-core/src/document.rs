//! Core editor trait and the plain field-backed implementation.
//!
//! `EditorDocument` abstracts where editor state lives, so the browser layer
//! and any reactive wrapper share the same command logic.

use crate::config::EditorConfig;
use crate::lists::normalize_lists;
use crate::mirror::OutputMirror;
use crate::tree::Document;
use crate::types::Selection;

/// Core trait for editor state.
///
/// Implementors provide storage; the provided methods hold the behavior
/// every editor shares (resync from markup, mirror refresh, list context).
pub trait EditorDocument {
    // === Required: state access ===

    fn document(&self) -> &Document;

    fn document_mut(&mut self) -> &mut Document;

    /// Current selection, if the surface has one.
    fn selection(&self) -> Option<Selection>;

    fn set_selection(&mut self, selection: Option<Selection>);

    fn mirror(&self) -> &OutputMirror;

    fn mirror_mut(&mut self) -> &mut OutputMirror;

    fn config(&self) -> &EditorConfig;

    // === Provided ===

    /// Serialized markup of the current document.
    fn markup(&self) -> String {
        self.document().to_html()
    }

    /// Length of the flattened projection.
    fn len(&self) -> usize {
        self.document().len()
    }

    fn is_empty(&self) -> bool {
        self.document().is_empty()
    }

    /// Run the list pass and refresh the mirror.
    ///
    /// Called after every command and every resync.
    fn after_mutation(&mut self) {
        let styles = self.config().list_styles.clone();
        normalize_lists(self.document_mut(), &styles);
        let markup = self.markup();
        self.mirror_mut().update(markup);
    }

    /// Replace the document with freshly read surface markup.
    ///
    /// The selection is clamped to the new document length.
    fn sync_from_markup(&mut self, markup: &str) {
        let doc = Document::from_html(markup, &self.config().sanitize);
        *self.document_mut() = doc;
        self.after_mutation();
        let len = self.len();
        if let Some(sel) = self.selection() {
            self.set_selection(Some(sel.clamped(len)));
        }
    }

    /// Load new content, placing the caret at the start.
    fn load_markup(&mut self, markup: &str) {
        self.sync_from_markup(markup);
        self.set_selection(Some(Selection::collapsed(0)));
    }

    /// Whether the caret (selection head) sits in a list item.
    fn is_caret_in_list_item(&self) -> bool {
        let Some(sel) = self.selection() else {
            return false;
        };
        self.document()
            .leaf_at(sel.head)
            .is_some_and(|leaf| leaf.in_list_item)
    }

    /// Flip the output mirror's visibility.
    fn toggle_output(&mut self) -> bool {
        self.mirror_mut().toggle()
    }
}

/// Simple field-based implementation of `EditorDocument`.
#[derive(Debug, Clone)]
pub struct PlainEditor {
    document: Document,
    selection: Option<Selection>,
    mirror: OutputMirror,
    config: EditorConfig,
}

impl Default for PlainEditor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl PlainEditor {
    /// Create an editor, loading `config.initial_content` if set.
    pub fn new(config: EditorConfig) -> Self {
        let mut editor = Self {
            document: Document::new(),
            selection: None,
            mirror: OutputMirror::new(config.output_visible),
            config,
        };
        match editor.config.initial_content.clone() {
            Some(markup) => editor.load_markup(&markup),
            None => editor.after_mutation(),
        }
        editor
    }

    pub fn from_markup(markup: &str) -> Self {
        Self::new(EditorConfig::default().with_initial_content(markup))
    }
}

impl EditorDocument for PlainEditor {
    fn document(&self) -> &Document {
        &self.document
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    fn mirror(&self) -> &OutputMirror {
        &self.mirror
    }

    fn mirror_mut(&mut self) -> &mut OutputMirror {
        &mut self.mirror
    }

    fn config(&self) -> &EditorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_content_is_sanitized_and_mirrored() {
        let editor = PlainEditor::from_markup("<p onclick=\"x()\">hi</p><script>bad()</script>");
        assert_eq!(editor.markup(), "<p>hi</p>");
        assert_eq!(editor.mirror().markup(), "<p>hi</p>");
        assert_eq!(editor.selection(), Some(Selection::collapsed(0)));
    }

    #[test]
    fn test_resync_styles_lists_and_clamps_selection() {
        let mut editor = PlainEditor::from_markup("<p>a long paragraph</p>");
        editor.set_selection(Some(Selection::collapsed(10)));
        editor.sync_from_markup("<ul><li>a</li></ul>");
        assert_eq!(
            editor.mirror().markup(),
            "<ul class=\"list-disc list-inside pl-5 space-y-0.5 text-base\"><li>a</li></ul>"
        );
        assert_eq!(editor.selection(), Some(Selection::collapsed(1)));
        assert!(editor.is_caret_in_list_item());
    }

    #[test]
    fn test_output_starts_from_config() {
        let config = EditorConfig {
            output_visible: false,
            ..Default::default()
        };
        let mut editor = PlainEditor::new(config);
        assert!(!editor.mirror().is_visible());
        editor.toggle_output();
        editor.toggle_output();
        assert!(!editor.mirror().is_visible());
    }
}
