//! Output panel: shows the mirrored markup as text with a character count.

use wasm_bindgen::prelude::*;
use wysiwyg_editor_core::OutputMirror;

/// DOM elements backing the output mirror.
#[derive(Debug, Clone)]
pub struct OutputPanel {
    panel: web_sys::HtmlElement,
    markup: web_sys::Element,
    counter: Option<web_sys::Element>,
}

impl OutputPanel {
    /// Use existing elements. `panel` is hidden and shown as a whole.
    pub fn new(
        panel: web_sys::HtmlElement,
        markup: web_sys::Element,
        counter: Option<web_sys::Element>,
    ) -> Self {
        Self {
            panel,
            markup,
            counter,
        }
    }

    /// Build a panel (heading, `<pre>` and counter) at the end of `container`.
    pub fn create(container: &web_sys::Element) -> Result<Self, JsValue> {
        let document = gloo_utils::document();

        let panel: web_sys::HtmlElement = document.create_element("div")?.dyn_into()?;
        panel.set_class_name("wysiwyg-output");

        let heading = document.create_element("h3")?;
        heading.set_text_content(Some("HTML Output"));
        let markup = document.create_element("pre")?;
        let counter = document.create_element("div")?;
        counter.set_class_name("wysiwyg-output-count");

        panel.append_child(&heading)?;
        panel.append_child(&markup)?;
        panel.append_child(&counter)?;
        container.append_child(&panel)?;

        Ok(Self::new(panel, markup, Some(counter)))
    }

    /// Bring the panel in line with `mirror`.
    ///
    /// Markup goes in as text content, so the browser does the escaping.
    pub fn render(&self, mirror: &OutputMirror) {
        self.panel.set_hidden(!mirror.is_visible());
        self.markup.set_text_content(Some(mirror.markup()));
        if let Some(counter) = &self.counter {
            counter.set_text_content(Some(&mirror.count_label()));
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.panel.hidden()
    }

    pub fn remove(&self) {
        self.panel.remove();
    }
}
