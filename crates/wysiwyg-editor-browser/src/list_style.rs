//! List styling on the live surface.
//!
//! The model pass (`normalize_lists`) styles lists created by commands. Lists
//! that appear through native editing (paste, browser shortcuts) only exist
//! in the DOM until the next resync, so the same check runs here first and
//! the browser's own list continuation never shows an unstyled list.

use wasm_bindgen::JsCast;
use wysiwyg_editor_core::{ListKind, ListStyles};

/// Give every `ul`/`ol` under `root` lacking its marker class the configured
/// class set. Returns how many lists were touched.
pub fn style_dom_lists(root: &web_sys::Element, styles: &ListStyles) -> usize {
    let Ok(node_list) = root.query_selector_all("ul, ol") else {
        return 0;
    };

    let mut count = 0;
    for i in 0..node_list.length() {
        let Some(node) = node_list.item(i) else {
            continue;
        };
        let Some(element) = node.dyn_ref::<web_sys::Element>() else {
            continue;
        };
        let Some(kind) = ListKind::from_tag(&element.tag_name().to_ascii_lowercase()) else {
            continue;
        };

        let class_list = element.class_list();
        let classes: Vec<String> = (0..class_list.length())
            .filter_map(|j| class_list.item(j))
            .collect();
        if !ListStyles::needs_styling(kind, classes.iter().map(String::as_str)) {
            continue;
        }
        if element
            .set_attribute("class", styles.classes_for(kind))
            .is_ok()
        {
            count += 1;
        }
    }

    if count > 0 {
        tracing::debug!(count, "styled surface lists");
    }
    count
}
