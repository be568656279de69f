//! DOM synchronization for the editable surface.
//!
//! Moves markup and selection between the browser DOM and the editor model.
//! Model offsets count characters in the flattened projection of the content
//! tree (see `Document::leaves`), so a DOM position is mapped by parsing the
//! surface content in front of it and measuring the result. That keeps the
//! mapping exactly in step with the parser instead of re-deriving the
//! projection rules from the DOM.

use wasm_bindgen::JsCast;
use wysiwyg_editor_core::sanitize::{is_dropped_element, sanitize_attributes};
use wysiwyg_editor_core::{Attributes, Document, SanitizePolicy, Selection};

/// Serialized markup currently in the surface.
pub fn read_markup(surface: &web_sys::Element) -> String {
    surface.inner_html()
}

/// Replace the surface content.
///
/// Only ever called with markup the serializer produced, which is already
/// sanitized and escaped.
pub fn write_markup(surface: &web_sys::Element, markup: &str) {
    surface.set_inner_html(markup);
}

/// Convert a DOM position (node + offset) to a model offset.
///
/// Returns `None` if the position is outside the surface or the range
/// can't be built.
pub fn dom_position_to_offset(
    surface: &web_sys::Element,
    node: &web_sys::Node,
    offset: u32,
    policy: &SanitizePolicy,
) -> Option<usize> {
    if !surface.contains(Some(node)) {
        return None;
    }
    let dom_document = surface.owner_document()?;
    let range = dom_document.create_range().ok()?;
    range.set_start(surface, 0).ok()?;
    range.set_end(node, offset).ok()?;

    let fragment = range.clone_contents().ok()?;
    let holder = dom_document.create_element("div").ok()?;
    holder.append_child(&fragment).ok()?;

    let prefix = Document::from_html(&holder.inner_html(), policy);
    Some(prefix.len())
}

/// Read the browser selection as a model selection.
///
/// `None` when there is no selection or it lies outside the surface.
pub fn selection_from_dom(
    surface: &web_sys::Element,
    policy: &SanitizePolicy,
) -> Option<Selection> {
    let window = web_sys::window()?;
    let selection = window.get_selection().ok()??;
    if selection.range_count() == 0 {
        return None;
    }

    let anchor_node = selection.anchor_node()?;
    let focus_node = selection.focus_node()?;

    tracing::trace!(
        anchor_node_name = %anchor_node.node_name(),
        anchor_offset = selection.anchor_offset(),
        focus_node_name = %focus_node.node_name(),
        focus_offset = selection.focus_offset(),
        "selection_from_dom: browser selection state"
    );

    let anchor = dom_position_to_offset(surface, &anchor_node, selection.anchor_offset(), policy)?;
    let head = if focus_node.is_same_node(Some(&anchor_node))
        && selection.focus_offset() == selection.anchor_offset()
    {
        anchor
    } else {
        dom_position_to_offset(surface, &focus_node, selection.focus_offset(), policy)?
    };
    Some(Selection::new(anchor, head))
}

/// Find the DOM position for a model offset.
///
/// Text positions are preferred; positions next to `<br>`/`<img>` and inside
/// empty blocks are used when no text node covers the offset. Each probe
/// re-parses a prefix of the surface, so this is quadratic in surface size.
pub fn offset_to_dom_position(
    surface: &web_sys::Element,
    target: usize,
    policy: &SanitizePolicy,
) -> Option<(web_sys::Node, u32)> {
    let dom_document = surface.owner_document()?;
    let walker = dom_document
        .create_tree_walker_with_what_to_show(surface, 0xFFFF_FFFF)
        .ok()?;

    let mut after_atom: Option<(web_sys::Node, u32)> = None;

    while let Ok(Some(node)) = walker.next_node() {
        match node.node_type() {
            web_sys::Node::TEXT_NODE => {
                if is_interblock_whitespace(&node) {
                    continue;
                }
                let text = node.text_content().unwrap_or_default();
                let start = dom_position_to_offset(surface, &node, 0, policy)?;
                if start > target {
                    break;
                }
                let len = text.chars().count();
                if target <= start + len {
                    return Some((node, utf16_offset(&text, target - start)));
                }
            }
            web_sys::Node::ELEMENT_NODE => {
                let name = node.node_name().to_ascii_lowercase();
                if name == "br" || name == "img" {
                    let parent = node.parent_node()?;
                    let index = child_index(&parent, &node)?;
                    let start = dom_position_to_offset(surface, &parent, index, policy)?;
                    if start == target {
                        return Some((parent, index));
                    }
                    if start > target {
                        break;
                    }
                    if start + 1 == target {
                        after_atom = Some((parent, index + 1));
                    }
                } else if is_empty_block(&node, &name) {
                    let start = dom_position_to_offset(surface, &node, 0, policy)?;
                    if start == target {
                        return Some((node, 0));
                    }
                }
            }
            _ => {}
        }
    }

    after_atom
}

/// Put the browser selection at `selection`.
///
/// Logs and leaves the browser selection alone if either end can't be mapped.
pub fn restore_selection(
    surface: &web_sys::Element,
    selection: Selection,
    policy: &SanitizePolicy,
) -> Option<()> {
    let Some((anchor_node, anchor_offset)) =
        offset_to_dom_position(surface, selection.anchor, policy)
    else {
        tracing::warn!(offset = selection.anchor, "could not map anchor to the DOM");
        return None;
    };
    let (focus_node, focus_offset) = if selection.is_collapsed() {
        (anchor_node.clone(), anchor_offset)
    } else {
        let Some(pos) = offset_to_dom_position(surface, selection.head, policy) else {
            tracing::warn!(offset = selection.head, "could not map head to the DOM");
            return None;
        };
        pos
    };

    let dom_selection = web_sys::window()?.get_selection().ok()??;
    dom_selection
        .set_base_and_extent(&anchor_node, anchor_offset, &focus_node, focus_offset)
        .ok()
}

/// Whether the live surface holds anything the sanitizer would strip.
///
/// Native editing (paste, drop) can bring in scripts or handler attributes
/// that never passed through the parser. When this returns true the surface
/// has to be rewritten from the model.
pub fn has_unsafe_content(surface: &web_sys::Element, policy: &SanitizePolicy) -> bool {
    let Ok(node_list) = surface.query_selector_all("*") else {
        return false;
    };

    for i in 0..node_list.length() {
        let Some(element) = node_list
            .item(i)
            .and_then(|node| node.dyn_into::<web_sys::Element>().ok())
        else {
            continue;
        };
        let tag = element.tag_name().to_ascii_lowercase();
        if is_dropped_element(&tag) {
            return true;
        }

        let names: Vec<String> = element
            .get_attribute_names()
            .iter()
            .filter_map(|name| name.as_string())
            .collect();
        let values: Vec<String> = names
            .iter()
            .map(|name| element.get_attribute(name).unwrap_or_default())
            .collect();
        let mut attrs = Attributes::from_pairs(
            names
                .iter()
                .map(String::as_str)
                .zip(values.iter().map(String::as_str)),
        );
        let before = attrs.len();
        sanitize_attributes(&tag, &mut attrs, policy);
        if attrs.len() != before {
            return true;
        }
    }
    false
}

/// Whitespace text directly under the surface or a list, left over from
/// pretty-printed markup. It has no model offset.
fn is_interblock_whitespace(node: &web_sys::Node) -> bool {
    let blank = node
        .text_content()
        .is_none_or(|text| text.chars().all(|c| c.is_ascii_whitespace()));
    if !blank {
        return false;
    }
    let Some(parent) = node.parent_element() else {
        return true;
    };
    matches!(parent.tag_name().to_ascii_lowercase().as_str(), "ul" | "ol")
        || parent.get_attribute("contenteditable").is_some()
}

fn is_empty_block(node: &web_sys::Node, name: &str) -> bool {
    const BLOCKS: &[&str] = &[
        "p", "div", "li", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "blockquote",
    ];
    if !BLOCKS.contains(&name) {
        return false;
    }
    let Some(element) = node.dyn_ref::<web_sys::Element>() else {
        return false;
    };
    node.text_content().unwrap_or_default().is_empty()
        && matches!(element.query_selector("br, img"), Ok(None))
}

fn child_index(parent: &web_sys::Node, child: &web_sys::Node) -> Option<u32> {
    let children = parent.child_nodes();
    (0..children.length()).find(|&i| {
        children
            .item(i)
            .is_some_and(|candidate| candidate.is_same_node(Some(child)))
    })
}

/// UTF-16 offset of the `chars`th character in `text`.
fn utf16_offset(text: &str, chars: usize) -> u32 {
    text.chars().take(chars).map(char::len_utf16).sum::<usize>() as u32
}
