//! WASM browser tests for wysiwyg-editor-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use wysiwyg_editor_browser::{
    EditorCommand, EditorConfig, EditorDocument, FixedPrompt, ListStyles, OutputPanel,
    PlainEditor, PromptKind, SanitizePolicy, SurfaceController, dom_position_to_offset,
    has_unsafe_content, offset_to_dom_position, platform, style_dom_lists,
};
use wysiwyg_editor_core::CommandOutcome;

fn surface_with(markup: &str) -> web_sys::HtmlElement {
    let document = gloo_utils::document();
    let element: web_sys::HtmlElement = document
        .create_element("div")
        .unwrap()
        .dyn_into()
        .unwrap();
    element.set_inner_html(markup);
    document.body().unwrap().append_child(&element).unwrap();
    element
}

fn select(anchor: &web_sys::Node, anchor_offset: u32, focus: &web_sys::Node, focus_offset: u32) {
    let selection = gloo_utils::window().get_selection().unwrap().unwrap();
    selection
        .set_base_and_extent(anchor, anchor_offset, focus, focus_offset)
        .unwrap();
}

fn first_text(element: &web_sys::Element, selector: &str) -> web_sys::Node {
    element
        .query_selector(selector)
        .unwrap()
        .unwrap()
        .first_child()
        .unwrap()
}

fn press(surface: &web_sys::HtmlElement, key: &str) -> bool {
    let init = web_sys::KeyboardEventInit::new();
    init.set_key(key);
    init.set_bubbles(true);
    init.set_cancelable(true);
    let event = web_sys::KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap();
    // false when a listener prevented the default.
    surface.dispatch_event(&event).unwrap()
}

// === Platform detection tests ===

#[wasm_bindgen_test]
fn test_platform_detection() {
    let plat = platform();
    // Actual values depend on the browser running the test.
    if plat.ios {
        assert!(!plat.mac);
        assert!(plat.uses_meta_for_shortcuts());
    }
}

// === Selection mapping tests ===

#[wasm_bindgen_test]
fn test_dom_position_maps_across_blocks() {
    let surface = surface_with("<p>ab</p><ul><li>cd</li></ul>");
    let policy = SanitizePolicy::default();
    let item_text = first_text(&surface, "li");

    assert_eq!(dom_position_to_offset(&surface, &item_text, 1, &policy), Some(4));

    let (node, offset) = offset_to_dom_position(&surface, 4, &policy).unwrap();
    assert!(node.is_same_node(Some(&item_text)));
    assert_eq!(offset, 1);

    let (node, offset) = offset_to_dom_position(&surface, 2, &policy).unwrap();
    assert!(node.is_same_node(Some(&first_text(&surface, "p"))));
    assert_eq!(offset, 2);
    surface.remove();
}

#[wasm_bindgen_test]
fn test_position_after_line_break() {
    let surface = surface_with("<p>Hello<br><br></p>");
    let policy = SanitizePolicy::default();
    let paragraph = surface.query_selector("p").unwrap().unwrap();

    let (node, offset) = offset_to_dom_position(&surface, 6, &policy).unwrap();
    assert!(node.is_same_node(Some(&paragraph)));
    assert_eq!(offset, 2);
    surface.remove();
}

// === List styling tests ===

#[wasm_bindgen_test]
fn test_dom_list_styling_is_idempotent() {
    let surface = surface_with("<ul><li>a<ol><li>b</li></ol></li></ul><ol class=\"list-decimal\"></ol>");
    let styles = ListStyles::default();

    assert_eq!(style_dom_lists(&surface, &styles), 2);
    assert_eq!(style_dom_lists(&surface, &styles), 0);
    assert_eq!(surface.query_selector_all(".list-disc").unwrap().length(), 1);
    assert_eq!(surface.query_selector_all(".list-decimal").unwrap().length(), 2);
    surface.remove();
}

// === Sanitization tests ===

#[wasm_bindgen_test]
fn test_unsafe_content_detection() {
    let policy = SanitizePolicy::default();
    let clean = surface_with("<p><a href=\"https://example.com\">ok</a></p>");
    assert!(!has_unsafe_content(&clean, &policy));

    let dirty = surface_with("<p><img src=\"x.png\" onerror=\"alert(1)\"></p>");
    assert!(has_unsafe_content(&dirty, &policy));

    let scripted = surface_with("<p><a href=\"javascript:alert(1)\">x</a></p>");
    assert!(has_unsafe_content(&scripted, &policy));
    clean.remove();
    dirty.remove();
    scripted.remove();
}

// === Surface controller tests ===

#[wasm_bindgen_test]
fn test_mount_injects_initial_content() {
    let surface = surface_with("");
    let controller = SurfaceController::mount(
        surface.clone(),
        PlainEditor::from_markup("<p onclick=\"x()\">Hi</p><script>bad()</script>"),
    );
    assert_eq!(surface.inner_html(), "<p>Hi</p>");
    assert_eq!(surface.get_attribute("contenteditable").as_deref(), Some("true"));
    assert_eq!(controller.markup(), "<p>Hi</p>");
    let active = gloo_utils::document().active_element().unwrap();
    assert!(active.is_same_node(Some(&surface)));
    controller.unmount();
    surface.remove();
}

#[wasm_bindgen_test]
fn test_bold_selection_updates_surface_and_mirror() {
    let surface = surface_with("");
    let controller =
        SurfaceController::mount(surface.clone(), PlainEditor::from_markup("<p>Hello</p>"));
    let text = first_text(&surface, "p");
    select(&text, 0, &text, 5);

    let outcome = controller.execute(&EditorCommand::Bold).unwrap();
    assert_eq!(outcome, CommandOutcome::Applied);
    assert_eq!(surface.inner_html(), "<p><b>Hello</b></p>");
    assert_eq!(controller.doc().mirror().markup(), surface.inner_html());
    assert_eq!(controller.char_count(), 19);
    controller.unmount();
    surface.remove();
}

#[wasm_bindgen_test]
fn test_list_command_styles_list() {
    let surface = surface_with("");
    let controller =
        SurfaceController::mount(surface.clone(), PlainEditor::from_markup("<p>item</p>"));
    let text = first_text(&surface, "p");
    select(&text, 2, &text, 2);

    controller.execute(&EditorCommand::InsertUnorderedList).unwrap();
    insta::assert_snapshot!(
        surface.inner_html(),
        @r#"<ul class="list-disc list-inside pl-5 space-y-0.5 text-base"><li>item</li></ul>"#
    );
    controller.unmount();
    surface.remove();
}

#[wasm_bindgen_test]
fn test_enter_outside_list_inserts_line_break() {
    let surface = surface_with("");
    let controller =
        SurfaceController::mount(surface.clone(), PlainEditor::from_markup("<p>Hello</p>"));
    let text = first_text(&surface, "p");
    select(&text, 5, &text, 5);

    let default_allowed = press(&surface, "Enter");
    assert!(!default_allowed);
    assert_eq!(surface.inner_html(), "<p>Hello<br><br></p>");
    assert_eq!(controller.doc().mirror().markup(), surface.inner_html());
    controller.unmount();
    surface.remove();
}

#[wasm_bindgen_test]
fn test_enter_in_list_item_left_to_browser() {
    let surface = surface_with("");
    let controller = SurfaceController::mount(
        surface.clone(),
        PlainEditor::from_markup("<ul><li>one</li></ul>"),
    );
    let before = surface.inner_html();
    let text = first_text(&surface, "li");
    select(&text, 3, &text, 3);

    // A synthetic event has no native default, so the surface stays as it was.
    let default_allowed = press(&surface, "Enter");
    assert!(default_allowed);
    assert_eq!(surface.inner_html(), before);
    controller.unmount();
    surface.remove();
}

#[wasm_bindgen_test]
async fn test_cancelled_prompt_leaves_surface_unchanged() {
    let surface = surface_with("");
    let controller =
        SurfaceController::mount(surface.clone(), PlainEditor::from_markup("<p>Hello</p>"));
    let text = first_text(&surface, "p");
    select(&text, 0, &text, 5);
    let before = surface.inner_html();

    let outcome = controller
        .insert_with_prompt(&FixedPrompt(None), PromptKind::Link)
        .await
        .unwrap();
    assert_eq!(outcome, CommandOutcome::Cancelled);
    assert_eq!(surface.inner_html(), before);

    let outcome = controller
        .insert_with_prompt(
            &FixedPrompt(Some("https://example.com".into())),
            PromptKind::Link,
        )
        .await
        .unwrap();
    assert_eq!(outcome, CommandOutcome::Applied);
    assert_eq!(
        surface.inner_html(),
        "<p><a href=\"https://example.com\">Hello</a></p>"
    );
    controller.unmount();
    surface.remove();
}

#[wasm_bindgen_test]
fn test_output_panel_toggles() {
    let surface = surface_with("");
    let container = surface_with("");
    let config = EditorConfig::default().with_initial_content("<p>a &amp; b</p>");
    let controller = SurfaceController::mount(surface.clone(), PlainEditor::new(config));
    controller.attach_output(OutputPanel::create(&container).unwrap());

    let pre = container.query_selector("pre").unwrap().unwrap();
    assert_eq!(pre.text_content().unwrap(), "<p>a &amp; b</p>");
    let counter = container.query_selector(".wysiwyg-output-count").unwrap().unwrap();
    assert_eq!(counter.text_content().unwrap(), "16 characters");

    let visible = controller.is_output_visible();
    controller.toggle_output();
    controller.toggle_output();
    assert_eq!(controller.is_output_visible(), visible);
    assert!(!controller.doc().mirror().markup().is_empty());
    controller.unmount();
    surface.remove();
    container.remove();
}

#[wasm_bindgen_test]
fn test_committed_composition_reaches_model() {
    let surface = surface_with("");
    let controller =
        SurfaceController::mount(surface.clone(), PlainEditor::from_markup("<p>Hello</p>"));
    let text = first_text(&surface, "p");
    text.set_text_content(Some("Hello日本"));
    select(&text, 7, &text, 7);

    let event = web_sys::Event::new("compositionend").unwrap();
    surface.dispatch_event(&event).unwrap();
    assert_eq!(controller.markup(), "<p>Hello日本</p>");

    // A later command works on the committed text instead of wiping it.
    press(&surface, "Enter");
    assert_eq!(surface.inner_html(), "<p>Hello日本<br><br></p>");
    controller.unmount();
    surface.remove();
}

#[wasm_bindgen_test]
fn test_change_callback_may_reenter_controller() {
    use std::cell::Cell;
    use std::rc::Rc;

    let surface = surface_with("");
    let controller =
        SurfaceController::mount(surface.clone(), PlainEditor::from_markup("<p>Hello</p>"));
    let toggled = Rc::new(Cell::new(false));
    {
        let handle = controller.clone();
        let toggled = Rc::clone(&toggled);
        controller.set_on_change(move |_| {
            if !toggled.replace(true) {
                handle.toggle_output();
            }
        });
    }
    let visible = controller.is_output_visible();

    let text = first_text(&surface, "p");
    select(&text, 0, &text, 5);
    controller.execute(&EditorCommand::Italic).unwrap();

    assert!(toggled.get());
    assert_eq!(controller.is_output_visible(), !visible);
    assert_eq!(controller.markup(), "<p><i>Hello</i></p>");
    controller.unmount();
    surface.remove();
}
