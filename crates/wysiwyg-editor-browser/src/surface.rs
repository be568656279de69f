//! Editable surface controller.
//!
//! Owns the contenteditable element and the listeners on it. Every change
//! goes through the model: commands are applied to the document and the
//! surface is re-rendered from it, and native edits are read back on each
//! `input` event and when an IME composition commits.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions};
use wasm_bindgen::JsCast;
use wysiwyg_editor_core::{
    CommandOutcome, EditorCommand, EditorDocument, EditorError, Key, KeyCombo, KeydownResult,
    Keybindings, OutputMirror, PromptKind, SanitizePolicy, UrlPrompt, command_from_answer,
    execute_at, execute_command, prompt_request,
};

use crate::dom_sync::{
    has_unsafe_content, read_markup, restore_selection, selection_from_dom, write_markup,
};
use crate::events::{handle_keydown_event, key_combo_from_event};
use crate::list_style::style_dom_lists;
use crate::output::OutputPanel;
use crate::platform::platform;

type ChangeCallback = Rc<dyn Fn(&OutputMirror)>;

struct Shared<D> {
    surface: web_sys::HtmlElement,
    doc: RefCell<D>,
    keybindings: RefCell<Keybindings>,
    output: RefCell<Option<OutputPanel>>,
    on_change: RefCell<Option<ChangeCallback>>,
}

/// Controller for one editable surface.
///
/// Cloning is cheap and yields a handle to the same surface; listeners are
/// removed when the last handle is dropped.
pub struct SurfaceController<D: EditorDocument + 'static> {
    shared: Rc<Shared<D>>,
    listeners: Rc<RefCell<Vec<EventListener>>>,
}

impl<D: EditorDocument + 'static> Clone for SurfaceController<D> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
            listeners: Rc::clone(&self.listeners),
        }
    }
}

impl<D: EditorDocument + 'static> SurfaceController<D> {
    /// Make `surface` editable, render `doc` into it, start listening and
    /// take focus.
    pub fn mount(surface: web_sys::HtmlElement, doc: D) -> Self {
        let _ = surface.set_attribute("contenteditable", "true");

        let keybindings = if doc.config().keybindings_enabled {
            Keybindings::default_for_platform(platform().uses_meta_for_shortcuts())
        } else {
            Keybindings::default()
        };

        let shared = Rc::new(Shared {
            surface,
            doc: RefCell::new(doc),
            keybindings: RefCell::new(keybindings),
            output: RefCell::new(None),
            on_change: RefCell::new(None),
        });
        shared.render();

        let listeners = vec![
            keydown_listener(&shared),
            input_listener(&shared),
            composition_listener(&shared),
        ];
        let controller = Self {
            shared,
            listeners: Rc::new(RefCell::new(listeners)),
        };
        controller.focus();
        tracing::debug!(len = controller.shared.doc.borrow().len(), "surface mounted");
        controller
    }

    pub fn surface(&self) -> &web_sys::HtmlElement {
        &self.shared.surface
    }

    /// Borrow the editor state.
    pub fn doc(&self) -> Ref<'_, D> {
        self.shared.doc.borrow()
    }

    pub fn markup(&self) -> String {
        self.doc().markup()
    }

    pub fn char_count(&self) -> usize {
        self.doc().mirror().char_count()
    }

    pub fn is_output_visible(&self) -> bool {
        self.doc().mirror().is_visible()
    }

    pub fn bind(&self, combo: KeyCombo, command: EditorCommand) {
        self.shared.keybindings.borrow_mut().bind(combo, command);
    }

    /// Show the mirror in `panel` from now on.
    pub fn attach_output(&self, panel: OutputPanel) {
        panel.render(self.doc().mirror());
        *self.shared.output.borrow_mut() = Some(panel);
    }

    /// Called with the mirror after every change.
    pub fn set_on_change(&self, callback: impl Fn(&OutputMirror) + 'static) {
        *self.shared.on_change.borrow_mut() = Some(Rc::new(callback));
    }

    /// Keep mousedown on `toolbar` from taking focus (and the selection)
    /// away from the surface.
    pub fn guard_toolbar(&self, toolbar: &web_sys::EventTarget) {
        let listener = EventListener::new_with_options(
            toolbar,
            "mousedown",
            EventListenerOptions::enable_prevent_default(),
            |event| event.prevent_default(),
        );
        self.listeners.borrow_mut().push(listener);
    }

    pub fn focus(&self) {
        let _ = self.shared.surface.focus();
    }

    /// Apply a command at the current selection, then re-render and refocus.
    ///
    /// Failures are logged and leave the surface as it was.
    pub fn execute(&self, command: &EditorCommand) -> Result<CommandOutcome, EditorError> {
        self.shared.sync_selection();
        let result = {
            let mut doc = self.shared.doc.borrow_mut();
            execute_command(&mut *doc, command)
        };
        self.finish_command(command, &result);
        result
    }

    /// Ask `prompt` for a URL and insert a link or image there.
    ///
    /// The selection is read before the prompt opens and the document isn't
    /// borrowed while it is open, so the surface stays usable behind a
    /// non-blocking dialog.
    pub async fn insert_with_prompt<P: UrlPrompt>(
        &self,
        prompt: &P,
        kind: PromptKind,
    ) -> Result<CommandOutcome, EditorError> {
        self.shared.sync_selection();
        let Some(selection) = self.doc().selection() else {
            return Ok(CommandOutcome::NoSelection);
        };

        let policy = self.shared.policy();
        let request = prompt_request(self.doc().document(), selection, kind, &policy);
        let answer = prompt.request_url(&request).await;
        let command = match command_from_answer(kind, answer, &policy) {
            Ok(Some(command)) => command,
            Ok(None) => {
                self.focus();
                return Ok(CommandOutcome::Cancelled);
            }
            Err(err) => {
                self.focus();
                return Err(err);
            }
        };

        let result = {
            let mut doc = self.shared.doc.borrow_mut();
            let selection = selection.clamped(doc.len());
            execute_at(&mut *doc, selection, &command)
        };
        self.finish_command(&command, &result);
        result
    }

    /// Flip the output panel, returning the new visibility.
    pub fn toggle_output(&self) -> bool {
        let visible = self.shared.doc.borrow_mut().toggle_output();
        self.shared.publish();
        visible
    }

    /// Replace the content with `markup` (sanitized on the way in).
    pub fn load(&self, markup: &str) {
        self.shared.doc.borrow_mut().load_markup(markup);
        self.shared.render();
        self.shared.publish();
    }

    /// Stop listening and make the surface read-only again.
    pub fn unmount(&self) {
        self.listeners.borrow_mut().clear();
        let _ = self.shared.surface.remove_attribute("contenteditable");
        if let Some(panel) = self.shared.output.borrow_mut().take() {
            panel.remove();
        }
    }

    fn finish_command(&self, command: &EditorCommand, result: &Result<CommandOutcome, EditorError>) {
        match result {
            Ok(outcome) if outcome.changed() => {
                self.focus();
                self.shared.render();
                self.shared.publish();
            }
            Ok(_) => self.focus(),
            Err(err) => {
                tracing::warn!(command = command.name(), %err, "command failed");
                self.focus();
            }
        }
    }
}

impl<D: EditorDocument> Shared<D> {
    fn policy(&self) -> SanitizePolicy {
        self.doc.borrow().config().sanitize.clone()
    }

    /// Copy the browser selection into the model, if it's in the surface.
    fn sync_selection(&self) {
        let policy = self.policy();
        if let Some(selection) = selection_from_dom(&self.surface, &policy) {
            self.doc.borrow_mut().set_selection(Some(selection));
        }
    }

    /// Write the model into the surface and put the selection back.
    fn render(&self) {
        let (markup, selection, policy) = {
            let doc = self.doc.borrow();
            (doc.markup(), doc.selection(), doc.config().sanitize.clone())
        };
        write_markup(&self.surface, &markup);
        if let Some(selection) = selection {
            restore_selection(&self.surface, selection, &policy);
        }
    }

    /// Push the mirror to the output panel and the change callback.
    ///
    /// No borrow is held while the callback runs, so it may call back into
    /// the controller.
    fn publish(&self) {
        let mirror = self.doc.borrow().mirror().clone();
        if let Some(panel) = self.output.borrow().as_ref() {
            panel.render(&mirror);
        }
        let callback = self.on_change.borrow().clone();
        if let Some(callback) = callback {
            callback(&mirror);
        }
    }

    /// Read native edits back into the model.
    ///
    /// Lists the browser created are styled in place first. If the surface
    /// picked up anything the sanitizer strips, it is rewritten from the
    /// model.
    fn resync(&self) {
        let (policy, styles) = {
            let doc = self.doc.borrow();
            (doc.config().sanitize.clone(), doc.config().list_styles.clone())
        };
        style_dom_lists(&self.surface, &styles);

        let selection = selection_from_dom(&self.surface, &policy);
        let raw = read_markup(&self.surface);
        let rewrite = has_unsafe_content(&self.surface, &policy);
        {
            let mut doc = self.doc.borrow_mut();
            doc.sync_from_markup(&raw);
            if let Some(selection) = selection {
                let len = doc.len();
                doc.set_selection(Some(selection.clamped(len)));
            }
        }

        if rewrite {
            tracing::warn!("surface picked up unsafe content, rewriting from the model");
            self.render();
        }
        self.publish();
    }
}

fn keydown_listener<D: EditorDocument + 'static>(shared: &Rc<Shared<D>>) -> EventListener {
    let shared = Rc::clone(shared);
    let target = shared.surface.clone();
    EventListener::new_with_options(
        &target,
        "keydown",
        EventListenerOptions::enable_prevent_default(),
        move |event| {
            let Some(event) = event.dyn_ref::<web_sys::KeyboardEvent>() else {
                return;
            };
            if event.is_composing() {
                return;
            }
            // Plain typing is left to the browser and read back on `input`.
            let combo = key_combo_from_event(event);
            if combo.key != Key::Enter && shared.keybindings.borrow().lookup(&combo).is_none() {
                return;
            }
            shared.sync_selection();
            let result = {
                let keybindings = shared.keybindings.borrow();
                let mut doc = shared.doc.borrow_mut();
                handle_keydown_event(&mut *doc, &keybindings, event)
            };
            if result == KeydownResult::Handled {
                shared.render();
                shared.publish();
            }
        },
    )
}

fn input_listener<D: EditorDocument + 'static>(shared: &Rc<Shared<D>>) -> EventListener {
    let shared = Rc::clone(shared);
    let target = shared.surface.clone();
    EventListener::new(&target, "input", move |event| {
        if event
            .dyn_ref::<web_sys::InputEvent>()
            .is_some_and(web_sys::InputEvent::is_composing)
        {
            return;
        }
        shared.resync();
    })
}

/// `input` events fired mid-composition are skipped, and not every browser
/// sends a final one, so committed IME text is read back here.
fn composition_listener<D: EditorDocument + 'static>(shared: &Rc<Shared<D>>) -> EventListener {
    let shared = Rc::clone(shared);
    let target = shared.surface.clone();
    EventListener::new(&target, "compositionend", move |_| shared.resync())
}
