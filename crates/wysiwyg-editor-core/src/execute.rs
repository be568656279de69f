//! Command execution for editor documents.
//!
//! `execute_command` applies an `EditorCommand` to any `EditorDocument`
//! at its current selection, then runs the post-command pass (list styling
//! and mirror refresh). The logic is platform-agnostic.

use url::Url;

use crate::actions::EditorCommand;
use crate::document::EditorDocument;
use crate::error::EditorError;
use crate::format::apply_command;
use crate::prompt::{PromptKind, PromptRequest, UrlPrompt};
use crate::sanitize::{SanitizePolicy, sanitize_url};
use crate::tree::Document;
use crate::types::Selection;

/// What happened when a command was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The document changed.
    Applied,
    /// The command ran but had nothing to do (e.g. bold on a caret).
    Unchanged,
    /// The editor has no selection; nothing was done.
    NoSelection,
    /// The user dismissed the URL prompt or left it empty.
    Cancelled,
}

impl CommandOutcome {
    pub fn changed(self) -> bool {
        self == Self::Applied
    }
}

/// Execute a command at the editor's current selection.
///
/// This is the central dispatch point for formatting. Errors (refused URL,
/// stale selection) leave the document as it was.
pub fn execute_command<D: EditorDocument>(
    doc: &mut D,
    command: &EditorCommand,
) -> Result<CommandOutcome, EditorError> {
    let Some(selection) = doc.selection() else {
        tracing::debug!(command = command.name(), "no selection, ignoring command");
        return Ok(CommandOutcome::NoSelection);
    };
    execute_at(doc, selection, command)
}

/// Execute a command over an explicit selection.
pub fn execute_at<D: EditorDocument>(
    doc: &mut D,
    selection: Selection,
    command: &EditorCommand,
) -> Result<CommandOutcome, EditorError> {
    let policy = doc.config().sanitize.clone();
    let applied = apply_command(doc.document_mut(), selection, command, &policy)?;
    doc.set_selection(Some(applied.selection));
    doc.after_mutation();
    tracing::debug!(command = command.name(), changed = applied.changed, "executed command");
    Ok(if applied.changed {
        CommandOutcome::Applied
    } else {
        CommandOutcome::Unchanged
    })
}

/// Ask `prompt` for a URL, then insert a link or image with it.
///
/// The selection is captured before the prompt is awaited, so focus moving
/// to a dialog doesn't change where the result lands. A cancelled or blank
/// answer leaves the document untouched.
pub async fn insert_with_prompt<D, P>(
    doc: &mut D,
    prompt: &P,
    kind: PromptKind,
) -> Result<CommandOutcome, EditorError>
where
    D: EditorDocument,
    P: UrlPrompt,
{
    let Some(selection) = doc.selection() else {
        return Ok(CommandOutcome::NoSelection);
    };

    let request = prompt_request(doc.document(), selection, kind, &doc.config().sanitize);
    let answer = prompt.request_url(&request).await;
    match command_from_answer(kind, answer, &doc.config().sanitize)? {
        Some(command) => execute_at(doc, selection, &command),
        None => Ok(CommandOutcome::Cancelled),
    }
}

/// Build the request for a URL prompt over `selection`.
///
/// A link prompt is prefilled with the selected text when that text is
/// already an absolute URL the policy accepts.
pub fn prompt_request(
    doc: &Document,
    selection: Selection,
    kind: PromptKind,
    policy: &SanitizePolicy,
) -> PromptRequest {
    let request = PromptRequest::new(kind);
    if kind != PromptKind::Link || selection.is_collapsed() {
        return request;
    }

    let selected: String = doc
        .plain_text()
        .chars()
        .skip(selection.start())
        .take(selection.len())
        .collect();
    let candidate = selected.trim();
    let is_url = !candidate.contains(char::is_whitespace)
        && Url::parse(candidate).is_ok()
        && sanitize_url(candidate, kind.url_context(), policy).is_ok();
    if is_url {
        request.with_default(candidate)
    } else {
        request
    }
}

/// Turn a prompt answer into the command it asks for.
///
/// `None` for a cancelled or blank answer. The URL is checked before any
/// document is touched so a rejection is reported with the raw text the
/// user typed.
pub fn command_from_answer(
    kind: PromptKind,
    answer: Option<String>,
    policy: &SanitizePolicy,
) -> Result<Option<EditorCommand>, EditorError> {
    let Some(url) = answer.filter(|url| !url.trim().is_empty()) else {
        tracing::debug!(?kind, "prompt cancelled");
        return Ok(None);
    };

    if let Err(err) = sanitize_url(&url, kind.url_context(), policy) {
        tracing::warn!(%url, %err, "refusing URL from prompt");
        return Err(err.into());
    }

    Ok(Some(match kind {
        PromptKind::Link => EditorCommand::CreateLink { url },
        PromptKind::Image => EditorCommand::InsertImage { url },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PlainEditor;
    use crate::prompt::FixedPrompt;

    /// Drive a future that never actually waits.
    fn block_on<F: std::future::Future>(fut: F) -> F::Output {
        use std::pin::pin;
        use std::task::{Context, Poll, Waker};

        let mut fut = pin!(fut);
        let mut cx = Context::from_waker(Waker::noop());
        loop {
            if let Poll::Ready(out) = fut.as_mut().poll(&mut cx) {
                return out;
            }
        }
    }

    fn editor(markup: &str, selection: Selection) -> PlainEditor {
        let mut editor = PlainEditor::from_markup(markup);
        editor.set_selection(Some(selection));
        editor
    }

    #[test]
    fn test_mirror_tracks_every_command() {
        let mut ed = editor("<p>Hello world</p>", Selection::new(0, 5));
        for cmd in [
            EditorCommand::Bold,
            EditorCommand::Italic,
            EditorCommand::InsertUnorderedList,
            EditorCommand::Justify(crate::actions::Alignment::Right),
        ] {
            execute_command(&mut ed, &cmd).unwrap();
            assert_eq!(ed.mirror().markup(), ed.document().to_html());
        }
        insta::assert_snapshot!(
            ed.mirror().markup(),
            @r#"<ul class="list-disc list-inside pl-5 space-y-0.5 text-base"><li style="text-align: right;"><b><i>Hello</i></b> world</li></ul>"#
        );
    }

    #[test]
    fn test_no_selection_is_silent() {
        let mut ed = PlainEditor::from_markup("<p>x</p>");
        ed.set_selection(None);
        let before = ed.markup();
        assert_eq!(
            execute_command(&mut ed, &EditorCommand::Bold).unwrap(),
            CommandOutcome::NoSelection
        );
        assert_eq!(ed.markup(), before);
    }

    #[test]
    fn test_new_list_styled_exactly_once() {
        let mut ed = editor("<p>a</p>", Selection::collapsed(0));
        execute_command(&mut ed, &EditorCommand::InsertOrderedList).unwrap();
        ed.after_mutation();
        ed.after_mutation();
        assert_eq!(ed.markup().matches("list-decimal").count(), 1);
    }

    #[test]
    fn test_cancelled_prompt_leaves_markup_identical() {
        let mut ed = editor("<p>Hello</p>", Selection::new(0, 5));
        let before = ed.mirror().markup().to_string();

        for answer in [None, Some(String::new()), Some("   ".to_string())] {
            let outcome =
                block_on(insert_with_prompt(&mut ed, &FixedPrompt(answer), PromptKind::Link))
                    .unwrap();
            assert_eq!(outcome, CommandOutcome::Cancelled);
            assert_eq!(ed.mirror().markup(), before);
            assert_eq!(ed.markup(), before);
        }
    }

    #[test]
    fn test_prompted_link_and_image() {
        let mut ed = editor("<p>Hello</p>", Selection::new(0, 5));
        let prompt = FixedPrompt(Some("https://example.com".into()));
        let outcome = block_on(insert_with_prompt(&mut ed, &prompt, PromptKind::Link)).unwrap();
        assert_eq!(outcome, CommandOutcome::Applied);
        assert_eq!(ed.markup(), r#"<p><a href="https://example.com">Hello</a></p>"#);

        ed.set_selection(Some(Selection::collapsed(5)));
        let prompt = FixedPrompt(Some("/img/cat.png".into()));
        block_on(insert_with_prompt(&mut ed, &prompt, PromptKind::Image)).unwrap();
        assert_eq!(
            ed.markup(),
            r#"<p><a href="https://example.com">Hello</a><img src="/img/cat.png"></p>"#
        );
    }

    #[test]
    fn test_answer_to_command() {
        let policy = SanitizePolicy::default();
        assert_eq!(command_from_answer(PromptKind::Image, None, &policy).unwrap(), None);
        assert_eq!(
            command_from_answer(PromptKind::Image, Some("a.png".into()), &policy).unwrap(),
            Some(EditorCommand::InsertImage { url: "a.png".into() })
        );
        assert!(command_from_answer(PromptKind::Link, Some("vbscript:x".into()), &policy).is_err());
    }

    #[test]
    fn test_link_prompt_prefilled_with_selected_url() {
        let policy = SanitizePolicy::default();
        let ed = editor("<p>see https://a.test/x now</p>", Selection::new(4, 20));
        let request = prompt_request(ed.document(), Selection::new(4, 20), PromptKind::Link, &policy);
        assert_eq!(request.default_value.as_deref(), Some("https://a.test/x"));

        let request = prompt_request(ed.document(), Selection::new(0, 3), PromptKind::Link, &policy);
        assert_eq!(request.default_value, None);
        let request = prompt_request(ed.document(), Selection::new(4, 20), PromptKind::Image, &policy);
        assert_eq!(request.default_value, None);

        let ed = editor("<p>javascript:alert(1)</p>", Selection::new(0, 19));
        let request = prompt_request(ed.document(), Selection::new(0, 19), PromptKind::Link, &policy);
        assert_eq!(request.default_value, None);
    }

    #[test]
    fn test_prompted_script_url_refused() {
        let mut ed = editor("<p>Hello</p>", Selection::new(0, 5));
        let prompt = FixedPrompt(Some("javascript:alert(1)".into()));
        let result = block_on(insert_with_prompt(&mut ed, &prompt, PromptKind::Link));
        assert!(matches!(result, Err(EditorError::Sanitize(_))));
        assert_eq!(ed.markup(), "<p>Hello</p>");
    }
}
