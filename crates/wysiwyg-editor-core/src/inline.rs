//! Operations on a leaf's run list.
//!
//! All offsets here are local to one leaf. Every mutating helper leaves the
//! runs normalized: no empty text runs, adjacent text runs with equal marks merged.

use crate::tree::{Inline, Mark, MarkKind};

pub fn content_len(content: &[Inline]) -> usize {
    content.iter().map(Inline::len).sum()
}

/// True if the content has no atoms and only whitespace text.
pub fn is_blank(content: &[Inline]) -> bool {
    content.iter().all(|inline| match inline {
        Inline::Text { text, .. } => text.chars().all(char::is_whitespace),
        Inline::Atom { .. } => false,
    })
}

/// True if the content holds nothing but whitespace and at most one `<br>`.
///
/// That's what an "empty" block looks like after the surface has put its
/// caret placeholder in.
pub fn is_placeholder(content: &[Inline]) -> bool {
    let breaks = content.iter().filter(|i| i.is_line_break()).count();
    breaks <= 1
        && content.iter().all(|inline| match inline {
            Inline::Text { text, .. } => text.chars().all(char::is_whitespace),
            Inline::Atom { .. } => inline.is_line_break(),
        })
}

/// True if any text run overlaps `start..end`.
pub fn has_text_in(content: &[Inline], start: usize, end: usize) -> bool {
    let mut pos = 0;
    for inline in content {
        let len = inline.len();
        if pos < end && start < pos + len && matches!(inline, Inline::Text { .. }) {
            return true;
        }
        pos += len;
    }
    false
}

pub fn ends_with_line_break(content: &[Inline]) -> bool {
    content.last().is_some_and(Inline::is_line_break)
}

/// Merge adjacent text runs with equal marks and drop empty text runs.
pub fn normalize(content: &mut Vec<Inline>) {
    let mut out: Vec<Inline> = Vec::with_capacity(content.len());
    for inline in content.drain(..) {
        if let Inline::Text { text, .. } = &inline {
            if text.is_empty() {
                continue;
            }
        }
        if let (
            Some(Inline::Text {
                text: prev_text,
                marks: prev_marks,
            }),
            Inline::Text { text, marks },
        ) = (out.last_mut(), &inline)
        {
            if prev_marks == marks {
                prev_text.push_str(text);
                continue;
            }
        }
        out.push(inline);
    }
    *content = out;
}

/// Ensure a run boundary at `offset`. Returns the index of the first run
/// starting at or after `offset`.
pub fn split_at(content: &mut Vec<Inline>, offset: usize) -> usize {
    let mut pos = 0;
    for idx in 0..content.len() {
        if pos == offset {
            return idx;
        }
        let len = content[idx].len();
        if offset < pos + len {
            if let Inline::Text { text, marks } = &mut content[idx] {
                let byte = char_to_byte(text, offset - pos);
                let tail = text.split_off(byte);
                let marks = marks.clone();
                content.insert(idx + 1, Inline::Text { text: tail, marks });
            }
            return idx + 1;
        }
        pos += len;
    }
    content.len()
}

/// Split at both ends of `start..end` and return the run index range covering it.
pub fn isolate(content: &mut Vec<Inline>, start: usize, end: usize) -> std::ops::Range<usize> {
    let end_idx = split_at(content, end);
    // Splitting at `start` may shift the end index by one.
    let before = content.len();
    let start_idx = split_at(content, start);
    let end_idx = end_idx + (content.len() - before);
    start_idx..end_idx
}

/// Split the content at `offset`, returning the tail.
pub fn split_off(content: &mut Vec<Inline>, offset: usize) -> Vec<Inline> {
    let idx = split_at(content, offset);
    let mut tail = content.split_off(idx);
    normalize(content);
    normalize(&mut tail);
    tail
}

/// Remove `start..end`, returning the removed runs.
pub fn remove_range(content: &mut Vec<Inline>, start: usize, end: usize) -> Vec<Inline> {
    if start >= end {
        return Vec::new();
    }
    let range = isolate(content, start, end);
    let removed: Vec<Inline> = content.drain(range).collect();
    normalize(content);
    removed
}

/// Insert runs at `offset`.
pub fn insert_at(content: &mut Vec<Inline>, offset: usize, runs: Vec<Inline>) {
    let idx = split_at(content, offset);
    content.splice(idx..idx, runs);
    normalize(content);
}

/// Marks a run typed at `offset` should inherit.
///
/// Text continues the formatting of the run before the caret, except links,
/// which do not grow from their edges.
pub fn marks_at(content: &[Inline], offset: usize) -> Vec<Mark> {
    let mut pos = 0;
    let mut inherited: Option<&[Mark]> = None;
    for inline in content {
        let len = inline.len();
        if pos < offset && offset <= pos + len {
            inherited = Some(inline.marks());
            if offset < pos + len {
                // Inside a run: links extend too.
                return inline.marks().to_vec();
            }
        }
        pos += len;
    }
    inherited
        .map(|marks| {
            marks
                .iter()
                .filter(|m| m.kind != MarkKind::Link)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// True if every text run inside `start..end` carries a mark of `kind`.
///
/// Returns false when the range holds no text.
pub fn range_has_mark(content: &[Inline], start: usize, end: usize, kind: MarkKind) -> bool {
    let mut pos = 0;
    let mut saw_text = false;
    for inline in content {
        let len = inline.len();
        let overlaps = pos < end && start < pos + len;
        if overlaps {
            if let Inline::Text { .. } = inline {
                saw_text = true;
                if !inline.has_mark(kind) {
                    return false;
                }
            }
        }
        pos += len;
    }
    saw_text
}

/// Add `mark` as the innermost mark on every run in `start..end` that
/// doesn't already carry its kind.
pub fn add_mark(content: &mut Vec<Inline>, start: usize, end: usize, mark: &Mark) {
    if start >= end {
        return;
    }
    let range = isolate(content, start, end);
    for inline in &mut content[range] {
        if !inline.has_mark(mark.kind) {
            inline.marks_mut().push(mark.clone());
        }
    }
    normalize(content);
}

/// Remove every mark of `kind` from runs in `start..end`.
pub fn remove_mark(content: &mut Vec<Inline>, start: usize, end: usize, kind: MarkKind) {
    if start >= end {
        return;
    }
    let range = isolate(content, start, end);
    for inline in &mut content[range] {
        inline.marks_mut().retain(|m| m.kind != kind);
    }
    normalize(content);
}

/// Split content at line breaks, dropping the breaks.
///
/// A trailing break (the placeholder that keeps an empty last line visible)
/// does not produce an extra empty line.
pub fn split_lines(content: Vec<Inline>) -> Vec<Vec<Inline>> {
    let mut lines = vec![Vec::new()];
    for inline in content {
        if inline.is_line_break() {
            lines.push(Vec::new());
        } else if let Some(line) = lines.last_mut() {
            line.push(inline);
        }
    }
    if lines.len() > 1 && lines.last().is_some_and(Vec::is_empty) {
        lines.pop();
    }
    lines
}

fn char_to_byte(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}
