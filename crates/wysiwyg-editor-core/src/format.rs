//! Selection-scoped formatting.
//!
//! [`apply_command`] takes a document, a selection and a command, mutates the
//! document and returns where the selection ends up. Nothing here touches
//! editor state beyond its arguments.

use std::ops::Range;

use crate::actions::{Alignment, EditorCommand};
use crate::attrs::Attributes;
use crate::error::EditorError;
use crate::inline;
use crate::sanitize::{SanitizePolicy, UrlContext, sanitize_url};
use crate::tree::{
    Atom, Block, BlockKind, Document, Inline, LeafInfo, LeafMut, List, ListItem, ListKind, Mark,
    MarkKind, Step, TextBlock,
};
use crate::types::Selection;

/// Result of applying a command to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    /// Whether the document changed.
    pub changed: bool,
    /// Selection after the command.
    pub selection: Selection,
}

/// Apply `command` to `doc` over `selection`.
///
/// URLs carried by the command are sanitized first; a refused URL leaves
/// the document untouched.
pub fn apply_command(
    doc: &mut Document,
    selection: Selection,
    command: &EditorCommand,
    policy: &SanitizePolicy,
) -> Result<Applied, EditorError> {
    selection.check_bounds(doc.len())?;
    let before = doc.clone();
    let range = selection.to_range();

    let selection = match command {
        EditorCommand::Bold => toggle_mark(doc, range, MarkKind::Bold, selection),
        EditorCommand::Italic => toggle_mark(doc, range, MarkKind::Italic, selection),
        EditorCommand::Underline => toggle_mark(doc, range, MarkKind::Underline, selection),
        EditorCommand::CreateLink { url } => {
            let url = sanitize_url(url, UrlContext::Link, policy)?;
            create_link(doc, range, url.as_str(), selection)
        }
        EditorCommand::InsertImage { url } => {
            let url = sanitize_url(url, UrlContext::Image, policy)?;
            insert_image(doc, range, url.as_str())
        }
        EditorCommand::InsertUnorderedList => toggle_list(doc, range, ListKind::Unordered, selection),
        EditorCommand::InsertOrderedList => toggle_list(doc, range, ListKind::Ordered, selection),
        EditorCommand::FormatBlock(format) => {
            let indices = selected_leaf_indices(&doc.leaves(), &range);
            restructure_selected(doc, &indices, Restructure::Lift {
                kind: format.block_kind(),
                only: None,
                retag: true,
            });
            selection.clamped(doc.len())
        }
        EditorCommand::Justify(alignment) => justify(doc, range, *alignment, selection),
        EditorCommand::InsertLineBreak => insert_line_break(doc, range),
        EditorCommand::InsertParagraph => insert_paragraph(doc, range),
        EditorCommand::InsertText { text } => insert_text(doc, range, text),
    };

    let changed = *doc != before;
    tracing::trace!(command = command.name(), changed, "applied command");
    Ok(Applied { changed, selection })
}

// === inline formatting ===

/// Leaves overlapping `range` with the local range inside each.
fn touched_leaves(doc: &Document, range: &Range<usize>) -> Vec<(LeafInfo, usize, usize)> {
    doc.leaves()
        .into_iter()
        .filter_map(|leaf| {
            let (s, e) = leaf.local_range(range.start, range.end)?;
            Some((leaf, s, e))
        })
        .collect()
}

fn toggle_mark(
    doc: &mut Document,
    range: Range<usize>,
    kind: MarkKind,
    selection: Selection,
) -> Selection {
    if range.is_empty() {
        return selection;
    }
    let targets = touched_leaves(doc, &range);

    let mut saw_text = false;
    let mut all_marked = true;
    for (leaf, s, e) in &targets {
        let Some(content) = doc.leaf_content(&leaf.path) else {
            continue;
        };
        if inline::has_text_in(content, *s, *e) {
            saw_text = true;
            all_marked &= inline::range_has_mark(content, *s, *e, kind);
        }
    }
    if !saw_text {
        return selection;
    }

    let mark = Mark::new(kind);
    for (leaf, s, e) in &targets {
        if let Some(content) = doc.leaf_content_mut(&leaf.path) {
            if all_marked {
                inline::remove_mark(content, *s, *e, kind);
            } else {
                inline::add_mark(content, *s, *e, &mark);
            }
        }
    }
    selection
}

fn create_link(doc: &mut Document, range: Range<usize>, url: &str, selection: Selection) -> Selection {
    let link = Mark::link(url);
    if range.is_empty() {
        // No selection: the URL itself becomes the link text.
        let Some((path, local)) = caret_leaf(doc, range.start) else {
            return selection;
        };
        let Some(content) = doc.leaf_content_mut(&path) else {
            return selection;
        };
        let mut marks = inline::marks_at(content, local);
        marks.push(link);
        inline::insert_at(
            content,
            local,
            vec![Inline::Text {
                text: url.to_string(),
                marks,
            }],
        );
        let len = url.chars().count();
        return Selection::new(range.start, range.start + len);
    }

    for (leaf, s, e) in touched_leaves(doc, &range) {
        if let Some(content) = doc.leaf_content_mut(&leaf.path) {
            inline::remove_mark(content, s, e, MarkKind::Link);
            inline::add_mark(content, s, e, &link);
        }
    }
    selection
}

fn insert_image(doc: &mut Document, range: Range<usize>, url: &str) -> Selection {
    delete_range(doc, range.clone());
    let caret = range.start;
    let Some((path, local)) = caret_leaf(doc, caret) else {
        return Selection::collapsed(caret);
    };
    if let Some(content) = doc.leaf_content_mut(&path) {
        let marks = inline::marks_at(content, local)
            .into_iter()
            .filter(|m| m.kind != MarkKind::Link)
            .collect();
        let atom = Atom::Image(Attributes::from_pairs([("src", url)]));
        inline::insert_at(content, local, vec![Inline::Atom { atom, marks }]);
    }
    Selection::collapsed(caret + 1)
}

fn insert_text(doc: &mut Document, range: Range<usize>, text: &str) -> Selection {
    delete_range(doc, range.clone());
    let caret = range.start;
    if text.is_empty() {
        return Selection::collapsed(caret);
    }
    let Some((path, local)) = caret_leaf(doc, caret) else {
        return Selection::collapsed(caret);
    };
    if let Some(content) = doc.leaf_content_mut(&path) {
        let marks = inline::marks_at(content, local);
        inline::insert_at(
            content,
            local,
            vec![Inline::Text {
                text: text.to_string(),
                marks,
            }],
        );
    }
    Selection::collapsed(caret + text.chars().count())
}

fn justify(
    doc: &mut Document,
    range: Range<usize>,
    alignment: Alignment,
    selection: Selection,
) -> Selection {
    for (leaf, _, _) in touched_leaves(doc, &range) {
        let Some(mut owner) = doc.leaf_mut(&leaf.path) else {
            continue;
        };
        // Bare content needs an element to carry the style.
        if let LeafMut::Text(tb) = &mut owner {
            if tb.kind == BlockKind::Bare {
                tb.kind = BlockKind::Division;
            }
        }
        owner
            .attrs_mut()
            .set_style_property("text-align", alignment.css_value());
    }
    selection
}

// === text entry ===

/// Path and local offset of the leaf holding `offset`, creating an empty
/// leaf when the document has none.
fn caret_leaf(doc: &mut Document, offset: usize) -> Option<(Vec<Step>, usize)> {
    if doc.leaves().is_empty() {
        doc.blocks
            .push(Block::Text(TextBlock::new(BlockKind::Bare, Vec::new())));
    }
    let leaf = doc.leaf_at(offset)?;
    Some((leaf.path.clone(), offset - leaf.start))
}

fn insert_line_break(doc: &mut Document, range: Range<usize>) -> Selection {
    delete_range(doc, range.clone());
    let caret = range.start;
    let Some((path, local)) = caret_leaf(doc, caret) else {
        return Selection::collapsed(caret);
    };
    if let Some(content) = doc.leaf_content_mut(&path) {
        let at_end = local == inline::content_len(content);
        // A single trailing <br> doesn't render a new line, so the end of a
        // leaf gets a second one to hold the caret.
        let count = if at_end && !inline::ends_with_line_break(content) {
            2
        } else {
            1
        };
        inline::insert_at(content, local, vec![Inline::line_break(); count]);
    }
    Selection::collapsed(caret + 1)
}

fn insert_paragraph(doc: &mut Document, range: Range<usize>) -> Selection {
    delete_range(doc, range.clone());
    let caret = range.start;
    if caret_leaf(doc, caret).is_none() {
        return Selection::collapsed(caret);
    }
    let leaves = doc.leaves();
    let Some((index, leaf)) = leaves.iter().enumerate().find(|(_, l)| l.contains(caret)) else {
        return Selection::collapsed(caret);
    };
    let local = caret - leaf.start;

    if leaf.list.is_some() {
        let empty_item = matches!(
            doc.leaf_mut(&leaf.path),
            Some(LeafMut::Item(item)) if item.children.is_empty() && inline::is_placeholder(&item.content)
        );
        if empty_item {
            // Enter on an empty item leaves the list.
            restructure_selected(doc, &(index..index + 1), Restructure::Lift {
                kind: BlockKind::Paragraph,
                only: None,
                retag: false,
            });
            return Selection::collapsed(leaf.start);
        }
        split_item(doc, &leaf.path, local);
    } else {
        split_text_block(doc, &leaf.path, local);
    }
    Selection::collapsed(caret + 1)
}

fn split_item(doc: &mut Document, path: &[Step], local: usize) -> Option<()> {
    let (Step::Item(j), prefix) = path.split_last()? else {
        return None;
    };
    let (Step::Block(b), prefix) = prefix.split_last()? else {
        return None;
    };
    let Block::List(list) = doc.sequence_mut(prefix)?.get_mut(*b)? else {
        return None;
    };
    let item = list.items.get_mut(*j)?;
    let tail = inline::split_off(&mut item.content, local);
    let mut next = ListItem::new(with_placeholder(tail));
    next.children = std::mem::take(&mut item.children);
    next.attrs = item.attrs.clone();
    next.attrs.remove("id");
    if item.content.is_empty() {
        item.content.push(Inline::line_break());
    }
    list.items.insert(j + 1, next);
    Some(())
}

fn split_text_block(doc: &mut Document, path: &[Step], local: usize) -> Option<()> {
    let (Step::Block(k), prefix) = path.split_last()? else {
        return None;
    };
    let sequence = doc.sequence_mut(prefix)?;
    let Block::Text(tb) = sequence.get_mut(*k)? else {
        return None;
    };
    let tail = inline::split_off(&mut tb.content, local);
    let tail_kind = match tb.kind {
        // Two bare runs would merge back into one on the next parse.
        BlockKind::Bare => {
            tb.kind = BlockKind::Division;
            BlockKind::Division
        }
        BlockKind::Heading(_) if tail.is_empty() => BlockKind::Paragraph,
        kind => kind,
    };
    let mut next = TextBlock::new(tail_kind, with_placeholder(tail));
    next.attrs = tb.attrs.clone();
    next.attrs.remove("id");
    if tb.content.is_empty() {
        tb.content.push(Inline::line_break());
    }
    sequence.insert(k + 1, Block::Text(next));
    Some(())
}

/// Empty blocks collapse to nothing when rendered; a `<br>` keeps them open.
fn with_placeholder(mut content: Vec<Inline>) -> Vec<Inline> {
    if content.is_empty() {
        content.push(Inline::line_break());
    }
    content
}

/// Delete `range`, joining the first and last leaf it touches.
fn delete_range(doc: &mut Document, range: Range<usize>) {
    if range.is_empty() {
        return;
    }
    let leaves = doc.leaves();
    let touched: Vec<(usize, &LeafInfo, usize, usize)> = leaves
        .iter()
        .enumerate()
        .filter_map(|(i, leaf)| {
            let (s, e) = leaf.local_range(range.start, range.end)?;
            Some((i, leaf, s, e))
        })
        .collect();
    let (Some(&(first_idx, first, first_s, _)), Some(&(last_idx, last, _, last_e))) =
        (touched.first(), touched.last())
    else {
        return;
    };

    if first_idx == last_idx {
        if let Some(content) = doc.leaf_content_mut(&first.path) {
            inline::remove_range(content, first_s, last_e);
        }
        return;
    }

    // Pull the surviving tail out of the last leaf, clear everything after
    // the start, then re-attach the tail to the first leaf.
    let tail = doc
        .leaf_content_mut(&last.path)
        .map(|content| {
            let tail = inline::split_off(content, last_e);
            content.clear();
            tail
        })
        .unwrap_or_default();
    for (_, leaf, _, _) in &touched[1..touched.len() - 1] {
        if let Some(content) = doc.leaf_content_mut(&leaf.path) {
            content.clear();
        }
    }
    if let Some(content) = doc.leaf_content_mut(&first.path) {
        let len = inline::content_len(content);
        inline::remove_range(content, first_s, len);
        inline::insert_at(content, first_s, tail);
    }

    let doomed = first_idx + 1..last_idx + 1;
    let mut counter = 0;
    remove_leaves(&mut doc.blocks, &mut counter, &doomed);
}

/// Remove the text blocks and childless list items whose leaf index is in
/// `doomed`, then any list or container left empty.
fn remove_leaves(blocks: &mut Vec<Block>, counter: &mut usize, doomed: &Range<usize>) {
    blocks.retain_mut(|block| match block {
        Block::Text(_) => {
            let idx = next_leaf(counter);
            !doomed.contains(&idx)
        }
        Block::List(list) => {
            list.items.retain_mut(|item| {
                let idx = next_leaf(counter);
                remove_leaves(&mut item.children, counter, doomed);
                !(doomed.contains(&idx) && item.children.is_empty())
            });
            !list.items.is_empty()
        }
        Block::Container(c) => {
            remove_leaves(&mut c.blocks, counter, doomed);
            !c.blocks.is_empty()
        }
        Block::Rule(_) => true,
    });
}

fn next_leaf(counter: &mut usize) -> usize {
    let idx = *counter;
    *counter += 1;
    idx
}

// === block structure ===

/// Index range of leaves overlapping `range`.
fn selected_leaf_indices(leaves: &[LeafInfo], range: &Range<usize>) -> Range<usize> {
    let mut hits = leaves
        .iter()
        .enumerate()
        .filter(|(_, leaf)| leaf.local_range(range.start, range.end).is_some())
        .map(|(i, _)| i);
    match hits.next() {
        Some(first) => {
            let last = hits.last().unwrap_or(first);
            first..last + 1
        }
        None => 0..0,
    }
}

fn toggle_list(
    doc: &mut Document,
    range: Range<usize>,
    kind: ListKind,
    selection: Selection,
) -> Selection {
    if doc.leaves().is_empty() {
        doc.blocks
            .push(Block::Text(TextBlock::new(BlockKind::Bare, Vec::new())));
    }
    let leaves = doc.leaves();
    let indices = selected_leaf_indices(&leaves, &range);
    if indices.is_empty() {
        return selection;
    }

    let all_in_kind = leaves[indices.clone()]
        .iter()
        .all(|leaf| leaf.list == Some(kind));
    let op = if all_in_kind {
        Restructure::Lift {
            kind: BlockKind::Paragraph,
            only: Some(kind),
            retag: false,
        }
    } else {
        Restructure::Listify(kind)
    };
    restructure_selected(doc, &indices, op);
    selection.clamped(doc.len())
}

#[derive(Debug, Clone, Copy)]
enum Restructure {
    /// Selected text blocks become items of a `kind` list. Lists of the other
    /// kind holding selected items switch kind.
    Listify(ListKind),
    /// Selected list items (in lists of kind `only`, if set) become blocks
    /// of `kind`. With `retag`, selected text blocks take `kind` too.
    Lift {
        kind: BlockKind,
        only: Option<ListKind>,
        retag: bool,
    },
}

/// Rebuild the document applying `op` to the leaves indexed by `indices`.
fn restructure_selected(doc: &mut Document, indices: &Range<usize>, op: Restructure) {
    if indices.is_empty() {
        return;
    }
    let mut counter = 0;
    let blocks = std::mem::take(&mut doc.blocks);
    doc.blocks = restructure(blocks, &mut counter, indices, op);
}

fn restructure(
    blocks: Vec<Block>,
    counter: &mut usize,
    selected: &Range<usize>,
    op: Restructure,
) -> Vec<Block> {
    let mut out: Vec<(Block, bool)> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match block {
            Block::Text(mut tb) => {
                let idx = next_leaf(counter);
                let hit = selected.contains(&idx);
                match op {
                    Restructure::Listify(kind) if hit => {
                        let list = List::new(kind, text_block_to_items(tb));
                        out.push((Block::List(list), true));
                    }
                    Restructure::Lift {
                        kind, retag: true, ..
                    } if hit => {
                        tb.kind = kind;
                        out.push((Block::Text(tb), false));
                    }
                    _ => out.push((Block::Text(tb), false)),
                }
            }
            Block::List(list) => out.extend(restructure_list(list, counter, selected, op)),
            Block::Container(mut c) => {
                c.blocks = restructure(c.blocks, counter, selected, op);
                out.push((Block::Container(c), false));
            }
            Block::Rule(attrs) => out.push((Block::Rule(attrs), false)),
        }
    }
    merge_touched_lists(out)
}

fn restructure_list(
    list: List,
    counter: &mut usize,
    selected: &Range<usize>,
    op: Restructure,
) -> Vec<(Block, bool)> {
    let List { kind, attrs, items } = list;
    let mut pieces: Vec<(Block, bool)> = Vec::new();
    let mut current: Vec<ListItem> = Vec::new();
    let mut switch = false;

    for mut item in items {
        let idx = next_leaf(counter);
        let hit = selected.contains(&idx);
        item.children = restructure(std::mem::take(&mut item.children), counter, selected, op);
        match op {
            Restructure::Lift {
                kind: block_kind,
                only,
                ..
            } if hit && only.is_none_or(|k| k == kind) => {
                if !current.is_empty() {
                    let chunk = List {
                        kind,
                        attrs: attrs.clone(),
                        items: std::mem::take(&mut current),
                    };
                    pieces.push((Block::List(chunk), false));
                }
                let ListItem {
                    attrs: item_attrs,
                    content,
                    children,
                } = item;
                pieces.push((
                    Block::Text(TextBlock {
                        kind: block_kind,
                        attrs: item_attrs,
                        content,
                    }),
                    false,
                ));
                pieces.extend(children.into_iter().map(|child| (child, false)));
            }
            Restructure::Listify(target) if hit && target != kind => {
                switch = true;
                current.push(item);
            }
            _ => current.push(item),
        }
    }
    if !current.is_empty() {
        let chunk = List {
            kind,
            attrs,
            items: current,
        };
        pieces.push((Block::List(chunk), false));
    }

    if switch {
        if let Restructure::Listify(target) = op {
            for (block, touched) in &mut pieces {
                if let Block::List(chunk) = block {
                    chunk.kind = target;
                    *touched = true;
                }
            }
        }
    }
    pieces
}

/// Items for a text block being turned into a list.
///
/// Bare content is split at line breaks, one item per line. Other blocks
/// become a single item keeping their attributes.
fn text_block_to_items(tb: TextBlock) -> Vec<ListItem> {
    if tb.kind == BlockKind::Bare {
        return inline::split_lines(tb.content)
            .into_iter()
            .map(ListItem::new)
            .collect();
    }
    let mut item = ListItem::new(tb.content);
    item.attrs = tb.attrs;
    vec![item]
}

/// Merge adjacent same-kind lists when either was touched by this pass.
fn merge_touched_lists(blocks: Vec<(Block, bool)>) -> Vec<Block> {
    let mut merged: Vec<(Block, bool)> = Vec::with_capacity(blocks.len());
    for (block, touched) in blocks {
        if let Block::List(list) = block {
            if let Some((Block::List(prev), prev_touched)) = merged.last_mut() {
                if prev.kind == list.kind && (touched || *prev_touched) {
                    prev.items.extend(list.items);
                    *prev_touched = true;
                    continue;
                }
            }
            merged.push((Block::List(list), touched));
        } else {
            merged.push((block, touched));
        }
    }
    merged.into_iter().map(|(block, _)| block).collect()
}
