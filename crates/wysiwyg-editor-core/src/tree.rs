//! The content tree behind the editable surface.
//!
//! Markup is parsed into blocks holding runs of marked inline content. All
//! formatting commands operate on this tree and the surface markup is the
//! tree serialized back out.
//!
//! # Offsets
//!
//! Positions are character offsets into the *flattened projection* of the
//! document. Leaves (text blocks and list item content) are visited
//! depth-first in document order:
//!
//! - every text char counts 1
//! - every atom (`<br>`, `<img>`) counts 1
//! - consecutive leaves are separated by 1
//!
//! So `<p>ab</p><p>c</p>` has leaves `0..2` and `3..4`.

use smol_str::SmolStr;

use crate::attrs::Attributes;

/// List flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Unordered => "ul",
            Self::Ordered => "ol",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ul" => Some(Self::Unordered),
            "ol" => Some(Self::Ordered),
            _ => None,
        }
    }
}

/// Kind of a block that directly holds inline content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Inline content with no wrapper element (e.g. `my <b>HTML</b>`).
    Bare,
    Paragraph,
    /// Heading level 1..=6.
    Heading(u8),
    Division,
    Preformatted,
    Quote,
}

impl BlockKind {
    /// Element tag, or None for bare content.
    pub fn tag(self) -> Option<&'static str> {
        match self {
            Self::Bare => None,
            Self::Paragraph => Some("p"),
            Self::Heading(1) => Some("h1"),
            Self::Heading(2) => Some("h2"),
            Self::Heading(3) => Some("h3"),
            Self::Heading(4) => Some("h4"),
            Self::Heading(5) => Some("h5"),
            Self::Heading(_) => Some("h6"),
            Self::Division => Some("div"),
            Self::Preformatted => Some("pre"),
            Self::Quote => Some("blockquote"),
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "p" => Some(Self::Paragraph),
            "h1" => Some(Self::Heading(1)),
            "h2" => Some(Self::Heading(2)),
            "h3" => Some(Self::Heading(3)),
            "h4" => Some(Self::Heading(4)),
            "h5" => Some(Self::Heading(5)),
            "h6" => Some(Self::Heading(6)),
            "div" => Some(Self::Division),
            "pre" => Some(Self::Preformatted),
            "blockquote" => Some(Self::Quote),
            _ => None,
        }
    }

    pub fn is_heading(self) -> bool {
        matches!(self, Self::Heading(_))
    }
}

/// Semantic kind of an inline mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
    Subscript,
    Superscript,
    Link,
    /// Any other inline element (`span`, `font`, `mark`, ...).
    Span,
}

impl MarkKind {
    /// Tag used when the editor creates a new mark of this kind.
    pub fn canonical_tag(self) -> &'static str {
        match self {
            Self::Bold => "b",
            Self::Italic => "i",
            Self::Underline => "u",
            Self::Strikethrough => "s",
            Self::Code => "code",
            Self::Subscript => "sub",
            Self::Superscript => "sup",
            Self::Link => "a",
            Self::Span => "span",
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "b" | "strong" => Self::Bold,
            "i" | "em" => Self::Italic,
            "u" | "ins" => Self::Underline,
            "s" | "strike" | "del" => Self::Strikethrough,
            "code" | "kbd" | "samp" | "tt" => Self::Code,
            "sub" => Self::Subscript,
            "sup" => Self::Superscript,
            "a" => Self::Link,
            _ => Self::Span,
        }
    }
}

/// An inline element wrapping a run of content.
///
/// The original tag is kept so `<strong>` stays `<strong>` even though it
/// counts as bold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    pub kind: MarkKind,
    pub tag: SmolStr,
    pub attrs: Attributes,
}

impl Mark {
    /// New mark using the canonical tag for its kind.
    pub fn new(kind: MarkKind) -> Self {
        Self {
            kind,
            tag: SmolStr::new_static(kind.canonical_tag()),
            attrs: Attributes::new(),
        }
    }

    pub fn link(href: &str) -> Self {
        let mut mark = Self::new(MarkKind::Link);
        mark.attrs.set("href", href);
        mark
    }

    pub fn from_element(tag: &str, attrs: Attributes) -> Self {
        Self {
            kind: MarkKind::from_tag(tag),
            tag: SmolStr::new(tag),
            attrs,
        }
    }
}

/// Non-text inline content. Each atom occupies one offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    LineBreak,
    Image(Attributes),
}

/// A run of inline content with the marks wrapping it, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text { text: String, marks: Vec<Mark> },
    Atom { atom: Atom, marks: Vec<Mark> },
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn line_break() -> Self {
        Self::Atom {
            atom: Atom::LineBreak,
            marks: Vec::new(),
        }
    }

    pub fn image(src: &str) -> Self {
        Self::Atom {
            atom: Atom::Image(Attributes::from_pairs([("src", src)])),
            marks: Vec::new(),
        }
    }

    /// Length in offsets.
    pub fn len(&self) -> usize {
        match self {
            Self::Text { text, .. } => text.chars().count(),
            Self::Atom { .. } => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn marks(&self) -> &[Mark] {
        match self {
            Self::Text { marks, .. } | Self::Atom { marks, .. } => marks,
        }
    }

    pub fn marks_mut(&mut self) -> &mut Vec<Mark> {
        match self {
            Self::Text { marks, .. } | Self::Atom { marks, .. } => marks,
        }
    }

    pub fn has_mark(&self, kind: MarkKind) -> bool {
        self.marks().iter().any(|m| m.kind == kind)
    }

    pub fn is_line_break(&self) -> bool {
        matches!(
            self,
            Self::Atom {
                atom: Atom::LineBreak,
                ..
            }
        )
    }
}

/// Block holding inline content directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub kind: BlockKind,
    pub attrs: Attributes,
    pub content: Vec<Inline>,
}

impl TextBlock {
    pub fn new(kind: BlockKind, content: Vec<Inline>) -> Self {
        Self {
            kind,
            attrs: Attributes::new(),
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListItem {
    pub attrs: Attributes,
    pub content: Vec<Inline>,
    /// Blocks after the item's own inline content (nested lists, paragraphs).
    pub children: Vec<Block>,
}

impl ListItem {
    pub fn new(content: Vec<Inline>) -> Self {
        Self {
            attrs: Attributes::new(),
            content,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    pub kind: ListKind,
    pub attrs: Attributes,
    pub items: Vec<ListItem>,
}

impl List {
    pub fn new(kind: ListKind, items: Vec<ListItem>) -> Self {
        Self {
            kind,
            attrs: Attributes::new(),
            items,
        }
    }
}

/// Wrapper element holding other blocks (`div`, `blockquote`, `section`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub tag: SmolStr,
    pub attrs: Attributes,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Text(TextBlock),
    List(List),
    Container(Container),
    /// `<hr>`. Holds no leaf.
    Rule(Attributes),
}

/// One step of a path from the document root to a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Index into a block sequence.
    Block(usize),
    /// Index into a list's items.
    Item(usize),
}

pub type LeafPath = Vec<Step>;

/// Location and extent of one leaf in the flattened projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafInfo {
    pub path: LeafPath,
    pub start: usize,
    pub len: usize,
    /// Kind of the list when this leaf is a list item's own content.
    pub list: Option<ListKind>,
    /// Whether the leaf is anywhere inside a list item.
    pub in_list_item: bool,
    /// Block kind for text-block leaves; None for list items.
    pub block_kind: Option<BlockKind>,
}

impl LeafInfo {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset <= self.end()
    }

    /// Local (start, end) of `range` clipped to this leaf, if they overlap.
    ///
    /// A collapsed range overlaps the leaf it sits in.
    pub fn local_range(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        if start == end {
            return self
                .contains(start)
                .then(|| (start - self.start, start - self.start));
        }
        let s = start.max(self.start);
        let e = end.min(self.end());
        if s < e || (s == e && self.len == 0 && s == self.start) {
            Some((s - self.start, e - self.start))
        } else {
            None
        }
    }
}

/// Mutable access to whatever owns a leaf's inline content.
#[derive(Debug)]
pub enum LeafMut<'a> {
    Text(&'a mut TextBlock),
    Item(&'a mut ListItem),
}

impl<'a> LeafMut<'a> {
    pub fn content_mut(self) -> &'a mut Vec<Inline> {
        match self {
            Self::Text(tb) => &mut tb.content,
            Self::Item(item) => &mut item.content,
        }
    }

    pub fn attrs_mut(self) -> &'a mut Attributes {
        match self {
            Self::Text(tb) => &mut tb.attrs,
            Self::Item(item) => &mut item.attrs,
        }
    }
}

/// Parsed editable content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Every leaf in document order with its offsets.
    pub fn leaves(&self) -> Vec<LeafInfo> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        collect_leaves(&self.blocks, &mut path, false, &mut out);
        out
    }

    /// Total length of the flattened projection.
    pub fn len(&self) -> usize {
        self.leaves().last().map(LeafInfo::end).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.leaves().iter().all(|leaf| leaf.len == 0)
    }

    /// Leaf containing `offset`. Offsets on a leaf's end belong to it.
    pub fn leaf_at(&self, offset: usize) -> Option<LeafInfo> {
        self.leaves().into_iter().find(|leaf| leaf.contains(offset))
    }

    pub fn leaf_content(&self, path: &[Step]) -> Option<&Vec<Inline>> {
        content_in_blocks(&self.blocks, path)
    }

    pub fn leaf_content_mut(&mut self, path: &[Step]) -> Option<&mut Vec<Inline>> {
        self.leaf_mut(path).map(LeafMut::content_mut)
    }

    /// The text block or list item owning the leaf at `path`.
    pub fn leaf_mut(&mut self, path: &[Step]) -> Option<LeafMut<'_>> {
        match path.split_last()? {
            (Step::Block(k), prefix) => match self.sequence_mut(prefix)?.get_mut(*k)? {
                Block::Text(tb) => Some(LeafMut::Text(tb)),
                _ => None,
            },
            (Step::Item(j), prefix) => {
                let (Step::Block(b), prefix) = prefix.split_last()? else {
                    return None;
                };
                match self.sequence_mut(prefix)?.get_mut(*b)? {
                    Block::List(list) => list.items.get_mut(*j).map(LeafMut::Item),
                    _ => None,
                }
            }
        }
    }

    /// Block sequence reached by `path`: the root for an empty path, a
    /// container's blocks, or a list item's children.
    pub fn sequence_mut(&mut self, path: &[Step]) -> Option<&mut Vec<Block>> {
        sequence_in_mut(&mut self.blocks, path)
    }

    /// Plain-text view: leaves joined by `\n`, `<br>` as `\n`, images as U+FFFC.
    ///
    /// Offsets in this string (counted in chars) match document offsets.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for (i, leaf) in self.leaves().iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            if let Some(content) = self.leaf_content(&leaf.path) {
                for inline in content {
                    match inline {
                        Inline::Text { text, .. } => out.push_str(text),
                        Inline::Atom {
                            atom: Atom::LineBreak,
                            ..
                        } => out.push('\n'),
                        Inline::Atom {
                            atom: Atom::Image(_),
                            ..
                        } => out.push('\u{FFFC}'),
                    }
                }
            }
        }
        out
    }
}

fn collect_leaves(
    blocks: &[Block],
    path: &mut LeafPath,
    in_list_item: bool,
    out: &mut Vec<LeafInfo>,
) {
    for (i, block) in blocks.iter().enumerate() {
        path.push(Step::Block(i));
        match block {
            Block::Text(tb) => push_leaf(
                out,
                path,
                crate::inline::content_len(&tb.content),
                None,
                in_list_item,
                Some(tb.kind),
            ),
            Block::List(list) => {
                for (j, item) in list.items.iter().enumerate() {
                    path.push(Step::Item(j));
                    push_leaf(
                        out,
                        path,
                        crate::inline::content_len(&item.content),
                        Some(list.kind),
                        true,
                        None,
                    );
                    collect_leaves(&item.children, path, true, out);
                    path.pop();
                }
            }
            Block::Container(c) => collect_leaves(&c.blocks, path, in_list_item, out),
            Block::Rule(_) => {}
        }
        path.pop();
    }
}

fn push_leaf(
    out: &mut Vec<LeafInfo>,
    path: &LeafPath,
    len: usize,
    list: Option<ListKind>,
    in_list_item: bool,
    block_kind: Option<BlockKind>,
) {
    let start = out.last().map(|prev| prev.end() + 1).unwrap_or(0);
    out.push(LeafInfo {
        path: path.clone(),
        start,
        len,
        list,
        in_list_item,
        block_kind,
    });
}

fn content_in_blocks<'a>(blocks: &'a [Block], path: &[Step]) -> Option<&'a Vec<Inline>> {
    match path.split_last()? {
        (Step::Block(k), prefix) => match sequence_in(blocks, prefix)?.get(*k)? {
            Block::Text(tb) => Some(&tb.content),
            _ => None,
        },
        (Step::Item(j), prefix) => {
            let (Step::Block(b), prefix) = prefix.split_last()? else {
                return None;
            };
            match sequence_in(blocks, prefix)?.get(*b)? {
                Block::List(list) => Some(&list.items.get(*j)?.content),
                _ => None,
            }
        }
    }
}

fn sequence_in<'a>(blocks: &'a [Block], path: &[Step]) -> Option<&'a [Block]> {
    match path {
        [] => Some(blocks),
        [Step::Block(b), rest @ ..] => match (blocks.get(*b)?, rest) {
            (Block::Container(c), _) => sequence_in(&c.blocks, rest),
            (Block::List(list), [Step::Item(j), rest @ ..]) => {
                sequence_in(&list.items.get(*j)?.children, rest)
            }
            _ => None,
        },
        _ => None,
    }
}

fn sequence_in_mut<'a>(blocks: &'a mut Vec<Block>, path: &[Step]) -> Option<&'a mut Vec<Block>> {
    match path {
        [] => Some(blocks),
        [Step::Block(b), rest @ ..] => match (blocks.get_mut(*b)?, rest) {
            (Block::Container(c), _) => sequence_in_mut(&mut c.blocks, rest),
            (Block::List(list), [Step::Item(j), rest @ ..]) => {
                sequence_in_mut(&mut list.items.get_mut(*j)?.children, rest)
            }
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(text: &str) -> Block {
        Block::Text(TextBlock::new(BlockKind::Paragraph, vec![Inline::text(text)]))
    }

    #[test]
    fn test_leaf_offsets() {
        let doc = Document::from_blocks(vec![para("ab"), para("c")]);
        let leaves = doc.leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!((leaves[0].start, leaves[0].end()), (0, 2));
        assert_eq!((leaves[1].start, leaves[1].end()), (3, 4));
        assert_eq!(doc.len(), 4);
        assert_eq!(doc.plain_text(), "ab\nc");
    }

    #[test]
    fn test_list_leaves_carry_context() {
        let mut item = ListItem::new(vec![Inline::text("one")]);
        item.children.push(Block::List(List::new(
            ListKind::Ordered,
            vec![ListItem::new(vec![Inline::text("nested")])],
        )));
        let doc = Document::from_blocks(vec![
            Block::List(List::new(ListKind::Unordered, vec![item])),
            para("after"),
        ]);

        let leaves = doc.leaves();
        assert_eq!(leaves.len(), 3);
        assert_eq!(leaves[0].list, Some(ListKind::Unordered));
        assert_eq!(leaves[1].list, Some(ListKind::Ordered));
        assert_eq!(
            leaves[1].path,
            vec![Step::Block(0), Step::Item(0), Step::Block(0), Step::Item(0)]
        );
        assert!(leaves[1].in_list_item);
        assert!(!leaves[2].in_list_item);
        assert_eq!(leaves[2].start, 11);
    }

    #[test]
    fn test_leaf_content_mut_resolves_nested_path() {
        let mut doc = Document::from_blocks(vec![Block::List(List::new(
            ListKind::Unordered,
            vec![ListItem::new(vec![Inline::text("x")])],
        ))]);
        let path = doc.leaves()[0].path.clone();
        doc.leaf_content_mut(&path)
            .unwrap()
            .push(Inline::text("y"));
        assert_eq!(doc.plain_text(), "xy");
    }

    #[test]
    fn test_local_range() {
        let doc = Document::from_blocks(vec![para("ab"), para("cd")]);
        let leaves = doc.leaves();
        assert_eq!(leaves[0].local_range(1, 4), Some((1, 2)));
        assert_eq!(leaves[1].local_range(1, 4), Some((0, 1)));
        assert_eq!(leaves[1].local_range(0, 2), None);
        // Caret at end of first leaf only belongs to the first leaf.
        assert_eq!(leaves[0].local_range(2, 2), Some((2, 2)));
        assert_eq!(leaves[1].local_range(2, 2), None);
    }
}
