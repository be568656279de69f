//! Markup → content tree.
//!
//! Tolerant of what `contentEditable` surfaces and pasted fragments produce:
//! unclosed `<p>`/`<li>`, stray end tags, void elements written with or
//! without `/>`. Sanitization happens during the raw pass so nothing unsafe
//! ever reaches the tree.

use std::borrow::Cow;

use smol_str::SmolStr;

use crate::attrs::Attributes;
use crate::inline;
use crate::sanitize::{SanitizePolicy, is_dropped_element, sanitize_attributes};
use crate::tree::{
    Atom, Block, BlockKind, Container, Document, Inline, List, ListItem, ListKind, Mark,
    TextBlock,
};

const VOID_ELEMENTS: &[&str] = &[
    "br", "img", "hr", "wbr", "input", "link", "meta", "base", "embed", "area", "col", "source",
    "track", "param", "frame", "keygen",
];

/// Elements that start a new block (and so end any pending inline run).
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "div", "pre", "blockquote", "ul", "ol", "li", "hr",
    "table", "thead", "tbody", "tfoot", "tr", "td", "th", "caption", "section", "article",
    "header", "footer", "nav", "aside", "main", "figure", "figcaption", "dl", "dt", "dd",
    "address", "details", "summary", "center", "fieldset", "hgroup",
];

/// Elements whose start implicitly closes an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "div", "pre", "blockquote", "ul", "ol", "hr",
    "table", "section", "article", "header", "footer", "nav", "aside", "main", "figure", "dl",
    "address", "details", "fieldset",
];

/// Open elements a `<p>` auto-close won't look past.
const PARAGRAPH_SCOPE: &[&str] = &[
    "div", "li", "blockquote", "td", "th", "section", "article", "button",
];

fn is_block_element(tag: &str) -> bool {
    BLOCK_ELEMENTS.contains(&tag)
}

fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

impl Document {
    /// Parse (and sanitize) editor markup.
    pub fn from_html(markup: &str, policy: &SanitizePolicy) -> Self {
        parse_html(markup, policy)
    }
}

/// Parse and sanitize markup into a document.
pub fn parse_html(markup: &str, policy: &SanitizePolicy) -> Document {
    let raw = build_raw_tree(markup, policy);
    let blocks = lower_blocks(raw);
    tracing::trace!(blocks = blocks.len(), "parsed markup");
    Document::from_blocks(blocks)
}

// === raw pass ===

#[derive(Debug, Clone, PartialEq)]
enum RawNode {
    Text(String),
    Element {
        tag: SmolStr,
        attrs: Attributes,
        children: Vec<RawNode>,
    },
}

impl RawNode {
    fn is_inline(&self) -> bool {
        match self {
            RawNode::Text(_) => true,
            RawNode::Element { tag, .. } => !is_block_element(tag),
        }
    }

    fn is_whitespace_text(&self) -> bool {
        matches!(self, RawNode::Text(t) if t.chars().all(char::is_whitespace))
    }
}

#[derive(Debug)]
enum Token<'a> {
    Text(&'a str),
    Start {
        tag: SmolStr,
        attrs: Attributes,
    },
    End(SmolStr),
}

struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek_byte(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek_byte().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Advance past the next `>` (or to the end).
    fn skip_past_gt(&mut self) {
        match self.rest().find('>') {
            Some(i) => self.pos += i + 1,
            None => self.pos = self.src.len(),
        }
    }

    /// Skip the content of a dropped element up to and including its end tag.
    fn skip_element_content(&mut self, tag: &str) {
        let needle = format!("</{tag}");
        match self.rest().to_ascii_lowercase().find(&needle) {
            Some(i) => {
                self.pos += i + needle.len();
                self.skip_past_gt();
            }
            None => self.pos = self.src.len(),
        }
    }

    fn read_name(&mut self) -> &'a str {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_ascii_whitespace() || matches!(c, '>' | '/' | '='))
            .unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn read_attrs(&mut self) -> Attributes {
        let mut attrs = Attributes::new();
        loop {
            self.skip_whitespace();
            match self.peek_byte() {
                None => break,
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'/') => {
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }
            let name = self.read_name();
            if name.is_empty() {
                // Stray `=` or similar.
                self.pos += 1;
                continue;
            }
            self.skip_whitespace();
            let mut value = Cow::Borrowed("");
            if self.peek_byte() == Some(b'=') {
                self.pos += 1;
                self.skip_whitespace();
                value = decode_entities(self.read_attr_value());
            }
            // First occurrence wins.
            if !attrs.contains(name) {
                attrs.set(name, value.into_owned());
            }
        }
        attrs
    }

    fn read_attr_value(&mut self) -> &'a str {
        let rest = self.rest();
        match self.peek_byte() {
            Some(q @ (b'"' | b'\'')) => {
                let body = &rest[1..];
                match body.find(q as char) {
                    Some(end) => {
                        self.pos += end + 2;
                        &body[..end]
                    }
                    None => {
                        self.pos = self.src.len();
                        body
                    }
                }
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_ascii_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                self.pos += end;
                &rest[..end]
            }
        }
    }

    fn next_token(&mut self) -> Option<Token<'a>> {
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return None;
            }
            if !rest.starts_with('<') {
                let end = rest.find('<').unwrap_or(rest.len());
                self.pos += end;
                return Some(Token::Text(&rest[..end]));
            }
            if let Some(body) = rest.strip_prefix("<!--") {
                match body.find("-->") {
                    Some(i) => self.pos += 4 + i + 3,
                    None => self.pos = self.src.len(),
                }
                continue;
            }
            let next = rest.as_bytes().get(1).copied();
            match next {
                Some(b'!' | b'?') => {
                    self.skip_past_gt();
                    continue;
                }
                Some(b'/') => {
                    self.pos += 2;
                    if !self.peek_byte().is_some_and(|b| b.is_ascii_alphabetic()) {
                        self.skip_past_gt();
                        continue;
                    }
                    let name = self.read_name().to_ascii_lowercase();
                    self.skip_past_gt();
                    return Some(Token::End(SmolStr::new(name)));
                }
                Some(b) if b.is_ascii_alphabetic() => {
                    self.pos += 1;
                    let tag = SmolStr::new(self.read_name().to_ascii_lowercase());
                    let attrs = self.read_attrs();
                    return Some(Token::Start { tag, attrs });
                }
                _ => {
                    self.pos += 1;
                    return Some(Token::Text("<"));
                }
            }
        }
    }
}

struct OpenElement {
    tag: SmolStr,
    attrs: Attributes,
    children: Vec<RawNode>,
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<OpenElement>,
    root: Vec<RawNode>,
}

impl TreeBuilder {
    fn push_node(&mut self, node: RawNode) {
        match self.stack.last_mut() {
            Some(open) => open.children.push(node),
            None => self.root.push(node),
        }
    }

    fn push_text(&mut self, text: &str) {
        let text = decode_entities(text);
        let siblings = match self.stack.last_mut() {
            Some(open) => &mut open.children,
            None => &mut self.root,
        };
        if let Some(RawNode::Text(prev)) = siblings.last_mut() {
            prev.push_str(&text);
        } else {
            siblings.push(RawNode::Text(text.into_owned()));
        }
    }

    fn close_top(&mut self) {
        if let Some(open) = self.stack.pop() {
            self.push_node(RawNode::Element {
                tag: open.tag,
                attrs: open.attrs,
                children: open.children,
            });
        }
    }

    fn close_to_depth(&mut self, depth: usize) {
        while self.stack.len() > depth {
            self.close_top();
        }
    }

    /// Stack index of the nearest open `tag`, not looking past any of `scope`.
    fn find_open(&self, tag: &str, scope: &[&str]) -> Option<usize> {
        for (i, open) in self.stack.iter().enumerate().rev() {
            if open.tag == tag {
                return Some(i);
            }
            if scope.contains(&open.tag.as_str()) {
                return None;
            }
        }
        None
    }

    fn start(&mut self, tag: SmolStr, attrs: Attributes) {
        if tag == "li" {
            if let Some(i) = self.find_open("li", &["ul", "ol"]) {
                self.close_to_depth(i);
            }
        }
        if CLOSES_PARAGRAPH.contains(&tag.as_str()) {
            if let Some(i) = self.find_open("p", PARAGRAPH_SCOPE) {
                self.close_to_depth(i);
            }
        }
        if is_void_element(&tag) {
            self.push_node(RawNode::Element {
                tag,
                attrs,
                children: Vec::new(),
            });
        } else {
            self.stack.push(OpenElement {
                tag,
                attrs,
                children: Vec::new(),
            });
        }
    }

    fn end(&mut self, tag: &str) {
        let scope: &[&str] = if tag == "li" { &["ul", "ol"] } else { &[] };
        if let Some(i) = self.find_open(tag, scope) {
            self.close_to_depth(i);
        }
    }

    fn finish(mut self) -> Vec<RawNode> {
        self.close_to_depth(0);
        self.root
    }
}

fn build_raw_tree(markup: &str, policy: &SanitizePolicy) -> Vec<RawNode> {
    let mut tokenizer = Tokenizer::new(markup);
    let mut builder = TreeBuilder::default();
    while let Some(token) = tokenizer.next_token() {
        match token {
            Token::Text(text) => builder.push_text(text),
            Token::Start { tag, mut attrs } => {
                if is_dropped_element(&tag) {
                    tracing::debug!(%tag, "dropping element");
                    if !is_void_element(&tag) {
                        tokenizer.skip_element_content(&tag);
                    }
                    continue;
                }
                sanitize_attributes(&tag, &mut attrs, policy);
                builder.start(tag, attrs);
            }
            Token::End(tag) => builder.end(&tag),
        }
    }
    builder.finish()
}

/// Decode the character references contentEditable surfaces emit.
///
/// Unknown references are left as written.
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest[1..]
            .char_indices()
            .take(11)
            .find(|&(_, c)| c == ';')
            .and_then(|(semi, _)| {
                let name = &rest[1..semi + 1];
                decode_reference(name).map(|c| (c, semi + 2))
            });
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code).filter(|c| *c != '\0');
    }
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{A0}',
        "shy" => '\u{AD}',
        "zwj" => '\u{200D}',
        "zwnj" => '\u{200C}',
        "mdash" => '—',
        "ndash" => '–',
        "hellip" => '…',
        "copy" => '©',
        _ => return None,
    })
}

// === lowering ===

fn lower_blocks(nodes: Vec<RawNode>) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pending: Vec<Inline> = Vec::new();

    for node in nodes {
        if node.is_inline() {
            lower_inline(node, &mut Vec::new(), &mut pending);
            continue;
        }
        flush_bare(&mut pending, &mut blocks);
        if let RawNode::Element {
            tag,
            attrs,
            children,
        } = node
        {
            blocks.push(lower_block(tag, attrs, children));
        }
    }
    flush_bare(&mut pending, &mut blocks);
    blocks
}

fn flush_bare(pending: &mut Vec<Inline>, blocks: &mut Vec<Block>) {
    if pending.is_empty() {
        return;
    }
    let mut content = std::mem::take(pending);
    inline::normalize(&mut content);
    if !inline::is_blank(&content) {
        blocks.push(Block::Text(TextBlock::new(BlockKind::Bare, content)));
    }
}

fn lower_block(tag: SmolStr, attrs: Attributes, children: Vec<RawNode>) -> Block {
    if tag == "hr" {
        return Block::Rule(attrs);
    }
    if let Some(kind) = ListKind::from_tag(&tag) {
        return Block::List(lower_list(kind, attrs, children));
    }
    let all_inline = children.iter().all(RawNode::is_inline);
    if let Some(kind) = BlockKind::from_tag(&tag) {
        if all_inline {
            let mut content = Vec::new();
            for child in children {
                lower_inline(child, &mut Vec::new(), &mut content);
            }
            inline::normalize(&mut content);
            return Block::Text(TextBlock {
                kind,
                attrs,
                content,
            });
        }
    }
    Block::Container(Container {
        tag,
        attrs,
        blocks: lower_blocks(children),
    })
}

fn lower_list(kind: ListKind, attrs: Attributes, children: Vec<RawNode>) -> List {
    let mut items = Vec::new();
    for child in children {
        if child.is_whitespace_text() {
            continue;
        }
        match child {
            RawNode::Element {
                tag,
                attrs,
                children,
            } if tag == "li" => items.push(lower_item(attrs, children)),
            // Anything else directly inside a list gets its own item.
            other => items.push(lower_item(Attributes::new(), vec![other])),
        }
    }
    List { kind, attrs, items }
}

fn lower_item(attrs: Attributes, children: Vec<RawNode>) -> ListItem {
    let split = children
        .iter()
        .position(|c| !c.is_inline())
        .unwrap_or(children.len());
    let mut children = children;
    let rest = children.split_off(split);

    let mut content = Vec::new();
    for child in children {
        lower_inline(child, &mut Vec::new(), &mut content);
    }
    inline::normalize(&mut content);
    if inline::is_blank(&content) && !rest.is_empty() {
        content.clear();
    }

    ListItem {
        attrs,
        content,
        children: lower_blocks(rest),
    }
}

fn lower_inline(node: RawNode, marks: &mut Vec<Mark>, out: &mut Vec<Inline>) {
    match node {
        RawNode::Text(text) => out.push(Inline::Text {
            text,
            marks: marks.clone(),
        }),
        RawNode::Element { tag, .. } if tag == "br" => out.push(Inline::Atom {
            atom: Atom::LineBreak,
            marks: marks.clone(),
        }),
        RawNode::Element { tag, attrs, .. } if tag == "img" => out.push(Inline::Atom {
            atom: Atom::Image(attrs),
            marks: marks.clone(),
        }),
        RawNode::Element {
            tag,
            attrs,
            children,
        } => {
            if is_void_element(&tag) {
                return;
            }
            // A block nested in an inline element only contributes its content.
            let is_mark = !is_block_element(&tag);
            if is_mark {
                marks.push(Mark::from_element(&tag, attrs));
            }
            for child in children {
                lower_inline(child, marks, out);
            }
            if is_mark {
                marks.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MarkKind;

    fn parse(markup: &str) -> Document {
        parse_html(markup, &SanitizePolicy::default())
    }

    #[test]
    fn test_parse_bare_inline_content() {
        let doc = parse("my <b>HTML</b>");
        assert_eq!(doc.blocks.len(), 1);
        let Block::Text(tb) = &doc.blocks[0] else {
            panic!("expected text block");
        };
        assert_eq!(tb.kind, BlockKind::Bare);
        assert_eq!(tb.content.len(), 2);
        assert!(tb.content[1].has_mark(MarkKind::Bold));
    }

    #[test]
    fn test_parse_keeps_empty_paragraph() {
        let doc = parse("<p></p>");
        assert_eq!(
            doc.blocks,
            vec![Block::Text(TextBlock::new(BlockKind::Paragraph, vec![]))]
        );
    }

    #[test]
    fn test_implicit_closes() {
        let doc = parse("<ul><li>one<li>two</ul><p>a<p>b");
        let Block::List(list) = &doc.blocks[0] else {
            panic!("expected list");
        };
        assert_eq!(list.items.len(), 2);
        assert_eq!(doc.blocks.len(), 3);
        assert_eq!(doc.plain_text(), "one\ntwo\na\nb");
    }

    #[test]
    fn test_nested_list_goes_to_children() {
        let doc = parse("<ul><li>a<ol><li>b</li></ol></li></ul>");
        let Block::List(list) = &doc.blocks[0] else {
            panic!("expected list");
        };
        assert_eq!(list.items[0].content, vec![Inline::text("a")]);
        assert!(matches!(list.items[0].children[0], Block::List(_)));
    }

    #[test]
    fn test_div_with_blocks_becomes_container() {
        let doc = parse("<div>x<p>y</p></div><div>z</div>");
        assert!(matches!(doc.blocks[0], Block::Container(_)));
        let Block::Text(tb) = &doc.blocks[1] else {
            panic!("expected text block");
        };
        assert_eq!(tb.kind, BlockKind::Division);
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt; &#39;&#x41;&nbsp;"), "a & b <c> 'A\u{A0}");
        assert_eq!(decode_entities("AT&T &bogus; &"), "AT&T &bogus; &");
    }

    #[test]
    fn test_entities_before_multibyte_text() {
        assert_eq!(decode_entities("&amp;日本語"), "&日本語");
        assert_eq!(decode_entities("&amp;éééé"), "&éééé");
        assert_eq!(decode_entities("&日本語;"), "&日本語;");

        let doc = parse("<p>&amp;日本語</p>");
        assert_eq!(doc.to_html(), "<p>&amp;日本語</p>");
    }

    #[test]
    fn test_sanitizes_while_parsing() {
        let doc = parse(
            "<p onclick=\"x()\">hi<script>alert(1)</script><a href=\"javascript:x\">l</a></p><style>p{}</style>",
        );
        assert_eq!(doc.blocks.len(), 1);
        let Block::Text(tb) = &doc.blocks[0] else {
            panic!("expected text block");
        };
        assert!(tb.attrs.is_empty());
        assert_eq!(doc.plain_text(), "hil");
        let link = tb.content[1].marks()[0].clone();
        assert_eq!(link.kind, MarkKind::Link);
        assert!(link.attrs.get("href").is_none());
    }

    #[test]
    fn test_attribute_forms() {
        let doc = parse("<img src=a.png alt='x y' data-k>");
        let Block::Text(tb) = &doc.blocks[0] else {
            panic!("expected text block");
        };
        let Inline::Atom {
            atom: Atom::Image(attrs),
            ..
        } = &tb.content[0]
        else {
            panic!("expected image");
        };
        assert_eq!(attrs.get("src"), Some("a.png"));
        assert_eq!(attrs.get("alt"), Some("x y"));
        assert_eq!(attrs.get("data-k"), Some(""));
    }
}
