//! Content tree → canonical markup.
//!
//! Adjacent runs that share leading marks are grouped under one element, so
//! `<b>a</b><b><i>b</i></b>` comes back as `<b>a<i>b</i></b>`.

use markdown_weaver_escape::{StrWrite, escape_html, escape_html_body_text};

use crate::attrs::Attributes;
use crate::tree::{Atom, Block, Document, Inline, Mark};

impl Document {
    /// Serialize to the markup the surface holds.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        // Writing into a String can't fail.
        let _ = HtmlWriter::new(&mut out).write_blocks(&self.blocks);
        out
    }
}

/// Writes blocks as markup into any [`StrWrite`] sink.
pub struct HtmlWriter<W> {
    writer: W,
}

impl<W: StrWrite> HtmlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    #[inline]
    fn write(&mut self, s: &str) -> Result<(), W::Error> {
        self.writer.write_str(s)
    }

    pub fn write_blocks(&mut self, blocks: &[Block]) -> Result<(), W::Error> {
        for block in blocks {
            self.write_block(block)?;
        }
        Ok(())
    }

    fn write_block(&mut self, block: &Block) -> Result<(), W::Error> {
        match block {
            Block::Text(tb) => match tb.kind.tag() {
                Some(tag) => {
                    self.start_tag(tag, &tb.attrs)?;
                    self.write_inlines(&tb.content)?;
                    self.end_tag(tag)
                }
                None => self.write_inlines(&tb.content),
            },
            Block::List(list) => {
                let tag = list.kind.tag();
                self.start_tag(tag, &list.attrs)?;
                for item in &list.items {
                    self.start_tag("li", &item.attrs)?;
                    self.write_inlines(&item.content)?;
                    self.write_blocks(&item.children)?;
                    self.end_tag("li")?;
                }
                self.end_tag(tag)
            }
            Block::Container(c) => {
                self.start_tag(&c.tag, &c.attrs)?;
                self.write_blocks(&c.blocks)?;
                self.end_tag(&c.tag)
            }
            Block::Rule(attrs) => self.start_tag("hr", attrs),
        }
    }

    fn start_tag(&mut self, tag: &str, attrs: &Attributes) -> Result<(), W::Error> {
        self.write("<")?;
        self.write(tag)?;
        for (name, value) in attrs.iter() {
            self.write(" ")?;
            self.write(name)?;
            self.write("=\"")?;
            escape_html(&mut self.writer, value)?;
            self.write("\"")?;
        }
        self.write(">")
    }

    fn end_tag(&mut self, tag: &str) -> Result<(), W::Error> {
        self.write("</")?;
        self.write(tag)?;
        self.write(">")
    }

    /// Write runs, opening and closing marks only where the mark stacks differ.
    pub fn write_inlines(&mut self, content: &[Inline]) -> Result<(), W::Error> {
        let mut open: Vec<&Mark> = Vec::new();
        for inline in content {
            let marks = inline.marks();
            let common = open
                .iter()
                .zip(marks)
                .take_while(|(a, b)| **a == *b)
                .count();
            while open.len() > common {
                if let Some(mark) = open.pop() {
                    self.end_tag(&mark.tag)?;
                }
            }
            for mark in &marks[common..] {
                self.start_tag(&mark.tag, &mark.attrs)?;
                open.push(mark);
            }
            match inline {
                Inline::Text { text, .. } => self.write_text(text)?,
                Inline::Atom {
                    atom: Atom::LineBreak,
                    ..
                } => self.write("<br>")?,
                Inline::Atom {
                    atom: Atom::Image(attrs),
                    ..
                } => self.start_tag("img", attrs)?,
            }
        }
        while let Some(mark) = open.pop() {
            self.end_tag(&mark.tag)?;
        }
        Ok(())
    }

    /// Body text, with non-breaking spaces kept visible as `&nbsp;`.
    fn write_text(&mut self, text: &str) -> Result<(), W::Error> {
        let mut parts = text.split('\u{A0}');
        if let Some(first) = parts.next() {
            escape_html_body_text(&mut self.writer, first)?;
        }
        for part in parts {
            self.write("&nbsp;")?;
            escape_html_body_text(&mut self.writer, part)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::parse::parse_html;
    use crate::sanitize::SanitizePolicy;

    fn roundtrip(markup: &str) -> String {
        parse_html(markup, &SanitizePolicy::default()).to_html()
    }

    #[test]
    fn test_canonical_roundtrip() {
        insta::assert_snapshot!(
            roundtrip("<p>Hello <b>bold</b> &amp; <i>it</i></p><ul class=\"x\"><li>a</li></ul>"),
            @r#"<p>Hello <b>bold</b> &amp; <i>it</i></p><ul class="x"><li>a</li></ul>"#
        );
    }

    #[test]
    fn test_groups_shared_marks() {
        insta::assert_snapshot!(
            roundtrip("<b>a</b><b><i>b</i></b>"),
            @"<b>a<i>b</i></b>"
        );
    }

    #[test]
    fn test_void_elements_and_nbsp() {
        insta::assert_snapshot!(
            roundtrip("<p>a&nbsp;b<br/><img src=\"x.png\" alt=\"&quot;q&quot;\"></p><hr>"),
            @r#"<p>a&nbsp;b<br><img src="x.png" alt="&quot;q&quot;"></p><hr>"#
        );
    }

    #[test]
    fn test_strong_keeps_its_tag() {
        assert_eq!(roundtrip("<strong>x</strong>"), "<strong>x</strong>");
    }

    #[test]
    fn test_nested_list_roundtrip() {
        insta::assert_snapshot!(
            roundtrip("<ol><li>one<ul><li>two</li></ul></li></ol>"),
            @"<ol><li>one<ul><li>two</li></ul></li></ol>"
        );
    }
}
