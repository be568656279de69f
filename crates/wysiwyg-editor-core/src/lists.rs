//! List style normalization.
//!
//! Lists created by commands (or pasted in) arrive without the cosmetic
//! classes the surface styles them with. [`normalize_lists`] is run after
//! every command and every input resync and gives any list lacking its
//! marker class the configured class set.

use serde::{Deserialize, Serialize};

use crate::tree::{Block, Document, List, ListKind};

/// Class sets applied to lists that lack their marker class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListStyles {
    pub unordered: String,
    pub ordered: String,
}

impl Default for ListStyles {
    fn default() -> Self {
        Self {
            unordered: "list-disc list-inside pl-5 space-y-0.5 text-base".to_string(),
            ordered: "list-decimal list-inside pl-5 space-y-0.5 text-base".to_string(),
        }
    }
}

impl ListStyles {
    /// Class token whose presence marks a list as already styled.
    pub fn marker_class(kind: ListKind) -> &'static str {
        match kind {
            ListKind::Unordered => "list-disc",
            ListKind::Ordered => "list-decimal",
        }
    }

    pub fn classes_for(&self, kind: ListKind) -> &str {
        match kind {
            ListKind::Unordered => &self.unordered,
            ListKind::Ordered => &self.ordered,
        }
    }

    /// True if a list with these class tokens still needs styling.
    pub fn needs_styling<'a>(kind: ListKind, mut classes: impl Iterator<Item = &'a str>) -> bool {
        let marker = Self::marker_class(kind);
        !classes.any(|c| c == marker)
    }
}

/// Give every unstyled list (nested ones included) its class set.
///
/// The class attribute is replaced, not merged. Returns how many lists were
/// restyled; running it again on the result returns 0.
pub fn normalize_lists(doc: &mut Document, styles: &ListStyles) -> usize {
    let count = normalize_blocks(&mut doc.blocks, styles);
    if count > 0 {
        tracing::debug!(count, "styled lists");
    }
    count
}

fn normalize_blocks(blocks: &mut [Block], styles: &ListStyles) -> usize {
    let mut count = 0;
    for block in blocks {
        match block {
            Block::List(list) => {
                count += style_list(list, styles);
                for item in &mut list.items {
                    count += normalize_blocks(&mut item.children, styles);
                }
            }
            Block::Container(c) => count += normalize_blocks(&mut c.blocks, styles),
            Block::Text(_) | Block::Rule(_) => {}
        }
    }
    count
}

fn style_list(list: &mut List, styles: &ListStyles) -> usize {
    if !ListStyles::needs_styling(list.kind, list.attrs.classes()) {
        return 0;
    }
    list.attrs.set("class", styles.classes_for(list.kind));
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_html;
    use crate::sanitize::SanitizePolicy;

    fn parse(markup: &str) -> Document {
        parse_html(markup, &SanitizePolicy::default())
    }

    #[test]
    fn test_styles_unstyled_lists() {
        let mut doc = parse("<ul><li>a</li></ul><ol class=\"mine\"><li>b</li></ol>");
        assert_eq!(normalize_lists(&mut doc, &ListStyles::default()), 2);
        insta::assert_snapshot!(
            doc.to_html(),
            @r#"<ul class="list-disc list-inside pl-5 space-y-0.5 text-base"><li>a</li></ul><ol class="list-decimal list-inside pl-5 space-y-0.5 text-base"><li>b</li></ol>"#
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let mut doc = parse("<ul><li>a<ol><li>b</li></ol></li></ul>");
        let styles = ListStyles::default();
        assert_eq!(normalize_lists(&mut doc, &styles), 2);
        let once = doc.to_html();
        assert_eq!(normalize_lists(&mut doc, &styles), 0);
        assert_eq!(doc.to_html(), once);
        assert_eq!(once.matches("list-disc").count(), 1);
        assert_eq!(once.matches("list-decimal").count(), 1);
    }

    #[test]
    fn test_styled_list_left_alone() {
        let mut doc = parse("<ul class=\"list-disc custom\"><li>a</li></ul>");
        assert_eq!(normalize_lists(&mut doc, &ListStyles::default()), 0);
        assert_eq!(doc.to_html(), "<ul class=\"list-disc custom\"><li>a</li></ul>");
    }

    #[test]
    fn test_lists_inside_containers() {
        let mut doc = parse("<blockquote><p>q</p><ul><li>a</li></ul></blockquote>");
        assert_eq!(normalize_lists(&mut doc, &ListStyles::default()), 1);
    }
}
