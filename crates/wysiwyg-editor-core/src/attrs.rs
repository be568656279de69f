//! Ordered element attributes.
//!
//! Attribute order is preserved so serialized markup stays stable across
//! parse/serialize cycles.

use smol_str::SmolStr;

/// Ordered list of `name="value"` pairs on an element.
///
/// Names are stored lowercased. Lookups are case-insensitive as a result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(SmolStr, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut attrs = Self::new();
        for (name, value) in pairs {
            attrs.set(name, value);
        }
        attrs
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            entry.1 = value;
        } else {
            self.entries
                .push((SmolStr::new(name.to_ascii_lowercase()), value));
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self
            .entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.entries.remove(idx).1)
    }

    /// Keep only attributes for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.entries.retain(|(n, v)| keep(n, v));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    // === class helpers ===

    /// Whitespace-separated class tokens.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.get("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, token: &str) -> bool {
        self.classes().any(|c| c == token)
    }

    // === inline style helpers ===

    /// Get a single declaration from the `style` attribute.
    pub fn style_property(&self, property: &str) -> Option<&str> {
        let style = self.get("style")?;
        style.split(';').find_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case(property)
                .then(|| value.trim())
        })
    }

    /// Set (or replace) a single declaration in the `style` attribute.
    ///
    /// Other declarations keep their order. Output is normalized to
    /// `name: value;` separated by single spaces.
    pub fn set_style_property(&mut self, property: &str, value: &str) {
        let mut decls: Vec<(String, String)> = self
            .get("style")
            .unwrap_or("")
            .split(';')
            .filter_map(|decl| {
                let (name, value) = decl.split_once(':')?;
                let name = name.trim();
                (!name.is_empty()).then(|| (name.to_ascii_lowercase(), value.trim().to_string()))
            })
            .collect();

        match decls.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(property)) {
            Some(decl) => decl.1 = value.to_string(),
            None => decls.push((property.to_ascii_lowercase(), value.to_string())),
        }

        let style = decls
            .iter()
            .map(|(n, v)| format!("{n}: {v};"))
            .collect::<Vec<_>>()
            .join(" ");
        self.set("style", style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_in_place() {
        let mut attrs = Attributes::from_pairs([("href", "/a"), ("title", "t")]);
        attrs.set("HREF", "/b");
        let pairs: Vec<_> = attrs.iter().collect();
        assert_eq!(pairs, vec![("href", "/b"), ("title", "t")]);
    }

    #[test]
    fn test_class_tokens() {
        let attrs = Attributes::from_pairs([("class", "  list-disc  pl-5 ")]);
        assert!(attrs.has_class("list-disc"));
        assert!(attrs.has_class("pl-5"));
        assert!(!attrs.has_class("list"));
    }

    #[test]
    fn test_style_property_roundtrip() {
        let mut attrs = Attributes::from_pairs([("style", "color:red;text-align:left")]);
        assert_eq!(attrs.style_property("text-align"), Some("left"));

        attrs.set_style_property("text-align", "center");
        assert_eq!(attrs.get("style"), Some("color: red; text-align: center;"));

        let mut empty = Attributes::new();
        empty.set_style_property("text-align", "right");
        assert_eq!(empty.get("style"), Some("text-align: right;"));
    }
}
