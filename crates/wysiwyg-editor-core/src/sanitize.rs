//! URL and attribute sanitization.
//!
//! Everything that enters the content tree passes through here: URLs typed
//! into link/image prompts, and `href`/`src`/`style` attributes found while
//! parsing markup. Dangerous elements are dropped by the parser itself using
//! [`is_dropped_element`].

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::attrs::Attributes;
use crate::error::SanitizeError;

/// Elements removed together with their content.
const DROPPED_ELEMENTS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "template", "frame", "frameset",
    "link", "meta", "base", "form", "input", "button", "textarea", "select",
];

const DATA_IMAGE_TYPES: &[&str] = &["image/png", "image/gif", "image/jpeg", "image/webp"];

/// What a URL will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlContext {
    Link,
    Image,
}

/// Which URLs may enter the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SanitizePolicy {
    /// Lowercase scheme names without the trailing colon.
    pub allowed_schemes: Vec<SmolStr>,
    pub allow_relative: bool,
    /// Allow `data:image/...` URLs for images (never for links).
    pub allow_data_images: bool,
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        Self {
            allowed_schemes: ["http", "https", "mailto", "tel"]
                .into_iter()
                .map(SmolStr::new_static)
                .collect(),
            allow_relative: true,
            allow_data_images: true,
        }
    }
}

impl SanitizePolicy {
    fn allows_scheme(&self, scheme: &str) -> bool {
        self.allowed_schemes
            .iter()
            .any(|s| s.eq_ignore_ascii_case(scheme))
    }
}

/// A URL that passed [`sanitize_url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeUrl(String);

impl SafeUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for SafeUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check a raw URL against the policy.
///
/// Leading/trailing spaces and control chars are trimmed and embedded
/// tab/CR/LF removed before the scheme is read, matching how browsers
/// tolerate `java\tscript:` tricks.
pub fn sanitize_url(
    raw: &str,
    context: UrlContext,
    policy: &SanitizePolicy,
) -> Result<SafeUrl, SanitizeError> {
    let cleaned: String = raw
        .trim_matches(|c: char| c <= ' ')
        .chars()
        .filter(|c| !matches!(c, '\t' | '\r' | '\n'))
        .collect();
    if cleaned.is_empty() {
        return Err(SanitizeError::Empty);
    }

    let Some(scheme) = scheme_of(&cleaned) else {
        return if policy.allow_relative {
            Ok(SafeUrl(cleaned))
        } else {
            Err(SanitizeError::RelativeNotAllowed)
        };
    };
    let scheme = scheme.to_ascii_lowercase();

    if scheme == "data" {
        let allowed = context == UrlContext::Image
            && policy.allow_data_images
            && is_data_image(&cleaned);
        return if allowed {
            Ok(SafeUrl(cleaned))
        } else {
            Err(SanitizeError::DisallowedScheme(scheme))
        };
    }

    if !policy.allows_scheme(&scheme) {
        tracing::debug!(%scheme, "rejecting URL scheme");
        return Err(SanitizeError::DisallowedScheme(scheme));
    }

    if scheme == "http" || scheme == "https" {
        let parsed = url::Url::parse(&cleaned)?;
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(SanitizeError::MissingHost);
        }
    }

    Ok(SafeUrl(cleaned))
}

/// Scheme of a URL, if it has one.
///
/// A colon after a `/`, `?` or `#` doesn't start a scheme (`./a:b`, `?q=a:b`).
fn scheme_of(url: &str) -> Option<&str> {
    let colon = url.find(':')?;
    let candidate = &url[..colon];
    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    chars
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        .then_some(candidate)
}

fn is_data_image(url: &str) -> bool {
    let Some(rest) = url.get("data:".len()..) else {
        return false;
    };
    let media = rest
        .split([';', ','])
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    DATA_IMAGE_TYPES.contains(&media.as_str())
}

/// True for elements that are removed with all of their content.
pub fn is_dropped_element(tag: &str) -> bool {
    DROPPED_ELEMENTS.contains(&tag)
}

/// Strip unsafe attributes from an element in place.
///
/// Event handlers, `srcdoc` and `formaction` always go; `href` and `src`
/// go when the URL is refused; `style` goes when it smuggles script.
pub fn sanitize_attributes(tag: &str, attrs: &mut Attributes, policy: &SanitizePolicy) {
    let context = if tag == "img" {
        UrlContext::Image
    } else {
        UrlContext::Link
    };
    attrs.retain(|name, value| {
        if name.starts_with("on") || name == "srcdoc" || name == "formaction" {
            tracing::trace!(tag, attr = name, "dropping attribute");
            return false;
        }
        match name {
            "href" | "src" | "action" | "xlink:href" => {
                match sanitize_url(value, context, policy) {
                    Ok(_) => true,
                    Err(err) => {
                        tracing::warn!(tag, attr = name, %err, "dropping unsafe URL attribute");
                        false
                    }
                }
            }
            "style" => {
                let lower = value.to_ascii_lowercase();
                !(lower.contains("expression(") || lower.contains("javascript:"))
            }
            _ => true,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(raw: &str, ctx: UrlContext) -> Result<SafeUrl, SanitizeError> {
        sanitize_url(raw, ctx, &SanitizePolicy::default())
    }

    #[test]
    fn test_allows_common_links() {
        assert_eq!(
            check("  https://example.com/a?b=c ", UrlContext::Link)
                .unwrap()
                .as_str(),
            "https://example.com/a?b=c"
        );
        assert!(check("mailto:someone@example.com", UrlContext::Link).is_ok());
        assert!(check("/relative/path", UrlContext::Link).is_ok());
        assert!(check("page.html#frag:x", UrlContext::Link).is_ok());
    }

    #[test]
    fn test_rejects_script_schemes() {
        assert_eq!(
            check("javascript:alert(1)", UrlContext::Link),
            Err(SanitizeError::DisallowedScheme("javascript".into()))
        );
        assert_eq!(
            check(" JaVa\tScRiPt:alert(1)", UrlContext::Link),
            Err(SanitizeError::DisallowedScheme("javascript".into()))
        );
        assert!(check("vbscript:x", UrlContext::Link).is_err());
    }

    #[test]
    fn test_data_urls_only_for_images() {
        let png = "data:image/png;base64,iVBORw0KGgo=";
        assert!(check(png, UrlContext::Image).is_ok());
        assert!(check(png, UrlContext::Link).is_err());
        assert!(check("data:text/html,<script>", UrlContext::Image).is_err());
    }

    #[test]
    fn test_empty_and_hostless() {
        assert_eq!(check("   ", UrlContext::Link), Err(SanitizeError::Empty));
        assert!(check("https://", UrlContext::Link).is_err());
    }

    #[test]
    fn test_relative_can_be_disabled() {
        let policy = SanitizePolicy {
            allow_relative: false,
            ..Default::default()
        };
        assert_eq!(
            sanitize_url("foo/bar", UrlContext::Link, &policy),
            Err(SanitizeError::RelativeNotAllowed)
        );
    }

    #[test]
    fn test_sanitize_attributes() {
        let mut attrs = Attributes::from_pairs([
            ("href", "javascript:void(0)"),
            ("onclick", "steal()"),
            ("title", "ok"),
            ("style", "width: expression(alert(1))"),
        ]);
        sanitize_attributes("a", &mut attrs, &SanitizePolicy::default());
        let pairs: Vec<_> = attrs.iter().collect();
        assert_eq!(pairs, vec![("title", "ok")]);
    }
}
