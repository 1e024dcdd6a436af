//! SVG template rendering
//!
//! Templates carry `{{token}}` placeholders (inner whitespace allowed).
//! Rendering substitutes XML-escaped binding values; tokens without a
//! binding are left in place and reported.

use crate::types::{DefaultBindings, VariantBindings};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("token regex is valid")
});

static SVG_ROOT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<svg[\s>/]").expect("svg regex is valid"));

/// Names the renderer understands
pub const KNOWN_TOKENS: &[&str] = &["headline", "subheadline", "cta", "imageUrl", "image"];

/// Source of placeholder values
pub trait BindingSource {
    /// Value for a token, if bound
    fn lookup(&self, token: &str) -> Option<&str>;
}

impl BindingSource for VariantBindings {
    fn lookup(&self, token: &str) -> Option<&str> {
        match token {
            "headline" => Some(self.headline.as_str()),
            "subheadline" => Some(self.subheadline.as_str()),
            "cta" => Some(self.cta.as_str()),
            "imageUrl" | "image" => Some(self.image_url.as_str()),
            _ => None,
        }
    }
}

impl BindingSource for DefaultBindings {
    fn lookup(&self, token: &str) -> Option<&str> {
        match token {
            "headline" => Some(self.headline.as_str()),
            "subheadline" => Some(self.subheadline.as_str()),
            "cta" => Some(self.cta.as_str()),
            "imageUrl" | "image" => Some(self.image.as_str()),
            _ => None,
        }
    }
}

/// Output of [`render`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Template with bound tokens substituted
    pub svg: String,
    /// Distinct tokens that had no binding, in first-seen order
    pub unresolved: Vec<String>,
}

impl Rendered {
    /// Whether every token was bound
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Escape text for use in XML content and attribute values
#[must_use]
pub fn escape_xml(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 16);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Substitute bindings into a template
#[must_use]
pub fn render(template: &str, bindings: &impl BindingSource) -> Rendered {
    let mut unresolved: Vec<String> = Vec::new();

    let svg = TOKEN_RE.replace_all(template, |caps: &Captures<'_>| {
        let token = &caps[1];
        match bindings.lookup(token) {
            Some(value) => escape_xml(value).into_owned(),
            None => {
                if !unresolved.iter().any(|t| t == token) {
                    unresolved.push(token.to_string());
                }
                caps[0].to_string()
            }
        }
    });

    Rendered {
        svg: svg.into_owned(),
        unresolved,
    }
}

/// Distinct placeholder names in first-seen order
#[must_use]
pub fn placeholders(template: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for caps in TOKEN_RE.captures_iter(template) {
        let token = &caps[1];
        if !seen.iter().any(|t| t == token) {
            seen.push(token.to_string());
        }
    }
    seen
}

/// Whether the text contains an `<svg` opening tag
#[inline]
#[must_use]
pub fn is_svg(text: &str) -> bool {
    SVG_ROOT_RE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BANNER: &str = r#"<svg width="800" height="400" xmlns="http://www.w3.org/2000/svg">
  <image href="{{imageUrl}}" width="800" height="400"/>
  <text x="400" y="150">{{headline}}</text>
  <text x="400" y="200">{{ subheadline }}</text>
  <text x="400" y="280">{{cta}}</text>
</svg>"#;

    fn bindings() -> VariantBindings {
        VariantBindings {
            headline: "Spring Into Savings".into(),
            subheadline: "Get 30% off".into(),
            cta: "Shop Now".into(),
            image_url: "/objects/uploads/bg".into(),
        }
    }

    #[test]
    fn renders_all_known_tokens() {
        let out = render(BANNER, &bindings());
        assert!(out.is_complete());
        assert!(out.svg.contains(">Spring Into Savings<"));
        assert!(out.svg.contains(">Get 30% off<"));
        assert!(out.svg.contains(">Shop Now<"));
        assert!(out.svg.contains(r#"href="/objects/uploads/bg""#));
        assert!(!out.svg.contains("{{"));
    }

    #[test]
    fn escapes_markup_in_values() {
        let mut b = bindings();
        b.headline = r#"<script>"Tom & Jerry's"</script>"#.into();
        let out = render("<svg><text>{{headline}}</text></svg>", &b);
        assert_eq!(
            out.svg,
            "<svg><text>&lt;script&gt;&quot;Tom &amp; Jerry&apos;s&quot;&lt;/script&gt;</text></svg>"
        );
    }

    #[test]
    fn unknown_tokens_stay_and_are_reported_once() {
        let out = render("<svg>{{price}} {{headline}} {{price}}</svg>", &bindings());
        assert_eq!(out.unresolved, vec!["price".to_string()]);
        assert_eq!(out.svg, "<svg>{{price}} Spring Into Savings {{price}}</svg>");
    }

    #[test]
    fn image_alias_resolves_from_defaults() {
        let defaults = DefaultBindings {
            image: "https://cdn.example.com/a.png".into(),
            ..DefaultBindings::default()
        };
        let out = render(r#"<svg><image href="{{image}}"/></svg>"#, &defaults);
        assert_eq!(out.svg, r#"<svg><image href="https://cdn.example.com/a.png"/></svg>"#);
    }

    #[test]
    fn placeholders_in_order() {
        assert_eq!(
            placeholders(BANNER),
            vec!["imageUrl", "headline", "subheadline", "cta"]
        );
        assert!(placeholders("<svg/>").is_empty());
    }

    #[test]
    fn svg_detection() {
        assert!(is_svg(BANNER));
        assert!(is_svg("<?xml version=\"1.0\"?><SVG viewBox=\"0 0 1 1\"></SVG>"));
        assert!(!is_svg("<div>hello</div>"));
        assert!(!is_svg("<svgfoo>"));
    }

    #[test]
    fn escape_borrows_plain_text() {
        assert!(matches!(escape_xml("plain"), Cow::Borrowed(_)));
    }
}
