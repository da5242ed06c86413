//! Title and path normalization into stable output identifiers.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{NoExpand, Regex};

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?[^>]*>").unwrap());

static ENTITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#?[0-9A-Za-z]+;").unwrap());

/// Remove HTML-like tag markup, preserving inter-tag text.
///
/// `replacement` is inserted at each removed tag boundary; pass `""` to drop
/// tags entirely, or `" "` to keep word separation when stripping block tags.
#[must_use]
pub fn strip_tags(text: &str, replacement: &str) -> String {
    TAG_PATTERN
        .replace_all(text, NoExpand(replacement))
        .into_owned()
}

/// Normalize an arbitrary title into a stable, URL-safe identifier.
///
/// Strips tag markup and HTML entities, lower-cases, keeps only letters
/// (including accented), digits, spaces and hyphens, collapses separator
/// runs into single hyphens and trims edge hyphens.
///
/// Symbol-only input yields an empty string; callers must treat an empty
/// slug as "no anchor available" rather than erroring. Applying `slugify`
/// to text that is already a slug is a no-op, and the result is purely a
/// function of the input.
#[must_use]
pub fn slugify(title: &str) -> String {
    let stripped = strip_tags(title, "");
    let text = ENTITY_PATTERN.replace_all(&stripped, "");

    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_separator = true;
        }
        // Everything else is removed without breaking the word.
    }
    slug
}

/// Collision-resistant identifier allocation.
///
/// The first occurrence of a slug keeps the bare form; later occurrences
/// get `-2`, `-3`, … suffixes in first-seen order.
#[derive(Debug, Default)]
pub struct SlugCounter {
    seen: HashMap<String, u32>,
}

impl SlugCounter {
    /// Create an empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `slug` unchanged on first sight, `slug-N` afterwards.
    pub fn disambiguate(&mut self, slug: &str) -> String {
        let count = self.seen.entry(slug.to_owned()).or_insert(0);
        *count += 1;
        if *count == 1 {
            slug.to_owned()
        } else {
            format!("{slug}-{count}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic_title() {
        assert_eq!(slugify("Getting Started"), "getting-started");
    }

    #[test]
    fn test_slugify_strips_punctuation_without_breaking_words() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("don't panic"), "dont-panic");
    }

    #[test]
    fn test_slugify_collapses_separator_runs() {
        assert_eq!(slugify("a  -  b"), "a-b");
        assert_eq!(slugify("--edge--case--"), "edge-case");
    }

    #[test]
    fn test_slugify_keeps_accented_letters() {
        assert_eq!(slugify("Configuração Avançada"), "configuração-avançada");
    }

    #[test]
    fn test_slugify_strips_tags() {
        assert_eq!(slugify("The <code>main</code> entry"), "the-main-entry");
    }

    #[test]
    fn test_slugify_strips_entities() {
        assert_eq!(slugify("Types &amp; Specs"), "types-specs");
        assert_eq!(slugify("&#128512;"), "");
    }

    #[test]
    fn test_slugify_symbol_only_is_empty() {
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("&hearts;"), "");
    }

    #[test]
    fn test_slugify_is_stable_on_slug_text() {
        let slug = slugify("Getting Started");
        assert_eq!(slugify(&slug), slug);
    }

    #[test]
    fn test_strip_tags_preserves_inter_tag_text() {
        assert_eq!(strip_tags("<p>one</p><p>two</p>", ""), "onetwo");
    }

    #[test]
    fn test_strip_tags_with_replacement() {
        assert_eq!(strip_tags("<p>one</p><p>two</p>", " "), " one  two ");
    }

    #[test]
    fn test_strip_tags_replacement_is_literal() {
        // `$` must not be treated as a capture-group reference.
        assert_eq!(strip_tags("a<br>b", "$1"), "a$1b");
    }

    #[test]
    fn test_counter_first_occurrence_keeps_bare_slug() {
        let mut counter = SlugCounter::new();
        assert_eq!(counter.disambiguate("readme"), "readme");
    }

    #[test]
    fn test_counter_appends_suffix_in_first_seen_order() {
        let mut counter = SlugCounter::new();
        assert_eq!(counter.disambiguate("readme"), "readme");
        assert_eq!(counter.disambiguate("readme"), "readme-2");
        assert_eq!(counter.disambiguate("readme"), "readme-3");
    }

    #[test]
    fn test_counter_tracks_slugs_independently() {
        let mut counter = SlugCounter::new();
        assert_eq!(counter.disambiguate("readme"), "readme");
        assert_eq!(counter.disambiguate("license"), "license");
        assert_eq!(counter.disambiguate("readme"), "readme-2");
    }
}
