//! Content item model shared across all pipeline stages.
//!
//! A [`ContentItem`] is one parsed source document. The well-known fields
//! (`slug`, `lang`, `title`, `date`, ...) are fixed struct fields that typed
//! code paths read directly; everything the reader didn't recognize lands in
//! the [`extra`](ContentItem::extra) bag for generic code paths (templates,
//! the translation flag).
//!
//! ## Slug groups
//!
//! Within one build every item belongs to exactly one slug group: all items
//! sharing a `slug` are language variants of each other. The translation
//! resolver picks one canonical item per group and fills each item's
//! `translations` list with the rest of its group. An item is either
//! canonical or a translation, never both.
//!
//! ## Validation
//!
//! Items are never rejected at parse time. [`ContentItem::validate`] returns
//! the list of missing required fields so callers (the `check` command, the
//! build summary) can report all problems at once instead of failing on the
//! first.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Open metadata bag: everything the reader produced that isn't a fixed field.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Publication status of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Listed, indexed, rendered.
    #[default]
    Published,
    /// Rendered under the drafts prefix; excluded from listings and taxonomy.
    Draft,
    /// Rendered at its normal path but excluded from listings and taxonomy.
    Hidden,
}

impl Status {
    /// Parse a status string from metadata. Unknown values fall back to
    /// published, matching the "malformed input never raises" contract.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Status::Draft,
            "hidden" => Status::Hidden,
            _ => Status::Published,
        }
    }
}

/// One parsed source document.
///
/// Created once per source file per run (or rehydrated from the read cache).
/// `translations` starts empty and is filled by the translation resolver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentItem {
    /// Cross-language grouping key, derived from metadata or the file stem.
    pub slug: String,
    /// Language code (e.g. `"en"`, `"pt-br"`).
    pub lang: String,
    /// Whether `lang` equals the site's configured default language.
    pub in_default_lang: bool,
    pub title: String,
    pub date: Option<NaiveDate>,
    pub status: Status,
    /// Category name; upstream guarantees a default (parent directory name).
    pub category: String,
    /// Ordered, unique-by-value tag set.
    pub tags: Vec<String>,
    /// Author names; empty names are dropped at taxonomy time.
    pub authors: Vec<String>,
    /// Source file path relative to the content root.
    pub source_path: PathBuf,
    /// Rendered body HTML, or `None` when the reader produced no content.
    pub body: Option<String>,
    /// Unrecognized metadata keys.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: Metadata,
    /// The rest of this item's slug group. Nested items carry an empty
    /// `translations` list of their own.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub translations: Vec<ContentItem>,
}

/// A required field absent from a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingField(pub &'static str);

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing required field: {}", self.0)
    }
}

impl std::error::Error for MissingField {}

impl ContentItem {
    /// Check required fields, returning every problem rather than the first.
    pub fn validate(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();
        if self.title.is_empty() {
            missing.push(MissingField("title"));
        }
        if self.slug.is_empty() {
            missing.push(MissingField("slug"));
        }
        if self.date.is_none() {
            missing.push(MissingField("date"));
        }
        missing
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Whether this item participates in listings and taxonomy buckets.
    pub fn is_listed(&self) -> bool {
        self.status == Status::Published
    }

    /// Relative output path for this item's rendered page.
    ///
    /// Canonical default-language items own the bare slug; other languages
    /// carry a lang suffix so a slug group never collides. Drafts render
    /// under their own prefix.
    pub fn output_name(&self) -> String {
        let base = if self.in_default_lang {
            format!("{}.html", self.slug)
        } else {
            format!("{}-{}.html", self.slug, self.lang)
        };
        match self.status {
            Status::Draft => format!("drafts/{base}"),
            _ => base,
        }
    }
}

/// Deduplicate tags while preserving first-seen order.
///
/// Tags form an ordered, unique-by-value set; insertion order matters later
/// for tag-cloud tie-breaking, so a `BTreeSet` would be wrong here.
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        if !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, slug: &str, date: Option<&str>) -> ContentItem {
        ContentItem {
            title: title.to_string(),
            slug: slug.to_string(),
            date: date.map(|d| d.parse().unwrap()),
            ..ContentItem::default()
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn complete_item_is_valid() {
        let it = item("Hello", "hello", Some("2024-01-15"));
        assert!(it.is_valid());
        assert!(it.validate().is_empty());
    }

    #[test]
    fn validate_reports_all_missing_fields() {
        let it = item("", "", None);
        let missing = it.validate();
        assert_eq!(
            missing,
            vec![
                MissingField("title"),
                MissingField("slug"),
                MissingField("date"),
            ]
        );
    }

    #[test]
    fn missing_field_display() {
        assert_eq!(
            MissingField("date").to_string(),
            "missing required field: date"
        );
    }

    // =========================================================================
    // Status
    // =========================================================================

    #[test]
    fn status_parse_known_values() {
        assert_eq!(Status::parse("draft"), Status::Draft);
        assert_eq!(Status::parse("Hidden"), Status::Hidden);
        assert_eq!(Status::parse("published"), Status::Published);
    }

    #[test]
    fn status_parse_unknown_defaults_to_published() {
        assert_eq!(Status::parse("wip"), Status::Published);
    }

    #[test]
    fn only_published_items_are_listed() {
        let mut it = item("T", "t", Some("2024-01-01"));
        assert!(it.is_listed());
        it.status = Status::Draft;
        assert!(!it.is_listed());
        it.status = Status::Hidden;
        assert!(!it.is_listed());
    }

    // =========================================================================
    // Output naming
    // =========================================================================

    #[test]
    fn output_name_for_default_lang() {
        let mut it = item("T", "hello", Some("2024-01-01"));
        it.lang = "en".to_string();
        it.in_default_lang = true;
        assert_eq!(it.output_name(), "hello.html");
    }

    #[test]
    fn output_name_carries_lang_suffix_for_translations() {
        let mut it = item("T", "hello", Some("2024-01-01"));
        it.lang = "fr".to_string();
        assert_eq!(it.output_name(), "hello-fr.html");
    }

    #[test]
    fn drafts_render_under_their_own_prefix() {
        let mut it = item("T", "wip", Some("2024-01-01"));
        it.in_default_lang = true;
        it.status = Status::Draft;
        assert_eq!(it.output_name(), "drafts/wip.html");
    }

    // =========================================================================
    // Tag dedup
    // =========================================================================

    #[test]
    fn dedup_tags_preserves_first_seen_order() {
        let tags = vec![
            "rust".to_string(),
            "web".to_string(),
            "rust".to_string(),
            "cli".to_string(),
        ];
        assert_eq!(dedup_tags(tags), vec!["rust", "web", "cli"]);
    }

    #[test]
    fn dedup_tags_empty() {
        assert!(dedup_tags(vec![]).is_empty());
    }
}
