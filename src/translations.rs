//! Cross-language translation resolution.
//!
//! Partitions a flat list of content items into canonical items (the site
//! index) and their language variants. Items sharing a slug form a group;
//! exactly one item per group becomes canonical, the rest become its
//! translations.
//!
//! ## Canonical selection
//!
//! Within a group, items whose `translation` metadata is present and not the
//! literal string `"false"` (case-insensitive) are explicitly flagged as
//! translations, leaving the unflagged items as canonical candidates. Two
//! corrections keep every group from ending up empty:
//!
//! - If *every* item in a group is flagged, the flag is discarded and the
//!   whole group becomes candidates.
//! - If no candidate is in the default language, the first item of the
//!   group (in stable sort order) is canonical regardless of flags.
//!
//! Among candidates in the default language, the first wins; the remaining
//! candidates demote to translations even when they are also flagged as
//! default-language. This tie-break is deliberate, observed behavior.
//!
//! ## Guarantees
//!
//! Resolution never fails and never drops an item: the output is always a
//! complete partition of the input (`index.len() + translations.len() ==
//! input.len()`). Duplicate same-language items within a group and empty
//! canonical slugs are logged as warnings, nothing more.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::content::ContentItem;

/// Result of resolving translations: one canonical item per slug group plus
/// everything that demoted to a translation.
#[derive(Debug, Default)]
pub struct ResolvedContent {
    pub index: Vec<ContentItem>,
    pub translations: Vec<ContentItem>,
}

impl ResolvedContent {
    pub fn total(&self) -> usize {
        self.index.len() + self.translations.len()
    }
}

/// Whether an item's metadata explicitly marks it as a translation.
fn translation_flagged(item: &ContentItem) -> bool {
    match item.extra.get("translation") {
        None => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(s)) => !s.eq_ignore_ascii_case("false"),
        Some(_) => true,
    }
}

/// Partition items into canonical index and translations.
///
/// Deterministic for a given input: grouping uses a stable sort by slug, so
/// relative input order survives within each group and drives every
/// first-wins decision below.
pub fn resolve(mut items: Vec<ContentItem>) -> ResolvedContent {
    items.sort_by(|a, b| a.slug.cmp(&b.slug));

    let mut resolved = ResolvedContent::default();
    for group in slug_groups(items) {
        resolve_group(group, &mut resolved);
    }
    resolved
}

/// Split a slug-sorted list into runs of equal slug.
fn slug_groups(items: Vec<ContentItem>) -> Vec<Vec<ContentItem>> {
    let mut groups: Vec<Vec<ContentItem>> = Vec::new();
    for item in items {
        match groups.last_mut() {
            Some(group) if group[0].slug == item.slug => group.push(item),
            _ => groups.push(vec![item]),
        }
    }
    groups
}

fn resolve_group(mut group: Vec<ContentItem>, out: &mut ResolvedContent) {
    warn_duplicate_langs(&group);

    // Every item's translations list is the rest of its group. Nested items
    // carry empty translation lists to keep the structure finite.
    let flat: Vec<ContentItem> = group
        .iter()
        .map(|item| ContentItem {
            translations: Vec::new(),
            ..item.clone()
        })
        .collect();
    for (i, item) in group.iter_mut().enumerate() {
        item.translations = flat
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, other)| other.clone())
            .collect();
    }

    let flagged: Vec<usize> = (0..group.len())
        .filter(|&i| translation_flagged(&group[i]))
        .collect();
    // A group where everything is flagged would have no candidates; discard
    // the flag instead.
    let candidates: Vec<usize> = if flagged.is_empty() || flagged.len() == group.len() {
        (0..group.len()).collect()
    } else {
        (0..group.len())
            .filter(|i| !flagged.contains(i))
            .collect()
    };

    // First default-language candidate wins; everyone else demotes. With no
    // default-language candidate at all, the group's first item is canonical.
    let canonical = candidates
        .iter()
        .copied()
        .find(|&i| group[i].in_default_lang)
        .unwrap_or(0);

    if group[canonical].slug.is_empty() {
        warn!(
            source = %group[canonical].source_path.display(),
            "canonical item has an empty slug"
        );
    }

    for (i, item) in group.into_iter().enumerate() {
        if i == canonical {
            out.index.push(item);
        } else {
            out.translations.push(item);
        }
    }
}

/// Warn about `(slug, lang)` pairs with more than one item, listing every
/// conflicting source path. No item is dropped.
fn warn_duplicate_langs(group: &[ContentItem]) {
    let mut by_lang: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for item in group {
        by_lang
            .entry(item.lang.as_str())
            .or_default()
            .push(item.source_path.display().to_string());
    }
    for (lang, sources) in by_lang {
        if sources.len() > 1 {
            warn!(
                slug = %group[0].slug,
                lang,
                sources = %sources.join(", "),
                "multiple items for the same slug and language"
            );
        }
    }
}
