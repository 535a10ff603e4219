//! Taxonomy indexes and the tag cloud.
//!
//! Builds three buckets over the canonical item set — category, tag, author —
//! and computes tag-cloud visual weights. Buckets are rebuilt from scratch
//! every run; nothing here is incremental.
//!
//! ## Ordering contract
//!
//! Buckets store items unsorted, in insertion order. Page-producing phases
//! call [`Bucket::sorted_entries`] immediately before use to get a fresh
//! date-descending copy, so the same bucket can feed multiple phases without
//! one phase's sort leaking into another. The category/author top-level
//! indexes sort by the key's case-folded comparison value instead, with an
//! optional reverse flag.
//!
//! The tag cloud is the one deliberately *unordered* output: the computed
//! `(tag, weight)` pairs are shuffled before being exposed. That is a
//! presentation de-biasing step; callers must not rely on any order.

use rand::seq::SliceRandom;

use crate::config::TagCloudConfig;
use crate::content::ContentItem;

/// Insertion-ordered map from a taxonomy value to the canonical items
/// carrying it.
#[derive(Debug, Default)]
pub struct Bucket {
    entries: Vec<(String, Vec<ContentItem>)>,
}

impl Bucket {
    fn insert(&mut self, name: &str, item: &ContentItem) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, items)) => items.push(item.clone()),
            None => self
                .entries
                .push((name.to_string(), vec![item.clone()])),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw entries in insertion order, items unsorted.
    pub fn entries(&self) -> &[(String, Vec<ContentItem>)] {
        &self.entries
    }

    /// Fresh copies of every entry with items sorted newest-first (stable,
    /// ties keep insertion order; undated items sort last). The stored
    /// bucket stays unsorted so repeated calls can't drift.
    pub fn sorted_entries(&self) -> Vec<(String, Vec<ContentItem>)> {
        self.entries
            .iter()
            .map(|(name, items)| {
                let mut items = items.clone();
                sort_by_date_desc(&mut items);
                (name.clone(), items)
            })
            .collect()
    }

    /// Top-level index sorted by the key's case-folded comparison value.
    pub fn key_sorted_entries(&self, reverse: bool) -> Vec<(String, Vec<ContentItem>)> {
        let mut entries = self.sorted_entries();
        entries.sort_by(|(a, _), (b, _)| a.to_lowercase().cmp(&b.to_lowercase()));
        if reverse {
            entries.reverse();
        }
        entries
    }
}

/// Sort newest-first; undated items last; stable on ties.
pub fn sort_by_date_desc(items: &mut [ContentItem]) {
    items.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Category, tag, and author buckets over the canonical item set.
#[derive(Debug, Default)]
pub struct TaxonomyBuckets {
    pub categories: Bucket,
    pub tags: Bucket,
    pub authors: Bucket,
}

/// Build all three buckets from canonical items.
///
/// Only listed items (published, not hidden) participate; authors with an
/// empty name are excluded. Malformed input never raises — upstream already
/// applied defaults for missing categories.
pub fn aggregate(items: &[ContentItem]) -> TaxonomyBuckets {
    let mut buckets = TaxonomyBuckets::default();
    for item in items.iter().filter(|i| i.is_listed()) {
        buckets.categories.insert(&item.category, item);
        for tag in &item.tags {
            buckets.tags.insert(tag, item);
        }
        for author in &item.authors {
            if !author.is_empty() {
                buckets.authors.insert(author, item);
            }
        }
    }
    buckets
}

// ============================================================================
// Tag cloud
// ============================================================================

/// One tag with its occurrence count and visual-size bucket.
///
/// Weight 1 is the biggest bucket (the most-used tag), `steps` the smallest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagWeight {
    pub tag: String,
    pub count: usize,
    pub weight: usize,
}

/// Compute tag-cloud weights from the tag bucket.
///
/// Keeps the `max_tags` most-used tags (ties broken by insertion order) and
/// assigns each a logarithmic weight:
///
/// ```text
/// weight = floor(steps - (steps-1) * ln(count) / ln(max_count))
/// ```
///
/// with the divisor replaced by 1 when `max_count == 1` (`ln(1)` is zero).
/// The result is returned in a random order; this is presentation
/// de-biasing, and callers must not depend on any ordering.
pub fn tag_cloud(tags: &Bucket, config: &TagCloudConfig) -> Vec<TagWeight> {
    let mut counts: Vec<(String, usize)> = tags
        .entries()
        .iter()
        .map(|(name, items)| (name.clone(), items.len()))
        .collect();
    // Stable sort: ties keep insertion order
    counts.sort_by(|(_, a), (_, b)| b.cmp(a));
    counts.truncate(config.max_tags);

    let Some(&(_, max_count)) = counts.first() else {
        return Vec::new();
    };
    let divisor = if max_count == 1 {
        1.0
    } else {
        (max_count as f64).ln()
    };

    let steps = config.steps as f64;
    let mut cloud: Vec<TagWeight> = counts
        .into_iter()
        .map(|(tag, count)| {
            let weight = (steps - (steps - 1.0) * (count as f64).ln() / divisor).floor();
            TagWeight {
                tag,
                count,
                weight: weight as usize,
            }
        })
        .collect();

    cloud.shuffle(&mut rand::thread_rng());
    cloud
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Status;
    use std::collections::BTreeSet;

    fn item(slug: &str, date: &str, category: &str, tags: &[&str], authors: &[&str]) -> ContentItem {
        ContentItem {
            slug: slug.to_string(),
            title: slug.to_string(),
            date: Some(date.parse().unwrap()),
            category: category.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            authors: authors.iter().map(|a| a.to_string()).collect(),
            ..ContentItem::default()
        }
    }

    // =========================================================================
    // Buckets
    // =========================================================================

    #[test]
    fn buckets_group_by_value_in_insertion_order() {
        let items = vec![
            item("a", "2024-01-10", "code", &["rust"], &["ann"]),
            item("b", "2024-01-20", "prose", &["rust", "web"], &["bob"]),
            item("c", "2024-01-15", "code", &[], &["ann"]),
        ];
        let buckets = aggregate(&items);

        let cats: Vec<&str> = buckets
            .categories
            .entries()
            .iter()
            .map(|(n, _)| n.as_str())
            .collect();
        assert_eq!(cats, vec!["code", "prose"]);
        assert_eq!(buckets.categories.entries()[0].1.len(), 2);
        assert_eq!(buckets.tags.len(), 2);
        assert_eq!(buckets.authors.len(), 2);
    }

    #[test]
    fn unlisted_items_are_excluded() {
        let mut draft = item("d", "2024-01-01", "code", &["rust"], &["ann"]);
        draft.status = Status::Draft;
        let mut hidden = item("h", "2024-01-02", "code", &["rust"], &["ann"]);
        hidden.status = Status::Hidden;
        let buckets = aggregate(&[draft, hidden]);
        assert!(buckets.categories.is_empty());
        assert!(buckets.tags.is_empty());
        assert!(buckets.authors.is_empty());
    }

    #[test]
    fn empty_author_names_are_excluded() {
        let items = vec![item("a", "2024-01-10", "code", &[], &["", "ann"])];
        let buckets = aggregate(&items);
        assert_eq!(buckets.authors.len(), 1);
        assert_eq!(buckets.authors.entries()[0].0, "ann");
    }

    #[test]
    fn sorted_entries_are_newest_first_without_mutating_the_bucket() {
        let items = vec![
            item("old", "2024-01-10", "code", &[], &[]),
            item("new", "2024-01-20", "code", &[], &[]),
        ];
        let buckets = aggregate(&items);

        let sorted = buckets.categories.sorted_entries();
        assert_eq!(sorted[0].1[0].slug, "new");
        assert_eq!(sorted[0].1[1].slug, "old");
        // Stored bucket keeps insertion order for the next phase
        assert_eq!(buckets.categories.entries()[0].1[0].slug, "old");
    }

    #[test]
    fn undated_items_sort_last() {
        let mut items = vec![
            ContentItem {
                slug: "undated".to_string(),
                ..ContentItem::default()
            },
            item("dated", "2024-01-10", "code", &[], &[]),
        ];
        sort_by_date_desc(&mut items);
        assert_eq!(items[0].slug, "dated");
        assert_eq!(items[1].slug, "undated");
    }

    #[test]
    fn key_sorted_entries_fold_case_and_honor_reverse() {
        let items = vec![
            item("a", "2024-01-10", "Zebra", &[], &[]),
            item("b", "2024-01-11", "apple", &[], &[]),
            item("c", "2024-01-12", "Mango", &[], &[]),
        ];
        let buckets = aggregate(&items);

        let keys: Vec<String> = buckets
            .categories
            .key_sorted_entries(false)
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(keys, vec!["apple", "Mango", "Zebra"]);

        let reversed: Vec<String> = buckets
            .categories
            .key_sorted_entries(true)
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(reversed, vec!["Zebra", "Mango", "apple"]);
    }

    // =========================================================================
    // Tag cloud
    // =========================================================================

    fn cloud_set(cloud: &[TagWeight]) -> BTreeSet<(String, usize)> {
        cloud
            .iter()
            .map(|tw| (tw.tag.clone(), tw.weight))
            .collect()
    }

    /// Build a tag bucket with exact per-tag counts.
    fn bucket_with_counts(counts: &[(&str, usize)]) -> Bucket {
        let mut items = Vec::new();
        let mut n = 0;
        for &(tag, count) in counts {
            for _ in 0..count {
                items.push(item(&format!("i{n}"), "2024-01-01", "c", &[tag], &[]));
                n += 1;
            }
        }
        aggregate(&items).tags
    }

    #[test]
    fn tag_cloud_log_weights() {
        let tags = bucket_with_counts(&[("a", 10), ("b", 5), ("c", 1)]);
        let cloud = tag_cloud(&tags, &TagCloudConfig { steps: 4, max_tags: 100 });

        // weight(10) = floor(4 - 3*ln(10)/ln(10)) = 1
        // weight(5)  = floor(4 - 3*ln(5)/ln(10))  = 1
        // weight(1)  = floor(4 - 3*ln(1)/ln(10))  = 4
        // Set equality only: the output order is intentionally shuffled.
        let expected: BTreeSet<(String, usize)> = [
            ("a".to_string(), 1),
            ("b".to_string(), 1),
            ("c".to_string(), 4),
        ]
        .into_iter()
        .collect();
        assert_eq!(cloud_set(&cloud), expected);
    }

    #[test]
    fn tag_cloud_single_occurrence_divisor_guard() {
        // max_count == 1 would divide by ln(1) == 0; the guard substitutes 1
        let tags = bucket_with_counts(&[("a", 1), ("b", 1)]);
        let cloud = tag_cloud(&tags, &TagCloudConfig { steps: 4, max_tags: 100 });
        let expected: BTreeSet<(String, usize)> =
            [("a".to_string(), 4), ("b".to_string(), 4)].into_iter().collect();
        assert_eq!(cloud_set(&cloud), expected);
    }

    #[test]
    fn tag_cloud_keeps_top_n_with_insertion_order_ties() {
        let tags = bucket_with_counts(&[("first", 2), ("second", 2), ("third", 1)]);
        let cloud = tag_cloud(&tags, &TagCloudConfig { steps: 4, max_tags: 2 });
        let kept: BTreeSet<String> = cloud.iter().map(|tw| tw.tag.clone()).collect();
        // "third" loses; the tie between first/second resolves by insertion
        // order, keeping both
        assert_eq!(
            kept,
            ["first".to_string(), "second".to_string()].into_iter().collect()
        );
    }

    #[test]
    fn tag_cloud_of_empty_bucket_is_empty() {
        let tags = Bucket::default();
        assert!(tag_cloud(&tags, &TagCloudConfig::default()).is_empty());
    }
}
