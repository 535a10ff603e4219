//! Shared test utilities for the pressa test suite.
//!
//! Provides fixture builders for temporary content trees, item constructors,
//! and lookup helpers over resolved content.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = site_fixture(&[
//!     ("post.md", "+++\ntitle = \"Post\"\ndate = 2024-01-15\n+++\nBody."),
//!     ("post.fr.md", "+++\ntitle = \"Billet\"\ndate = 2024-01-15\n+++\nCorps."),
//! ]);
//! let out = tempfile::TempDir::new().unwrap();
//! let summary = pipeline::build(&options(&tmp, &out)).unwrap();
//! assert_eq!(summary.canonical, 1);
//! ```

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::content::{ContentItem, Status};
use crate::pipeline::BuildOptions;

// =========================================================================
// Fixture setup
// =========================================================================

/// Build a temporary content tree from `(relative path, contents)` pairs
/// and return it. Intermediate directories are created as needed.
///
/// Tests get an isolated tree they can mutate without affecting other tests.
pub fn site_fixture(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (rel, contents) in files {
        let path = tmp.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
    tmp
}

/// Build options pointing a fixture tree at a fresh output directory, with
/// the cache enabled under its defaults.
pub fn options(source: &TempDir, output: &TempDir) -> BuildOptions {
    BuildOptions {
        source: source.path().to_path_buf(),
        output: output.path().to_path_buf(),
        no_cache: false,
    }
}

// =========================================================================
// Item constructors
// =========================================================================

/// A published item with the given slug and language, dated so listings
/// have something to sort by.
pub fn item(slug: &str, lang: &str, in_default_lang: bool) -> ContentItem {
    ContentItem {
        slug: slug.to_string(),
        lang: lang.to_string(),
        in_default_lang,
        title: slug.to_string(),
        date: chrono::NaiveDate::from_ymd_opt(2024, 1, 15),
        status: Status::Published,
        source_path: PathBuf::from(format!("{slug}.{lang}.md")),
        ..Default::default()
    }
}

// =========================================================================
// Lookups — panic with a clear message on miss
// =========================================================================

/// Find an item by slug and language. Panics if not found.
pub fn find_item<'a>(items: &'a [ContentItem], slug: &str, lang: &str) -> &'a ContentItem {
    items
        .iter()
        .find(|i| i.slug == slug && i.lang == lang)
        .unwrap_or_else(|| {
            let available: Vec<String> = items
                .iter()
                .map(|i| format!("{}/{}", i.slug, i.lang))
                .collect();
            panic!("item '{slug}/{lang}' not found. Available: {available:?}")
        })
}
