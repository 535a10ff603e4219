//! The build pipeline.
//!
//! One build run is a single pass over the content tree:
//!
//! ```text
//! discover → read/cache → resolve translations → aggregate taxonomy
//!          → paginate → write
//! ```
//!
//! All run-scoped mutable state (the read cache, the write ledger, the
//! taxonomy buckets) lives in one [`BuildContext`] constructed fresh per
//! invocation, so repeated builds in one process (a watch loop) cannot leak
//! state into each other.
//!
//! ## Phases
//!
//! Writes happen in a fixed phase order: per-document pages, listing pages,
//! taxonomy pages, drafts. The order matters because write arbitration is
//! order-sensitive: a document whose metadata claims a listing path (via
//! `save_as`) pre-claims it with an override write, and the later listing
//! phase's normal write is then skipped. See [`writer`](crate::writer).
//!
//! ## Parallelism
//!
//! Per-file parsing is independent, so the read phase fans out over
//! [rayon](https://docs.rs/rayon) with the cache map behind a single-writer
//! `Mutex`, preserving one cache write per key per run. Everything after
//! resolution is sequential; the final write order must stay the declared
//! phase order.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::{CacheStats, FileStampCacheStore};
use crate::config::{self, SiteConfig};
use crate::content::{ContentItem, Status};
use crate::paginate::{PageName, Paginator, page_name};
use crate::reader::{Document, MarkdownReader, Reader, build_item};
use crate::render;
use crate::taxonomy::{self, TaxonomyBuckets};
use crate::translations::{self, ResolvedContent};
use crate::writer::{FsWriter, OutputGuard, WriteError, WriteOutcome, Writer};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Write error: {0}")]
    Write(#[from] WriteError),
}

/// Inputs for one build run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Content directory (holds `site.toml` and the source documents).
    pub source: PathBuf,
    /// Output directory for the rendered site.
    pub output: PathBuf,
    /// Disable the read cache entirely - neither load nor store.
    pub no_cache: bool,
}

/// What one build run did, for the CLI summary.
#[derive(Debug, Default)]
pub struct BuildSummary {
    pub canonical: usize,
    pub translations: usize,
    pub drafts: usize,
    /// Source files that could not be read or parsed (skipped with a warning).
    pub read_errors: usize,
    /// Items with missing required fields (built anyway).
    pub invalid_items: usize,
    pub cache_stats: CacheStats,
    pub files_written: usize,
    pub files_skipped: usize,
}

/// All run-scoped state for one build, constructed fresh per invocation.
struct BuildContext<W> {
    config: SiteConfig,
    cache: FileStampCacheStore<Document>,
    guard: OutputGuard<W>,
    summary: BuildSummary,
}

/// Run a full build: read everything under `options.source`, render the
/// site into `options.output`.
pub fn build(options: &BuildOptions) -> Result<BuildSummary, BuildError> {
    let config = config::load_config(&options.source)?;
    let writer = FsWriter::new(&options.output);
    build_with(options, config, &MarkdownReader, writer)
}

/// Build against explicit collaborators; the `build` wrapper supplies the
/// markdown reader and filesystem writer.
fn build_with<W: Writer>(
    options: &BuildOptions,
    config: SiteConfig,
    reader: &dyn Reader,
    writer: W,
) -> Result<BuildSummary, BuildError> {
    let mut cache_config = config.cache.clone();
    if options.no_cache {
        cache_config.enabled = false;
        cache_config.load = false;
    }
    // A relative cache dir lives inside the content tree; absolute paths
    // win the join and pass through unchanged.
    let cache_dir = options.source.join(&cache_config.dir);
    let cache = FileStampCacheStore::open(
        &cache_dir,
        reader.identity(),
        &options.source,
        &cache_config,
    );

    let mut ctx = BuildContext {
        config,
        cache,
        guard: OutputGuard::new(writer),
        summary: BuildSummary::default(),
    };

    let sources = discover(&options.source)?;
    let items = ctx.read_items(reader, &options.source, &sources);
    // Reader output is now fully stored; persist before the write phases so
    // a failed write still leaves the cache at a consistent state.
    ctx.cache.persist();

    let resolved = translations::resolve(items);
    ctx.summary.canonical = resolved.index.len();
    ctx.summary.translations = resolved.translations.len();
    ctx.summary.invalid_items = resolved
        .index
        .iter()
        .chain(&resolved.translations)
        .filter(|item| !item.is_valid())
        .count();

    let buckets = taxonomy::aggregate(&resolved.index);
    ctx.write_phases(&resolved, &buckets)?;

    info!(
        written = ctx.summary.files_written,
        skipped = ctx.summary.files_skipped,
        "build complete"
    );
    Ok(ctx.summary)
}

/// Walk the content root for source documents, in sorted order so every
/// downstream first-wins decision is deterministic.
fn discover(source: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let mut paths = Vec::new();
    for entry in walkdir::WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| BuildError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(source)
            .expect("walkdir yields paths under its root")
            .to_path_buf();
        paths.push(rel);
    }
    Ok(paths)
}

impl<W: Writer> BuildContext<W> {
    /// Read every source document, consulting the cache first. Parsing fans
    /// out over rayon; the cache sits behind a single-writer lock.
    fn read_items(
        &mut self,
        reader: &dyn Reader,
        source: &Path,
        rel_paths: &[PathBuf],
    ) -> Vec<ContentItem> {
        let cache = Mutex::new(&mut self.cache);

        let results: Vec<Option<(PathBuf, Document, bool)>> = rel_paths
            .par_iter()
            .map(|rel| {
                let key = rel.to_string_lossy();
                if let Some(doc) = cache.lock().unwrap().get(&key).cloned() {
                    return Some((rel.clone(), doc, true));
                }
                match reader.read(&source.join(rel)) {
                    Ok(doc) => {
                        cache.lock().unwrap().put(&key, doc.clone());
                        Some((rel.clone(), doc, false))
                    }
                    Err(err) => {
                        warn!(path = %rel.display(), %err, "skipping unreadable document");
                        None
                    }
                }
            })
            .collect();

        let mut items = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Some((rel, doc, hit)) => {
                    if hit {
                        self.summary.cache_stats.hit();
                    } else {
                        self.summary.cache_stats.miss();
                    }
                    items.push(build_item(doc, &rel, &self.config.default_lang));
                }
                None => self.summary.read_errors += 1,
            }
        }
        items
    }

    /// Run every page-producing phase in the declared order.
    fn write_phases(
        &mut self,
        resolved: &ResolvedContent,
        buckets: &TaxonomyBuckets,
    ) -> Result<(), BuildError> {
        self.item_pages_phase(resolved)?;
        self.listing_phase(&resolved.index)?;
        self.taxonomy_phase(buckets)?;
        self.drafts_phase(resolved)?;
        Ok(())
    }

    /// Phase 1: one page per non-draft item, canonical and translation
    /// alike. An item whose metadata names a `save_as` path additionally
    /// pre-claims that path with an override write.
    fn item_pages_phase(&mut self, resolved: &ResolvedContent) -> Result<(), BuildError> {
        for item in resolved
            .index
            .iter()
            .chain(&resolved.translations)
            .filter(|i| i.status != Status::Draft)
        {
            let markup = render::item_page(&self.config.title, item);
            self.write(&item.output_name(), &markup, false)?;

            if let Some(serde_json::Value::String(save_as)) = item.extra.get("save_as") {
                self.write(save_as, &markup, true)?;
            }
        }
        Ok(())
    }

    /// Phase 2: the paginated newest-first index of canonical items.
    fn listing_phase(&mut self, index: &[ContentItem]) -> Result<(), BuildError> {
        let mut listed: Vec<ContentItem> =
            index.iter().filter(|i| i.is_listed()).cloned().collect();
        taxonomy::sort_by_date_desc(&mut listed);
        self.write_paginated(&listed, "posts", "index.html")
    }

    /// Phase 3: taxonomy pages - per-bucket paginated listings, the
    /// category/author indexes, and the tag cloud (which is the tag index).
    fn taxonomy_phase(&mut self, buckets: &TaxonomyBuckets) -> Result<(), BuildError> {
        let reverse = self.config.taxonomy.reverse;

        for (kind, plural, bucket) in [
            ("category", "categories", &buckets.categories),
            ("tag", "tags", &buckets.tags),
            ("author", "authors", &buckets.authors),
        ] {
            // Sorted fresh per phase; the stored bucket stays unsorted
            for (name, items) in bucket.sorted_entries() {
                let base = format!("{kind}/{}.html", slugify(&name));
                self.write_paginated(&items, &name, &base)?;
            }

            // The tag cloud below doubles as the tag index
            if kind == "tag" {
                continue;
            }
            let index_entries = bucket.key_sorted_entries(reverse);
            let markup = render::taxonomy_index(
                &self.config.title,
                plural,
                &index_entries,
                |name| format!("{kind}/{}.html", slugify(name)),
            );
            self.write(&format!("{plural}.html"), &markup, false)?;
        }

        let cloud = taxonomy::tag_cloud(&buckets.tags, &self.config.tag_cloud);
        let markup = render::tag_cloud_page(&self.config.title, &cloud, |tag| {
            format!("tag/{}.html", slugify(tag))
        });
        self.write("tags.html", &markup, false)?;
        Ok(())
    }

    /// Phase 4: drafts, rendered last under their own prefix.
    fn drafts_phase(&mut self, resolved: &ResolvedContent) -> Result<(), BuildError> {
        for item in resolved
            .index
            .iter()
            .chain(&resolved.translations)
            .filter(|i| i.status == Status::Draft)
        {
            let markup = render::item_page(&self.config.title, item);
            self.write(&item.output_name(), &markup, false)?;
            self.summary.drafts += 1;
        }
        Ok(())
    }

    /// Write every page of one listing under the configured pagination
    /// rules.
    fn write_paginated(
        &mut self,
        items: &[ContentItem],
        heading: &str,
        base: &str,
    ) -> Result<(), BuildError> {
        let pagination = self.config.pagination.clone();
        let paginator = Paginator::new(items, pagination.per_page, pagination.orphans);
        for page in paginator.pages() {
            let name = page_name(&pagination.rules, page.number(), base, base);
            let prev: Option<PageName> = page
                .has_previous()
                .then(|| page_name(&pagination.rules, page.previous_page_number(), base, base));
            let next: Option<PageName> = page
                .has_next()
                .then(|| page_name(&pagination.rules, page.next_page_number(), base, base));
            let markup = render::listing_page(
                &self.config.title,
                heading,
                &page,
                prev.as_ref(),
                next.as_ref(),
            );
            self.write(&name.save_as, &markup, false)?;
        }
        Ok(())
    }

    fn write(
        &mut self,
        rel_path: &str,
        markup: &maud::Markup,
        override_existing: bool,
    ) -> Result<(), BuildError> {
        let outcome = self.guard.write(
            Path::new(rel_path),
            markup.0.as_bytes(),
            override_existing,
        )?;
        match outcome {
            WriteOutcome::Written => self.summary.files_written += 1,
            WriteOutcome::Skipped => self.summary.files_skipped += 1,
        }
        Ok(())
    }
}

/// Turn a taxonomy value into a path-safe name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

// ============================================================================
// Check
// ============================================================================

/// Result of validating a content tree without writing anything.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub items: usize,
    /// `(source path, problem)` pairs, one per problem.
    pub problems: Vec<(PathBuf, String)>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Read and resolve the whole tree, reporting every validation problem.
/// Nothing is written and the cache is not touched.
pub fn check(source: &Path) -> Result<CheckReport, BuildError> {
    let config = config::load_config(source)?;
    let reader = MarkdownReader;
    let mut report = CheckReport::default();

    let mut items = Vec::new();
    for rel in discover(source)? {
        match reader.read(&source.join(&rel)) {
            Ok(doc) => items.push(build_item(doc, &rel, &config.default_lang)),
            Err(err) => report.problems.push((rel, err.to_string())),
        }
    }

    let resolved = translations::resolve(items);
    for item in resolved.index.iter().chain(&resolved.translations) {
        for missing in item.validate() {
            report
                .problems
                .push((item.source_path.clone(), missing.to_string()));
        }
    }
    report.items = resolved.total();
    Ok(report)
}
