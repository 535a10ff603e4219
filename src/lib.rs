//! # Pressa
//!
//! A minimal static site generator for multilingual writing. Your filesystem
//! is the data source: markdown files become pages, directories become
//! categories, and a language suffix in the filename (`hello.fr.md`) marks a
//! translation of the same slug.
//!
//! # Architecture: One Pass, Fixed Phases
//!
//! A build is a single pass over the content tree:
//!
//! ```text
//! 1. Read       content/  →  items        (markdown + TOML front matter, cached)
//! 2. Resolve    items     →  canonical index + translations
//! 3. Aggregate  index     →  category/tag/author buckets
//! 4. Write      pages     →  dist/        (fixed phase order, write-once)
//! ```
//!
//! All run-scoped state lives in one context built fresh per invocation, so
//! repeated builds in-process cannot leak state into each other. The write
//! phase runs in a fixed order because output arbitration is order-sensitive:
//! the first writer of a path wins, and only a deliberate override may
//! replace it (see [`writer`]).
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | The build run itself — discovery, phases, and the per-run context |
//! | [`reader`] | Markdown + TOML front matter parsing, metadata resolution |
//! | [`cache`] | Persisted read cache with per-file staleness stamps (mtime or sha256) |
//! | [`content`] | The content item model: slug, language, status, taxonomy fields |
//! | [`translations`] | Groups items by slug, picks a canonical item per group |
//! | [`taxonomy`] | Category/tag/author buckets and the logarithmic tag cloud |
//! | [`paginate`] | Page windowing with orphan folding, page naming rules |
//! | [`render`] | HTML generation with Maud |
//! | [`writer`] | Write-once output arbitration over a pluggable writer |
//! | [`config`] | `site.toml` loading, defaults, validation |
//! | [`output`] | CLI output formatting for the build summary and check report |
//!
//! # Design Decisions
//!
//! ## A Cache That Never Fails a Build
//!
//! The read cache is a pure accelerator. A missing, corrupt, or unwritable
//! cache file degrades to a cold run with a log line; it never surfaces as a
//! build error. Staleness is checked per key at lookup time — an entry whose
//! source file changed simply misses, so there is no separate invalidation
//! pass and no way for a stale entry to reach the output.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time
//! HTML macro system, rather than Handlebars or Tera. Malformed HTML is a
//! build error, template variables are Rust expressions, and all
//! interpolation is auto-escaped.
//!
//! ## Write-Once Output
//!
//! Several phases can legitimately target the same path: a document whose
//! front matter claims `save_as = "index.html"` pre-empts the generated
//! listing index. Rather than last-writer-wins (output depends on phase
//! order in surprising ways), every write goes through a ledger: the first
//! writer of a path wins, a later normal write is skipped, and only a
//! deliberate override replaces an existing file. Two overrides of the same
//! path abort the build, since that is always a configuration conflict.
//!
//! ## Front Matter, Not Filename Conventions
//!
//! Metadata lives in TOML front matter between `+++` fences, with filename
//! and directory fallbacks (slug from the stem, language from the suffix,
//! category from the parent directory). Everything the front matter does not
//! claim is carried along in an open metadata bag, so downstream consumers
//! keep working when authors add fields.

pub mod cache;
pub mod config;
pub mod content;
pub mod output;
pub mod paginate;
pub mod pipeline;
pub mod reader;
pub mod render;
pub mod taxonomy;
pub mod translations;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;
