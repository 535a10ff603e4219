//! Source document reading and metadata resolution.
//!
//! A [`Reader`] turns one source file into a [`Document`]: raw or partially
//! processed content plus an open metadata bag. The pipeline is agnostic to
//! how documents are produced; the built-in [`MarkdownReader`] handles
//! markdown with `+++`-delimited TOML front matter.
//!
//! ## Front matter
//!
//! ```text
//! +++
//! title = "Hello"
//! date = 2024-01-15
//! tags = ["rust", "web"]
//! lang = "en"
//! +++
//! Body in **markdown**.
//! ```
//!
//! Recognized keys become fixed [`ContentItem`] fields; everything else
//! lands in the `extra` bag. A file without front matter is all body.
//!
//! ## Defaults
//!
//! Downstream stages assume defaults were already applied here, so a
//! malformed or sparse document still produces a complete item:
//!
//! - `slug`: the file stem, minus a trailing `.lang` component
//! - `lang`: the stem's `.lang` component (`post.fr.md` → `fr`), else the
//!   site default language
//! - `category`: the parent directory name, else `"misc"`
//! - `date`: absent when unparseable ([`ContentItem::validate`] reports it)

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::content::{ContentItem, Metadata, Status, dedup_tags};

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("front matter error: {0}")]
    FrontMatter(#[from] toml::de::Error),
}

/// Reader output: content plus an open key→value bag. This pair is what the
/// read cache stores per source file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub content: Option<String>,
    pub metadata: Metadata,
}

/// Produces `(content, metadata)` pairs from source files.
pub trait Reader: Sync {
    /// Stable identity string; the cache namespace derives from it.
    fn identity(&self) -> &str;

    fn read(&self, path: &Path) -> Result<Document, ReadError>;
}

/// Built-in reader: markdown body, `+++` TOML front matter.
#[derive(Debug, Default)]
pub struct MarkdownReader;

impl Reader for MarkdownReader {
    fn identity(&self) -> &str {
        "markdown-reader-v1"
    }

    fn read(&self, path: &Path) -> Result<Document, ReadError> {
        let raw = std::fs::read_to_string(path)?;
        let (front_matter, body) = split_front_matter(&raw);

        let metadata = match front_matter {
            Some(fm) => {
                let table: toml::Table = toml::from_str(fm)?;
                table
                    .into_iter()
                    .map(|(k, v)| (k, toml_to_json(v)))
                    .collect()
            }
            None => Metadata::new(),
        };

        let content = if body.trim().is_empty() {
            None
        } else {
            Some(markdown_to_html(body))
        };

        Ok(Document { content, metadata })
    }
}

/// Split a raw file into `(front matter, body)`. The front matter block is
/// the text between a leading `+++` line and the next `+++` line.
fn split_front_matter(raw: &str) -> (Option<&str>, &str) {
    let Some(rest) = raw.strip_prefix("+++") else {
        return (None, raw);
    };
    let Some(rest) = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n")) else {
        return (None, raw);
    };
    match rest.split_once("\n+++") {
        Some((fm, body)) => {
            let body = body.strip_prefix('\n').unwrap_or(body);
            (Some(fm), body)
        }
        None => (None, raw),
    }
}

/// Convert a TOML value into the JSON bag the pipeline traffics in.
///
/// TOML datetimes become their string form; `serde_json::to_value` would
/// wrap them in toml's private struct encoding instead.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => i.into(),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(d) => serde_json::Value::String(d.to_string()),
        toml::Value::Array(values) => {
            serde_json::Value::Array(values.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

fn markdown_to_html(body: &str) -> String {
    let parser = pulldown_cmark::Parser::new(body);
    let mut html = String::with_capacity(body.len() * 2);
    pulldown_cmark::html::push_html(&mut html, parser);
    html
}

// ============================================================================
// Metadata resolution
// ============================================================================

/// Assemble a [`ContentItem`] from a document, applying filename-derived
/// defaults for anything the metadata left out.
///
/// Field resolution, first available wins:
///
/// ```text
/// slug:     metadata slug → file stem (lang suffix stripped)
/// lang:     metadata lang → stem suffix (post.fr.md) → site default
/// category: metadata category → parent directory name → "misc"
/// ```
pub fn build_item(
    doc: Document,
    rel_path: &Path,
    default_lang: &str,
) -> ContentItem {
    let Document {
        content,
        mut metadata,
    } = doc;

    let (stem_slug, stem_lang) = parse_source_stem(
        rel_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default(),
    );

    let title = take_string(&mut metadata, "title").unwrap_or_default();
    let slug = take_string(&mut metadata, "slug").unwrap_or(stem_slug);
    let lang = take_string(&mut metadata, "lang")
        .or(stem_lang)
        .unwrap_or_else(|| default_lang.to_string());
    let date = take_string(&mut metadata, "date").and_then(|raw| parse_date(&raw, rel_path));
    let status = take_string(&mut metadata, "status")
        .map(|s| Status::parse(&s))
        .unwrap_or_default();
    let category = take_string(&mut metadata, "category")
        .or_else(|| parent_dir_name(rel_path))
        .unwrap_or_else(|| "misc".to_string());
    let tags = dedup_tags(take_string_list(&mut metadata, "tags"));
    let mut authors = take_string_list(&mut metadata, "authors");
    if authors.is_empty()
        && let Some(author) = take_string(&mut metadata, "author")
    {
        authors.push(author);
    }

    ContentItem {
        in_default_lang: lang == default_lang,
        slug,
        lang,
        title,
        date,
        status,
        category,
        tags,
        authors,
        source_path: rel_path.to_path_buf(),
        body: content,
        extra: metadata,
        translations: Vec::new(),
    }
}

/// Split a file stem into `(slug, lang)`: a final dot-component that looks
/// like a language code (`hello-world.fr` → `fr`) is the language.
fn parse_source_stem(stem: &str) -> (String, Option<String>) {
    if let Some((slug, suffix)) = stem.rsplit_once('.')
        && looks_like_lang(suffix)
    {
        return (slug.to_string(), Some(suffix.to_string()));
    }
    (stem.to_string(), None)
}

/// `fr`, `en`, `pt-br` — two or three letters, optional region part.
fn looks_like_lang(s: &str) -> bool {
    let (primary, region) = s.split_once('-').unwrap_or((s, ""));
    let alpha2or3 = |p: &str| (2..=3).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphabetic());
    alpha2or3(primary) && (region.is_empty() || region.len() == 2)
}

fn parent_dir_name(rel_path: &Path) -> Option<String> {
    rel_path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
}

/// Parse a date value: a plain date, or the date prefix of a datetime.
fn parse_date(raw: &str, rel_path: &Path) -> Option<NaiveDate> {
    let date_part = raw.get(..10).unwrap_or(raw);
    match date_part.parse::<NaiveDate>() {
        Ok(d) => Some(d),
        Err(err) => {
            debug!(path = %rel_path.display(), raw, %err, "unparseable date");
            None
        }
    }
}

/// Remove and string-convert a metadata key.
fn take_string(metadata: &mut Metadata, key: &str) -> Option<String> {
    let value = metadata.remove(key)?;
    match value {
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Remove a list-valued key; a comma-separated string also counts.
fn take_string_list(metadata: &mut Metadata, key: &str) -> Vec<String> {
    match metadata.remove(key) {
        Some(serde_json::Value::Array(values)) => values
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                other => Some(other.to_string()),
            })
            .collect(),
        Some(serde_json::Value::String(s)) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        Some(_) | None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn read_str(content: &str) -> Document {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.md");
        std::fs::write(&path, content).unwrap();
        MarkdownReader.read(&path).unwrap()
    }

    // =========================================================================
    // Front matter parsing
    // =========================================================================

    #[test]
    fn front_matter_and_body_are_split() {
        let doc = read_str("+++\ntitle = \"Hello\"\ntags = [\"rust\"]\n+++\nBody **here**.\n");
        assert_eq!(doc.metadata["title"], "Hello");
        let html = doc.content.unwrap();
        assert!(html.contains("<strong>here</strong>"));
        assert!(!html.contains("+++"));
    }

    #[test]
    fn no_front_matter_is_all_body() {
        let doc = read_str("Just a body.\n");
        assert!(doc.metadata.is_empty());
        assert!(doc.content.unwrap().contains("Just a body."));
    }

    #[test]
    fn empty_body_yields_no_content() {
        let doc = read_str("+++\ntitle = \"T\"\n+++\n");
        assert!(doc.content.is_none());
    }

    #[test]
    fn unterminated_front_matter_is_body() {
        let doc = read_str("+++\ntitle = \"T\"\n");
        assert!(doc.metadata.is_empty());
        assert!(doc.content.is_some());
    }

    #[test]
    fn broken_front_matter_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.md");
        std::fs::write(&path, "+++\nnot toml [\n+++\nbody\n").unwrap();
        assert!(matches!(
            MarkdownReader.read(&path),
            Err(ReadError::FrontMatter(_))
        ));
    }

    #[test]
    fn toml_date_survives_into_the_bag() {
        let doc = read_str("+++\ndate = 2024-01-15\n+++\nbody\n");
        assert_eq!(doc.metadata["date"], "2024-01-15");
    }

    // =========================================================================
    // Item assembly
    // =========================================================================

    fn doc_with(pairs: &[(&str, serde_json::Value)]) -> Document {
        Document {
            content: Some("<p>body</p>".to_string()),
            metadata: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn metadata_fields_win_over_filename_defaults() {
        let doc = doc_with(&[
            ("title", "Hello".into()),
            ("slug", "custom-slug".into()),
            ("lang", "de".into()),
            ("date", "2024-01-15".into()),
            ("category", "essays".into()),
        ]);
        let item = build_item(doc, &PathBuf::from("prose/post.fr.md"), "en");
        assert_eq!(item.slug, "custom-slug");
        assert_eq!(item.lang, "de");
        assert_eq!(item.category, "essays");
        assert_eq!(item.date, Some("2024-01-15".parse().unwrap()));
        assert!(!item.in_default_lang);
    }

    #[test]
    fn filename_defaults_fill_missing_metadata() {
        let doc = doc_with(&[("title", "Hello".into())]);
        let item = build_item(doc, &PathBuf::from("prose/hello-world.fr.md"), "en");
        assert_eq!(item.slug, "hello-world");
        assert_eq!(item.lang, "fr");
        assert_eq!(item.category, "prose");
        assert!(!item.in_default_lang);
    }

    #[test]
    fn stem_without_lang_suffix_uses_default_lang() {
        let doc = doc_with(&[]);
        let item = build_item(doc, &PathBuf::from("hello-world.md"), "en");
        assert_eq!(item.slug, "hello-world");
        assert_eq!(item.lang, "en");
        assert!(item.in_default_lang);
        // Top-level file: no parent directory to take a category from
        assert_eq!(item.category, "misc");
    }

    #[test]
    fn version_suffixes_are_not_languages() {
        let (slug, lang) = parse_source_stem("release.v2");
        assert_eq!(slug, "release.v2");
        assert_eq!(lang, None);
        assert_eq!(parse_source_stem("post.pt-br").1.as_deref(), Some("pt-br"));
    }

    #[test]
    fn unparseable_date_is_dropped() {
        let doc = doc_with(&[("date", "someday".into())]);
        let item = build_item(doc, &PathBuf::from("a.md"), "en");
        assert_eq!(item.date, None);
        assert!(!item.is_valid());
    }

    #[test]
    fn datetime_prefix_parses_as_date() {
        let doc = doc_with(&[("date", "2024-01-15T10:30:00Z".into())]);
        let item = build_item(doc, &PathBuf::from("a.md"), "en");
        assert_eq!(item.date, Some("2024-01-15".parse().unwrap()));
    }

    #[test]
    fn tags_dedup_and_comma_strings_split() {
        let doc = doc_with(&[("tags", "rust, web, rust".into())]);
        let item = build_item(doc, &PathBuf::from("a.md"), "en");
        assert_eq!(item.tags, vec!["rust", "web"]);
    }

    #[test]
    fn singular_author_key_is_accepted() {
        let doc = doc_with(&[("author", "ann".into())]);
        let item = build_item(doc, &PathBuf::from("a.md"), "en");
        assert_eq!(item.authors, vec!["ann"]);
    }

    #[test]
    fn unrecognized_keys_land_in_extra() {
        let doc = doc_with(&[
            ("title", "T".into()),
            ("translation", "true".into()),
            ("summary", "a note".into()),
        ]);
        let item = build_item(doc, &PathBuf::from("a.md"), "en");
        assert_eq!(item.extra.len(), 2);
        assert_eq!(item.extra["translation"], "true");
        assert_eq!(item.extra["summary"], "a note");
    }

    #[test]
    fn status_key_is_recognized() {
        let doc = doc_with(&[("status", "draft".into())]);
        let item = build_item(doc, &PathBuf::from("a.md"), "en");
        assert_eq!(item.status, Status::Draft);
    }
}
