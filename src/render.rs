//! HTML rendering.
//!
//! Turns resolved content into final HTML using [maud](https://maud.lambda.xyz/)
//! compile-time templates: type-safe, auto-escaped, no template directory to
//! ship. Every function here is pure (items in, markup out), so the write
//! arbitration in [`writer`](crate::writer) stays the only place that touches
//! the output directory.
//!
//! ## Generated pages
//!
//! - **Item pages** (`/{slug}.html`, `/{slug}-{lang}.html`): one per content
//!   item, with links to its translations
//! - **Listing pages** (`/index.html`, `/index2.html`, ...): paginated
//!   newest-first index of canonical items
//! - **Taxonomy pages** (`/category/{name}.html`, `/tag/{name}.html`,
//!   `/author/{name}.html`): paginated per-bucket listings plus top-level
//!   indexes
//! - **Tag cloud** (`/tags.html`): weighted tag spans

use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::content::ContentItem;
use crate::paginate::{Page, PageName};
use crate::taxonomy::TagWeight;

/// Base CSS embedded in every page; enough to be readable unstyled.
const BASE_CSS: &str = "\
body { max-width: 42rem; margin: 2rem auto; padding: 0 1rem; font-family: serif; }
nav.pages, ul.translations { font-size: 0.9rem; }
span.tag-1 { font-size: 1.6rem; } span.tag-2 { font-size: 1.3rem; }
span.tag-3 { font-size: 1.1rem; } span.tag-4 { font-size: 0.9rem; }";

/// Common document shell: head, site header, footer.
fn base_document(site_title: &str, page_title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (page_title) " · " (site_title) }
                style { (PreEscaped(BASE_CSS)) }
            }
            body {
                header {
                    a href="/" { (site_title) }
                }
                (content)
            }
        }
    }
}

fn item_entry(item: &ContentItem) -> Markup {
    html! {
        li {
            @if let Some(date) = item.date {
                time { (date.format("%Y-%m-%d")) } " — "
            }
            a href={ "/" (item.output_name()) } { (item.title) }
        }
    }
}

/// One content item's page, with its translation links.
pub fn item_page(site_title: &str, item: &ContentItem) -> Markup {
    let content = html! {
        main {
            article {
                h1 { (item.title) }
                @if let Some(date) = item.date {
                    p { time { (date.format("%Y-%m-%d")) } }
                }
                @if !item.translations.is_empty() {
                    ul.translations {
                        @for other in &item.translations {
                            li {
                                a href={ "/" (other.output_name()) } lang=(other.lang) {
                                    (other.lang)
                                }
                            }
                        }
                    }
                }
                @if let Some(body) = &item.body {
                    (PreEscaped(body.as_str()))
                }
            }
        }
    };
    base_document(site_title, &item.title, content)
}

/// Previous/next navigation between paginated pages.
fn page_nav(page: &Page<'_, ContentItem>, prev: Option<&PageName>, next: Option<&PageName>) -> Markup {
    html! {
        @if page.has_other_pages() {
            nav.pages {
                @if let Some(prev) = prev {
                    a href={ "/" (prev.url) } { "newer" } " "
                }
                span { "page " (page.number()) }
                @if let Some(next) = next {
                    " " a href={ "/" (next.url) } { "older" }
                }
            }
        }
    }
}

/// One paginated listing page of items, used by the index, category, tag,
/// and author phases alike.
pub fn listing_page(
    site_title: &str,
    heading: &str,
    page: &Page<'_, ContentItem>,
    prev: Option<&PageName>,
    next: Option<&PageName>,
) -> Markup {
    let content = html! {
        main {
            h1 { (heading) }
            ul.items {
                @for item in page.items() {
                    (item_entry(item))
                }
            }
            (page_nav(page, prev, next))
        }
    };
    base_document(site_title, heading, content)
}

/// Top-level index of one taxonomy kind: key plus item count.
pub fn taxonomy_index(
    site_title: &str,
    kind: &str,
    entries: &[(String, Vec<ContentItem>)],
    bucket_url: impl Fn(&str) -> String,
) -> Markup {
    let content = html! {
        main {
            h1 { (kind) }
            ul {
                @for (name, items) in entries {
                    li {
                        a href={ "/" (bucket_url(name)) } { (name) }
                        " (" (items.len()) ")"
                    }
                }
            }
        }
    };
    base_document(site_title, kind, content)
}

/// The tag cloud page. The cloud arrives pre-shuffled; weights map to CSS
/// size classes, `tag-1` biggest.
pub fn tag_cloud_page(site_title: &str, cloud: &[TagWeight], tag_url: impl Fn(&str) -> String) -> Markup {
    let content = html! {
        main {
            h1 { "tags" }
            p.cloud {
                @for tw in cloud {
                    span class={ "tag-" (tw.weight) } {
                        a href={ "/" (tag_url(&tw.tag)) } { (tw.tag) }
                    }
                    " "
                }
            }
        }
    };
    base_document(site_title, "tags", content)
}
