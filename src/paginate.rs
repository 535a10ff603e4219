//! Pagination: slicing ordered item sequences into bounded pages.
//!
//! A [`Paginator`] wraps an ordered slice and hands out ephemeral [`Page`]
//! views on demand; nothing here is persisted. The math follows two rules:
//!
//! - `per_page == 0` means one page containing everything.
//! - `orphans` is the minimum trailing item count that must not be stranded
//!   alone on a final page: when the items after a page boundary number
//!   `orphans` or fewer, they fold into that page instead of forming their
//!   own.
//!
//! `page_count` is a hard "at least one page always exists" guarantee, even
//! for an empty sequence — listing phases always render page 1.
//!
//! ## Output naming
//!
//! Paginated output names come from an ordered rule list (see
//! [`PaginationRule`](crate::config::PaginationRule)); the selected rule is
//! the **last** one whose `min_page` is `<=` the page number. Rule templates
//! see `{name}`, `{number}`, `{number_sep}`, and `{extension}`, where
//! `{number}` and `{number_sep}` are empty on page 1 so the first page keeps
//! the unpaginated name.

use crate::config::PaginationRule;

/// Slices an ordered sequence into bounded pages.
#[derive(Debug)]
pub struct Paginator<'a, T> {
    items: &'a [T],
    per_page: usize,
    orphans: usize,
}

impl<'a, T> Paginator<'a, T> {
    pub fn new(items: &'a [T], per_page: usize, orphans: usize) -> Self {
        Self {
            items,
            per_page,
            orphans,
        }
    }

    /// Page size with the "0 means everything" rule applied.
    fn effective_per_page(&self) -> usize {
        if self.per_page == 0 {
            self.items.len()
        } else {
            self.per_page
        }
    }

    /// Number of pages: `ceil(max(1, total - orphans) / per_page)`.
    ///
    /// The division happens in floating point to avoid truncation, with a
    /// zero `per_page` treated as 1 for the division only (everything-on-one
    /// -page over an empty sequence would otherwise divide by zero). The
    /// `max(1, ...)` floor makes `page_count` of an empty sequence 1.
    pub fn page_count(&self) -> usize {
        let hits = self.items.len().saturating_sub(self.orphans).max(1);
        let per_page = self.effective_per_page().max(1);
        (hits as f64 / per_page as f64).ceil() as usize
    }

    /// The 1-based `n`th page.
    ///
    /// When the items past this page's normal end number `orphans` or fewer,
    /// they are folded in rather than left for a final page of their own.
    pub fn page(&self, number: usize) -> Page<'a, T> {
        let total = self.items.len();
        let per_page = self.effective_per_page();
        let bottom = ((number - 1) * per_page).min(total);
        let mut top = (bottom + per_page).min(total);
        if top + self.orphans >= total {
            top = total;
        }
        Page {
            items: &self.items[bottom..top],
            number,
            bottom,
            total,
            num_pages: self.page_count(),
        }
    }

    /// All pages in order, for phases that render every page.
    pub fn pages(&self) -> Vec<Page<'a, T>> {
        (1..=self.page_count()).map(|n| self.page(n)).collect()
    }
}

/// Ephemeral view of one page of items. Created on demand, never stored.
#[derive(Debug)]
pub struct Page<'a, T> {
    items: &'a [T],
    number: usize,
    bottom: usize,
    total: usize,
    num_pages: usize,
}

impl<'a, T> Page<'a, T> {
    pub fn items(&self) -> &'a [T] {
        self.items
    }

    /// 1-based page number.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_other_pages(&self) -> bool {
        self.has_next() || self.has_previous()
    }

    /// Unchecked: callers must test `has_next` first.
    pub fn next_page_number(&self) -> usize {
        self.number + 1
    }

    /// Unchecked: callers must test `has_previous` first.
    pub fn previous_page_number(&self) -> usize {
        self.number - 1
    }

    /// 1-based index of this page's first item, 0 for an empty sequence.
    pub fn start_index(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.bottom + 1
        }
    }

    /// 1-based index of this page's last item.
    pub fn end_index(&self) -> usize {
        self.bottom + self.items.len()
    }
}

// ============================================================================
// Output naming
// ============================================================================

/// Rendered output identity for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageName {
    pub url: String,
    pub save_as: String,
}

/// Compute the URL and save-as path for a page from the rule list.
///
/// The selected rule is the last whose `min_page` is `<=` the page number;
/// when the page number is below every threshold, the built-in default rule
/// applies. `{name}` and `{extension}` derive from the unpaginated base
/// names (for the url and save-as templates respectively); a leading path
/// separator in the rendered result is stripped.
pub fn page_name(
    rules: &[PaginationRule],
    number: usize,
    base_url: &str,
    base_save_as: &str,
) -> PageName {
    let default_rule = PaginationRule::default();
    let rule = rules
        .iter()
        .filter(|r| r.min_page <= number)
        .next_back()
        .unwrap_or(&default_rule);
    PageName {
        url: expand(&rule.url, number, base_url),
        save_as: expand(&rule.save_as, number, base_save_as),
    }
}

/// Fill one rule template for one page.
fn expand(template: &str, number: usize, base: &str) -> String {
    let (name, extension) = split_extension(base);
    let (num, sep) = if number == 1 {
        (String::new(), "")
    } else {
        (number.to_string(), "/")
    };
    let rendered = template
        .replace("{name}", name)
        .replace("{number_sep}", sep)
        .replace("{number}", &num)
        .replace("{extension}", &extension);
    rendered.trim_start_matches('/').to_string()
}

/// Split `"blog/index.html"` into `("blog/index", ".html")`. The extension
/// split looks only at the final path component.
fn split_extension(base: &str) -> (&str, String) {
    let dot = base
        .rfind('.')
        .filter(|&i| !base[i..].contains('/'));
    match dot {
        Some(i) => (&base[..i], base[i..].to_string()),
        None => (base, String::new()),
    }
}
