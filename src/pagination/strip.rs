//! Page-number strip with ellipses, as rendered under every list view.

use serde::Serialize;
use std::fmt;

/// Upper bound on the tokens [`page_strip`] emits: first, last, current and two gaps.
pub const MAX_STRIP_TOKENS: usize = 5;

/// Strips for at most this many pages list every page number.
const FULL_STRIP_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "page")]
pub enum PageToken {
    Page(usize),
    Ellipsis,
}

impl PageToken {
    pub fn page(&self) -> Option<usize> {
        match self {
            Self::Page(page) => Some(*page),
            Self::Ellipsis => None,
        }
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(page) => write!(f, "{page}"),
            Self::Ellipsis => f.write_str("..."),
        }
    }
}

/// Build the page strip for `current_page` out of `total_pages`.
///
/// Up to three pages are listed in full. Beyond that the strip always holds
/// the first and last page, the current page when it is neither, and an
/// ellipsis on each side where pages are hidden. `current_page` is clamped
/// into range first and a `total_pages` of zero counts as one page.
pub fn page_strip(total_pages: usize, current_page: usize) -> Vec<PageToken> {
    let total_pages = total_pages.max(1);
    let current_page = current_page.clamp(1, total_pages);

    if total_pages <= FULL_STRIP_LIMIT {
        return (1..=total_pages).map(PageToken::Page).collect();
    }

    let mut tokens = Vec::with_capacity(MAX_STRIP_TOKENS);
    tokens.push(PageToken::Page(1));
    if current_page > 2 {
        tokens.push(PageToken::Ellipsis);
    }
    if current_page > 1 && current_page < total_pages {
        tokens.push(PageToken::Page(current_page));
    }
    if current_page < total_pages - 1 {
        tokens.push(PageToken::Ellipsis);
    }
    tokens.push(PageToken::Page(total_pages));
    tokens
}

/// Render a strip as `1 ... 4 ... 9`, marking the active page with brackets.
pub fn render_strip(tokens: &[PageToken], current_page: usize) -> String {
    tokens
        .iter()
        .map(|token| match token {
            PageToken::Page(page) if *page == current_page => format!("[{page}]"),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
