use anyhow::{anyhow, Result};
use scraper::{ElementRef, Selector};

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {}: {}", css, e))
}

/// Text of an element with every text node trimmed and empty nodes dropped,
/// joined without a separator.
pub fn stripped_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Removes the `(H)` / `(A)` home and away markers from a participant label.
pub fn strip_home_away(label: &str) -> String {
    label.replace("(H)", "").replace("(A)", "").trim().to_string()
}

pub fn has_class(element: &ElementRef, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}
