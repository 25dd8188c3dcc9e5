use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Raw state signals posted by the host page around the third-party viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "event", rename_all = "lowercase")]
#[ts(export)]
pub enum ViewerSignal {
    PageChanging {
        #[serde(rename = "pageNumber")]
        page_number: u32,
        #[serde(default, rename = "pagesCount", skip_serializing_if = "Option::is_none")]
        #[ts(optional)]
        pages_count: Option<u32>,
    },
    PagesLoaded {
        #[serde(rename = "pagesCount")]
        pages_count: u32,
    },
    DocumentLoadError {
        message: String,
    },
    /// Page-indicator text scraped from viewer builds that do not publish events.
    PageIndicator {
        text: String,
    },
}

static RE_PAGE_INDICATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:page\s*)?(\d+)\s*(?:/|of)\s*(\d+)\s*$").unwrap()
});

/// Parse indicator text such as `3 of 40`, `Page 3 / 40` or `(3 of 40)`.
///
/// Returns `None` for anything that does not look like a valid position.
pub fn parse_page_indicator(text: &str) -> Option<(u32, u32)> {
    let cleaned = text.trim().trim_start_matches('(').trim_end_matches(')');
    let caps = RE_PAGE_INDICATOR.captures(cleaned)?;
    let page = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let total = caps.get(2)?.as_str().parse::<u32>().ok()?;
    if page == 0 || total == 0 || page > total {
        return None;
    }
    Some((page, total))
}
