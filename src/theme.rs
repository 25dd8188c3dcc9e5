//! Colour palettes pushed into the embedded viewer for each reading theme.

use crate::config::ThemeMode;
use serde::Serialize;
use ts_rs::TS;

/// CSS values the host page applies to the viewer container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Palette {
    pub theme: ThemeMode,
    pub background: String,
    pub foreground: String,
    /// CSS `filter` applied to rendered pages; dark mode inverts page canvases.
    pub page_filter: String,
}

impl From<ThemeMode> for Palette {
    fn from(mode: ThemeMode) -> Self {
        let (background, foreground, page_filter) = match mode {
            ThemeMode::Light => ("#ffffff", "#1f1f1f", "none"),
            ThemeMode::Dark => ("#121212", "#e6e6e6", "invert(0.92) hue-rotate(180deg)"),
            ThemeMode::Sepia => ("#f4ecd8", "#5b4636", "sepia(0.6) contrast(0.95)"),
        };
        Palette {
            theme: mode,
            background: background.to_string(),
            foreground: foreground.to_string(),
            page_filter: page_filter.to_string(),
        }
    }
}
