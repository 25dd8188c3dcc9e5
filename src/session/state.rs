use super::constants::{MAX_FONT_SIZE, MIN_FONT_SIZE};
use crate::config::ThemeMode;
use serde::Serialize;
use ts_rs::TS;

/// Reader-related model for one mounted document.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingSession {
    pub(super) current_page: u32,
    pub(super) total_pages: u32,
    pub(super) progress_percent: f64,
    pub(super) is_bookmarked: bool,
    pub(super) bookmark_page: u32,
    pub(super) font_size: u32,
    pub(super) theme_mode: ThemeMode,
    pub(super) is_fullscreen: bool,
    pub(super) controls_visible: bool,
}

impl ReadingSession {
    pub(super) fn new(font_size: u32, theme_mode: ThemeMode) -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
            progress_percent: 0.0,
            is_bookmarked: false,
            bookmark_page: 1,
            font_size: font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
            theme_mode,
            is_fullscreen: false,
            controls_visible: true,
        }
    }

    pub(super) fn set_position(&mut self, page: u32, total_pages: u32) {
        self.total_pages = total_pages;
        self.current_page = page.clamp(1, total_pages.max(1));
        self.recompute_progress();
    }

    /// Back to page 1 of an unknown page count; preferences and bookmark stay.
    pub(super) fn reset_position(&mut self) {
        self.current_page = 1;
        self.total_pages = 0;
        self.recompute_progress();
    }

    pub(super) fn recompute_progress(&mut self) {
        self.progress_percent = if self.total_pages == 0 {
            0.0
        } else {
            (self.current_page as f64 * 100.0 / self.total_pages as f64).clamp(0.0, 100.0)
        };
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn progress_percent(&self) -> f64 {
        self.progress_percent
    }

    pub fn is_bookmarked(&self) -> bool {
        self.is_bookmarked
    }

    pub fn bookmark_page(&self) -> u32 {
        self.bookmark_page
    }

    pub fn font_size(&self) -> u32 {
        self.font_size
    }

    pub fn theme_mode(&self) -> ThemeMode {
        self.theme_mode
    }

    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    pub fn controls_visible(&self) -> bool {
        self.controls_visible
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Ready,
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SessionStatus {
    Loading,
    Ready,
    Failed,
}

/// Serializable view of the session handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReadingSnapshot {
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,
    pub current_page: u32,
    pub total_pages: u32,
    pub progress_percent: f64,
    pub is_bookmarked: bool,
    pub bookmark_page: u32,
    pub font_size: u32,
    pub theme: ThemeMode,
    pub is_fullscreen: bool,
    pub controls_visible: bool,
}

impl ReadingSnapshot {
    pub(super) fn capture(session: &ReadingSession, phase: &SessionPhase) -> Self {
        let (status, error) = match phase {
            SessionPhase::Loading => (SessionStatus::Loading, None),
            SessionPhase::Ready => (SessionStatus::Ready, None),
            SessionPhase::Failed { message } => (SessionStatus::Failed, Some(message.clone())),
        };
        Self {
            status,
            error,
            current_page: session.current_page,
            total_pages: session.total_pages,
            progress_percent: session.progress_percent,
            is_bookmarked: session.is_bookmarked,
            bookmark_page: session.bookmark_page,
            font_size: session.font_size,
            theme: session.theme_mode,
            is_fullscreen: session.is_fullscreen,
            controls_visible: session.controls_visible,
        }
    }
}
