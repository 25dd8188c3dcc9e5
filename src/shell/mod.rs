//! Presentation shell: the state of the chrome around the reading surface.
//!
//! Nothing here renders. The shell view is re-derived from a session
//! snapshot after every update, and the controls auto-hide through a single
//! deadline that every interaction replaces.

use crate::config::ThemeMode;
use crate::session::{ReadingSnapshot, SessionStatus};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::warn;
use ts_rs::TS;

/// One outstanding auto-hide deadline at most.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoHideTimer {
    delay: Option<Duration>,
    deadline: Option<Instant>,
}

impl AutoHideTimer {
    /// A zero delay disables auto-hide.
    pub fn new(delay_secs: f32) -> Self {
        let delay = if delay_secs > 0.0 {
            match Duration::try_from_secs_f32(delay_secs) {
                Ok(delay) => Some(delay),
                Err(err) => {
                    warn!(delay_secs, "Auto-hide disabled: {err}");
                    None
                }
            }
        } else {
            None
        };
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.delay.is_some()
    }

    /// Replace any pending deadline with one measured from `now`.
    pub fn reschedule(&mut self, now: Instant) {
        self.deadline = self.delay.map(|delay| now + delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

/// Everything the chrome needs to draw itself.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ShellView {
    pub title: String,
    pub page_label: String,
    pub progress_fraction: f64,
    pub can_go_previous: bool,
    pub can_go_next: bool,
    pub controls_visible: bool,
    pub show_spinner: bool,
    pub show_retry: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error_message: Option<String>,
    pub is_bookmarked: bool,
    pub theme: ThemeMode,
    pub is_fullscreen: bool,
}

impl ShellView {
    pub fn derive(title: &str, snapshot: &ReadingSnapshot) -> Self {
        let ready = snapshot.status == SessionStatus::Ready;
        let page_label = match snapshot.status {
            SessionStatus::Loading => "Loading…".to_string(),
            SessionStatus::Failed => "Unavailable".to_string(),
            SessionStatus::Ready => format!("{} / {}", snapshot.current_page, snapshot.total_pages),
        };
        ShellView {
            title: title.to_string(),
            page_label,
            progress_fraction: (snapshot.progress_percent / 100.0).clamp(0.0, 1.0),
            can_go_previous: ready && snapshot.current_page > 1,
            can_go_next: ready && snapshot.current_page < snapshot.total_pages,
            controls_visible: snapshot.controls_visible,
            show_spinner: snapshot.status == SessionStatus::Loading,
            show_retry: snapshot.status == SessionStatus::Failed,
            error_message: snapshot.error.clone(),
            is_bookmarked: snapshot.is_bookmarked,
            theme: snapshot.theme,
            is_fullscreen: snapshot.is_fullscreen,
        }
    }
}
