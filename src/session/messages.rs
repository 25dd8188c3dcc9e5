use crate::bridge::BridgeMessage;
use crate::config::ThemeMode;
use serde::Deserialize;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    /// Finger moves right to left: forward.
    Left,
    Right,
}

/// Inputs accepted by the session reducer.
#[derive(Debug, Clone)]
pub enum SessionInput {
    Bridge(BridgeMessage),
    GoToPage(u32),
    NextPage,
    PreviousPage,
    Swipe(SwipeDirection),
    ToggleBookmark,
    Retry,
    ChangeFontSize(i32),
    SetTheme(ThemeMode),
    CycleTheme,
    ToggleFullscreen,
    Interaction(Instant),
    Tick(Instant),
}
