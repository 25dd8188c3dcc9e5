//! Reading session controller.
//!
//! Owns the [`ReadingSession`] for one mounted document. Bridge events and
//! user operations go through a pure reducer that returns [`Effect`]s; the
//! runtime then performs them (bridge sends, observer callbacks, progress
//! writes). State is only ever as fresh as the last event from the document.

mod constants;
mod messages;
mod observer;
mod reducer;
mod runtime;
mod state;

use crate::bridge::{BridgeMessage, BridgeTransport};
use crate::cache::ProgressStore;
use crate::config::{AppConfig, ThemeMode};
use crate::shell::AutoHideTimer;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;
use tracing::info;

pub use constants::{
    BASE_FONT_SIZE, FONT_SIZE_STEP, MAX_FONT_SIZE, MIN_FONT_SIZE, scale_for_font_size,
};
pub use messages::{SessionInput, SwipeDirection};
pub use observer::{NoopObserver, ReaderHandle, SessionObserver};
pub use state::{ReadingSession, ReadingSnapshot, SessionPhase, SessionStatus};

use observer::HandleRequest;

/// Describes work that must be performed outside the pure reducer.
#[derive(Debug, Clone, PartialEq)]
enum Effect {
    Send(BridgeMessage),
    NotifyPageChange { page: u32, total_pages: u32 },
    NotifyLoadError(String),
    NotifyLoadComplete,
    SaveProgress,
}

/// Initial preferences for a mounted document.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub document_url: String,
    pub font_size: u32,
    pub theme: ThemeMode,
    pub swipe_navigation: bool,
    pub auto_hide_controls_secs: f32,
}

impl SessionOptions {
    pub fn from_config(config: &AppConfig, document_url: impl Into<String>) -> Self {
        Self {
            document_url: document_url.into(),
            font_size: config.font_size,
            theme: config.theme,
            swipe_navigation: config.swipe_navigation,
            auto_hide_controls_secs: config.auto_hide_controls_secs,
        }
    }
}

pub struct ReadingController {
    bridge: BridgeTransport,
    observer: Box<dyn SessionObserver>,
    session: ReadingSession,
    phase: SessionPhase,
    timer: AutoHideTimer,
    document_url: String,
    swipe_navigation: bool,
    /// Present only when progress is remembered between mounts.
    store: Option<ProgressStore>,
    resume_page: Option<u32>,
    handle_tx: Sender<HandleRequest>,
    handle_rx: Receiver<HandleRequest>,
}

impl ReadingController {
    /// Mount a session in `Loading`, restoring saved progress when a store is given.
    pub fn new(
        bridge: BridgeTransport,
        observer: Box<dyn SessionObserver>,
        options: SessionOptions,
        store: Option<ProgressStore>,
    ) -> Self {
        let (handle_tx, handle_rx) = mpsc::channel();
        let mut session = ReadingSession::new(options.font_size, options.theme);
        let mut resume_page = None;
        if let Some(saved) = store.as_ref().and_then(|store| store.load(&options.document_url)) {
            info!(
                last_page = saved.last_page,
                is_bookmarked = saved.is_bookmarked,
                "Restoring saved reading progress"
            );
            session.is_bookmarked = saved.is_bookmarked;
            session.bookmark_page = saved.bookmark_page.max(1);
            resume_page = Some(saved.last_page);
        }
        info!(url = %options.document_url, "Mounted reading session");
        Self {
            bridge,
            observer,
            session,
            phase: SessionPhase::Loading,
            timer: AutoHideTimer::new(options.auto_hide_controls_secs),
            document_url: options.document_url,
            swipe_navigation: options.swipe_navigation,
            store,
            resume_page,
            handle_tx,
            handle_rx,
        }
    }

    pub fn handle(&self) -> ReaderHandle {
        ReaderHandle {
            tx: self.handle_tx.clone(),
        }
    }

    pub fn session(&self) -> &ReadingSession {
        &self.session
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn document_url(&self) -> &str {
        &self.document_url
    }

    pub fn snapshot(&self) -> ReadingSnapshot {
        ReadingSnapshot::capture(&self.session, &self.phase)
    }

    /// When the controls will auto-hide, if they are scheduled to.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn dispatch(&mut self, input: SessionInput) {
        let now = match &input {
            SessionInput::Interaction(at) | SessionInput::Tick(at) => *at,
            _ => Instant::now(),
        };
        let effects = self.reduce(input, now);
        for effect in effects {
            self.run_effect(effect);
        }
    }

    /// Apply queued handle requests, then every bridge event, in arrival order.
    pub fn pump(&mut self) -> usize {
        let requests: Vec<HandleRequest> = self.handle_rx.try_iter().collect();
        let messages = self.bridge.pump();
        let count = requests.len() + messages.len();
        for request in requests {
            match request {
                HandleRequest::GoToPage(page) => self.dispatch(SessionInput::GoToPage(page)),
            }
        }
        for message in messages {
            self.dispatch(SessionInput::Bridge(message));
        }
        count
    }

    pub fn go_to_page(&mut self, page: u32) {
        self.dispatch(SessionInput::GoToPage(page));
    }

    pub fn next_page(&mut self) {
        self.dispatch(SessionInput::NextPage);
    }

    pub fn previous_page(&mut self) {
        self.dispatch(SessionInput::PreviousPage);
    }

    pub fn swipe(&mut self, direction: SwipeDirection) {
        self.dispatch(SessionInput::Swipe(direction));
    }

    pub fn toggle_bookmark(&mut self) {
        self.dispatch(SessionInput::ToggleBookmark);
    }

    pub fn retry(&mut self) {
        self.dispatch(SessionInput::Retry);
    }

    pub fn change_font_size(&mut self, delta: i32) {
        self.dispatch(SessionInput::ChangeFontSize(delta));
    }

    pub fn set_theme(&mut self, theme: ThemeMode) {
        self.dispatch(SessionInput::SetTheme(theme));
    }

    pub fn cycle_theme(&mut self) {
        self.dispatch(SessionInput::CycleTheme);
    }

    pub fn toggle_fullscreen(&mut self) {
        self.dispatch(SessionInput::ToggleFullscreen);
    }

    pub fn interact(&mut self, now: Instant) {
        self.dispatch(SessionInput::Interaction(now));
    }

    /// Returns true when the controls were hidden by this tick.
    pub fn tick(&mut self, now: Instant) -> bool {
        let was_visible = self.session.controls_visible;
        self.dispatch(SessionInput::Tick(now));
        was_visible && !self.session.controls_visible
    }

    /// Unmount: remember where the reader stopped, then drop the session.
    pub fn teardown(mut self) -> ReadingSnapshot {
        if self.phase == SessionPhase::Ready {
            self.run_effect(Effect::SaveProgress);
        }
        info!(
            url = %self.document_url,
            page = self.session.current_page,
            total = self.session.total_pages,
            "Tearing down reading session"
        );
        self.snapshot()
    }
}
