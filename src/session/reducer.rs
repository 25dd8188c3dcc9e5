use super::constants::{MAX_FONT_SIZE, MIN_FONT_SIZE};
use super::messages::{SessionInput, SwipeDirection};
use super::state::SessionPhase;
use super::{Effect, ReadingController};
use crate::bridge::BridgeMessage;
use crate::config::ThemeMode;
use std::time::Instant;
use tracing::{debug, info, warn};

impl ReadingController {
    pub(super) fn reduce(&mut self, input: SessionInput, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();

        match input {
            SessionInput::Bridge(message) => self.handle_bridge_message(message, now, &mut effects),
            SessionInput::GoToPage(page) => self.handle_go_to_page(page, &mut effects),
            SessionInput::NextPage => self.handle_next_page(&mut effects),
            SessionInput::PreviousPage => self.handle_previous_page(&mut effects),
            SessionInput::Swipe(direction) => self.handle_swipe(direction, &mut effects),
            SessionInput::ToggleBookmark => self.handle_toggle_bookmark(&mut effects),
            SessionInput::Retry => self.handle_retry(&mut effects),
            SessionInput::ChangeFontSize(delta) => self.handle_font_size_changed(delta, &mut effects),
            SessionInput::SetTheme(theme) => self.handle_set_theme(theme, &mut effects),
            SessionInput::CycleTheme => {
                self.handle_set_theme(self.session.theme_mode.next(), &mut effects)
            }
            SessionInput::ToggleFullscreen => {
                self.session.is_fullscreen = !self.session.is_fullscreen;
            }
            SessionInput::Interaction(at) => self.handle_interaction(at),
            SessionInput::Tick(at) => self.handle_tick(at),
        }

        effects
    }

    fn handle_bridge_message(
        &mut self,
        message: BridgeMessage,
        now: Instant,
        effects: &mut Vec<Effect>,
    ) {
        if matches!(self.phase, SessionPhase::Failed { .. }) {
            debug!(tag = message.tag(), "Ignoring bridge event while failed");
            return;
        }
        match message {
            BridgeMessage::DocumentLoaded { total_pages } => {
                self.handle_document_loaded(total_pages, now, effects)
            }
            BridgeMessage::PageChanged { page, total_pages } => {
                self.handle_page_changed(page, total_pages, now, effects)
            }
            BridgeMessage::LoadFailed { message } => self.handle_load_failed(message, effects),
            command => debug!(tag = command.tag(), "Ignoring command echoed to the host"),
        }
    }

    fn handle_document_loaded(&mut self, total_pages: u32, now: Instant, effects: &mut Vec<Effect>) {
        if total_pages == 0 {
            debug!("Ignoring document load with no pages");
            return;
        }
        let page = self.session.current_page.min(total_pages);
        self.session.set_position(page, total_pages);
        if self.phase == SessionPhase::Loading {
            self.enter_ready(now, effects);
        }
    }

    fn handle_page_changed(
        &mut self,
        page: u32,
        total_pages: u32,
        now: Instant,
        effects: &mut Vec<Effect>,
    ) {
        if page == 0 || total_pages == 0 || page > total_pages {
            debug!(page, total = total_pages, "Ignoring invalid page change");
            return;
        }
        self.session.set_position(page, total_pages);
        if self.phase == SessionPhase::Loading {
            self.enter_ready(now, effects);
        }
        debug!(page, total = total_pages, progress = self.session.progress_percent, "Page changed");
        effects.push(Effect::NotifyPageChange { page, total_pages });
    }

    fn enter_ready(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        self.phase = SessionPhase::Ready;
        self.session.controls_visible = true;
        self.timer.reschedule(now);
        info!(total = self.session.total_pages, "Document ready");
        effects.push(Effect::NotifyLoadComplete);

        // Consumed on the first ready transition, whichever event caused it.
        let (page, total_pages) = (self.session.current_page, self.session.total_pages);
        if let Some(target) = self.resume_page.take() {
            if target > 1 && target <= total_pages && target != page {
                info!(page = target, total = total_pages, "Resuming at last read page");
                effects.push(Effect::Send(BridgeMessage::GoToPage { page: target }));
            }
        }
    }

    fn handle_load_failed(&mut self, message: String, effects: &mut Vec<Effect>) {
        warn!(%message, "Document failed to load");
        self.phase = SessionPhase::Failed {
            message: message.clone(),
        };
        self.timer.cancel();
        self.session.controls_visible = true;
        effects.push(Effect::NotifyLoadError(message));
    }

    fn handle_go_to_page(&mut self, page: u32, effects: &mut Vec<Effect>) {
        if self.phase != SessionPhase::Ready {
            debug!(page, "Ignoring page request before the document is ready");
            return;
        }
        if page == 0 || page > self.session.total_pages {
            debug!(page, total = self.session.total_pages, "Ignoring out-of-range page request");
            return;
        }
        effects.push(Effect::Send(BridgeMessage::GoToPage { page }));
    }

    fn handle_next_page(&mut self, effects: &mut Vec<Effect>) {
        self.handle_go_to_page(self.session.current_page.saturating_add(1), effects);
    }

    fn handle_previous_page(&mut self, effects: &mut Vec<Effect>) {
        if self.session.current_page > 1 {
            self.handle_go_to_page(self.session.current_page - 1, effects);
        }
    }

    fn handle_swipe(&mut self, direction: SwipeDirection, effects: &mut Vec<Effect>) {
        if !self.swipe_navigation {
            return;
        }
        match direction {
            SwipeDirection::Left => self.handle_next_page(effects),
            SwipeDirection::Right => self.handle_previous_page(effects),
        }
    }

    fn handle_toggle_bookmark(&mut self, effects: &mut Vec<Effect>) {
        self.session.bookmark_page = self.session.current_page;
        self.session.is_bookmarked = !self.session.is_bookmarked;
        info!(
            page = self.session.bookmark_page,
            bookmarked = self.session.is_bookmarked,
            "Bookmark toggled"
        );
        if self.store.is_some() && self.phase == SessionPhase::Ready {
            effects.push(Effect::SaveProgress);
        }
    }

    fn handle_retry(&mut self, effects: &mut Vec<Effect>) {
        if !matches!(self.phase, SessionPhase::Failed { .. }) {
            debug!(phase = ?self.phase, "Retry ignored outside the failed state");
            return;
        }
        info!(url = %self.document_url, "Retrying document load");
        self.phase = SessionPhase::Loading;
        self.session.reset_position();
        self.session.controls_visible = true;
        self.timer.cancel();
        effects.push(Effect::Send(BridgeMessage::Reload));
    }

    fn handle_font_size_changed(&mut self, delta: i32, effects: &mut Vec<Effect>) {
        let current = self.session.font_size as i64;
        let next = (current + delta as i64).clamp(MIN_FONT_SIZE as i64, MAX_FONT_SIZE as i64);
        let applied = next - current;
        if applied == 0 {
            return;
        }
        self.session.font_size = next as u32;
        effects.push(Effect::Send(BridgeMessage::ChangeFontSize {
            delta: applied as i32,
        }));
    }

    fn handle_set_theme(&mut self, theme: ThemeMode, effects: &mut Vec<Effect>) {
        if self.session.theme_mode == theme {
            return;
        }
        self.session.theme_mode = theme;
        effects.push(Effect::Send(BridgeMessage::ChangeTheme { theme: Some(theme) }));
    }

    fn handle_interaction(&mut self, now: Instant) {
        self.session.controls_visible = true;
        if self.phase == SessionPhase::Ready {
            self.timer.reschedule(now);
        }
    }

    fn handle_tick(&mut self, now: Instant) {
        if !self.timer.expired(now) {
            return;
        }
        self.timer.cancel();
        if self.session.controls_visible {
            debug!("Auto-hiding reader controls");
            self.session.controls_visible = false;
        }
    }
}
