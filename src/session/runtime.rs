use super::{Effect, ReadingController};
use crate::cache::SavedProgress;
use tracing::{debug, warn};

impl ReadingController {
    pub(super) fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Send(message) => {
                if let Err(err) = self.bridge.send(&message) {
                    warn!(tag = message.tag(), code = %err.code, "Bridge send failed: {err}");
                }
            }
            Effect::NotifyPageChange { page, total_pages } => {
                self.observer.on_page_change(page, total_pages)
            }
            Effect::NotifyLoadError(message) => self.observer.on_load_error(&message),
            Effect::NotifyLoadComplete => self.observer.on_load_complete(),
            Effect::SaveProgress => self.persist_progress(),
        }
    }

    fn persist_progress(&self) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let progress = SavedProgress {
            last_page: self.session.current_page,
            is_bookmarked: self.session.is_bookmarked,
            bookmark_page: self.session.bookmark_page,
        };
        if progress.last_page <= 1 && !progress.is_bookmarked {
            if let Err(err) = store.clear(&self.document_url) {
                warn!("Failed to clear reading progress: {err:#}");
            }
            return;
        }
        match store.save(&self.document_url, &progress) {
            Ok(()) => debug!(page = progress.last_page, "Saved reading progress"),
            Err(err) => warn!("Failed to save reading progress: {err:#}"),
        }
    }
}
