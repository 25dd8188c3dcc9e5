use std::sync::mpsc::Sender;
use tracing::debug;

/// Callbacks the parent registers for session events.
pub trait SessionObserver {
    fn on_page_change(&mut self, _page: u32, _total_pages: u32) {}
    fn on_load_error(&mut self, _message: &str) {}
    fn on_load_complete(&mut self) {}
}

pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum HandleRequest {
    GoToPage(u32),
}

/// Imperative handle given to the parent; requests run on the next pump.
#[derive(Debug, Clone)]
pub struct ReaderHandle {
    pub(super) tx: Sender<HandleRequest>,
}

impl ReaderHandle {
    /// Returns false once the controller is gone.
    pub fn go_to_page(&self, page: u32) -> bool {
        let delivered = self.tx.send(HandleRequest::GoToPage(page)).is_ok();
        if !delivered {
            debug!(page, "Reader handle used after teardown");
        }
        delivered
    }
}
