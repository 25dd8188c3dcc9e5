use super::loader::{DocumentInfo, DocumentLoader, LoadFailure, LoadFailureKind, LoadToken};
use super::signal::{ViewerSignal, parse_page_indicator};
use super::surface::{SurfaceCommand, ViewerSurface};
use crate::bridge::{BridgeMessage, BridgeTransport};
use crate::config::ThemeMode;
use crate::session::{MAX_FONT_SIZE, MIN_FONT_SIZE, scale_for_font_size};
use crate::theme::Palette;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterStatus {
    Idle,
    Loading { generation: u64 },
    Open,
    Failed,
}

struct LoadOutcome {
    generation: u64,
    result: Result<DocumentInfo, LoadFailure>,
}

/// Document-side half of the bridge.
///
/// Owns the rendering surface: loads it, turns its signals into normalized
/// bridge events, and applies host commands to it.
pub struct ViewerAdapter<S: ViewerSurface> {
    bridge: BridgeTransport,
    surface: S,
    loader: Arc<dyn DocumentLoader>,
    viewer_url: String,
    document_url: String,
    theme: ThemeMode,
    font_size: u32,
    status: AdapterStatus,
    generation: u64,
    active_token: Option<LoadToken>,
    outcomes_tx: Sender<LoadOutcome>,
    outcomes_rx: Receiver<LoadOutcome>,
    total_pages: u32,
    pending_page: Option<u32>,
    last_reported: Option<(u32, u32)>,
}

impl<S: ViewerSurface> ViewerAdapter<S> {
    pub fn new(
        bridge: BridgeTransport,
        surface: S,
        loader: Arc<dyn DocumentLoader>,
        viewer_url: impl Into<String>,
        document_url: impl Into<String>,
        theme: ThemeMode,
        font_size: u32,
    ) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::channel();
        Self {
            bridge,
            surface,
            loader,
            viewer_url: viewer_url.into(),
            document_url: document_url.into(),
            theme,
            font_size: font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
            status: AdapterStatus::Idle,
            generation: 0,
            active_token: None,
            outcomes_tx,
            outcomes_rx,
            total_pages: 0,
            pending_page: None,
            last_reported: None,
        }
    }

    pub fn status(&self) -> AdapterStatus {
        self.status
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Start loading the surface; any earlier attempt is cancelled first.
    pub fn load(&mut self) {
        if let Some(token) = self.active_token.take() {
            token.cancel();
        }
        self.generation = self.generation.wrapping_add(1).max(1);
        let generation = self.generation;
        let token = LoadToken::new(generation);
        self.active_token = Some(token.clone());
        self.status = AdapterStatus::Loading { generation };
        self.total_pages = 0;
        self.pending_page = None;
        self.last_reported = None;

        info!(url = %self.document_url, generation, "Loading document surface");
        let loader = Arc::clone(&self.loader);
        let url = self.document_url.clone();
        let tx = self.outcomes_tx.clone();
        thread::spawn(move || {
            let result = loader.preflight(&url, &token);
            if tx.send(LoadOutcome { generation, result }).is_err() {
                debug!(generation, "Adapter torn down before load finished");
            }
        });
    }

    /// Reload the surface from scratch after a failure or on host request.
    pub fn retry(&mut self) {
        info!(url = %self.document_url, "Reloading document surface");
        if let Err(err) = self.surface.apply(SurfaceCommand::Close) {
            debug!("Closing surface before reload failed: {err}");
        }
        self.load();
    }

    /// Apply finished load attempts without blocking. Returns true if one was applied.
    pub fn poll_load(&mut self) -> bool {
        let mut applied = false;
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            applied |= self.finish_load(outcome);
        }
        applied
    }

    /// Block until the current load attempt finishes or the timeout passes.
    pub fn await_load(&mut self, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        while matches!(self.status, AdapterStatus::Loading { .. }) {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match self.outcomes_rx.recv_timeout(remaining) {
                Ok(outcome) => {
                    self.finish_load(outcome);
                }
                Err(_) => return false,
            }
        }
        true
    }

    fn finish_load(&mut self, outcome: LoadOutcome) -> bool {
        if outcome.generation != self.generation
            || !matches!(self.status, AdapterStatus::Loading { .. })
        {
            debug!(
                generation = outcome.generation,
                current = self.generation,
                "Discarding superseded load result"
            );
            return false;
        }
        self.active_token = None;
        match outcome.result {
            Ok(info) => {
                let open = SurfaceCommand::Open {
                    viewer_url: self.viewer_url.clone(),
                    document_url: info.url,
                    palette: Palette::from(self.theme),
                    scale: scale_for_font_size(self.font_size),
                };
                match self.surface.apply(open) {
                    Ok(()) => self.status = AdapterStatus::Open,
                    Err(err) => self.fail(format!("The reader could not open the document: {err}")),
                }
            }
            Err(failure) if failure.kind == LoadFailureKind::Cancelled => {
                debug!("Load cancelled: {failure}");
            }
            Err(failure) => self.fail(failure.message),
        }
        true
    }

    fn fail(&mut self, message: String) {
        warn!(%message, "Document surface failed to load");
        self.status = AdapterStatus::Failed;
        self.post(BridgeMessage::LoadFailed { message });
    }

    fn post(&mut self, message: BridgeMessage) {
        if let Err(err) = self.bridge.send(&message) {
            warn!(tag = message.tag(), "Bridge send failed: {err}");
        }
    }

    /// Translate one surface signal into normalized bridge events.
    pub fn observe(&mut self, signal: ViewerSignal) {
        if self.status != AdapterStatus::Open {
            debug!(?signal, status = ?self.status, "Ignoring signal from inactive surface");
            return;
        }
        match signal {
            ViewerSignal::PagesLoaded { pages_count } => {
                if pages_count == 0 {
                    debug!("Ignoring empty page count");
                    return;
                }
                self.total_pages = pages_count;
                self.post(BridgeMessage::DocumentLoaded {
                    total_pages: pages_count,
                });
                if let Some(page) = self.pending_page.take() {
                    self.report_page(page, pages_count);
                }
            }
            ViewerSignal::PageChanging {
                page_number,
                pages_count,
            } => {
                let total = pages_count.filter(|count| *count > 0).unwrap_or(self.total_pages);
                if total == 0 {
                    self.pending_page = Some(page_number);
                    return;
                }
                self.total_pages = total;
                self.report_page(page_number, total);
            }
            ViewerSignal::PageIndicator { text } => match parse_page_indicator(&text) {
                Some((page, total)) => {
                    self.total_pages = total;
                    self.report_page(page, total);
                }
                None => debug!(%text, "Page indicator not recognized"),
            },
            ViewerSignal::DocumentLoadError { message } => self.fail(message),
        }
    }

    fn report_page(&mut self, page: u32, total: u32) {
        if page == 0 || page > total {
            debug!(page, total, "Ignoring out-of-range page signal");
            return;
        }
        if self.last_reported == Some((page, total)) {
            return;
        }
        self.last_reported = Some((page, total));
        self.post(BridgeMessage::PageChanged {
            page,
            total_pages: total,
        });
    }

    /// Apply every queued host command to the surface.
    pub fn pump(&mut self) -> usize {
        let commands = self.bridge.pump();
        let count = commands.len();
        for command in commands {
            self.handle_command(command);
        }
        count
    }

    fn handle_command(&mut self, command: BridgeMessage) {
        if !command.is_command() {
            debug!(tag = command.tag(), "Ignoring event sent to the document side");
            return;
        }
        match command {
            BridgeMessage::Reload => self.retry(),
            BridgeMessage::GoToPage { page } => {
                if self.status != AdapterStatus::Open {
                    debug!(page, "Dropping navigation while surface is not open");
                    return;
                }
                if page == 0 || (self.total_pages > 0 && page > self.total_pages) {
                    debug!(page, total = self.total_pages, "Dropping out-of-range navigation");
                    return;
                }
                self.apply_to_surface(SurfaceCommand::Navigate { page });
            }
            BridgeMessage::ChangeFontSize { delta } => {
                let next = (self.font_size as i64 + delta as i64)
                    .clamp(MIN_FONT_SIZE as i64, MAX_FONT_SIZE as i64) as u32;
                if next == self.font_size {
                    return;
                }
                self.font_size = next;
                self.apply_to_surface(SurfaceCommand::Zoom {
                    scale: scale_for_font_size(next),
                });
            }
            BridgeMessage::ChangeTheme { theme } => {
                self.theme = theme.unwrap_or_else(|| self.theme.next());
                self.apply_to_surface(SurfaceCommand::Theme {
                    palette: Palette::from(self.theme),
                });
            }
            BridgeMessage::PageChanged { .. }
            | BridgeMessage::DocumentLoaded { .. }
            | BridgeMessage::LoadFailed { .. } => {}
        }
    }

    fn apply_to_surface(&mut self, command: SurfaceCommand) {
        if let Err(err) = self.surface.apply(command) {
            warn!("Surface command failed: {err}");
        }
    }

    /// Cancel in-flight work and close the surface.
    pub fn teardown(mut self) -> S {
        if let Some(token) = self.active_token.take() {
            token.cancel();
        }
        self.apply_to_surface(SurfaceCommand::Close);
        self.surface
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Loader with scripted results, consumed in order; the last one repeats.
    pub(crate) struct ScriptedLoader {
        results: Mutex<Vec<Result<(), LoadFailure>>>,
    }

    impl ScriptedLoader {
        pub(crate) fn new(results: Vec<Result<(), LoadFailure>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results),
            })
        }

        pub(crate) fn ok() -> Arc<Self> {
            Self::new(vec![Ok(())])
        }
    }

    impl DocumentLoader for ScriptedLoader {
        fn preflight(
            &self,
            document_url: &str,
            token: &LoadToken,
        ) -> Result<DocumentInfo, LoadFailure> {
            token.check_cancelled("scripted")?;
            let next = match self.results.lock() {
                Ok(mut results) if results.len() > 1 => results.remove(0),
                Ok(results) => results.first().cloned().unwrap_or(Ok(())),
                Err(_) => Ok(()),
            };
            next.map(|()| DocumentInfo {
                url: document_url.to_string(),
                content_type: Some("application/pdf".to_string()),
                content_length: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedLoader;
    use super::*;
    use crate::viewer::surface::testing::RecordingSurface;
    use std::sync::Mutex;

    const WAIT: Duration = Duration::from_secs(5);

    fn open_adapter(
        loader: Arc<dyn DocumentLoader>,
    ) -> (ViewerAdapter<RecordingSurface>, BridgeTransport, RecordingSurface) {
        let (host, document) = BridgeTransport::pair();
        let surface = RecordingSurface::default();
        let mut adapter = ViewerAdapter::new(
            document,
            surface.clone(),
            loader,
            "https://viewer.example.com/viewer.html",
            "https://cdn.example.com/issue.pdf",
            ThemeMode::Light,
            16,
        );
        adapter.load();
        assert!(adapter.await_load(WAIT));
        (adapter, host, surface)
    }

    #[test]
    fn successful_load_opens_surface() {
        let (adapter, _host, surface) = open_adapter(ScriptedLoader::ok());
        assert_eq!(adapter.status(), AdapterStatus::Open);
        let applied = surface.take();
        assert!(matches!(
            applied.as_slice(),
            [SurfaceCommand::Open { document_url, .. }] if document_url == "https://cdn.example.com/issue.pdf"
        ));
    }

    #[test]
    fn failed_load_reports_load_failed() {
        let loader = ScriptedLoader::new(vec![Err(LoadFailure::new(
            LoadFailureKind::Timeout,
            "The document took too long to respond",
        ))]);
        let (adapter, mut host, surface) = open_adapter(loader);

        assert_eq!(adapter.status(), AdapterStatus::Failed);
        assert!(surface.take().is_empty());
        assert_eq!(
            host.pump(),
            vec![BridgeMessage::LoadFailed {
                message: "The document took too long to respond".to_string()
            }]
        );
    }

    #[test]
    fn normalizes_and_dedupes_page_signals() {
        let (mut adapter, mut host, _surface) = open_adapter(ScriptedLoader::ok());

        adapter.observe(ViewerSignal::PageChanging {
            page_number: 1,
            pages_count: None,
        });
        adapter.observe(ViewerSignal::PagesLoaded { pages_count: 10 });
        adapter.observe(ViewerSignal::PageChanging {
            page_number: 1,
            pages_count: Some(10),
        });
        adapter.observe(ViewerSignal::PageIndicator {
            text: "2 of 10".to_string(),
        });
        adapter.observe(ViewerSignal::PageIndicator {
            text: "<span>??</span>".to_string(),
        });

        assert_eq!(
            host.pump(),
            vec![
                BridgeMessage::DocumentLoaded { total_pages: 10 },
                BridgeMessage::PageChanged {
                    page: 1,
                    total_pages: 10
                },
                BridgeMessage::PageChanged {
                    page: 2,
                    total_pages: 10
                },
            ]
        );
    }

    #[test]
    fn host_commands_drive_the_surface() {
        let (mut adapter, mut host, surface) = open_adapter(ScriptedLoader::ok());
        adapter.observe(ViewerSignal::PagesLoaded { pages_count: 5 });
        surface.take();

        host.send(&BridgeMessage::GoToPage { page: 4 }).expect("send");
        host.send(&BridgeMessage::GoToPage { page: 9 }).expect("send");
        host.send(&BridgeMessage::ChangeFontSize { delta: 4 }).expect("send");
        host.send(&BridgeMessage::ChangeTheme { theme: None }).expect("send");
        assert_eq!(adapter.pump(), 4);

        let applied = surface.take();
        assert_eq!(applied.len(), 3);
        assert_eq!(applied[0], SurfaceCommand::Navigate { page: 4 });
        assert_eq!(
            applied[1],
            SurfaceCommand::Zoom {
                scale: scale_for_font_size(20)
            }
        );
        assert_eq!(
            applied[2],
            SurfaceCommand::Theme {
                palette: Palette::from(ThemeMode::Dark)
            }
        );
    }

    #[test]
    fn reload_command_restarts_loading_with_new_generation() {
        let loader = ScriptedLoader::new(vec![
            Err(LoadFailure::new(LoadFailureKind::Network, "offline")),
            Ok(()),
        ]);
        let (mut adapter, mut host, surface) = open_adapter(loader);
        assert_eq!(adapter.status(), AdapterStatus::Failed);
        host.pump();

        host.send(&BridgeMessage::Reload).expect("send");
        adapter.pump();
        assert!(matches!(
            adapter.status(),
            AdapterStatus::Loading { generation: 2 }
        ));
        assert!(adapter.await_load(WAIT));
        assert_eq!(adapter.status(), AdapterStatus::Open);
        let applied = surface.take();
        assert!(matches!(applied.first(), Some(SurfaceCommand::Close)));
        assert!(matches!(applied.last(), Some(SurfaceCommand::Open { .. })));
    }

    #[test]
    fn signals_before_open_are_ignored() {
        let (mut host, document) = BridgeTransport::pair();
        let mut adapter = ViewerAdapter::new(
            document,
            RecordingSurface::default(),
            ScriptedLoader::ok(),
            "https://viewer.example.com/viewer.html",
            "https://cdn.example.com/issue.pdf",
            ThemeMode::Light,
            16,
        );
        adapter.observe(ViewerSignal::PagesLoaded { pages_count: 3 });
        assert!(host.pump().is_empty());
    }

    /// Blocks in preflight until released, then reports success.
    struct GatedLoader {
        entered: Mutex<mpsc::Sender<()>>,
        gate: Mutex<mpsc::Receiver<()>>,
        finished: Mutex<mpsc::Sender<()>>,
    }

    impl DocumentLoader for GatedLoader {
        fn preflight(
            &self,
            document_url: &str,
            _token: &LoadToken,
        ) -> Result<DocumentInfo, LoadFailure> {
            if let Ok(entered) = self.entered.lock() {
                let _ = entered.send(());
            }
            if let Ok(gate) = self.gate.lock() {
                let _ = gate.recv_timeout(WAIT);
            }
            if let Ok(finished) = self.finished.lock() {
                let _ = finished.send(());
            }
            Ok(DocumentInfo {
                url: document_url.to_string(),
                content_type: None,
                content_length: None,
            })
        }
    }

    #[test]
    fn load_finishing_after_teardown_is_discarded() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let (finished_tx, finished_rx) = mpsc::channel();
        let loader = Arc::new(GatedLoader {
            entered: Mutex::new(entered_tx),
            gate: Mutex::new(release_rx),
            finished: Mutex::new(finished_tx),
        });
        let (_host, document) = BridgeTransport::pair();
        let surface = RecordingSurface::default();
        let mut adapter = ViewerAdapter::new(
            document,
            surface.clone(),
            loader,
            "https://viewer.example.com/viewer.html",
            "https://cdn.example.com/issue.pdf",
            ThemeMode::Light,
            16,
        );
        adapter.load();
        entered_rx.recv_timeout(WAIT).expect("preflight started");

        let surface = adapter.teardown();
        release_tx.send(()).expect("release loader");
        finished_rx.recv_timeout(WAIT).expect("preflight finished");

        assert_eq!(surface.take(), vec![SurfaceCommand::Close]);
    }

    #[test]
    fn document_load_error_signal_fails_the_surface() {
        let (mut adapter, mut host, _surface) = open_adapter(ScriptedLoader::ok());
        adapter.observe(ViewerSignal::DocumentLoadError {
            message: "Invalid PDF structure".to_string(),
        });
        assert_eq!(adapter.status(), AdapterStatus::Failed);
        assert_eq!(
            host.pump(),
            vec![BridgeMessage::LoadFailed {
                message: "Invalid PDF structure".to_string()
            }]
        );
    }
}
