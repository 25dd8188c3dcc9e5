//! Stdio host driver.
//!
//! One process plays both sides of the bridge: the controller on the host
//! end and the viewer adapter on the document end, joined by an in-memory
//! pair. The webview wrapper talks to us in JSON lines:
//!
//! - stdin carries surface signals (`{"event": ...}`) and user input
//!   (`{"command": ...}`);
//! - stdout carries surface commands (`{"action": ...}`) and shell view
//!   updates (`{"shell": ...}`).
//!
//! Logs go to stderr.

use crate::bridge::{BridgeTransport, FrameSink, LineSink, spawn_line_reader};
use crate::cache::ProgressStore;
use crate::config::{AppConfig, ThemeMode};
use crate::http::{ApiClient, AuthContext};
use crate::session::{
    FONT_SIZE_STEP, ReaderHandle, ReadingController, ReadingSnapshot, SessionObserver,
    SessionOptions, SwipeDirection,
};
use crate::shell::ShellView;
use crate::viewer::{
    DocumentLoader, HttpDocumentLoader, StdioSurface, ViewerAdapter, ViewerSignal, ViewerSurface,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, BufReader, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn default_font_step() -> i32 {
    FONT_SIZE_STEP
}

/// User input forwarded by the webview wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum UserCommand {
    GoToPage {
        page: u32,
    },
    Next,
    Previous,
    ToggleBookmark,
    Retry,
    FontSize {
        #[serde(default = "default_font_step")]
        delta: i32,
    },
    /// Without a theme, cycles to the next one.
    Theme {
        #[serde(default)]
        theme: Option<ThemeMode>,
    },
    Fullscreen,
    Tap,
    Swipe {
        direction: SwipeDirection,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostInput {
    Signal(ViewerSignal),
    Command(UserCommand),
}

/// Classify one stdin line by its discriminating key.
pub fn route_line(line: &str) -> Result<HostInput, String> {
    let value: Value = serde_json::from_str(line).map_err(|err| format!("invalid JSON: {err}"))?;
    let Some(object) = value.as_object() else {
        return Err("expected a JSON object".to_string());
    };
    if object.contains_key("event") {
        serde_json::from_value(value)
            .map(HostInput::Signal)
            .map_err(|err| format!("invalid surface signal: {err}"))
    } else if object.contains_key("command") {
        serde_json::from_value(value)
            .map(HostInput::Command)
            .map_err(|err| format!("invalid user command: {err}"))
    } else {
        Err("line has neither an event nor a command".to_string())
    }
}

#[derive(Serialize)]
struct ShellFrame<'a> {
    shell: &'a ShellView,
}

/// Reports session callbacks to the log.
pub struct LoggingObserver;

impl SessionObserver for LoggingObserver {
    fn on_page_change(&mut self, page: u32, total_pages: u32) {
        info!(page, total = total_pages, "Page change");
    }

    fn on_load_error(&mut self, message: &str) {
        warn!(%message, "Load error; waiting for retry");
    }

    fn on_load_complete(&mut self) {
        info!("Load complete");
    }
}

/// Controller, adapter and view output for one mounted document.
pub struct HostLoop<S: ViewerSurface, W: Write> {
    title: String,
    controller: ReadingController,
    handle: ReaderHandle,
    adapter: ViewerAdapter<S>,
    view_sink: LineSink<W>,
    last_view: Option<ShellView>,
}

impl<S: ViewerSurface, W: Write> HostLoop<S, W> {
    pub fn new(
        title: impl Into<String>,
        controller: ReadingController,
        adapter: ViewerAdapter<S>,
        view_out: W,
    ) -> Self {
        let handle = controller.handle();
        Self {
            title: title.into(),
            controller,
            handle,
            adapter,
            view_sink: LineSink::new(view_out),
            last_view: None,
        }
    }

    pub fn controller(&self) -> &ReadingController {
        &self.controller
    }

    pub fn adapter(&self) -> &ViewerAdapter<S> {
        &self.adapter
    }

    pub fn start(&mut self) {
        self.adapter.load();
        self.emit_view();
    }

    pub fn handle_line(&mut self, line: &str, now: Instant) {
        match route_line(line) {
            Ok(HostInput::Signal(signal)) => {
                trace!(?signal, "Surface signal");
                self.adapter.observe(signal);
            }
            Ok(HostInput::Command(command)) => self.apply_command(command, now),
            Err(reason) => warn!(%reason, "Dropping input line"),
        }
    }

    fn apply_command(&mut self, command: UserCommand, now: Instant) {
        debug!(?command, "User command");
        self.controller.interact(now);
        match command {
            UserCommand::GoToPage { page } => {
                self.handle.go_to_page(page);
            }
            UserCommand::Next => self.controller.next_page(),
            UserCommand::Previous => self.controller.previous_page(),
            UserCommand::ToggleBookmark => self.controller.toggle_bookmark(),
            UserCommand::Retry => self.controller.retry(),
            UserCommand::FontSize { delta } => self.controller.change_font_size(delta),
            UserCommand::Theme { theme: Some(theme) } => self.controller.set_theme(theme),
            UserCommand::Theme { theme: None } => self.controller.cycle_theme(),
            UserCommand::Fullscreen => self.controller.toggle_fullscreen(),
            UserCommand::Tap => {}
            UserCommand::Swipe { direction } => self.controller.swipe(direction),
        }
    }

    /// One turn of the cooperative loop.
    pub fn step(&mut self, now: Instant) {
        self.adapter.poll_load();
        self.controller.pump();
        self.adapter.pump();
        self.controller.pump();
        self.controller.tick(now);
        self.emit_view();
    }

    fn emit_view(&mut self) {
        let view = ShellView::derive(&self.title, &self.controller.snapshot());
        if self.last_view.as_ref() == Some(&view) {
            return;
        }
        let frame = match serde_json::to_string(&ShellFrame { shell: &view }) {
            Ok(frame) => frame,
            Err(err) => {
                warn!("Failed to encode shell view: {err}");
                return;
            }
        };
        if let Err(err) = self.view_sink.send_frame(&frame) {
            warn!("Failed to write shell view: {err}");
        }
        self.last_view = Some(view);
    }

    pub fn shutdown(self) -> (ReadingSnapshot, W) {
        let snapshot = self.controller.teardown();
        self.adapter.teardown();
        (snapshot, self.view_sink.into_inner())
    }
}

pub struct HostOptions {
    pub document_url: String,
    pub title: String,
    pub token: Option<String>,
}

/// Mount the document and serve stdio until input ends or Ctrl+C.
pub fn run_host(config: &AppConfig, options: HostOptions) -> Result<ReadingSnapshot> {
    let auth = AuthContext::new();
    if let Some(token) = options.token {
        auth.login(token);
    }
    let client = ApiClient::new(
        auth,
        config.api_base_url.as_deref(),
        Duration::from_secs(config.load_timeout_secs),
    )?;
    let document_url = client
        .resolve(&options.document_url)
        .context("resolving document URL")?
        .to_string();
    let loader: Arc<dyn DocumentLoader> = Arc::new(HttpDocumentLoader::new(
        client,
        config.allowed_hosts.clone(),
        config.allow_insecure_http,
        config.max_document_bytes(),
    ));

    let (mut host_end, document_end) = BridgeTransport::pair();
    host_end.on_message(|message| trace!(tag = message.tag(), "Bridge event for host"));
    let store = config
        .remember_progress
        .then(|| ProgressStore::new(&config.cache_dir));
    let controller = ReadingController::new(
        host_end,
        Box::new(LoggingObserver),
        SessionOptions::from_config(config, document_url.clone()),
        store,
    );
    let adapter = ViewerAdapter::new(
        document_end,
        StdioSurface::new(io::stdout()),
        loader,
        config.viewer_url.clone(),
        document_url,
        config.theme,
        config.font_size,
    );
    let mut host = HostLoop::new(options.title, controller, adapter, io::stdout());

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    if let Err(err) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C; tearing down reading session");
        flag.store(true, Ordering::SeqCst);
    }) {
        warn!("Failed to install Ctrl+C signal handler: {err}");
    }

    let lines = spawn_line_reader(BufReader::new(io::stdin()), "stdin");
    host.start();
    while !shutdown.load(Ordering::SeqCst) {
        match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => host.handle_line(&line, Instant::now()),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                info!("Input closed");
                host.step(Instant::now());
                break;
            }
        }
        host.step(Instant::now());
    }

    let (snapshot, _) = host.shutdown();
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::NoopObserver;
    use crate::session::SessionStatus;
    use crate::viewer::testing::{RecordingSurface, ScriptedLoader};
    use crate::viewer::{AdapterStatus, SurfaceCommand};

    fn mounted() -> (HostLoop<RecordingSurface, Vec<u8>>, RecordingSurface) {
        let (host_end, document_end) = BridgeTransport::pair();
        let config = AppConfig::default();
        let controller = ReadingController::new(
            host_end,
            Box::new(NoopObserver),
            SessionOptions::from_config(&config, "https://cdn.example.com/issue.pdf"),
            None,
        );
        let surface = RecordingSurface::default();
        let adapter = ViewerAdapter::new(
            document_end,
            surface.clone(),
            ScriptedLoader::ok(),
            config.viewer_url.clone(),
            "https://cdn.example.com/issue.pdf",
            config.theme,
            config.font_size,
        );
        let mut host = HostLoop::new("Issue 12", controller, adapter, Vec::new());
        host.start();
        let deadline = Instant::now() + Duration::from_secs(5);
        while host.adapter().status() != AdapterStatus::Open && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
            host.step(Instant::now());
        }
        (host, surface)
    }

    #[test]
    fn routes_signals_and_commands() {
        assert_eq!(
            route_line(r#"{"event":"pagesloaded","pagesCount":3}"#),
            Ok(HostInput::Signal(ViewerSignal::PagesLoaded { pages_count: 3 }))
        );
        assert_eq!(
            route_line(r#"{"command":"fontSize"}"#),
            Ok(HostInput::Command(UserCommand::FontSize {
                delta: FONT_SIZE_STEP
            }))
        );
        assert_eq!(
            route_line(r#"{"command":"swipe","direction":"left"}"#),
            Ok(HostInput::Command(UserCommand::Swipe {
                direction: SwipeDirection::Left
            }))
        );
        assert!(route_line("nope").is_err());
        assert!(route_line(r#"{"page":1}"#).is_err());
        assert!(route_line(r#"{"command":"launchRockets"}"#).is_err());
    }

    #[test]
    fn end_to_end_navigation_round_trip() {
        let (mut host, surface) = mounted();
        assert!(matches!(
            surface.take().as_slice(),
            [SurfaceCommand::Open { .. }]
        ));

        let now = Instant::now();
        host.handle_line(r#"{"event":"pagesloaded","pagesCount":10}"#, now);
        host.step(now);
        assert_eq!(host.controller().session().total_pages(), 10);

        host.handle_line(r#"{"command":"goToPage","page":4}"#, now);
        host.step(now);
        assert_eq!(surface.take(), vec![SurfaceCommand::Navigate { page: 4 }]);

        host.handle_line("garbage", now);
        host.handle_line(r#"{"event":"pagechanging","pageNumber":4}"#, now);
        host.step(now);
        assert_eq!(host.controller().session().current_page(), 4);

        let (snapshot, output) = host.shutdown();
        assert_eq!(snapshot.current_page, 4);
        let text = String::from_utf8(output).expect("utf8");
        assert!(text.lines().all(|line| line.starts_with(r#"{"shell":"#)));
        assert!(text.contains(r#""pageLabel":"4 / 10""#));
        assert!(matches!(surface.take().last(), Some(SurfaceCommand::Close)));
    }

    #[test]
    fn surface_error_then_user_retry_reloads() {
        let (mut host, surface) = mounted();
        surface.take();
        let now = Instant::now();

        host.handle_line(
            r#"{"event":"documentloaderror","message":"Invalid PDF structure"}"#,
            now,
        );
        host.step(now);
        assert_eq!(host.controller().snapshot().status, SessionStatus::Failed);

        host.handle_line(r#"{"command":"retry"}"#, now);
        host.step(now);
        assert_eq!(host.controller().snapshot().status, SessionStatus::Loading);
        assert!(matches!(surface.take().first(), Some(SurfaceCommand::Close)));
    }
}
