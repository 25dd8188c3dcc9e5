//! Entry point for the magazine reader host.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml`.
//! - Optionally write the webview host page.
//! - Run the stdio host loop for one document.

use anyhow::{Context, Result, anyhow};
use magreader::config::{AppConfig, ThemeMode, load_config};
use magreader::host::{HostOptions, run_host};
use magreader::viewer::{HostPage, render_host_page};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const USAGE: &str = "Usage: magreader <document-url> [--title <title>] [--config <path>] \
[--token <bearer>] [--font-size <n>] [--theme light|dark|sepia] [--no-swipe] \
[--host-page <path>]";

struct CliArgs {
    document_url: String,
    title: Option<String>,
    config_path: PathBuf,
    token: Option<String>,
    font_size: Option<u32>,
    theme: Option<ThemeMode>,
    no_swipe: bool,
    host_page: Option<PathBuf>,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    let mut config = load_config(&args.config_path);
    apply_overrides(&mut config, &args);
    set_log_level(reload_handle, config.log_level.as_filter_str());

    let title = args
        .title
        .clone()
        .unwrap_or_else(|| title_from_url(&args.document_url));
    info!(
        url = %args.document_url,
        %title,
        theme = %config.theme,
        font_size = config.font_size,
        level = %config.log_level,
        "Starting magazine reader"
    );

    if let Some(path) = &args.host_page {
        let html = render_host_page(&HostPage {
            title: &title,
            viewer_url: &config.viewer_url,
            boot: None,
        })?;
        fs::write(path, html).with_context(|| format!("writing host page {}", path.display()))?;
        info!(path = %path.display(), "Wrote viewer host page");
    }

    let snapshot = run_host(
        &config,
        HostOptions {
            document_url: args.document_url,
            title,
            token: args.token,
        },
    )
    .context("Reading session failed")?;
    info!(
        page = snapshot.current_page,
        total = snapshot.total_pages,
        progress = snapshot.progress_percent,
        "Reader closed"
    );
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs> {
    let mut document_url = None;
    let mut parsed = CliArgs {
        document_url: String::new(),
        title: None,
        config_path: PathBuf::from("conf/config.toml"),
        token: None,
        font_size: None,
        theme: None,
        no_swipe: false,
        host_page: None,
    };

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| anyhow!("Missing value for {flag}\n{USAGE}"))
        };
        match arg.as_str() {
            "--title" => parsed.title = Some(value("--title")?),
            "--config" => parsed.config_path = PathBuf::from(value("--config")?),
            "--token" => parsed.token = Some(value("--token")?),
            "--font-size" => {
                let raw = value("--font-size")?;
                parsed.font_size = Some(
                    raw.parse()
                        .with_context(|| format!("Invalid --font-size {raw}"))?,
                );
            }
            "--theme" => {
                let raw = value("--theme")?;
                parsed.theme =
                    Some(ThemeMode::parse(&raw).ok_or_else(|| anyhow!("Unknown theme {raw}"))?);
            }
            "--no-swipe" => parsed.no_swipe = true,
            "--host-page" => parsed.host_page = Some(PathBuf::from(value("--host-page")?)),
            flag if flag.starts_with("--") => return Err(anyhow!("Unknown flag {flag}\n{USAGE}")),
            _ if document_url.is_none() => document_url = Some(arg.clone()),
            _ => return Err(anyhow!("Unexpected argument {arg}\n{USAGE}")),
        }
    }

    parsed.document_url = document_url.ok_or_else(|| anyhow!(USAGE))?;
    Ok(parsed)
}

fn apply_overrides(config: &mut AppConfig, args: &CliArgs) {
    if let Some(font_size) = args.font_size {
        config.font_size = font_size;
    }
    if let Some(theme) = args.theme {
        config.theme = theme;
    }
    if args.no_swipe {
        config.swipe_navigation = false;
    }
}

fn title_from_url(url: &str) -> String {
    let name = url
        .split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').find(|segment| !segment.is_empty()))
        .unwrap_or("Document");
    name.strip_suffix(".pdf")
        .or_else(|| name.strip_suffix(".PDF"))
        .unwrap_or(name)
        .to_string()
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    if env::var_os("RUST_LOG").is_some() {
        info!(%level, "RUST_LOG is set; ignoring config log level");
        return;
    }
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
