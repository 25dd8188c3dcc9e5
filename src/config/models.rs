use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// High-level reader configuration, flattened from the TOML tables.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub theme: ThemeMode,
    pub font_size: u32,
    pub swipe_navigation: bool,
    pub auto_hide_controls_secs: f32,
    pub remember_progress: bool,
    pub viewer_url: String,
    pub api_base_url: Option<String>,
    pub load_timeout_secs: u64,
    pub max_document_mb: u64,
    pub allowed_hosts: Vec<String>,
    pub allow_insecure_http: bool,
    pub log_level: LogLevel,
    pub cache_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            theme: ThemeMode::default(),
            font_size: crate::config::defaults::default_font_size(),
            swipe_navigation: crate::config::defaults::default_swipe_navigation(),
            auto_hide_controls_secs: crate::config::defaults::default_auto_hide_controls_secs(),
            remember_progress: crate::config::defaults::default_remember_progress(),
            viewer_url: crate::config::defaults::default_viewer_url(),
            api_base_url: None,
            load_timeout_secs: crate::config::defaults::default_load_timeout_secs(),
            max_document_mb: crate::config::defaults::default_max_document_mb(),
            allowed_hosts: Vec::new(),
            allow_insecure_http: false,
            log_level: crate::config::defaults::default_log_level(),
            cache_dir: crate::config::defaults::default_cache_dir(),
        }
    }
}

impl AppConfig {
    pub fn max_document_bytes(&self) -> u64 {
        self.max_document_mb.saturating_mul(1024 * 1024)
    }
}

/// Reading theme applied to the embedded viewer.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
    Sepia,
}

impl ThemeMode {
    /// Light, dark, sepia, then back to light.
    pub fn next(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Sepia,
            ThemeMode::Sepia => ThemeMode::Light,
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "light" | "day" => Some(ThemeMode::Light),
            "dark" | "night" => Some(ThemeMode::Dark),
            "sepia" => Some(ThemeMode::Sepia),
            _ => None,
        }
    }
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ThemeMode::Light => "Light",
            ThemeMode::Dark => "Dark",
            ThemeMode::Sepia => "Sepia",
        };
        write!(f, "{}", label)
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
