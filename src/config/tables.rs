use super::defaults;
use super::models::{AppConfig, LogLevel, ThemeMode};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, serde::Serialize, Default)]
pub(super) struct ConfigTables {
    #[serde(default)]
    appearance: AppearanceConfig,
    #[serde(default)]
    reading: ReadingConfig,
    #[serde(default)]
    viewer: ViewerConfig,
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    cache: CacheConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            theme: tables.appearance.theme,
            font_size: tables.appearance.font_size,
            swipe_navigation: tables.reading.swipe_navigation,
            auto_hide_controls_secs: tables.reading.auto_hide_controls_secs,
            remember_progress: tables.reading.remember_progress,
            viewer_url: tables.viewer.viewer_url,
            api_base_url: tables.viewer.api_base_url,
            load_timeout_secs: tables.viewer.load_timeout_secs,
            max_document_mb: tables.viewer.max_document_mb,
            allowed_hosts: tables.viewer.allowed_hosts,
            allow_insecure_http: tables.viewer.allow_insecure_http,
            log_level: tables.logging.log_level,
            cache_dir: tables.cache.cache_dir,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            appearance: AppearanceConfig {
                theme: config.theme,
                font_size: config.font_size,
            },
            reading: ReadingConfig {
                swipe_navigation: config.swipe_navigation,
                auto_hide_controls_secs: config.auto_hide_controls_secs,
                remember_progress: config.remember_progress,
            },
            viewer: ViewerConfig {
                viewer_url: config.viewer_url.clone(),
                api_base_url: config.api_base_url.clone(),
                load_timeout_secs: config.load_timeout_secs,
                max_document_mb: config.max_document_mb,
                allowed_hosts: config.allowed_hosts.clone(),
                allow_insecure_http: config.allow_insecure_http,
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
            cache: CacheConfig {
                cache_dir: config.cache_dir.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct AppearanceConfig {
    #[serde(default)]
    theme: ThemeMode,
    #[serde(default = "defaults::default_font_size")]
    font_size: u32,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        AppearanceConfig {
            theme: ThemeMode::default(),
            font_size: defaults::default_font_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ReadingConfig {
    #[serde(default = "defaults::default_swipe_navigation")]
    swipe_navigation: bool,
    #[serde(default = "defaults::default_auto_hide_controls_secs")]
    auto_hide_controls_secs: f32,
    #[serde(default = "defaults::default_remember_progress")]
    remember_progress: bool,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        ReadingConfig {
            swipe_navigation: defaults::default_swipe_navigation(),
            auto_hide_controls_secs: defaults::default_auto_hide_controls_secs(),
            remember_progress: defaults::default_remember_progress(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ViewerConfig {
    #[serde(default = "defaults::default_viewer_url")]
    viewer_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_base_url: Option<String>,
    #[serde(default = "defaults::default_load_timeout_secs")]
    load_timeout_secs: u64,
    #[serde(default = "defaults::default_max_document_mb")]
    max_document_mb: u64,
    #[serde(default)]
    allowed_hosts: Vec<String>,
    #[serde(default)]
    allow_insecure_http: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            viewer_url: defaults::default_viewer_url(),
            api_base_url: None,
            load_timeout_secs: defaults::default_load_timeout_secs(),
            max_document_mb: defaults::default_max_document_mb(),
            allowed_hosts: Vec::new(),
            allow_insecure_http: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct CacheConfig {
    #[serde(default = "defaults::default_cache_dir")]
    cache_dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            cache_dir: defaults::default_cache_dir(),
        }
    }
}
