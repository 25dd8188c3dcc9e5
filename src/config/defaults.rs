pub(crate) fn default_font_size() -> u32 {
    16
}

pub(crate) fn default_swipe_navigation() -> bool {
    true
}

pub(crate) fn default_auto_hide_controls_secs() -> f32 {
    3.0
}

pub(crate) fn default_remember_progress() -> bool {
    false
}

pub(crate) fn default_viewer_url() -> String {
    "https://mozilla.github.io/pdf.js/web/viewer.html".to_string()
}

pub(crate) fn default_load_timeout_secs() -> u64 {
    30
}

pub(crate) fn default_max_document_mb() -> u64 {
    200
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}

pub(crate) fn default_cache_dir() -> String {
    ".cache".to_string()
}
