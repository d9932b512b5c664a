use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::compare::CompareSources;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const SETTINGS_FILE: &str = "stainviz.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_url: String,
    /// Zero disables the client-side timeout.
    pub request_timeout_secs: u64,
    pub compare_sources: CompareSources,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            request_timeout_secs: 120,
            compare_sources: CompareSources::default(),
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

/// Layers defaults, the settings file and the process environment.
pub fn load_settings_from(path: Option<&Path>) -> ClientSettings {
    let mut settings = ClientSettings::default();

    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE));
    if let Ok(raw) = fs::read_to_string(&path) {
        apply_file(&mut settings, &raw);
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

pub(crate) fn apply_file(settings: &mut ClientSettings, raw: &str) {
    let Ok(table) = toml::from_str::<toml::Table>(raw) else {
        tracing::warn!("ignoring unparseable {SETTINGS_FILE}");
        return;
    };

    let text = |key: &str| table.get(key).and_then(|v| v.as_str()).map(str::to_string);

    if let Some(v) = text("api_url") {
        settings.api_url = normalize_api_url(&v);
    }
    match table.get("request_timeout_secs") {
        Some(toml::Value::Integer(secs)) if *secs >= 0 => {
            settings.request_timeout_secs = *secs as u64;
        }
        Some(toml::Value::String(secs)) => {
            if let Ok(parsed) = secs.trim().parse::<u64>() {
                settings.request_timeout_secs = parsed;
            }
        }
        _ => {}
    }
    if let Some(v) = text("ground_truth_src") {
        settings.compare_sources.ground_truth = v;
    }
    if let Some(v) = text("ai_inferred_src") {
        settings.compare_sources.ai_inferred = v;
    }
    if let Some(v) = text("brightfield_src") {
        settings.compare_sources.brightfield = v;
    }
}

pub(crate) fn apply_env(settings: &mut ClientSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("STAINVIZ_API_URL") {
        settings.api_url = normalize_api_url(&v);
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_url = normalize_api_url(&v);
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
}

pub fn normalize_api_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_API_URL.to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
