//! Persistent settings for the `tabsim` binary and [`ExecutionContext::from_settings`].
//!
//! [`ExecutionContext::from_settings`]: crate::context::ExecutionContext::from_settings

use crate::error::{Result, ResultExt as _};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_OPENML_BASE_URL: &str = "https://www.openml.org";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    None,
    #[default]
    Memory,
    Disk,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default)]
    pub kind: CacheKind,
    /// Directory for [`CacheKind::Disk`]; defaults to [`default_cache_dir`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl CacheSettings {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(default_cache_dir)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cache: CacheSettings,
    pub http_timeout_secs: u64,
    pub openml_base_url: String,
    pub verify_checksums: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            openml_base_url: DEFAULT_OPENML_BASE_URL.to_owned(),
            verify_checksums: true,
        }
    }
}

/// `<data dir>/tabsim`, or a relative `tabsim` when the platform has none.
pub fn base_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tabsim")
}

pub fn settings_path() -> PathBuf {
    base_dir().join("config.json")
}

pub fn default_cache_dir() -> PathBuf {
    base_dir().join("cache")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Missing or unreadable files yield the defaults.
pub fn load_settings_from(path: &std::path::Path) -> Settings {
    if path.exists()
        && let Ok(content) = std::fs::read_to_string(path)
        && let Ok(settings) = serde_json::from_str::<Settings>(&content)
    {
        return settings;
    }

    tracing::debug!(path = %path.display(), "Using default settings");
    Settings::default()
}

pub fn save_settings(settings: &Settings) -> Result<PathBuf> {
    let path = settings_path();
    save_settings_to(settings, &path)?;
    Ok(path)
}

pub fn save_settings_to(settings: &Settings, path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write settings: {}", path.display()))?;
    Ok(())
}
