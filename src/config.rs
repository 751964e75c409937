//! Application configuration
//!
//! Stored as JSON next to other per-user config. A missing file is generated
//! with defaults so users have something to edit; environment variables still
//! override what the file says.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::constants::config::*;
use crate::constants::remote::{DEBOUNCE_MS, DEFAULT_POLL_SECS, MAX_POLL_SECS, MIN_POLL_SECS};
use crate::persistence::LocalStore;
use crate::remote::MirrorOptions;

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_window_width() -> u16 {
    DEFAULT_WINDOW_WIDTH
}

fn default_window_height() -> u16 {
    DEFAULT_WINDOW_HEIGHT
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_SECS
}

fn default_circle_labels() -> [String; 3] {
    DEFAULT_CIRCLE_LABELS.map(String::from)
}

/// Remote document mirror
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
    /// 0 disables polling; the document is still fetched once at startup
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            poll_interval_secs: DEFAULT_POLL_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_window_width")]
    pub window_width: u16,
    #[serde(default = "default_window_height")]
    pub window_height: u16,
    /// Canvas document location; platform data dir when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
    /// Font family (optionally with a style, e.g. "Inter Bold") for card text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
    #[serde(default)]
    pub remote: RemoteSettings,
    #[serde(default = "default_circle_labels")]
    pub circle_labels: [String; 3],
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            data_file: None,
            font_name: None,
            export_dir: None,
            remote: RemoteSettings::default(),
            circle_labels: default_circle_labels(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(FILENAME);
        path
    }

    /// Load `path` (or the default location), writing a default file when none exists.
    /// A file that fails to parse is an error and is left untouched.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);

        let mut config = match Self::read_file(&path)? {
            Some(config) => config,
            None => {
                let config = Self::default();
                match config.save_to(&path) {
                    Ok(()) => info!(path = %path.display(), "Generated config file for user to edit (env vars still override)"),
                    Err(e) => warn!(error = ?e, "Failed to write default config"),
                }
                config
            }
        };

        config.apply_env_overrides();
        config.validate_and_clamp();
        Ok(config)
    }

    /// The file as written, without env overrides; `None` when it does not exist
    fn read_file(path: &Path) -> Result<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str::<AppConfig>(&contents)
                .map(Some)
                .with_context(|| format!("Failed to parse config file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read config file {}", path.display())),
        }
    }

    /// Persist a font choice, leaving every other key in the file as the user wrote it
    pub fn save_font_name(path: &Path, font_name: Option<&str>) -> Result<()> {
        let mut config = Self::read_file(path)?.unwrap_or_default();
        config.font_name = font_name.map(str::to_string);
        config.save_to(path)?;
        info!(path = %path.display(), font = ?font_name, "Saved font choice");
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .context(format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        fs::write(path, contents).context(format!("Failed to write config file to {}", path.display()))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|var| env::var(var).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_REMOTE_URL).map(|u| u.trim().to_string()) {
            self.remote.enabled = !url.is_empty();
            self.remote.url = url;
        }
        if let Some(data) = lookup(ENV_DATA_FILE).filter(|d| !d.trim().is_empty()) {
            self.data_file = Some(PathBuf::from(data.trim()));
        }
    }

    /// Clamp values to safe ranges; called after loading and after env overrides
    pub fn validate_and_clamp(&mut self) {
        let level = self.log_level.trim().to_ascii_lowercase();
        if LOG_LEVELS.contains(&level.as_str()) {
            self.log_level = level;
        } else {
            warn!(log_level = %self.log_level, using = DEFAULT_LOG_LEVEL, "Unknown log_level, using default");
            self.log_level = default_log_level();
        }

        if self.window_width < MIN_WINDOW_DIMENSION {
            warn!(window_width = self.window_width, min = MIN_WINDOW_DIMENSION, "window_width below minimum, clamping");
            self.window_width = MIN_WINDOW_DIMENSION;
        } else if self.window_width > MAX_WINDOW_DIMENSION {
            warn!(window_width = self.window_width, max = MAX_WINDOW_DIMENSION, "window_width exceeds maximum, clamping");
            self.window_width = MAX_WINDOW_DIMENSION;
        }

        if self.window_height < MIN_WINDOW_DIMENSION {
            warn!(window_height = self.window_height, min = MIN_WINDOW_DIMENSION, "window_height below minimum, clamping");
            self.window_height = MIN_WINDOW_DIMENSION;
        } else if self.window_height > MAX_WINDOW_DIMENSION {
            warn!(window_height = self.window_height, max = MAX_WINDOW_DIMENSION, "window_height exceeds maximum, clamping");
            self.window_height = MAX_WINDOW_DIMENSION;
        }

        let poll = self.remote.poll_interval_secs;
        if poll != 0 && poll < MIN_POLL_SECS {
            warn!(poll_interval_secs = poll, min = MIN_POLL_SECS, "poll_interval_secs below minimum, clamping");
            self.remote.poll_interval_secs = MIN_POLL_SECS;
        } else if poll > MAX_POLL_SECS {
            warn!(poll_interval_secs = poll, max = MAX_POLL_SECS, "poll_interval_secs exceeds maximum, clamping");
            self.remote.poll_interval_secs = MAX_POLL_SECS;
        }

        if self.remote.enabled && self.remote.url.trim().is_empty() {
            warn!("Remote mirror enabled without a url, disabling");
            self.remote.enabled = false;
        }

        if self.font_name.as_deref().is_some_and(|f| f.trim().is_empty()) {
            self.font_name = None;
        }

        for (label, fallback) in self.circle_labels.iter_mut().zip(DEFAULT_CIRCLE_LABELS) {
            if label.trim().is_empty() {
                warn!(using = fallback, "Empty circle label, using default");
                *label = fallback.to_string();
            }
        }
    }

    pub fn data_path(&self) -> PathBuf {
        self.data_file.clone().unwrap_or_else(LocalStore::default_path)
    }

    /// Directory exports land in: configured, then the pictures dir, then cwd
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::picture_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn remote_url(&self) -> Option<&str> {
        Some(self.remote.url.trim()).filter(|url| self.remote.enabled && !url.is_empty())
    }

    pub fn mirror_options(&self) -> MirrorOptions {
        MirrorOptions {
            debounce: Duration::from_millis(DEBOUNCE_MS),
            poll_interval: Some(self.remote.poll_interval_secs)
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_is_generated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card-canvas").join("config.json");

        let mut config = AppConfig::load(Some(&path)).unwrap();
        assert!(path.exists());

        // Environment may carry overrides; compare the file instead
        let written: AppConfig = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, AppConfig::default());
        config.remote = RemoteSettings::default();
        config.data_file = None;
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"log_level": "debug", "circle_labels": ["A", "B", "C"]}"#).unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.circle_labels, ["A", "B", "C"].map(String::from));
        assert_eq!(config.window_width, DEFAULT_WINDOW_WIDTH);
        assert_eq!(config.font_name, None);
    }

    #[test]
    fn test_invalid_file_is_error_and_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ log_level: ").unwrap();

        assert!(AppConfig::load(Some(&path)).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ log_level: ");
    }

    #[test]
    fn test_validate_and_clamp() {
        let mut config = AppConfig {
            log_level: "LOUD".into(),
            window_width: 10,
            window_height: u16::MAX,
            font_name: Some("  ".into()),
            remote: RemoteSettings {
                enabled: true,
                url: " ".into(),
                poll_interval_secs: 999_999,
            },
            circle_labels: ["".into(), "Payroll".into(), " ".into()],
            ..AppConfig::default()
        };
        config.validate_and_clamp();

        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.window_width, MIN_WINDOW_DIMENSION);
        assert_eq!(config.window_height, MAX_WINDOW_DIMENSION);
        assert_eq!(config.font_name, None);
        assert!(!config.remote.enabled);
        assert_eq!(config.remote.poll_interval_secs, MAX_POLL_SECS);
        assert_eq!(config.circle_labels, default_circle_labels());
        assert!(config.remote_url().is_none());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_REMOTE_URL, "https://example.com/canvas.json"),
            (ENV_DATA_FILE, "/tmp/other.json"),
        ]
        .into();
        let mut config = AppConfig::default();
        config.apply_overrides(|var| vars.get(var).map(|v| v.to_string()));

        assert_eq!(config.remote_url(), Some("https://example.com/canvas.json"));
        assert_eq!(config.data_path(), PathBuf::from("/tmp/other.json"));
    }

    #[test]
    fn test_font_choice_does_not_persist_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"log_level": "debug", "window_width": 1400}"#).unwrap();

        // What the running app holds after env overrides were applied
        let vars: HashMap<&str, &str> = [
            (ENV_REMOTE_URL, "https://example.com/canvas.json"),
            (ENV_DATA_FILE, "/tmp/other.json"),
        ]
        .into();
        let mut running = AppConfig::read_file(&path).unwrap().unwrap();
        running.apply_overrides(|var| vars.get(var).map(|v| v.to_string()));
        assert!(running.remote_url().is_some());

        AppConfig::save_font_name(&path, Some("Inter Bold")).unwrap();

        let written = AppConfig::read_file(&path).unwrap().unwrap();
        assert_eq!(written.font_name.as_deref(), Some("Inter Bold"));
        assert_eq!(written.log_level, "debug");
        assert_eq!(written.window_width, 1400);
        assert_eq!(written.remote, RemoteSettings::default());
        assert_eq!(written.data_file, None);

        AppConfig::save_font_name(&path, None).unwrap();
        assert_eq!(AppConfig::read_file(&path).unwrap().unwrap().font_name, None);
    }

    #[test]
    fn test_font_choice_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        AppConfig::save_font_name(&path, Some("Inter")).unwrap();
        let written = AppConfig::read_file(&path).unwrap().unwrap();
        assert_eq!(written, AppConfig { font_name: Some("Inter".into()), ..AppConfig::default() });
    }

    #[test]
    fn test_mirror_options() {
        let mut config = AppConfig::default();
        assert_eq!(config.mirror_options().poll_interval, Some(Duration::from_secs(DEFAULT_POLL_SECS)));
        assert_eq!(config.mirror_options().debounce, Duration::from_millis(DEBOUNCE_MS));
        config.remote.poll_interval_secs = 0;
        config.validate_and_clamp();
        assert_eq!(config.mirror_options().poll_interval, None);
    }
}
