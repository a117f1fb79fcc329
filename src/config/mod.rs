use crate::errors::{AppError, AppResult};
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub mod migrate; // use submodule at src/config/migrate.rs

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Inline bearer token; `token_file` and `RATTENDANCE_TOKEN` take precedence.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_file: Option<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_coalesce_window")]
    pub coalesce_window_ms: u64,
    #[serde(default = "default_reconnect_initial")]
    pub reconnect_initial_ms: u64,
    #[serde(default = "default_reconnect_max")]
    pub reconnect_max_ms: u64,
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// 0 disables the idle check on the push stream.
    #[serde(default = "default_push_idle_timeout")]
    pub push_idle_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_poll_interval() -> u64 {
    30
}
fn default_coalesce_window() -> u64 {
    500
}
fn default_reconnect_initial() -> u64 {
    1000
}
fn default_reconnect_max() -> u64 {
    30_000
}
fn default_max_reconnect_attempts() -> u32 {
    5
}
fn default_push_idle_timeout() -> u64 {
    90
}
fn default_request_timeout() -> u64 {
    15
}
fn default_export_dir() -> String {
    "~/Downloads".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            token: None,
            token_file: None,
            poll_interval_secs: default_poll_interval(),
            coalesce_window_ms: default_coalesce_window(),
            reconnect_initial_ms: default_reconnect_initial(),
            reconnect_max_ms: default_reconnect_max(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            push_idle_timeout_secs: default_push_idle_timeout(),
            request_timeout_secs: default_request_timeout(),
            export_dir: default_export_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("rattendance")
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".rattendance")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rattendance.conf")
    }

    /// Load configuration from `path` (default location when `None`).
    /// A missing file yields the defaults; an unreadable or invalid one is an error.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_file);

        let cfg = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| AppError::ConfigLoad(format!("{}: {e}", path.display())))?;
            if content.trim().is_empty() {
                Config::default()
            } else {
                serde_yaml::from_str(&content)
                    .map_err(|e| AppError::ConfigLoad(format!("{}: {e}", path.display())))?
            }
        } else {
            Config::default()
        };

        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the sync and export code cannot work with.
    pub fn validate(&self) -> AppResult<()> {
        crate::api::http::normalize_base_url(&self.server_url)?;

        let zero = [
            ("poll_interval_secs", self.poll_interval_secs),
            ("coalesce_window_ms", self.coalesce_window_ms),
            ("reconnect_initial_ms", self.reconnect_initial_ms),
            ("reconnect_max_ms", self.reconnect_max_ms),
            ("request_timeout_secs", self.request_timeout_secs),
        ];
        if let Some((key, _)) = zero.iter().find(|(_, v)| *v == 0) {
            return Err(AppError::Config(format!("{key} must be greater than 0")));
        }

        if self.reconnect_max_ms < self.reconnect_initial_ms {
            return Err(AppError::Config(
                "reconnect_max_ms must not be lower than reconnect_initial_ms".into(),
            ));
        }

        if self.export_dir.trim().is_empty() {
            return Err(AppError::Config("export_dir must not be empty".into()));
        }

        Ok(())
    }

    pub fn export_dir_path(&self) -> PathBuf {
        expand_tilde(&self.export_dir)
    }

    pub fn token_file_path(&self) -> Option<PathBuf> {
        self.token_file
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(expand_tilde)
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).map_err(|_| AppError::ConfigSave)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml).map_err(|_| AppError::ConfigSave)
    }

    /// Write a default configuration file. An existing file is left alone.
    /// Returns the path and whether it was created.
    pub fn init(path: Option<&Path>) -> AppResult<(PathBuf, bool)> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_file);
        if path.exists() {
            return Ok((path, false));
        }
        Config::default().save(&path)?;
        Ok((path, true))
    }
}
