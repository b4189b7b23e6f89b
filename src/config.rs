//! Application-level configuration loading, including authoring bounds and
//! room-code generation settings.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_LIVE_BACK_CONFIG_PATH";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Smallest accepted per-question time limit in seconds.
    pub min_time_limit_secs: u32,
    /// Largest accepted per-question time limit in seconds.
    pub max_time_limit_secs: u32,
    /// Smallest accepted base points per question.
    pub min_base_points: u32,
    /// Largest accepted base points per question.
    pub max_base_points: u32,
    /// Generation attempts before room-code reservation gives up.
    pub room_code_attempts: u32,
    /// Buffer capacity of each per-session SSE broadcast channel.
    pub sse_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in defaults when the file is absent or malformed.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            min_time_limit_secs: 10,
            max_time_limit_secs: 300,
            min_base_points: 1,
            max_base_points: 100,
            room_code_attempts: 10,
            sse_capacity: 16,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
///
/// Omitted fields keep their built-in defaults.
struct RawConfig {
    min_time_limit_secs: Option<u32>,
    max_time_limit_secs: Option<u32>,
    min_base_points: Option<u32>,
    max_base_points: Option<u32>,
    room_code_attempts: Option<u32>,
    sse_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            min_time_limit_secs: value.min_time_limit_secs.unwrap_or(defaults.min_time_limit_secs),
            max_time_limit_secs: value.max_time_limit_secs.unwrap_or(defaults.max_time_limit_secs),
            min_base_points: value.min_base_points.unwrap_or(defaults.min_base_points),
            max_base_points: value.max_base_points.unwrap_or(defaults.max_base_points),
            room_code_attempts: value.room_code_attempts.unwrap_or(defaults.room_code_attempts),
            sse_capacity: value.sse_capacity.unwrap_or(defaults.sse_capacity),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
