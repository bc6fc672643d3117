//! Configuration management for Convoscope
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::calendar::{ReportTimezone, TimeFormat};
use crate::error::{ConvoscopeError, Result};
use anyhow::Context;
use crate::grouping::{SessionPolicy, DEFAULT_CONTEXT_WINDOW_MINUTES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Convoscope
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Webex API settings
    #[serde(default)]
    pub webex: WebexConfig,
    /// Session grouping policy
    #[serde(default)]
    pub sessions: SessionsConfig,
    /// Report display settings
    #[serde(default)]
    pub display: DisplayConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Webex API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebexConfig {
    /// Base URL of the Webex REST API (overridable for tests and mocks)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Access token; usually supplied through `WEBEX_TOKEN`
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// Items requested per page when listing rooms and messages
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Upper bound on messages read from a single space per day
    #[serde(default = "default_max_messages_per_space")]
    pub max_messages_per_space: usize,

    /// Spaces fetched concurrently
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// HTTP timeout per request (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retries after HTTP 429 before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_api_base() -> String {
    "https://webexapis.com/v1".to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_max_messages_per_space() -> usize {
    1000
}

fn default_max_concurrent_requests() -> usize {
    10
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for WebexConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token: None,
            page_size: default_page_size(),
            max_messages_per_space: default_max_messages_per_space(),
            max_concurrent_requests: default_max_concurrent_requests(),
            timeout_seconds: default_timeout_seconds(),
            max_retries: default_max_retries(),
        }
    }
}

/// Session grouping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Largest gap between consecutive messages in one session (minutes)
    #[serde(default = "default_context_window_minutes")]
    pub context_window_minutes: i64,

    /// Include sessions where the user only received messages
    #[serde(default)]
    pub include_passive: bool,
}

fn default_context_window_minutes() -> i64 {
    DEFAULT_CONTEXT_WINDOW_MINUTES
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            context_window_minutes: default_context_window_minutes(),
            include_passive: false,
        }
    }
}

impl SessionsConfig {
    /// Grouping policy described by this configuration
    pub fn policy(&self) -> SessionPolicy {
        SessionPolicy::from_minutes(self.context_window_minutes, self.include_passive)
    }
}

/// Report display configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    /// 12 or 24 hour clock
    #[serde(default)]
    pub time_format: TimeFormat,

    /// IANA timezone for day boundaries; host timezone when unset
    #[serde(default)]
    pub timezone: Option<String>,
}

impl DisplayConfig {
    /// Resolve the configured report timezone
    pub fn report_timezone(&self) -> Result<ReportTimezone> {
        ReportTimezone::from_name(self.timezone.as_deref())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human readable ones
    #[serde(default)]
    pub json_format: bool,

    /// Also append logs to this file
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "convoscope=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConvoscopeError::Io)
            .with_context(|| format!("Failed to read config file {}", path))?;
        let config: Self = serde_yaml::from_str(&contents)
            .map_err(ConvoscopeError::Yaml)
            .with_context(|| format!("Failed to parse config {}", path))?;
        Ok(config)
    }

    fn apply_env_vars(&mut self) {
        if let Ok(token) = std::env::var("WEBEX_TOKEN") {
            if !token.trim().is_empty() {
                self.webex.token = Some(token.trim().to_string());
            }
        }

        if let Ok(api_base) = std::env::var("CONVOSCOPE_WEBEX_API_BASE") {
            self.webex.api_base = api_base;
        }

        if let Ok(window) = std::env::var("CONVOSCOPE_CONTEXT_WINDOW_MINUTES") {
            match window.parse::<i64>() {
                Ok(v) => {
                    self.sessions.context_window_minutes = v;
                    tracing::debug!(
                        context_window_minutes = v,
                        "Env override: CONVOSCOPE_CONTEXT_WINDOW_MINUTES"
                    );
                }
                Err(_) => {
                    tracing::warn!("Invalid CONVOSCOPE_CONTEXT_WINDOW_MINUTES: {}", window);
                }
            }
        }

        if let Ok(passive) = std::env::var("CONVOSCOPE_INCLUDE_PASSIVE") {
            match passive.parse::<bool>() {
                Ok(v) => {
                    self.sessions.include_passive = v;
                    tracing::debug!(include_passive = v, "Env override: CONVOSCOPE_INCLUDE_PASSIVE");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for CONVOSCOPE_INCLUDE_PASSIVE: {}", passive);
                }
            }
        }

        if let Ok(format) = std::env::var("CONVOSCOPE_TIME_FORMAT") {
            match format.parse::<TimeFormat>() {
                Ok(v) => self.display.time_format = v,
                Err(e) => tracing::warn!("Ignoring CONVOSCOPE_TIME_FORMAT: {}", e),
            }
        }

        if let Ok(timezone) = std::env::var("CONVOSCOPE_TIMEZONE") {
            self.display.timezone = Some(timezone);
        }

        if let Ok(level) = std::env::var("CONVOSCOPE_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(json_logs) = std::env::var("CONVOSCOPE_JSON_LOGS") {
            match json_logs.parse::<bool>() {
                Ok(v) => self.logging.json_format = v,
                Err(_) => {
                    tracing::warn!("Invalid value for CONVOSCOPE_JSON_LOGS: {}", json_logs);
                }
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            self.logging.level = "convoscope=debug".to_string();
        }

        let Some(report) = cli.command.report_args() else {
            return;
        };

        if let Some(minutes) = report.context_window {
            self.sessions.context_window_minutes = minutes;
        }
        if report.passive {
            self.sessions.include_passive = true;
        }
        if let Some(format) = report.time_format {
            self.display.time_format = format;
        }
        if let Some(timezone) = &report.timezone {
            self.display.timezone = Some(timezone.clone());
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges
    /// and that required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.sessions.context_window_minutes < 0 {
            return Err(ConvoscopeError::Config(
                "sessions.context_window_minutes cannot be negative".to_string(),
            )
            .into());
        }

        if self.sessions.context_window_minutes > 24 * 60 {
            return Err(ConvoscopeError::Config(
                "sessions.context_window_minutes must be at most 1440 (one day)".to_string(),
            )
            .into());
        }

        if self.webex.api_base.trim().is_empty() {
            return Err(ConvoscopeError::Config("webex.api_base cannot be empty".to_string()).into());
        }

        if self.webex.page_size == 0 || self.webex.page_size > 1000 {
            return Err(ConvoscopeError::Config(
                "webex.page_size must be between 1 and 1000".to_string(),
            )
            .into());
        }

        if self.webex.max_messages_per_space == 0 {
            return Err(ConvoscopeError::Config(
                "webex.max_messages_per_space must be greater than 0".to_string(),
            )
            .into());
        }

        if self.webex.max_concurrent_requests == 0 {
            return Err(ConvoscopeError::Config(
                "webex.max_concurrent_requests must be greater than 0".to_string(),
            )
            .into());
        }

        if self.webex.timeout_seconds == 0 {
            return Err(ConvoscopeError::Config(
                "webex.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        self.display.report_timezone()?;

        Ok(())
    }
}
