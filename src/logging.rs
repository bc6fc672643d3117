//! Structured logging setup
//!
//! Logs go to stderr so that report output on stdout stays clean (and valid
//! JSON with `--json`). An optional file receives the same events.

use crate::config::LoggingConfig;
use crate::error::{ConvoscopeError, Result};
use anyhow::Context;
use std::fs::{File, OpenOptions};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging based on configuration.
///
/// `RUST_LOG` takes precedence over `config.level`.
///
/// # Arguments
///
/// * `config` - Logging configuration
///
/// # Errors
///
/// Returns error if the filter is invalid, the log file cannot be opened, or
/// a global subscriber is already installed.
///
/// # Examples
///
/// ```no_run
/// use convoscope::config::LoggingConfig;
/// use convoscope::logging::init_logging;
///
/// let config = LoggingConfig {
///     level: "convoscope=debug".to_string(),
///     json_format: false,
///     file_path: None,
/// };
/// init_logging(&config).unwrap();
/// ```
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_filter(&config.level)?;
    let file = open_log_file(config)?;
    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json_format {
        let stderr_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr);

        match file {
            Some(file) => {
                let file_layer = fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(file);
                registry.with(stderr_layer).with(file_layer).try_init()?;
            }
            None => registry.with(stderr_layer).try_init()?,
        }
    } else {
        let stderr_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr);

        match file {
            Some(file) => {
                let file_layer = fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(false)
                    .with_writer(file);
                registry.with(stderr_layer).with(file_layer).try_init()?;
            }
            None => registry.with(stderr_layer).try_init()?,
        }
    }

    Ok(())
}

/// Level used before the configuration is loaded
pub const BOOTSTRAP_LEVEL: &str = "warn";

/// Stderr subscriber for startup, before [`init_logging`] has run
///
/// Configuration loading runs under it with `tracing::subscriber::with_default`
/// so a missing config file or an ignored environment value is still
/// reported. `RUST_LOG` applies here too.
pub fn bootstrap_subscriber() -> impl tracing::Subscriber + Send + Sync + 'static {
    let filter = build_filter(BOOTSTRAP_LEVEL).unwrap_or_else(|_| EnvFilter::new(BOOTSTRAP_LEVEL));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
}

/// Filter from `RUST_LOG`, falling back to `level`
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?)
}

fn open_log_file(config: &LoggingConfig) -> Result<Option<Arc<File>>> {
    let Some(path) = &config.file_path else {
        return Ok(None);
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(ConvoscopeError::Io)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    Ok(Some(Arc::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::temp_dir;
    use serial_test::serial;
    use std::path::PathBuf;

    #[test]
    fn test_build_filter_accepts_default_level() {
        assert!(build_filter(&LoggingConfig::default().level).is_ok());
        assert!(build_filter("info").is_ok());
    }

    #[test]
    #[serial]
    fn test_bootstrap_subscriber_enables_warnings() {
        std::env::remove_var("RUST_LOG");
        tracing::subscriber::with_default(bootstrap_subscriber(), || {
            assert!(tracing::enabled!(tracing::Level::WARN));
            assert!(!tracing::enabled!(tracing::Level::INFO));
        });
    }

    #[test]
    fn test_open_log_file_none_without_path() {
        let config = LoggingConfig::default();
        assert!(open_log_file(&config).unwrap().is_none());
    }

    #[test]
    fn test_open_log_file_creates_file() {
        let dir = temp_dir();
        let path = dir.path().join("convoscope.log");
        let config = LoggingConfig {
            file_path: Some(path.clone()),
            ..LoggingConfig::default()
        };
        assert!(open_log_file(&config).unwrap().is_some());
        assert!(path.exists());
    }

    #[test]
    fn test_init_fails_for_unwritable_log_file() {
        let config = LoggingConfig {
            file_path: Some(PathBuf::from("/nonexistent/dir/convoscope.log")),
            ..LoggingConfig::default()
        };
        let err = init_logging(&config).unwrap_err();
        assert!(err.to_string().contains("Failed to open log file"));
        assert!(matches!(
            err.downcast_ref::<ConvoscopeError>(),
            Some(ConvoscopeError::Io(_))
        ));
    }
}
