use std::sync::OnceLock;

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::ConfigError;

static LOGGING_GUARD: OnceLock<()> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Filter directive; falls back to `RUST_LOG`, then `info`.
    pub env_filter: Option<String>,
    pub with_ansi: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            env_filter: None,
            with_ansi: true,
        }
    }
}

/// Install the global subscriber. The library logs through `log`; those
/// records are forwarded to the same subscriber.
///
/// Safe to call multiple times; only the first call installs anything.
pub fn init_logging(options: LoggingOptions) -> Result<(), ConfigError> {
    if LOGGING_GUARD.get().is_some() {
        return Ok(());
    }

    let filter = options
        .env_filter
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::new(filter))
        .with_ansi(options.with_ansi)
        .with_target(false)
        .try_init()
        .map_err(|err| ConfigError::Invalid(format!("logging init failed: {err}")))?;

    LOGGING_GUARD.get_or_init(|| ());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let options = LoggingOptions {
            env_filter: Some("warn".to_string()),
            with_ansi: false,
        };
        assert!(init_logging(options.clone()).is_ok());
        assert!(init_logging(options).is_ok());
    }
}
