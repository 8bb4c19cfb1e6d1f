// Logging module for structured logging using the tracing crate

use std::error::Error;

use tracing_subscriber::EnvFilter;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line output for terminals
    #[default]
    Text,
    /// JSON output for log aggregation systems
    Json,
}

/// Initialize the tracing subscriber for structured logging
///
/// Sets up the global subscriber with level filtering taken from
/// `RUST_LOG` (defaulting to `info`) and human-readable formatting.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_subscriber() -> Result<(), Box<dyn Error + Send + Sync>> {
    init_with_format(LogFormat::Text)
}

/// Initialize the tracing subscriber with an explicit output format.
pub fn init_with_format(format: LogFormat) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()?,
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_subscriber() {
        // Only the first install in a process can succeed; the unit test
        // binary calls this exactly once.
        assert!(init_subscriber().is_ok());
        tracing::info!("logging initialized for tests");
    }
}
