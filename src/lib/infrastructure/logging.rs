//! Logging setup

use clap::Parser;
use tracing::Level;

use crate::infrastructure::secrets;

/// Logging configuration
#[derive(Clone, Debug, Default, Parser)]
pub struct LogConfig {
    /// Log level: trace, debug, info, warn, error, fatal or panic
    #[clap(long = "log.level", env = "PARAMETER_LOG_LEVEL")]
    pub level: Option<String>,
}

impl LogConfig {
    /// The configured level, falling back to the plugin's parameter files
    pub fn level(&self) -> Level {
        let level = self
            .level
            .clone()
            .or_else(|| secrets::read_fallback("log_level"))
            .unwrap_or_default();

        parse_level(&level)
    }

    /// Installs the global subscriber
    #[mutants::skip]
    pub fn init(&self) {
        tracing_subscriber::fmt()
            .with_max_level(self.level())
            .with_target(false)
            .init();
    }
}

/// Maps a level name to a tracing level. Unknown names are INFO.
pub fn parse_level(level: &str) -> Level {
    match level.trim().to_lowercase().as_str() {
        "t" | "trace" => Level::TRACE,
        "d" | "debug" => Level::DEBUG,
        "w" | "warn" => Level::WARN,
        "e" | "error" | "f" | "fatal" | "p" | "panic" => Level::ERROR,
        _ => Level::INFO,
    }
}
