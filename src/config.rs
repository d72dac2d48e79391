use std::path::PathBuf;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "CrimeMap";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory
/// ~/CrimeMap/ on all platforms, falling back to the working directory
/// when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the SQLite database path
pub fn database_path() -> PathBuf {
    app_data_dir().join("crime-map.db")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "crime_map=info,warn"
}

// ═══════════════════════════════════════════
// Parser configuration
// ═══════════════════════════════════════════

/// Largest accepted occurred-range correction, one week.
pub const MAX_CORRECTION_WINDOW_HOURS: i64 = 24 * 7;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("correction window must be 0 to 168 hours, got {0}")]
    CorrectionWindow(i64),
}

/// What the report extractor does with a token no state expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownTokenPolicy {
    /// Decline the token so the runner fails with "field not interpretable".
    Strict,
    /// Consume the token and log it.
    Lenient,
}

/// Layout constants for the Drexel crime log format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub unknown_tokens: UnknownTokenPolicy,
    /// Hours added to an occurred-range end that precedes its start.
    pub correction_window_hours: i64,
    /// Noise tokens following the page header date range.
    pub header_trailing_tokens: usize,
    /// Noise tokens following the page number footer.
    pub footer_trailing_tokens: usize,
    /// Column labels between "Date Reported:" and its values.
    pub reported_label_skip: usize,
    /// Column labels between the occurred label and the synopsis text.
    pub occurred_label_skip: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            unknown_tokens: UnknownTokenPolicy::Strict,
            correction_window_hours: 12,
            header_trailing_tokens: 3,
            footer_trailing_tokens: 5,
            reported_label_skip: 2,
            occurred_label_skip: 1,
        }
    }
}

impl ParserConfig {
    pub fn lenient() -> Self {
        Self {
            unknown_tokens: UnknownTokenPolicy::Lenient,
            ..Self::default()
        }
    }

    /// Check values that cannot be expressed in the field types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.correction_window().map(|_| ())
    }

    /// The occurred-range correction as a duration.
    pub fn correction_window(&self) -> Result<Duration, ConfigError> {
        let hours = self.correction_window_hours;
        if !(0..=MAX_CORRECTION_WINDOW_HOURS).contains(&hours) {
            return Err(ConfigError::CorrectionWindow(hours));
        }
        Duration::try_hours(hours).ok_or(ConfigError::CorrectionWindow(hours))
    }
}
