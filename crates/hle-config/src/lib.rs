//! Shared configuration for the HLE service host.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then a
//! TOML file (selected with `--config-path` or `HLE_CONFIG_PATH`), then
//! `HLE_*` environment variables, then command-line flags. The resolved
//! [`Config`] carries the telemetry settings and the dispatch policy codes
//! that the service manager hands to every facade it registers.

mod defaults;

pub use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use defaults::{
    DEFAULT_APT_MAX_SESSIONS, DEFAULT_LOG_FILTER, DEFAULT_MALFORMED_RESULT, DEFAULT_STUB_RESULT,
    DEFAULT_UNKNOWN_RESULT, default_apt_max_sessions, default_log_filter,
    default_log_filter_string, default_log_format, default_malformed_result, default_stub_result,
    default_unknown_result,
};

/// How the replay host renders dispatch and lifecycle events on stderr.
///
/// `json` suits trace capture next to the replay output, `compact` suits a
/// terminal. Parsing ignores ASCII case.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One flattened JSON object per event.
    #[default]
    Json,
    /// One human-readable line per event.
    Compact,
}

/// Error returned when `log_format` names no known [`LogFormat`].
pub type LogFormatParseError = strum::ParseError;

/// Resolved configuration for the service host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "HLE")]
pub struct Config {
    /// Tracing filter expression applied to the telemetry subscriber.
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Output format of the telemetry subscriber.
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
    /// Raw result code returned for registered commands that have no handler.
    #[serde(default = "defaults::default_stub_result")]
    pub stub_result: u32,
    /// Raw result code returned for command identifiers absent from a table.
    #[serde(default = "defaults::default_unknown_result")]
    pub unknown_result: u32,
    /// Raw result code returned when a request buffer cannot be decoded.
    #[serde(default = "defaults::default_malformed_result")]
    pub malformed_result: u32,
    /// Maximum concurrent sessions for each APT facade.
    #[serde(default = "defaults::default_apt_max_sessions")]
    pub apt_max_sessions: u32,
    /// Whether the emulated console reports itself as a New 3DS model.
    #[serde(default)]
    pub apt_new_3ds: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            stub_result: DEFAULT_STUB_RESULT,
            unknown_result: DEFAULT_UNKNOWN_RESULT,
            malformed_result: DEFAULT_MALFORMED_RESULT,
            apt_max_sessions: DEFAULT_APT_MAX_SESSIONS,
            apt_new_3ds: false,
        }
    }
}

impl Config {
    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Telemetry output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Result code for stubbed commands.
    #[must_use]
    pub const fn stub_result(&self) -> u32 {
        self.stub_result
    }

    /// Result code for unknown commands.
    #[must_use]
    pub const fn unknown_result(&self) -> u32 {
        self.unknown_result
    }

    /// Result code for undecodable requests.
    #[must_use]
    pub const fn malformed_result(&self) -> u32 {
        self.malformed_result
    }

    /// Session cap applied to each APT facade.
    #[must_use]
    pub const fn apt_max_sessions(&self) -> u32 {
        self.apt_max_sessions
    }

    /// Console model reported by APT.
    #[must_use]
    pub const fn apt_new_3ds(&self) -> bool {
        self.apt_new_3ds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_documented_values() {
        let config = Config::default();
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.stub_result(), 0);
        assert_eq!(config.unknown_result(), 0xFFFF_FFFF);
        assert_eq!(config.apt_max_sessions(), 8);
        assert!(!config.apt_new_3ds());
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("COMPACT".parse::<LogFormat>().ok(), Some(LogFormat::Compact));
        assert_eq!("json".parse::<LogFormat>().ok(), Some(LogFormat::Json));
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
