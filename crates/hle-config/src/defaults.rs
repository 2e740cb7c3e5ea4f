//! Built-in configuration defaults.

use crate::LogFormat;

/// Default log filter expression used by the host binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Stubbed commands report success unless configured otherwise; guest
/// software generally tolerates a stubbed success.
pub const DEFAULT_STUB_RESULT: u32 = 0;

/// Unknown commands report an all-ones failure code.
pub const DEFAULT_UNKNOWN_RESULT: u32 = 0xFFFF_FFFF;

/// Undecodable request buffers share the unknown-command failure code.
pub const DEFAULT_MALFORMED_RESULT: u32 = DEFAULT_UNKNOWN_RESULT;

/// Concurrent sessions allowed on each APT facade.
pub const DEFAULT_APT_MAX_SESSIONS: u32 = 8;

/// Default log filter expression used by the host binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the host binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default stub result code.
#[must_use]
pub const fn default_stub_result() -> u32 {
    DEFAULT_STUB_RESULT
}

/// Default unknown-command result code.
#[must_use]
pub const fn default_unknown_result() -> u32 {
    DEFAULT_UNKNOWN_RESULT
}

/// Default malformed-request result code.
#[must_use]
pub const fn default_malformed_result() -> u32 {
    DEFAULT_MALFORMED_RESULT
}

/// Default APT session cap.
#[must_use]
pub const fn default_apt_max_sessions() -> u32 {
    DEFAULT_APT_MAX_SESSIONS
}
