//! Runtime settings of the cell handler.
//!
//! Settings can be loaded from environment variables or constructed
//! programmatically.

use core::time::Duration;
use std::env;

const DEFAULT_SLOW_FRAME_MS: u64 = 10;
const DEFAULT_RECONNECT_SECONDS: u64 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellsConfig {
    /// Frames that take longer than this are logged
    pub slow_frame_ms: u64,
    /// Whether to emit one JSON line of frame statistics per frame
    pub telemetry_enabled: bool,
    /// Wait shown on the disconnected placeholder when the transport gives none
    pub reconnect_seconds: u64,
}

impl Default for CellsConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SLOW_FRAME_MS, false, DEFAULT_RECONNECT_SECONDS)
    }
}

impl CellsConfig {
    /// Construct a new `CellsConfig` with explicit values.
    ///
    /// # Arguments
    ///
    /// * `slow_frame_ms` - Frames slower than this many milliseconds are logged
    /// * `telemetry_enabled` - Whether to emit frame statistics
    /// * `reconnect_seconds` - Default wait shown after the connection closes
    ///
    /// # Returns
    ///
    /// A new `CellsConfig` instance with the specified settings
    #[inline]
    #[must_use]
    pub const fn new(slow_frame_ms: u64, telemetry_enabled: bool, reconnect_seconds: u64) -> Self {
        Self {
            slow_frame_ms,
            telemetry_enabled,
            reconnect_seconds,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `CELLS_SLOW_FRAME_MS`: slow frame threshold in milliseconds (default: 10)
    /// - `CELLS_TELEMETRY`: Set to "1" to emit frame statistics (default: disabled)
    /// - `CELLS_RECONNECT_SECONDS`: default reconnect wait (default: 5)
    ///
    /// # Returns
    ///
    /// A new `CellsConfig` instance populated from environment variables
    #[inline]
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`CellsConfig::from_env`] with a custom variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let slow_frame_ms = lookup("CELLS_SLOW_FRAME_MS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SLOW_FRAME_MS);
        let telemetry_enabled = lookup("CELLS_TELEMETRY").as_deref() == Some("1");
        let reconnect_seconds = lookup("CELLS_RECONNECT_SECONDS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RECONNECT_SECONDS);
        Self {
            slow_frame_ms,
            telemetry_enabled,
            reconnect_seconds,
        }
    }

    /// Get the slow frame threshold as a `Duration`.
    #[inline]
    #[must_use]
    pub const fn slow_frame(&self) -> Duration {
        Duration::from_millis(self.slow_frame_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_overrides_and_falls_back() {
        let config = CellsConfig::from_lookup(|key| match key {
            "CELLS_SLOW_FRAME_MS" => Some("25".to_owned()),
            "CELLS_TELEMETRY" => Some("1".to_owned()),
            "CELLS_RECONNECT_SECONDS" => Some("soon".to_owned()),
            _ => None,
        });
        assert_eq!(config, CellsConfig::new(25, true, 5));
        assert_eq!(config.slow_frame(), Duration::from_millis(25));

        assert_eq!(CellsConfig::from_lookup(|_| None), CellsConfig::default());
    }
}
