//! Logging and distributed tracing
//!
//! Console logging is always on, as text or JSON lines. Spans are exported
//! over OTLP when `telemetry.enabled` is set.

mod otel;

use serde::{Deserialize, Serialize};

pub use otel::{TelemetryConfig, TelemetryError, TelemetryGuard, init_telemetry};

/// Console log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parses_lowercase() {
        let format: LogFormat = serde_json::from_str("\"json\"").unwrap_or_default();
        assert_eq!(format, LogFormat::Json);
        assert_eq!(LogFormat::default(), LogFormat::Text);
    }
}
