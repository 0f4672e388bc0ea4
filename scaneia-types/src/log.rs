use serde::{Deserialize, Serialize};
use std::fmt;

/// Application log level for persisted [`LogEntry`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for LogLevel {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, String> {
        match value {
            "INFO" => Ok(LogLevel::Info),
            "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(format!("invalid log level: {other}")),
        }
    }
}

/// A persisted application log record, optionally tied to a scan.
///
/// Written by the scan workflow (start, completion, failure) and consumed by
/// the log-analysis prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    /// Milliseconds since the UNIX epoch, assigned by the store.
    pub timestamp: u64,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_labels_round_trip() {
        for level in [LogLevel::Info, LogLevel::Warning, LogLevel::Error] {
            assert_eq!(LogLevel::try_from(level.as_str()), Ok(level));
        }
        assert!(LogLevel::try_from("DEBUG").is_err());
    }

    #[test]
    fn entry_omits_absent_scan_reference() {
        let entry = LogEntry {
            id: "log-1".into(),
            timestamp: 1,
            level: LogLevel::Info,
            message: "m".into(),
            scan_id: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["level"], "INFO");
        assert!(json.get("scanId").is_none());
    }
}
