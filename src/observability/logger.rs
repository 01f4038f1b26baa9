//! Structured JSON logger
//!
//! One log line = one event. Lines are synchronous, unbuffered, and have
//! deterministic key ordering (serde_json's map is sorted), so log output
//! is stable across runs and diffable in tests.

use std::fmt;
use std::io::{self, Write};

use serde_json::{Map, Value};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Normal operations
    Info = 0,
    /// Recoverable issues
    Warn = 1,
    /// Operation failures
    Error = 2,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Synchronous structured logger
pub struct Logger;

impl Logger {
    /// Log an event with the given severity and fields.
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        match severity {
            Severity::Info | Severity::Warn => {
                Self::log_to_writer(severity, event, fields, &mut io::stdout())
            }
            Severity::Error => Self::log_to_writer(severity, event, fields, &mut io::stderr()),
        }
    }

    fn log_to_writer<W: Write>(
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        let mut map = Map::new();
        map.insert("event".into(), Value::String(event.to_string()));
        map.insert(
            "severity".into(),
            Value::String(severity.as_str().to_string()),
        );
        for (key, value) in fields {
            map.insert((*key).to_string(), Value::String((*value).to_string()));
        }

        let mut line = Value::Object(map).to_string();
        line.push('\n');
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    /// Log at INFO level
    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    /// Log at WARN level
    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    /// Log at ERROR level
    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }
}

#[cfg(test)]
fn capture_log(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut buffer = Vec::new();
    Logger::log_to_writer(severity, event, fields, &mut buffer);
    String::from_utf8(buffer).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
    }

    #[test]
    fn test_log_is_one_json_line() {
        let output = capture_log(
            Severity::Info,
            "CONFIG_PUBLISHED",
            &[("namespace", "demo"), ("key", "app.yaml")],
        );
        assert!(output.ends_with('\n'));
        assert_eq!(output.matches('\n').count(), 1);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["event"], "CONFIG_PUBLISHED");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["namespace"], "demo");
        assert_eq!(parsed["key"], "app.yaml");
    }

    #[test]
    fn test_log_deterministic_ordering() {
        let a = capture_log(Severity::Info, "E", &[("b", "2"), ("a", "1")]);
        let b = capture_log(Severity::Info, "E", &[("a", "1"), ("b", "2")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_log_escapes_special_chars() {
        let output = capture_log(Severity::Warn, "E", &[("message", "line1\n\"quoted\"")]);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["message"], "line1\n\"quoted\"");
    }
}
