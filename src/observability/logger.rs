//! Structured JSON logger
//!
//! One log line = one event. Synchronous, unbuffered, deterministic field
//! ordering (event first, then severity, then fields alphabetically,
//! timestamp last).
//!
//! The engine logs sparingly: degraded conditions the write path is not
//! allowed to turn into failures (ledger append after a durable row write,
//! stock update after a sale record) and best-effort cleanup warnings.

use std::io::{self, Write};

use chrono::Utc;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Debug = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable / degraded conditions
    Warn = 2,
    /// Operation failures
    Error = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured logger writing one JSON object per line.
pub struct Logger;

impl Logger {
    /// Log an event at the given severity.
    ///
    /// `Warn` and above go to stderr, everything else to stdout.
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if severity >= Severity::Warn {
            Self::log_to_writer(severity, event, fields, &mut io::stderr());
        } else {
            Self::log_to_writer(severity, event, fields, &mut io::stdout());
        }
    }

    /// Degraded-condition shorthand; always `Warn`.
    pub fn degraded(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    fn log_to_writer<W: Write>(
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        let mut sorted: Vec<&(&str, &str)> = fields.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);

        let mut line = String::with_capacity(128);
        line.push('{');
        push_pair(&mut line, "event", event);
        line.push(',');
        push_pair(&mut line, "severity", severity.as_str());
        for (key, value) in sorted {
            line.push(',');
            push_pair(&mut line, key, value);
        }
        line.push(',');
        push_pair(&mut line, "ts", &Utc::now().to_rfc3339());
        line.push('}');
        line.push('\n');

        // Best-effort: a failed log write must never take the operation down.
        let _ = writer.write_all(line.as_bytes());
    }
}

fn push_pair(out: &mut String, key: &str, value: &str) {
    out.push_str(&serde_json::Value::from(key).to_string());
    out.push(':');
    out.push_str(&serde_json::Value::from(value).to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Warn < Severity::Error);
    }

    #[test]
    fn test_line_is_valid_json_with_sorted_fields() {
        let mut buf: Vec<u8> = Vec::new();
        Logger::log_to_writer(
            Severity::Warn,
            "ledger_append_failed",
            &[("table", "goods"), ("item", "row-1")],
            &mut buf,
        );
        let line = String::from_utf8(buf).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(parsed["event"], "ledger_append_failed");
        assert_eq!(parsed["severity"], "WARN");
        assert_eq!(parsed["item"], "row-1");
        // item sorts before table
        assert!(line.find("\"item\"").unwrap() < line.find("\"table\"").unwrap());
    }

    #[test]
    fn test_escaping() {
        let mut buf: Vec<u8> = Vec::new();
        Logger::log_to_writer(Severity::Info, "note", &[("msg", "say \"hi\"")], &mut buf);
        let line = String::from_utf8(buf).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(parsed["msg"], "say \"hi\"");
    }
}
