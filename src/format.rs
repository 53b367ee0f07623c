//! Log line formatting: value serialization and template substitution.

use crate::level::LogLevel;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;

/// Placeholder rendered when a value cannot be serialized.
pub const UNSERIALIZABLE: &str = "<unserializable>";

/// Render a single log value as text.
///
/// Strings render as-is, other scalars in their natural text form, and
/// structured records as a compact JSON encoding. A record that cannot be
/// encoded degrades to [`UNSERIALIZABLE`] instead of failing the emit.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| UNSERIALIZABLE.to_string()),
    }
}

/// Render an ordered list of values and join them with single spaces.
pub fn join_values(values: &[Value]) -> String {
    values.iter().map(render_value).collect::<Vec<_>>().join(" ")
}

/// Substitute the template placeholders into a finished log line.
///
/// Each of `{timestamp}`, `{level}` and `{message}` is substituted at most
/// once, wherever it first appears; a placeholder missing from the template
/// is silently skipped. A template containing none of the placeholders is
/// returned verbatim.
pub fn format_line(template: &str, timestamp: &str, level: LogLevel, message: &str) -> String {
    let line = template.replacen("{timestamp}", timestamp, 1);
    let line = line.replacen("{level}", level.as_upper_str(), 1);
    line.replacen("{message}", message, 1)
}

/// The current instant in sortable ISO-8601 form (UTC, millisecond
/// precision), as substituted for the `{timestamp}` placeholder.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_scalars() {
        assert_eq!(render_value(&json!("plain")), "plain");
        assert_eq!(render_value(&json!(42)), "42");
        assert_eq!(render_value(&json!(1.5)), "1.5");
        assert_eq!(render_value(&json!(true)), "true");
        assert_eq!(render_value(&json!(null)), "null");
    }

    #[test]
    fn test_render_record_is_compact_json() {
        assert_eq!(render_value(&json!({"a": 1, "b": "x"})), r#"{"a":1,"b":"x"}"#);
    }

    #[test]
    fn test_join_values_with_single_spaces() {
        let joined = join_values(&[json!("Error occurred:"), json!("Some error message.")]);
        assert_eq!(joined, "Error occurred: Some error message.");

        let mixed = join_values(&[json!("count"), json!(3), json!({"ok": false})]);
        assert_eq!(mixed, r#"count 3 {"ok":false}"#);
    }

    #[test]
    fn test_format_line_default_template() {
        let line = format_line(
            "{timestamp} [{level}] {message}",
            "2024-01-02T03:04:05.678Z",
            LogLevel::Warning,
            "disk low",
        );
        assert_eq!(line, "2024-01-02T03:04:05.678Z [WARNING] disk low");
    }

    #[test]
    fn test_format_line_placeholders_in_any_order() {
        let line = format_line("{message} | {level}", "ts", LogLevel::Error, "boom");
        assert_eq!(line, "boom | ERROR");
    }

    #[test]
    fn test_format_line_missing_placeholders_skipped() {
        assert_eq!(
            format_line("static prefix: {message}", "ts", LogLevel::Info, "m"),
            "static prefix: m"
        );
        assert_eq!(format_line("no placeholders", "ts", LogLevel::Info, "m"), "no placeholders");
    }

    #[test]
    fn test_format_line_substitutes_each_placeholder_once() {
        // Only the first occurrence is substituted; the second is left as-is.
        let line = format_line("{level} {level}", "ts", LogLevel::Info, "m");
        assert_eq!(line, "INFO {level}");
    }

    #[test]
    fn test_timestamp_is_sortable_iso8601() {
        let ts = timestamp_now();
        // e.g. 2024-01-02T03:04:05.678Z
        assert_eq!(ts.len(), 24);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
    }
}
