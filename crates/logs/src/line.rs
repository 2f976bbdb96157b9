use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One structured record of a log stream.
///
/// Wire shape: `{"level":"info","pos":0,"out":"...","time":"...","args":null}`.
/// `pos` is monotonically non-decreasing within one source; there is no
/// ordering guarantee across the blob and stream sources.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogLine {
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub pos: i64,
    #[serde(default)]
    pub out: String,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub args: Option<serde_json::Value>,
}

impl LogLine {
    /// The line text with exactly one trailing newline, ready for display.
    pub fn normalized(&self) -> String {
        let mut text = self.out.trim_end_matches('\n').to_string();
        text.push('\n');
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_payload() {
        let raw = r#"{"level":"info","pos":0,"out":"1.6.14: Pulling from plugins/cache\n","time":"2024-05-28T20:00:37.637136016Z","args":null}"#;
        let line: LogLine = serde_json::from_str(raw).unwrap();
        assert_eq!(line.level, "info");
        assert_eq!(line.out, "1.6.14: Pulling from plugins/cache\n");
        assert!(line.time.is_some());
    }

    #[test]
    fn parses_minimal_payload() {
        let line: LogLine = serde_json::from_str(r#"{"out":"line1"}"#).unwrap();
        assert_eq!(line.out, "line1");
        assert_eq!(line.pos, 0);
        assert!(line.time.is_none());
    }

    #[test]
    fn normalized_appends_missing_newline() {
        let line: LogLine = serde_json::from_str(r#"{"out":"line1"}"#).unwrap();
        assert_eq!(line.normalized(), "line1\n");
    }

    #[test]
    fn normalized_collapses_extra_newlines() {
        let line: LogLine = serde_json::from_str(r#"{"out":"line2\n\n"}"#).unwrap();
        assert_eq!(line.normalized(), "line2\n");
    }
}
