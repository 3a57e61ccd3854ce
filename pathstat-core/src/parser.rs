use crate::entry::{CompletionEntry, Entry, StartEntry};
use crate::error::ParseError;
use chrono::DateTime;
use regex::Regex;

/// Layout of the timestamp on a `Started` line, e.g. `2023-01-01 12:00:00 +0900`.
pub const TIMESTAMP_LAYOUT: &str = "%Y-%m-%d %H:%M:%S %z";

// Optional tagged-logging prefix, e.g. `[web.1] [a1b2] Started ...`
const TAG_PREFIX: &str = r"^(?:\[[^\]]*\]\s*)*";

/// Classifies raw request-lifecycle lines and extracts their typed fields.
///
/// All patterns are compiled once when the parser is built; parsing itself
/// is a pure function of the input text.
pub struct EntryParser {
    started: Regex,
    completed: Regex,
    views: Regex,
    active_record: Regex,
    bracket_group: Regex,
}

impl EntryParser {
    pub fn new() -> Self {
        Self {
            started: compile(&format!(
                r#"{TAG_PREFIX}Started\s+(\w+)\s+"([^"]+)"\s+for\s+\S+\s+at\s+([^\[]+?)\s*(?:\[.*)?$"#
            )),
            completed: compile(&format!(
                r"{TAG_PREFIX}Completed\s+(\d+)\s+(.+?)\s+in\s+(\d+)ms"
            )),
            views: compile(r"Views:\s*([\d.]+)ms"),
            active_record: compile(r"ActiveRecord:\s*([\d.]+)ms"),
            bracket_group: compile(r"\[([^\[\]]*)\]"),
        }
    }

    /// Parse one line into a Start or Completion entry.
    pub fn parse(&self, line: &str) -> Result<Entry, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::UnrecognizedFormat(String::new()));
        }

        if let Some(caps) = self.started.captures(line) {
            return self.parse_started(line, &caps);
        }

        if let Some(caps) = self.completed.captures(line) {
            return self.parse_completed(line, &caps);
        }

        Err(ParseError::UnrecognizedFormat(line.to_string()))
    }

    /// Content of the last `[...]` group in the line, or an empty string.
    pub fn extract_session_token(&self, line: &str) -> String {
        self.bracket_group
            .captures_iter(line)
            .last()
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }

    fn parse_started(&self, line: &str, caps: &regex::Captures<'_>) -> Result<Entry, ParseError> {
        let raw_timestamp = &caps[3];
        let timestamp = DateTime::parse_from_str(raw_timestamp, TIMESTAMP_LAYOUT)
            .map_err(|e| ParseError::malformed("timestamp", raw_timestamp, e))?;

        Ok(Entry::Start(StartEntry {
            method: caps[1].to_string(),
            path: caps[2].to_string(),
            timestamp,
            session_token: self.extract_session_token(line),
        }))
    }

    fn parse_completed(&self, line: &str, caps: &regex::Captures<'_>) -> Result<Entry, ParseError> {
        let status_code = caps[1]
            .parse::<u16>()
            .map_err(|e| ParseError::malformed("status code", &caps[1], e))?;
        let duration_ms = caps[3]
            .parse::<u64>()
            .map_err(|e| ParseError::malformed("duration", &caps[3], e))?;

        Ok(Entry::Completion(CompletionEntry {
            status_code,
            status_text: caps[2].trim().to_string(),
            duration_ms,
            view_ms: sub_timing(&self.views, line),
            db_ms: sub_timing(&self.active_record, line),
            session_token: self.extract_session_token(line),
        }))
    }
}

impl Default for EntryParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Optional `<label>: <f>ms` annotation; absent or unreadable values count as zero.
fn sub_timing(pattern: &Regex, line: &str) -> f64 {
    pattern
        .captures(line)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in log pattern must compile")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_last_bracket_group() {
        let parser = EntryParser::new();
        assert_eq!(
            parser.extract_session_token("Completed 200 OK in 150ms (Views: [test]) [session123]"),
            "session123"
        );
        assert_eq!(parser.extract_session_token("Completed 200 OK in 150ms"), "");
        assert_eq!(
            parser.extract_session_token("Completed 200 OK in 150ms [a1b2-c3d4_e5f6]"),
            "a1b2-c3d4_e5f6"
        );
    }

    #[test]
    fn classification_is_exclusive() {
        let parser = EntryParser::new();
        let started = r#"Started GET "/users" for 127.0.0.1 at 2023-01-01 12:00:00 +0900"#;
        let completed = "Completed 200 OK in 150ms (Views: 100.0ms | ActiveRecord: 50.0ms)";

        assert!(matches!(parser.parse(started), Ok(Entry::Start(_))));
        assert!(matches!(parser.parse(completed), Ok(Entry::Completion(_))));

        for noise in [
            "Started processing but not a Rails log",
            "Completed task but not a Rails log",
            "",
        ] {
            assert!(matches!(parser.parse(noise), Err(ParseError::UnrecognizedFormat(_))));
        }
    }

    #[test]
    fn sub_timing_defaults_to_zero() {
        let parser = EntryParser::new();
        assert_eq!(sub_timing(&parser.views, "Completed 200 OK in 5ms"), 0.0);
        assert_eq!(sub_timing(&parser.views, "Completed 200 OK in 5ms (Views: 1.2.3ms)"), 0.0);
        assert_eq!(sub_timing(&parser.views, "Completed 200 OK in 5ms (Views: 2.5ms)"), 2.5);
    }
}
