use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// One physical log line as handed over by a log source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Source-assigned identifier (event id, line number, ...)
    pub identifier: String,

    /// Raw line text
    pub text: String,

    /// Instant the source recorded the line at
    pub timestamp: DateTime<Utc>,
}

impl RawRecord {
    pub fn new(identifier: impl Into<String>, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            identifier: identifier.into(),
            text: text.into(),
            timestamp,
        }
    }
}

/// A parsed request-lifecycle line.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Start(StartEntry),
    Completion(CompletionEntry),
}

/// `Started GET "/users/1" for 127.0.0.1 at 2023-01-01 12:00:00 +0900`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartEntry {
    pub method: String,

    /// Literal request path, query string included
    pub path: String,

    pub timestamp: DateTime<FixedOffset>,

    /// Empty when the line carries no bracket group
    pub session_token: String,
}

/// `Completed 200 OK in 150ms (Views: 100.0ms | ActiveRecord: 50.0ms) [token]`
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionEntry {
    pub status_code: u16,
    pub status_text: String,
    pub duration_ms: u64,

    /// View rendering time; 0.0 when not reported
    pub view_ms: f64,

    /// ORM time; 0.0 when not reported
    pub db_ms: f64,

    pub session_token: String,
}

impl Entry {
    /// Pairing key, `None` for entries that can never be paired.
    pub fn session_token(&self) -> Option<&str> {
        let token = match self {
            Entry::Start(start) => start.session_token.as_str(),
            Entry::Completion(completion) => completion.session_token.as_str(),
        };
        (!token.is_empty()).then_some(token)
    }
}

/// Inclusive UTC time range an analysis covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, crate::PathstatError> {
        if start > end {
            return Err(crate::PathstatError::InvalidWindow(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}
