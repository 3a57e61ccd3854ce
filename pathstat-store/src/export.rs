//! Exported log-store event pages.
//!
//! Each page is a JSON document shaped like a filter-events response:
//!
//! ```json
//! {
//!   "events": [
//!     {"eventId": "3712...", "timestamp": 1672542000000, "message": "Started GET ..."}
//!   ],
//!   "nextToken": "..."
//! }
//! ```
//!
//! A single file is a single page. A directory holds one page per `.json`
//! file; pages are read in file-name order and the token of a page is the
//! file name of the page after it. `nextToken` values inside the documents
//! refer to the remote store and are ignored.

use crate::error::StoreError;
use crate::source::{LogPage, LogQuery, LogSource};
use chrono::{DateTime, Utc};
use pathstat_core::entry::RawRecord;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventPage {
    #[serde(default)]
    events: Vec<ExportedEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportedEvent {
    event_id: Option<String>,
    message: Option<String>,
    timestamp: Option<i64>,
}

/// Reads exported event pages from a file or a directory of files.
pub struct ExportSource {
    root: PathBuf,
    pages: Vec<PathBuf>,
}

impl ExportSource {
    /// Open a page file or a directory of page files.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let metadata = std::fs::metadata(path).map_err(|e| StoreError::io(path, e))?;

        let pages = if metadata.is_dir() {
            let mut pages: Vec<PathBuf> = std::fs::read_dir(path)
                .map_err(|e| StoreError::io(path, e))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            pages.sort();
            if pages.is_empty() {
                return Err(StoreError::EmptyExport(path.display().to_string()));
            }
            pages
        } else {
            vec![path.to_path_buf()]
        };

        debug!(path = %path.display(), pages = pages.len(), "Opened event export");
        Ok(Self {
            root: path.to_path_buf(),
            pages,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_index(&self, token: Option<&str>) -> Result<usize, StoreError> {
        let Some(token) = token else {
            return Ok(0);
        };
        self.pages
            .iter()
            .position(|p| p.file_name().is_some_and(|name| name == token))
            .ok_or_else(|| StoreError::UnknownPageToken(token.to_string()))
    }

    fn read_page(path: &Path) -> Result<EventPage, StoreError> {
        let data = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        serde_json::from_str(&data).map_err(|source| StoreError::Json {
            path: path.display().to_string(),
            source,
        })
    }
}

impl LogSource for ExportSource {
    fn name(&self) -> String {
        self.root.display().to_string()
    }

    fn fetch_page(&self, query: &LogQuery, next_token: Option<&str>) -> Result<LogPage, StoreError> {
        let index = self.page_index(next_token)?;
        let path = &self.pages[index];
        let page = Self::read_page(path)?;

        let mut records = Vec::with_capacity(page.events.len());
        for event in page.events {
            let (Some(id), Some(message), Some(millis)) = (event.event_id, event.message, event.timestamp) else {
                debug!(page = %path.display(), "Skipping incomplete event");
                continue;
            };
            let Some(timestamp) = DateTime::<Utc>::from_timestamp_millis(millis) else {
                warn!(page = %path.display(), id = %id, millis, "Skipping event with out-of-range timestamp");
                continue;
            };
            if !query.window.contains(timestamp) || !query.matches_text(&message) {
                continue;
            }
            records.push(RawRecord::new(id, message, timestamp));
        }

        let next_token = self
            .pages
            .get(index + 1)
            .and_then(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned());

        Ok(LogPage { records, next_token })
    }
}
