use crate::error::StoreError;
use pathstat_core::entry::{RawRecord, TimeWindow};
use std::collections::HashSet;
use tracing::{debug, info};

/// What to fetch: a time window plus an any-of keyword filter.
#[derive(Debug, Clone)]
pub struct LogQuery {
    pub window: TimeWindow,
    /// A record is kept when its text contains any keyword; empty keeps all.
    pub keywords: Vec<String>,
}

impl LogQuery {
    pub fn new(window: TimeWindow, keywords: Vec<String>) -> Self {
        Self { window, keywords }
    }

    pub fn matches_text(&self, text: &str) -> bool {
        self.keywords.is_empty() || self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

/// One page of records plus the token of the page after it.
#[derive(Debug, Clone, Default)]
pub struct LogPage {
    pub records: Vec<RawRecord>,
    pub next_token: Option<String>,
}

/// A paginated supplier of raw log records.
pub trait LogSource {
    /// Human-readable name used in logs.
    fn name(&self) -> String;

    /// Fetch the page identified by `next_token` (`None` = first page).
    fn fetch_page(&self, query: &LogQuery, next_token: Option<&str>) -> Result<LogPage, StoreError>;

    /// Follow page tokens until the last page and return every record in order.
    fn fetch_all(&self, query: &LogQuery) -> Result<Vec<RawRecord>, StoreError> {
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        let mut token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.fetch_page(query, token.as_deref())?;
            pages += 1;
            debug!(source = %self.name(), page = pages, records = page.records.len(), "Fetched page");
            records.extend(page.records);

            match page.next_token {
                Some(next) => {
                    if !seen.insert(next.clone()) {
                        return Err(StoreError::PageLoop(next));
                    }
                    token = Some(next);
                }
                None => break,
            }
        }

        info!(source = %self.name(), pages, records = records.len(), "Fetched log records");
        Ok(records)
    }
}
