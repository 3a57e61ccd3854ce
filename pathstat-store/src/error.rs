use thiserror::Error;

/// Retrieval failures. Unlike parse errors in the core, these abort the run.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed event page {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown page token: {0}")]
    UnknownPageToken(String),

    #[error("Page token {0} was already visited")]
    PageLoop(String),

    #[error("No event pages found in {0}")]
    EmptyExport(String),
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
