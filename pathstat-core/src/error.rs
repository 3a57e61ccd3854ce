use thiserror::Error;

/// Why a single log line could not be turned into an [`Entry`](crate::entry::Entry).
///
/// Both variants are non-fatal: the analyzer skips the line and keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unrecognized log format: {0}")]
    UnrecognizedFormat(String),

    #[error("Malformed {field}: {value:?} ({reason})")]
    MalformedField {
        field: &'static str,
        value: String,
        reason: String,
    },
}

impl ParseError {
    pub(crate) fn malformed(
        field: &'static str,
        value: &str,
        reason: impl std::fmt::Display,
    ) -> Self {
        ParseError::MalformedField {
            field,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-friendly label, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::UnrecognizedFormat(_) => "unrecognized_format",
            ParseError::MalformedField { .. } => "malformed_field",
        }
    }
}

/// Unified error type for the fallible collaborators around the core
/// (configuration and exclusion rules).
#[derive(Error, Debug)]
pub enum PathstatError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Exclusion rule at index {0} must specify at least one matching criteria")]
    EmptyExclusionRule(usize),

    #[error("Invalid exclusion pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid time window: {0}")]
    InvalidWindow(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
