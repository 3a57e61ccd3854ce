use crate::error::PathstatError;
use crate::exclusion::{ExclusionRule, PathExcluder};
use chrono::FixedOffset;
use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// Top-level pathstat configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathstatConfig {
    /// UTC offset used to read `--start` / `--end`, e.g. `+09:00`.
    #[serde(default = "default_timezone", deserialize_with = "deserialize_offset_text")]
    pub timezone: String,
    #[serde(default)]
    pub exclusions: ExclusionSettings,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where exclusion rules come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExclusionSettings {
    /// Explicit exclusions file; skips the directory search.
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Search the standard config directories when no file is given.
    #[serde(default = "default_true")]
    pub search: bool,
    /// Rules appended after the file (or default) rules.
    #[serde(default)]
    pub excluded_paths: Vec<ExclusionRule>,
}

/// Retrieval-side filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// A record is kept when it contains any of these. Empty keeps everything.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Emit the full analysis result instead of the summary list.
    #[serde(default)]
    pub detailed: bool,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_timezone() -> String { "+09:00".into() }
fn default_true() -> bool { true }
fn default_keywords() -> Vec<String> { vec!["Started".into(), "Completed".into()] }

/// Environment values such as `+0900` arrive as integers; turn them back into offset text.
fn deserialize_offset_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OffsetText {
        Text(String),
        Compact(i64),
    }

    Ok(match OffsetText::deserialize(deserializer)? {
        OffsetText::Text(text) => text,
        OffsetText::Compact(n) => format!("{}{:04}", if n < 0 { '-' } else { '+' }, n.unsigned_abs()),
    })
}

// ── Impls ─────────────────────────────────────────────────────

impl Default for PathstatConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            exclusions: ExclusionSettings::default(),
            source: SourceConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for ExclusionSettings {
    fn default() -> Self {
        Self {
            file: None,
            search: true,
            excluded_paths: Vec::new(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
        }
    }
}

impl PathstatConfig {
    /// Load configuration from a YAML file + `PATHSTAT_` env overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: PathstatConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("PATHSTAT_").split("__"))
            .extract()?;
        Ok(config)
    }

    /// Defaults + env overrides, for runs without a config file.
    pub fn from_env() -> anyhow::Result<Self> {
        let config: PathstatConfig = Figment::from(figment::providers::Serialized::defaults(
            PathstatConfig::default(),
        ))
        .merge(Env::prefixed("PATHSTAT_").split("__"))
        .extract()?;
        Ok(config)
    }

    /// Parsed [`timezone`](Self::timezone) offset.
    pub fn offset(&self) -> Result<FixedOffset, PathstatError> {
        parse_offset(&self.timezone)
    }

    /// Build the path excluder these settings describe.
    ///
    /// `override_file` (from the command line) beats `exclusions.file`, which
    /// beats the directory search, which beats the built-in default.
    pub fn build_excluder(&self, override_file: Option<&Path>) -> Result<PathExcluder, PathstatError> {
        let file = override_file.or(self.exclusions.file.as_deref());

        let mut excluder = match file {
            Some(path) => PathExcluder::from_file(path)?,
            None if self.exclusions.search => PathExcluder::with_search()?,
            None => PathExcluder::default(),
        };

        if !self.exclusions.excluded_paths.is_empty() {
            excluder.extend(self.exclusions.excluded_paths.clone())?;
        }
        Ok(excluder)
    }
}

/// Parse `+09:00`, `-0530`, `Z` or `UTC` into a fixed offset.
pub fn parse_offset(value: &str) -> Result<FixedOffset, PathstatError> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return Ok(FixedOffset::east_opt(0).expect("zero offset is valid"));
    }

    let invalid = || PathstatError::ConfigError(format!("invalid timezone offset: {value:?}"));

    let (sign, rest) = match value.as_bytes().first() {
        Some(b'+') => (1, &value[1..]),
        Some(b'-') => (-1, &value[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
