//! Path exclusion rules.
//!
//! Rules are read from a YAML document of the form:
//!
//! ```yaml
//! excluded_paths:
//!   - exact: /health
//!   - prefix: /rails/active_storage
//!   - pattern: "^/api/v[0-9]+/internal/"
//! ```
//!
//! A path is excluded when any rule matches it. Rules are checked in order
//! and evaluation stops at the first match. Exclusion is always evaluated on
//! the literal request path, before route normalization.

use crate::error::PathstatError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name looked up in the standard config directories.
pub const EXCLUSIONS_FILE_NAME: &str = "excluded_paths.yml";

/// Directory name used under the XDG / home config roots.
pub const APP_DIR_NAME: &str = "pathstat";

/// Decides whether a literal request path is left out of the statistics.
pub trait PathFilter {
    fn should_exclude(&self, path: &str) -> bool;
}

impl<F> PathFilter for F
where
    F: Fn(&str) -> bool,
{
    fn should_exclude(&self, path: &str) -> bool {
        self(path)
    }
}

/// A single exclusion rule. Any combination of fields may be set; the rule
/// matches when one of them does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl ExclusionRule {
    pub fn exact(path: &str) -> Self {
        Self { exact: Some(path.to_string()), ..Self::default() }
    }

    pub fn prefix(prefix: &str) -> Self {
        Self { prefix: Some(prefix.to_string()), ..Self::default() }
    }

    pub fn pattern(pattern: &str) -> Self {
        Self { pattern: Some(pattern.to_string()), ..Self::default() }
    }

    fn is_empty(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().is_none_or(str::is_empty);
        blank(&self.exact) && blank(&self.prefix) && blank(&self.pattern)
    }
}

/// Top-level shape of the exclusions file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExclusionConfig {
    #[serde(default)]
    pub excluded_paths: Vec<ExclusionRule>,
}

struct CompiledRule {
    exact: Option<String>,
    prefix: Option<String>,
    pattern: Option<Regex>,
}

impl CompiledRule {
    fn matches(&self, path: &str) -> bool {
        if self.exact.as_deref().is_some_and(|exact| exact == path) {
            return true;
        }
        if self.prefix.as_deref().is_some_and(|prefix| path.starts_with(prefix)) {
            return true;
        }
        self.pattern.as_ref().is_some_and(|re| re.is_match(path))
    }
}

/// Compiled, ordered set of exclusion rules.
pub struct PathExcluder {
    rules: Vec<CompiledRule>,
}

impl PathExcluder {
    /// Validate and compile a list of rules.
    pub fn from_rules(rules: Vec<ExclusionRule>) -> Result<Self, PathstatError> {
        let mut compiled = Vec::with_capacity(rules.len());

        for (index, rule) in rules.into_iter().enumerate() {
            if rule.is_empty() {
                return Err(PathstatError::EmptyExclusionRule(index));
            }

            let pattern = match rule.pattern.as_deref().filter(|p| !p.is_empty()) {
                Some(pattern) => {
                    warn_on_costly_pattern(pattern);
                    let re = Regex::new(pattern).map_err(|source| PathstatError::InvalidPattern {
                        pattern: pattern.to_string(),
                        source,
                    })?;
                    Some(re)
                }
                None => None,
            };

            compiled.push(CompiledRule {
                exact: rule.exact.filter(|v| !v.is_empty()),
                prefix: rule.prefix.filter(|v| !v.is_empty()),
                pattern,
            });
        }

        Ok(Self { rules: compiled })
    }

    /// Parse rules from a YAML document. `origin` names the source in errors.
    pub fn from_yaml_str(yaml: &str, origin: &str) -> Result<Self, PathstatError> {
        let config: ExclusionConfig =
            serde_yaml::from_str(yaml).map_err(|source| PathstatError::Yaml {
                path: origin.to_string(),
                source,
            })?;
        Self::from_rules(config.excluded_paths)
    }

    /// Load rules from an exclusions file.
    pub fn from_file(path: &Path) -> Result<Self, PathstatError> {
        let data = std::fs::read_to_string(path).map_err(|source| PathstatError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let excluder = Self::from_yaml_str(&data, &path.display().to_string())?;
        info!(path = %path.display(), rules = excluder.len(), "Loaded exclusion rules");
        Ok(excluder)
    }

    /// Load from the first exclusions file found in the standard locations,
    /// or fall back to [`PathExcluder::default`].
    pub fn with_search() -> Result<Self, PathstatError> {
        match find_config_path() {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Append further rules after the existing ones.
    pub fn extend(&mut self, rules: Vec<ExclusionRule>) -> Result<(), PathstatError> {
        let extra = Self::from_rules(rules)?;
        self.rules.extend(extra.rules);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for PathExcluder {
    /// Framework-internal file serving is excluded out of the box.
    fn default() -> Self {
        Self {
            rules: vec![CompiledRule {
                exact: None,
                prefix: Some("/rails/active_storage".to_string()),
                pattern: None,
            }],
        }
    }
}

impl PathFilter for PathExcluder {
    fn should_exclude(&self, path: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(path))
    }
}

fn warn_on_costly_pattern(pattern: &str) {
    if pattern.contains(".*.*") {
        warn!(pattern = %pattern, "Regex pattern contains multiple .* which may cause performance issues");
    }
    if pattern.starts_with(".*") {
        warn!(pattern = %pattern, "Regex pattern starts with .* without ^ anchor, consider using prefix match instead");
    }
}

/// Candidate exclusion file locations, most specific first.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        paths.push(PathBuf::from(xdg).join(APP_DIR_NAME).join(EXCLUSIONS_FILE_NAME));
    }

    if let Some(home) = std::env::var_os("HOME").filter(|v| !v.is_empty()) {
        let home = PathBuf::from(home);
        paths.push(home.join(".config").join(APP_DIR_NAME).join(EXCLUSIONS_FILE_NAME));
        paths.push(home.join(format!(".{APP_DIR_NAME}")).join(EXCLUSIONS_FILE_NAME));
    }

    paths
}

/// First existing exclusions file from [`config_search_paths`].
pub fn find_config_path() -> Option<PathBuf> {
    let candidates = config_search_paths();
    debug!(paths = ?candidates, "Searching for exclusions file");

    for path in candidates {
        if path.is_file() {
            info!(path = %path.display(), "Found exclusions file");
            return Some(path);
        }
        debug!(path = %path.display(), "Exclusions file not found");
    }

    info!("No exclusions file found, using default exclusions");
    None
}
