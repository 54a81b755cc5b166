//! Configuration system for gsp.
//!
//! Config is read from a TOML file (default: ~/.config/gsp/config.toml, see
//! [`crate::dirs`]). Command-line flags are layered on top through
//! [`ConfigOverrides`]; a flag only wins when it was actually given.

use std::{
  fmt,
  path::{Path, PathBuf},
  str::FromStr,
};

use serde::{Deserialize, Serialize};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Failed to read config {}: {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Failed to parse config {}: {source}", .path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },
  /// Could not determine where the config file lives
  #[error("No config directory found; pass --config")]
  NoConfigDir,
  #[error("No selector configured (available: fzf, fzy, sk)")]
  MissingSelector,
  #[error("Invalid selector '{0}' (available: fzf, fzy, sk)")]
  InvalidSelector(String),
  #[error("Invalid sort order '{0}' (available: asc, desc, nosort)")]
  InvalidOrder(String),
}

// ============================================================================
// Selector
// ============================================================================

/// Interactive selector programs gsp can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SelectorKind {
  Fzf,
  Fzy,
  Sk,
}

impl SelectorKind {
  /// Executable name looked up on PATH
  pub fn program(&self) -> &'static str {
    match self {
      SelectorKind::Fzf => "fzf",
      SelectorKind::Fzy => "fzy",
      SelectorKind::Sk => "sk",
    }
  }
}

impl fmt::Display for SelectorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.program())
  }
}

impl FromStr for SelectorKind {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "fzf" => Ok(SelectorKind::Fzf),
      "fzy" => Ok(SelectorKind::Fzy),
      "sk" | "skim" => Ok(SelectorKind::Sk),
      _ => Err(ConfigError::InvalidSelector(s.to_string())),
    }
  }
}

impl TryFrom<String> for SelectorKind {
  type Error = ConfigError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<SelectorKind> for String {
  fn from(kind: SelectorKind) -> Self {
    kind.program().to_string()
  }
}

// ============================================================================
// Ordering & failure handling
// ============================================================================

/// Final ordering of the result stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Order {
  /// Results appear in discovery order, interleaved across sources
  #[default]
  Unsorted,
  Ascending,
  Descending,
}

impl Order {
  pub fn as_str(&self) -> &'static str {
    match self {
      Order::Unsorted => "nosort",
      Order::Ascending => "asc",
      Order::Descending => "desc",
    }
  }
}

impl fmt::Display for Order {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Order {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "asc" | "ascending" => Ok(Order::Ascending),
      "desc" | "descending" => Ok(Order::Descending),
      "nosort" | "none" | "" => Ok(Order::Unsorted),
      _ => Err(ConfigError::InvalidOrder(s.to_string())),
    }
  }
}

impl TryFrom<String> for Order {
  type Error = ConfigError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Order> for String {
  fn from(order: Order) -> Self {
    order.as_str().to_string()
  }
}

/// What the scan does when one source fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
  /// Stop every source and fail the run on the first error
  #[default]
  FailFast,
  /// Keep the other sources running and report failures at the end
  BestEffort,
}

// ============================================================================
// Sources
// ============================================================================

/// One configured root directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
  /// Root path, may start with `~`
  pub path: String,

  /// Directory levels below the root to emit (0 = the root only)
  #[serde(default)]
  pub depth: u8,
}

// ============================================================================
// Logging
// ============================================================================

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// Log level: off, error, warn, info, debug, trace (default: warn)
  pub level: String,

  /// Log file path. When unset, logs go to stderr.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub file: Option<String>,

  /// Log file rotation: never, hourly, daily (default: never)
  pub rotation: String,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "warn".to_string(),
      file: None,
      rotation: "never".to_string(),
    }
  }
}

// ============================================================================
// Main Config
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Selector used to display the projects
  #[serde(skip_serializing_if = "Option::is_none")]
  pub selector: Option<SelectorKind>,

  /// Sort order of the results
  pub sort: Order,

  /// Display each project only once
  pub unique: bool,

  /// Expand `~` in the selected output (default: true)
  pub expand_output: bool,

  /// Source failure handling
  pub on_error: FailurePolicy,

  /// Roots to scan, in configuration order
  pub sources: Vec<SourceConfig>,

  pub log: LogConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      selector: None,
      sort: Order::Unsorted,
      unique: false,
      expand_output: true,
      on_error: FailurePolicy::FailFast,
      sources: Vec::new(),
      log: LogConfig::default(),
    }
  }
}

/// Values given on the command line. `None` leaves the file value untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
  pub selector: Option<String>,
  pub sort: Option<String>,
  pub unique: Option<bool>,
  pub expand_output: Option<bool>,
  pub on_error: Option<FailurePolicy>,
}

impl Config {
  /// Load the config file at `path` and apply command-line overrides
  pub fn load(path: &Path, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let mut config = Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    config.apply(overrides)?;
    Ok(config)
  }

  pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(content)
  }

  /// Apply command-line overrides on top of the file values
  pub fn apply(&mut self, overrides: &ConfigOverrides) -> Result<(), ConfigError> {
    if let Some(ref selector) = overrides.selector
      && !selector.is_empty()
    {
      self.selector = Some(selector.parse()?);
    }

    if let Some(ref sort) = overrides.sort {
      self.sort = sort.parse()?;
    }

    if let Some(unique) = overrides.unique {
      self.unique = unique;
    }

    if let Some(expand_output) = overrides.expand_output {
      self.expand_output = expand_output;
    }

    if let Some(on_error) = overrides.on_error {
      self.on_error = on_error;
    }

    Ok(())
  }

  /// The configured selector, required before anything is displayed
  pub fn selector(&self) -> Result<SelectorKind, ConfigError> {
    self.selector.ok_or(ConfigError::MissingSelector)
  }

  /// Get the user-level config path
  pub fn user_config_path() -> Option<PathBuf> {
    crate::dirs::default_config_path()
  }
}
