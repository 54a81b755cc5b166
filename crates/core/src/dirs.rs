use std::path::PathBuf;

/// Get the default config directory
///
/// Respects the following environment variables (in order of precedence):
/// 1. GSP_CONFIG_DIR - explicit config directory override
/// 2. XDG_CONFIG_HOME - standard XDG config home directory
/// 3. dirs::config_dir() - platform default
pub fn default_config_dir() -> Option<PathBuf> {
  // Check explicit override first
  if let Ok(dir) = std::env::var("GSP_CONFIG_DIR") {
    return Some(PathBuf::from(dir));
  }

  // Check XDG_CONFIG_HOME
  if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
    return Some(PathBuf::from(xdg_config).join("gsp"));
  }

  // Fall back to platform default
  ::dirs::config_dir().map(|dir| dir.join("gsp"))
}

/// Get the default config file path (`<config dir>/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
  default_config_dir().map(|dir| dir.join("config.toml"))
}
