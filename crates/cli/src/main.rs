//! gsp - select projects across configured source directories

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gsp_core::{Config, ConfigError, ConfigOverrides, FailurePolicy, HomeDir};

mod app;
mod logging;

use app::{App, Mode};
use logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "gsp")]
#[command(version, about = "Select projects.")]
#[command(after_help = "\
EXAMPLES:
  gsp                             # Pick a project with the configured selector
  cd \"$(gsp)\"                     # Jump to the picked project
  gsp -l -s asc -u                # Print every project, sorted and deduplicated
  gsp -m                          # Time a full scan

CONFIG:
  Default file: $GSP_CONFIG_DIR/config.toml, $XDG_CONFIG_HOME/gsp/config.toml
  or the platform config directory. Flags override file values.")]
struct Cli {
  /// Load configuration from the specified file
  #[arg(short, long, value_name = "FILE")]
  config: Option<String>,

  /// Print entries to stdout
  #[arg(short, long)]
  list: bool,

  /// Measure performance (time taken and number of entries processed)
  #[arg(short, long)]
  measure: bool,

  /// Selector for displaying entries (fzf, fzy, sk)
  #[arg(long, visible_alias = "sl", value_name = "NAME")]
  selector: Option<String>,

  /// Sort order for displaying entries
  #[arg(short, long, value_name = "ORDER", value_parser = ["asc", "desc", "nosort"])]
  sort: Option<String>,

  /// Display only unique entries
  #[arg(short, long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
  unique: Option<bool>,

  /// Expand `~` in the selection output
  #[arg(long, visible_alias = "eo", value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
  expand_output: Option<bool>,

  /// Keep scanning other sources when one fails
  #[arg(long)]
  best_effort: bool,
}

impl Cli {
  fn overrides(&self) -> ConfigOverrides {
    ConfigOverrides {
      selector: self.selector.clone(),
      sort: self.sort.clone(),
      unique: self.unique,
      expand_output: self.expand_output,
      on_error: self.best_effort.then_some(FailurePolicy::BestEffort),
    }
  }

  fn mode(&self) -> Mode {
    if self.list {
      Mode::List
    } else if self.measure {
      Mode::Measure
    } else {
      Mode::Select
    }
  }

  fn config_path(&self, home: Option<&HomeDir>) -> Result<PathBuf, ConfigError> {
    match (&self.config, home) {
      (Some(path), Some(home)) => Ok(PathBuf::from(home.expand(path))),
      (Some(path), None) => Ok(PathBuf::from(path)),
      (None, _) => Config::user_config_path().ok_or(ConfigError::NoConfigDir),
    }
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let home = HomeDir::detect();

  let config = cli
    .config_path(home.as_ref())
    .and_then(|path| Config::load(&path, &cli.overrides()));

  let _guard = init_logging(config.as_ref().ok().map(|config| &config.log), home.as_ref());

  let config = config?;
  let home = home.context("Could not determine the home directory")?;

  App::new(config, home, cli.mode())?.run().await
}
