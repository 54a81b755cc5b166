//! Shared configuration and domain types for gsp.

pub mod config;
pub mod dirs;
pub mod home;

pub use config::{Config, ConfigError, ConfigOverrides, FailurePolicy, LogConfig, Order, SelectorKind, SourceConfig};
pub use home::{Formatter, HomeDir};
