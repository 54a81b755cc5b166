//! Home directory shorthand (`~`).
//!
//! Source paths may start with `~`. They are expanded once before traversal,
//! and results from such sources are contracted back to the `~` form so the
//! selector shows short paths. The final selection is expanded again when
//! `expand_output` is enabled.

use std::path::is_separator;

/// The user's home directory, as a string prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeDir {
  path: String,
}

impl HomeDir {
  pub fn new(path: impl Into<String>) -> Self {
    let mut path = path.into();
    while path.len() > 1 && path.ends_with(is_separator) {
      path.pop();
    }
    Self { path }
  }

  /// Detect the current user's home directory
  pub fn detect() -> Option<Self> {
    ::dirs::home_dir().map(|home| Self::new(home.to_string_lossy()))
  }

  pub fn as_str(&self) -> &str {
    &self.path
  }

  /// Whether `path` is written with the `~` shorthand.
  pub fn is_shorthand(path: &str) -> bool {
    path.starts_with('~')
  }

  /// Expand a leading `~` or `~/`. Other paths (including `~user`) are
  /// returned unchanged.
  pub fn expand(&self, path: &str) -> String {
    match path.strip_prefix('~') {
      Some(rest) if rest.is_empty() || rest.starts_with(is_separator) => format!("{}{}", self.path, rest),
      _ => path.to_string(),
    }
  }

  /// Rewrite the home prefix of an absolute path back to `~`.
  pub fn contract(&self, path: &str) -> String {
    match path.strip_prefix(self.path.as_str()) {
      Some(rest) if rest.is_empty() || rest.starts_with(is_separator) => format!("~{rest}"),
      _ => path.to_string(),
    }
  }

  /// Expand a final selection. Only shorthand paths are touched.
  pub fn expand_output(&self, selection: &str) -> String {
    if Self::is_shorthand(selection) {
      self.expand(selection)
    } else {
      selection.to_string()
    }
  }

  /// Formatter for results of a source configured as `root`.
  ///
  /// Sources written with `~` get their results contracted back to `~`;
  /// everything else passes through unchanged.
  pub fn formatter_for(&self, root: &str) -> Formatter {
    if Self::is_shorthand(root) {
      let home = self.clone();
      Box::new(move |path: &str| home.contract(path))
    } else {
      Box::new(|path: &str| path.to_string())
    }
  }
}

/// Pure per-source transform applied to every emitted path
pub type Formatter = Box<dyn Fn(&str) -> String + Send + Sync>;

#[cfg(test)]
mod tests {
  use super::*;

  fn home() -> HomeDir {
    HomeDir::new("/home/gabe")
  }

  #[test]
  fn test_trailing_separator_trimmed() {
    assert_eq!(HomeDir::new("/home/gabe/").as_str(), "/home/gabe");
    assert_eq!(HomeDir::new("/").as_str(), "/");
  }

  #[test]
  fn test_expand() {
    let home = home();
    assert_eq!(home.expand("~"), "/home/gabe");
    assert_eq!(home.expand("~/projects"), "/home/gabe/projects");
    assert_eq!(home.expand("/srv/projects"), "/srv/projects");
    // Other users' homes are not expanded
    assert_eq!(home.expand("~alice/projects"), "~alice/projects");
  }

  #[test]
  fn test_contract() {
    let home = home();
    assert_eq!(home.contract("/home/gabe"), "~");
    assert_eq!(home.contract("/home/gabe/projects/gsp"), "~/projects/gsp");
    assert_eq!(home.contract("/srv/projects"), "/srv/projects");
    // Prefix match must end on a path boundary
    assert_eq!(home.contract("/home/gabriel/projects"), "/home/gabriel/projects");
  }

  #[test]
  fn test_expand_contract_inverse() {
    let home = home();
    for path in ["~", "~/a", "~/a/b/c"] {
      assert_eq!(home.contract(&home.expand(path)), path);
    }
  }

  #[test]
  fn test_expand_output() {
    let home = home();
    assert_eq!(home.expand_output("~/projects/gsp"), "/home/gabe/projects/gsp");
    assert_eq!(home.expand_output("/srv/gsp"), "/srv/gsp");
  }

  #[test]
  fn test_formatter_for() {
    let home = home();
    let short = home.formatter_for("~/projects");
    assert_eq!(short("/home/gabe/projects/gsp"), "~/projects/gsp");

    let absolute = home.formatter_for("/home/gabe/projects");
    assert_eq!(absolute("/home/gabe/projects/gsp"), "/home/gabe/projects/gsp");
  }

  #[test]
  fn test_is_shorthand() {
    assert!(HomeDir::is_shorthand("~/projects"));
    assert!(HomeDir::is_shorthand("~"));
    assert!(!HomeDir::is_shorthand("/home/gabe"));
  }
}
