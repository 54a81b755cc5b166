//! Selector trait for interactive choosers
//!
//! A selector receives the result stream line by line while it runs and
//! returns the single line the user picked.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::SelectorError;

/// Result type for selector operations
pub type Result<T> = std::result::Result<T, SelectorError>;

/// What the user did with the candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
  /// The chosen line, without its line terminator
  Chosen(String),
  /// The selector exited without choosing anything
  Cancelled,
}

impl Selection {
  pub fn chosen(&self) -> Option<&str> {
    match self {
      Selection::Chosen(line) => Some(line),
      Selection::Cancelled => None,
    }
  }
}

/// Trait for interactive selectors
///
/// # Example
///
/// ```ignore
/// use futures::{StreamExt, stream::BoxStream};
/// use selector::{Result, Selection, Selector};
///
/// struct First;
///
/// #[async_trait::async_trait]
/// impl Selector for First {
///     fn name(&self) -> &str {
///         "first"
///     }
///
///     async fn select(&self, mut input: BoxStream<'static, String>) -> Result<Selection> {
///         Ok(input.next().await.map_or(Selection::Cancelled, Selection::Chosen))
///     }
/// }
/// ```
#[async_trait]
pub trait Selector: Send + Sync {
  /// The name of this selector (for logging)
  fn name(&self) -> &str;

  /// Feed `input` to the selector while it runs and wait for the outcome.
  ///
  /// The input is dropped by the time this returns, whether or not it was
  /// consumed to the end.
  async fn select(&self, input: BoxStream<'static, String>) -> Result<Selection>;
}
