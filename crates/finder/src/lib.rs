//! Concurrent, depth-bounded project directory discovery.
//!
//! ```text
//! PathSource ─┐
//! PathSource ─┼─► raw channel ─► [Collator] ─► ResultStream ─► consumer
//! PathSource ─┘        (cap = #sources)
//! ```
//!
//! Each source walks on its own blocking worker. Without dedupe or ordering
//! the raw channel is handed straight to the consumer; otherwise the
//! [`Collator`] buffers everything first. [`ScanHandle::wait`] reports how the
//! sources fared once the stream is done.

#![feature(io_error_more)]

mod collator;
mod coordinator;
mod error;
mod source;

pub use collator::Collator;
pub use coordinator::{Coordinator, Delivery, ResultStream, ScanHandle, ScanReport, ScanRequest, SourceFailure};
pub use error::{FinderError, Result};
pub use gsp_core::{FailurePolicy, Order};
pub use source::PathSource;
