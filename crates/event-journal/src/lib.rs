//! Bounded Event Journal
//!
//! Provides a fixed-capacity FIFO journal: appends go to the tail and the
//! oldest entry is evicted once capacity is exceeded.

mod journal;

pub use journal::{Journal, DEFAULT_CAPACITY};

use thiserror::Error;

/// Journal errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JournalError {
    #[error("Journal capacity must be at least 1")]
    ZeroCapacity,
}
