//! Discovery feed engine
//!
//! Produces an ordered, de-duplicated stream of catalog candidates for one
//! user and category, prefetches further pages as the stream is consumed and
//! records every classification exactly once.

pub mod buffer;
pub mod controller;
pub mod exclusion;
pub mod sessions;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use buffer::FeedBuffer;
pub use controller::FeedController;
pub use exclusion::{build_exclusion_set, ExclusionSet};
pub use sessions::FeedSessions;
pub use state::{ClassifyOutcome, FeedSnapshot, FeedState};
