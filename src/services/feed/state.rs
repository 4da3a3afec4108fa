use serde::Serialize;

use crate::models::{Bucket, Category, ItemId};

/// Lifecycle of a feed session, published to subscribers on every change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedState {
    Uninitialized,
    Loading,
    Ready,
    Prefetching,
    /// Nothing left to offer this session
    Empty,
    /// A collaborator failure left the buffer empty
    Error,
}

/// Point-in-time view of a session for status endpoints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedSnapshot {
    pub state: FeedState,
    pub category: Option<Category>,
    pub buffered: usize,
    pub excluded: usize,
    pub next_page: u32,
    pub exhausted: bool,
    pub generation: u64,
}

impl FeedSnapshot {
    /// View of a user who has no feed session
    pub fn uninitialized() -> Self {
        Self {
            state: FeedState::Uninitialized,
            category: None,
            buffered: 0,
            excluded: 0,
            next_page: 1,
            exhausted: false,
            generation: 0,
        }
    }
}

/// Result of a single `classify` call
///
/// The decision write may fail without undoing the advance; `persisted` and
/// `write_error` report that for this call only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifyOutcome {
    pub item_id: ItemId,
    pub bucket: Bucket,
    pub persisted: bool,
    pub write_error: Option<String>,
    pub state: FeedState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serialization() {
        assert_eq!(
            serde_json::to_string(&FeedState::Prefetching).unwrap(),
            "\"prefetching\""
        );
        assert_eq!(
            serde_json::to_string(&FeedState::Uninitialized).unwrap(),
            "\"uninitialized\""
        );
    }
}
