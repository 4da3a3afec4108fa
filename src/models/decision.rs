use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{candidate::resolve_poster_url, Bucket, Category, ItemId, UserId};

/// Display data captured at classification time
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DecisionMetadata {
    pub title: String,
    pub year: String,
    pub poster_ref: Option<String>,
    pub rating: f64,
    pub genre_refs: Vec<i64>,
}

impl DecisionMetadata {
    pub fn poster_url(&self, image_base_url: &str) -> Option<String> {
        resolve_poster_url(self.poster_ref.as_deref(), image_base_url)
    }
}

/// A durable record that an item was placed in a bucket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    pub user_id: UserId,
    pub category: Category,
    pub item_id: ItemId,
    pub bucket: Bucket,
    pub metadata: DecisionMetadata,
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    /// Record key within a bucket: `{userId}_{category}_{itemId}`
    pub fn record_key(user_id: &UserId, category: Category, item_id: ItemId) -> String {
        format!("{}_{}_{}", user_id, category, item_id)
    }

    pub fn key(&self) -> String {
        Self::record_key(&self.user_id, self.category, self.item_id)
    }
}
