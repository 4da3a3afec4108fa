use std::collections::HashSet;

use crate::{
    db::DecisionStore,
    error::FeedError,
    models::{Bucket, Category, ItemId, UserId},
};

/// IDs that must not be offered again during a feed session
///
/// Seeded from the three decision buckets at session start and only ever
/// grows until the session ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    ids: HashSet<ItemId>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.ids.contains(&id)
    }

    /// Returns true when the ID was not already excluded
    pub fn insert(&mut self, id: ItemId) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<ItemId> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = ItemId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl Extend<ItemId> for ExclusionSet {
    fn extend<I: IntoIterator<Item = ItemId>>(&mut self, iter: I) {
        self.ids.extend(iter);
    }
}

/// Builds the exclusion set for a user and category
///
/// The three bucket reads run concurrently and are all awaited before
/// returning, so the cost is that of the slowest read. Any failed read fails
/// the whole build; callers decide whether to fall back to an empty set.
pub async fn build_exclusion_set(
    store: &dyn DecisionStore,
    user_id: &UserId,
    category: Category,
) -> Result<ExclusionSet, FeedError> {
    let (watched, watchlisted, skipped) = tokio::join!(
        store.read_bucket_ids(user_id, category, Bucket::Watched),
        store.read_bucket_ids(user_id, category, Bucket::Watchlisted),
        store.read_bucket_ids(user_id, category, Bucket::Skipped),
    );

    let mut exclusion = ExclusionSet::new();
    for (bucket, result) in [
        (Bucket::Watched, watched),
        (Bucket::Watchlisted, watchlisted),
        (Bucket::Skipped, skipped),
    ] {
        let ids = result.map_err(|e| {
            FeedError::CollaboratorUnavailable(format!("reading {} bucket: {}", bucket, e))
        })?;
        exclusion.extend(ids);
    }

    tracing::debug!(
        user_id = %user_id,
        category = %category,
        excluded = exclusion.len(),
        store = store.name(),
        "Exclusion set built"
    );

    Ok(exclusion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::decisions::MockDecisionStore;
    use crate::error::StoreError;
    use crate::models::DecisionMetadata;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_union_of_all_buckets() {
        let mut store = MockDecisionStore::new();
        store
            .expect_read_bucket_ids()
            .times(3)
            .returning(|_, _, bucket| {
                Ok(match bucket {
                    Bucket::Watched => HashSet::from([1, 2]),
                    Bucket::Watchlisted => HashSet::from([2, 3]),
                    Bucket::Skipped => HashSet::from([4]),
                })
            });
        store.expect_name().return_const("mock");

        let exclusion = build_exclusion_set(&store, &UserId::new("u1"), Category::Movie)
            .await
            .unwrap();

        assert_eq!(exclusion.len(), 4);
        for id in [1, 2, 3, 4] {
            assert!(exclusion.contains(id));
        }
    }

    #[tokio::test]
    async fn test_reads_are_scoped_to_category() {
        let mut store = MockDecisionStore::new();
        store
            .expect_read_bucket_ids()
            .withf(|user, category, _| user.as_str() == "u1" && *category == Category::Series)
            .times(3)
            .returning(|_, _, _| Ok(HashSet::new()));
        store.expect_name().return_const("mock");

        let exclusion = build_exclusion_set(&store, &UserId::new("u1"), Category::Series)
            .await
            .unwrap();
        assert!(exclusion.is_empty());
    }

    #[tokio::test]
    async fn test_any_failed_read_fails_build() {
        let mut store = MockDecisionStore::new();
        store
            .expect_read_bucket_ids()
            .returning(|_, _, bucket| match bucket {
                Bucket::Skipped => Err(StoreError::Unavailable("offline".to_string())),
                _ => Ok(HashSet::from([9])),
            });

        let result = build_exclusion_set(&store, &UserId::new("u1"), Category::Movie).await;
        assert!(matches!(
            result,
            Err(FeedError::CollaboratorUnavailable(msg)) if msg.contains("skipped")
        ));
    }

    /// Store whose every read takes a fixed delay
    struct SlowReads(Duration);

    #[async_trait::async_trait]
    impl DecisionStore for SlowReads {
        async fn read_bucket_ids(
            &self,
            _: &UserId,
            _: Category,
            bucket: Bucket,
        ) -> Result<HashSet<ItemId>, StoreError> {
            tokio::time::sleep(self.0).await;
            Ok(HashSet::from([bucket as ItemId]))
        }

        async fn write_decision(
            &self,
            _: &UserId,
            _: Category,
            _: ItemId,
            _: Bucket,
            _: &DecisionMetadata,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn delete_decision(
            &self,
            _: &UserId,
            _: Category,
            _: ItemId,
            _: Bucket,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn list_bucket(
            &self,
            _: &UserId,
            _: Category,
            _: Bucket,
        ) -> Result<Vec<crate::models::Decision>, StoreError> {
            Ok(vec![])
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_bucket_reads_run_concurrently() {
        let store = SlowReads(Duration::from_millis(200));
        let started = Instant::now();

        let exclusion = build_exclusion_set(&store, &UserId::new("u1"), Category::Movie)
            .await
            .unwrap();

        // Sequential reads would take at least 600ms
        assert!(started.elapsed() < Duration::from_millis(500));
        assert_eq!(exclusion.len(), 3);
    }

    #[test]
    fn test_insert_reports_novelty() {
        let mut exclusion: ExclusionSet = [5].into_iter().collect();
        assert!(!exclusion.insert(5));
        assert!(exclusion.insert(6));
        assert_eq!(exclusion.len(), 2);
    }
}
