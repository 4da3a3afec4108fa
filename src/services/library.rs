//! Watched and watchlist screens over the decision store

use crate::{
    db::DecisionStore,
    error::{AppError, AppResult},
    models::{Bucket, Category, Decision, ItemId, UserId},
};

/// Decisions in one bucket, most recent first
pub async fn list(
    store: &dyn DecisionStore,
    user_id: &UserId,
    category: Category,
    bucket: Bucket,
) -> AppResult<Vec<Decision>> {
    Ok(store.list_bucket(user_id, category, bucket).await?)
}

/// Deletes one decision; removing an item that was never recorded succeeds
pub async fn remove(
    store: &dyn DecisionStore,
    user_id: &UserId,
    category: Category,
    item_id: ItemId,
    bucket: Bucket,
) -> AppResult<()> {
    store
        .delete_decision(user_id, category, item_id, bucket)
        .await?;
    tracing::info!(user_id = %user_id, category = %category, item_id, bucket = %bucket, "Decision removed");
    Ok(())
}

/// Moves a watchlisted item to watched, carrying its stored metadata across
pub async fn mark_watched_from_watchlist(
    store: &dyn DecisionStore,
    user_id: &UserId,
    category: Category,
    item_id: ItemId,
) -> AppResult<Decision> {
    let existing = store
        .list_bucket(user_id, category, Bucket::Watchlisted)
        .await?
        .into_iter()
        .find(|d| d.item_id == item_id)
        .ok_or_else(|| AppError::NotFound(format!("{} {} is not on the watchlist", category, item_id)))?;

    store
        .move_decision(
            user_id,
            category,
            item_id,
            Bucket::Watchlisted,
            Bucket::Watched,
            &existing.metadata,
        )
        .await?;

    tracing::info!(user_id = %user_id, category = %category, item_id, "Watchlist item marked watched");

    store
        .list_bucket(user_id, category, Bucket::Watched)
        .await?
        .into_iter()
        .find(|d| d.item_id == item_id)
        .ok_or_else(|| AppError::Internal(format!("moved record {} missing from watched", item_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDecisionStore;
    use crate::models::DecisionMetadata;
    use tokio_test::{assert_err, assert_ok};

    fn metadata(title: &str) -> DecisionMetadata {
        DecisionMetadata {
            title: title.to_string(),
            year: "1999".to_string(),
            poster_ref: Some("/p.jpg".to_string()),
            rating: 8.7,
            genre_refs: vec![878],
        }
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_category() {
        let store = MemoryDecisionStore::new();
        let user = UserId::new("u1");
        for (id, title) in [(603, "The Matrix"), (604, "The Matrix Reloaded")] {
            store
                .write_decision(&user, Category::Movie, id, Bucket::Watched, &metadata(title))
                .await
                .unwrap();
        }

        let decisions = list(&store, &user, Category::Movie, Bucket::Watched)
            .await
            .unwrap();
        assert_eq!(decisions.len(), 2);
        assert!(list(&store, &user, Category::Series, Bucket::Watched)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = MemoryDecisionStore::new();
        let user = UserId::new("u1");
        store
            .write_decision(&user, Category::Movie, 1, Bucket::Skipped, &metadata("x"))
            .await
            .unwrap();

        assert_ok!(remove(&store, &user, Category::Movie, 1, Bucket::Skipped).await);
        assert_ok!(remove(&store, &user, Category::Movie, 1, Bucket::Skipped).await);

        assert!(list(&store, &user, Category::Movie, Bucket::Skipped)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_mark_watched_moves_record() {
        let store = MemoryDecisionStore::new();
        let user = UserId::new("u1");
        store
            .write_decision(
                &user,
                Category::Series,
                1396,
                Bucket::Watchlisted,
                &metadata("Breaking Bad"),
            )
            .await
            .unwrap();

        let moved = mark_watched_from_watchlist(&store, &user, Category::Series, 1396)
            .await
            .unwrap();

        assert_eq!(moved.bucket, Bucket::Watched);
        assert_eq!(moved.metadata.title, "Breaking Bad");
        assert!(store
            .read_bucket_ids(&user, Category::Series, Bucket::Watchlisted)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(store.record_count(&user, Category::Series, 1396).await, 1);
    }

    #[tokio::test]
    async fn test_mark_watched_requires_watchlist_entry() {
        let store = MemoryDecisionStore::new();
        let user = UserId::new("u1");

        let err = assert_err!(mark_watched_from_watchlist(&store, &user, Category::Movie, 42).await);
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
