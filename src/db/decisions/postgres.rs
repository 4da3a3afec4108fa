use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashSet;

use super::DecisionStore;
use crate::{
    error::StoreError,
    models::{Bucket, Category, Decision, DecisionMetadata, ItemId, UserId},
};

/// Decision store backed by the `decisions` table
#[derive(Clone)]
pub struct PgDecisionStore {
    pool: PgPool,
}

impl PgDecisionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct DecisionRow {
    user_id: String,
    item_id: i64,
    title: String,
    year: String,
    poster_ref: Option<String>,
    rating: f64,
    genre_refs: Vec<i64>,
    decided_at: DateTime<Utc>,
}

impl DecisionRow {
    fn into_decision(self, category: Category, bucket: Bucket) -> Decision {
        Decision {
            user_id: UserId(self.user_id),
            category,
            item_id: self.item_id,
            bucket,
            metadata: DecisionMetadata {
                title: self.title,
                year: self.year,
                poster_ref: self.poster_ref,
                rating: self.rating,
                genre_refs: self.genre_refs,
            },
            decided_at: self.decided_at,
        }
    }
}

#[async_trait::async_trait]
impl DecisionStore for PgDecisionStore {
    async fn read_bucket_ids(
        &self,
        user_id: &UserId,
        category: Category,
        bucket: Bucket,
    ) -> Result<HashSet<ItemId>, StoreError> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT item_id
            FROM decisions
            WHERE user_id = $1 AND category = $2 AND bucket = $3
            "#,
        )
        .bind(user_id.as_str())
        .bind(category.as_str())
        .bind(bucket.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    async fn write_decision(
        &self,
        user_id: &UserId,
        category: Category,
        item_id: ItemId,
        bucket: Bucket,
        metadata: &DecisionMetadata,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO decisions
                (user_id, category, item_id, bucket, title, year, poster_ref, rating, genre_refs, decided_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now())
            ON CONFLICT (user_id, category, item_id, bucket) DO UPDATE SET
                title = EXCLUDED.title,
                year = EXCLUDED.year,
                poster_ref = EXCLUDED.poster_ref,
                rating = EXCLUDED.rating,
                genre_refs = EXCLUDED.genre_refs,
                decided_at = EXCLUDED.decided_at
            "#,
        )
        .bind(user_id.as_str())
        .bind(category.as_str())
        .bind(item_id)
        .bind(bucket.as_str())
        .bind(&metadata.title)
        .bind(&metadata.year)
        .bind(metadata.poster_ref.as_deref())
        .bind(metadata.rating)
        .bind(&metadata.genre_refs)
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            key = %Decision::record_key(user_id, category, item_id),
            bucket = %bucket,
            "Decision written"
        );

        Ok(())
    }

    async fn delete_decision(
        &self,
        user_id: &UserId,
        category: Category,
        item_id: ItemId,
        bucket: Bucket,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            DELETE FROM decisions
            WHERE user_id = $1 AND category = $2 AND item_id = $3 AND bucket = $4
            "#,
        )
        .bind(user_id.as_str())
        .bind(category.as_str())
        .bind(item_id)
        .bind(bucket.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_bucket(
        &self,
        user_id: &UserId,
        category: Category,
        bucket: Bucket,
    ) -> Result<Vec<Decision>, StoreError> {
        let rows: Vec<DecisionRow> = sqlx::query_as(
            r#"
            SELECT user_id, item_id, title, year, poster_ref, rating, genre_refs, decided_at
            FROM decisions
            WHERE user_id = $1 AND category = $2 AND bucket = $3
            ORDER BY decided_at DESC
            "#,
        )
        .bind(user_id.as_str())
        .bind(category.as_str())
        .bind(bucket.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| row.into_decision(category, bucket))
            .collect())
    }

    async fn move_decision(
        &self,
        user_id: &UserId,
        category: Category,
        item_id: ItemId,
        from: Bucket,
        to: Bucket,
        metadata: &DecisionMetadata,
    ) -> Result<(), StoreError> {
        // Both statements commit together
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO decisions
                (user_id, category, item_id, bucket, title, year, poster_ref, rating, genre_refs, decided_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now())
            ON CONFLICT (user_id, category, item_id, bucket) DO UPDATE SET
                decided_at = EXCLUDED.decided_at
            "#,
        )
        .bind(user_id.as_str())
        .bind(category.as_str())
        .bind(item_id)
        .bind(to.as_str())
        .bind(&metadata.title)
        .bind(&metadata.year)
        .bind(metadata.poster_ref.as_deref())
        .bind(metadata.rating)
        .bind(&metadata.genre_refs)
        .execute(&mut *tx)
        .await?;

        if from != to {
            sqlx::query(
                r#"
                DELETE FROM decisions
                WHERE user_id = $1 AND category = $2 AND item_id = $3 AND bucket = $4
                "#,
            )
            .bind(user_id.as_str())
            .bind(category.as_str())
            .bind(item_id)
            .bind(from.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            key = %Decision::record_key(user_id, category, item_id),
            from = %from,
            to = %to,
            "Decision moved"
        );

        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
