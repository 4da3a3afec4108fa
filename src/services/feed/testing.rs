//! Collaborator doubles for feed engine tests

use std::collections::{HashMap, HashSet};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use tokio::sync::Notify;

use super::{FeedController, FeedState};
use crate::{
    db::{DecisionStore, MemoryDecisionStore},
    error::{CatalogError, StoreError},
    models::{Bucket, CatalogPage, Candidate, Category, Decision, DecisionMetadata, ItemId, UserId},
    services::catalog::CatalogClient,
};

pub fn candidate(id: ItemId, category: Category) -> Candidate {
    Candidate {
        id,
        title: format!("Title {}", id),
        overview: String::new(),
        poster_ref: Some(format!("/{}.jpg", id)),
        year: "2021".to_string(),
        rating: 7.5,
        category,
        genre_refs: Default::default(),
    }
}

/// Holds one page fetch in flight until released
#[derive(Default)]
pub struct PageGate {
    /// Fired once the fetch is parked on the gate
    pub entered: Notify,
    pub release: Notify,
}

/// Catalog serving fixed pages; unscripted pages come back empty
pub struct ScriptedCatalog {
    total_pages: u32,
    pages: HashMap<(Category, u32), Result<Vec<ItemId>, CatalogError>>,
    gates: HashMap<(Category, u32), Arc<PageGate>>,
    calls: Mutex<Vec<(Category, u32)>>,
}

impl ScriptedCatalog {
    pub fn new(total_pages: u32) -> Self {
        Self {
            total_pages,
            pages: HashMap::new(),
            gates: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn page(mut self, category: Category, page: u32, ids: &[ItemId]) -> Self {
        self.pages.insert((category, page), Ok(ids.to_vec()));
        self
    }

    pub fn failing(mut self, category: Category, page: u32, error: CatalogError) -> Self {
        self.pages.insert((category, page), Err(error));
        self
    }

    /// Holds the page response until the returned gate is released
    pub fn gated(mut self, category: Category, page: u32) -> (Self, Arc<PageGate>) {
        let gate = Arc::new(PageGate::default());
        self.gates.insert((category, page), Arc::clone(&gate));
        (self, gate)
    }

    pub fn calls(&self) -> Vec<(Category, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CatalogClient for ScriptedCatalog {
    async fn fetch_page(&self, category: Category, page: u32) -> Result<CatalogPage, CatalogError> {
        self.calls.lock().unwrap().push((category, page));

        if let Some(gate) = self.gates.get(&(category, page)) {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let ids = match self.pages.get(&(category, page)) {
            Some(Ok(ids)) => ids.clone(),
            Some(Err(e)) => return Err(e.clone()),
            None => Vec::new(),
        };

        Ok(CatalogPage {
            page,
            total_pages: self.total_pages,
            results: ids.into_iter().map(|id| candidate(id, category)).collect(),
        })
    }

    async fn search_by_text(
        &self,
        category: Category,
        query: &str,
    ) -> Result<Vec<Candidate>, CatalogError> {
        Ok(vec![Candidate {
            title: query.to_string(),
            ..candidate(1, category)
        }])
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Memory store with switchable failures and an optional write gate
#[derive(Default)]
pub struct ControlledStore {
    pub inner: MemoryDecisionStore,
    pub fail_reads: AtomicBool,
    pub fail_writes_for: Mutex<HashSet<ItemId>>,
    pub gate_writes: AtomicBool,
    pub write_entered: Notify,
    pub write_release: Notify,
}

impl ControlledStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, user: &UserId, category: Category, bucket: Bucket, ids: &[ItemId]) {
        for id in ids {
            self.inner
                .write_decision(user, category, *id, bucket, &DecisionMetadata::default())
                .await
                .unwrap();
        }
    }

    pub async fn ids(&self, user: &UserId, category: Category, bucket: Bucket) -> HashSet<ItemId> {
        self.inner
            .read_bucket_ids(user, category, bucket)
            .await
            .unwrap()
    }
}

#[async_trait::async_trait]
impl DecisionStore for ControlledStore {
    async fn read_bucket_ids(
        &self,
        user_id: &UserId,
        category: Category,
        bucket: Bucket,
    ) -> Result<HashSet<ItemId>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("read refused".to_string()));
        }
        self.inner.read_bucket_ids(user_id, category, bucket).await
    }

    async fn write_decision(
        &self,
        user_id: &UserId,
        category: Category,
        item_id: ItemId,
        bucket: Bucket,
        metadata: &DecisionMetadata,
    ) -> Result<(), StoreError> {
        if self.gate_writes.load(Ordering::SeqCst) {
            self.write_entered.notify_one();
            self.write_release.notified().await;
        }
        if self.fail_writes_for.lock().unwrap().contains(&item_id) {
            return Err(StoreError::Unavailable("write refused".to_string()));
        }
        self.inner
            .write_decision(user_id, category, item_id, bucket, metadata)
            .await
    }

    async fn delete_decision(
        &self,
        user_id: &UserId,
        category: Category,
        item_id: ItemId,
        bucket: Bucket,
    ) -> Result<(), StoreError> {
        self.inner
            .delete_decision(user_id, category, item_id, bucket)
            .await
    }

    async fn list_bucket(
        &self,
        user_id: &UserId,
        category: Category,
        bucket: Bucket,
    ) -> Result<Vec<Decision>, StoreError> {
        self.inner.list_bucket(user_id, category, bucket).await
    }

    fn name(&self) -> &'static str {
        "controlled"
    }
}

/// Waits until no prefetch is pending and returns the settled state
pub async fn settle(controller: &FeedController) -> FeedState {
    let mut rx = controller.subscribe();
    let state = tokio::time::timeout(
        Duration::from_secs(2),
        rx.wait_for(|state| *state != FeedState::Prefetching),
    )
    .await
    .expect("feed did not settle")
    .expect("state channel closed");
    let settled = *state;
    settled
}
