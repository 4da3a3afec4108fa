use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tracing::instrument;

use super::{
    buffer::FeedBuffer,
    exclusion::{build_exclusion_set, ExclusionSet},
    state::{ClassifyOutcome, FeedSnapshot, FeedState},
};
use crate::{
    config::FeedConfig,
    db::DecisionStore,
    error::FeedError,
    models::{Bucket, Candidate, Category, ItemId, UserId},
    services::catalog::CatalogClient,
};

/// Mutable state of one feed session, owned by its controller
struct Session {
    /// Bumped on every start, switch and close; results from older generations are dropped
    generation: u64,
    category: Option<Category>,
    exclusion: ExclusionSet,
    buffer: FeedBuffer,
    prefetch_task: Option<JoinHandle<()>>,
}

impl Session {
    fn new(generation: u64, category: Option<Category>, config: &FeedConfig) -> Self {
        Self {
            generation,
            category,
            exclusion: ExclusionSet::new(),
            buffer: FeedBuffer::new(config.max_empty_pages),
            prefetch_task: None,
        }
    }

    fn prefetching(&self) -> bool {
        self.prefetch_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn cancel_prefetch(&mut self) {
        if let Some(task) = self.prefetch_task.take() {
            task.abort();
        }
    }

    /// Settled state once no load is pending
    fn resolve_state(&self, collaborator_failed: bool) -> FeedState {
        if self.prefetching() {
            FeedState::Prefetching
        } else if !self.buffer.is_empty() {
            FeedState::Ready
        } else if collaborator_failed {
            FeedState::Error
        } else {
            FeedState::Empty
        }
    }
}

struct ControllerInner {
    user_id: UserId,
    catalog: Arc<dyn CatalogClient>,
    store: Arc<dyn DecisionStore>,
    config: FeedConfig,
    session: Mutex<Session>,
    classifying: AtomicBool,
    state_tx: watch::Sender<FeedState>,
}

impl ControllerInner {
    /// Publishes a state; callers hold the session lock so publishes follow generation order
    fn publish(&self, session: &Session, state: FeedState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            tracing::debug!(
                user_id = %self.user_id,
                generation = session.generation,
                from = ?previous,
                to = ?state,
                "Feed state changed"
            );
        }
    }
}

/// Resets the in-progress flag once the advance is done, however it exits
struct ClassifyGuard<'a>(&'a AtomicBool);

impl Drop for ClassifyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives one user's discovery feed
///
/// Serves candidates in catalog order, records each classification once and
/// keeps the buffer topped up from later catalog pages. Cloning yields another
/// handle to the same session.
#[derive(Clone)]
pub struct FeedController {
    inner: Arc<ControllerInner>,
}

impl FeedController {
    pub fn new(
        user_id: UserId,
        catalog: Arc<dyn CatalogClient>,
        store: Arc<dyn DecisionStore>,
        config: FeedConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(FeedState::Uninitialized);
        let session = Session::new(0, None, &config);

        Self {
            inner: Arc::new(ControllerInner {
                user_id,
                catalog,
                store,
                config,
                session: Mutex::new(session),
                classifying: AtomicBool::new(false),
                state_tx,
            }),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.inner.user_id
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.inner.state_tx.subscribe()
    }

    pub fn state(&self) -> FeedState {
        *self.inner.state_tx.borrow()
    }

    pub async fn snapshot(&self) -> FeedSnapshot {
        let session = self.inner.session.lock().await;
        FeedSnapshot {
            state: self.state(),
            category: session.category,
            buffered: session.buffer.len(),
            excluded: session.exclusion.len(),
            next_page: session.buffer.next_page(),
            exhausted: session.buffer.is_exhausted(),
            generation: session.generation,
        }
    }

    pub async fn is_excluded(&self, item_id: ItemId) -> bool {
        self.inner.session.lock().await.exclusion.contains(item_id)
    }

    /// Begins a new session for `category`
    ///
    /// Discards the previous buffer and exclusion set, cancels any prefetch,
    /// rebuilds the exclusion set and loads the initial pages before
    /// returning. Returns `SessionStale` if a newer start overtook this one.
    #[instrument(skip(self), fields(user_id = %self.inner.user_id))]
    pub async fn start(&self, category: Category) -> Result<FeedState, FeedError> {
        let inner = &self.inner;
        let config = inner.config;

        let generation = {
            let mut session = inner.session.lock().await;
            session.cancel_prefetch();
            let generation = session.generation + 1;
            *session = Session::new(generation, Some(category), &config);
            inner.publish(&session, FeedState::Loading);
            generation
        };

        let exclusion =
            match build_exclusion_set(inner.store.as_ref(), &inner.user_id, category).await {
                Ok(exclusion) => exclusion,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        category = %category,
                        "Exclusion set unavailable, feed may repeat decided items"
                    );
                    ExclusionSet::new()
                }
            };

        let mut buffer = FeedBuffer::new(config.max_empty_pages);
        let mut pages_requested = 0;
        let mut catalog_failed = false;

        // Keep going past the initial run while nothing survived filtering;
        // the empty-page limit bounds this loop.
        while !buffer.is_exhausted() && (pages_requested < config.initial_pages || buffer.is_empty())
        {
            pages_requested += 1;
            let page = buffer.advance_page();

            match inner.catalog.fetch_page(category, page).await {
                Ok(results) => {
                    buffer.append_page(results, &exclusion);
                }
                Err(e) => {
                    tracing::warn!(error = %e, page, category = %category, "Initial page load failed");
                    buffer.requeue_page(page);
                    catalog_failed = true;
                    break;
                }
            }
        }

        let mut session = inner.session.lock().await;
        if session.generation != generation {
            tracing::debug!(generation, "Discarding superseded feed start");
            return Err(FeedError::SessionStale);
        }

        session.exclusion = exclusion;
        session.buffer = buffer;
        let state = session.resolve_state(catalog_failed);
        inner.publish(&session, state);

        tracing::info!(
            category = %category,
            generation,
            buffered = session.buffer.len(),
            excluded = session.exclusion.len(),
            next_page = session.buffer.next_page(),
            state = ?state,
            "Feed session started"
        );

        Ok(state)
    }

    /// Restarts the session on another category
    pub async fn switch_category(&self, category: Category) -> Result<FeedState, FeedError> {
        tracing::info!(user_id = %self.inner.user_id, category = %category, "Switching feed category");
        self.start(category).await
    }

    /// The candidate awaiting classification; repeated calls return the same item
    pub async fn current(&self) -> Option<Candidate> {
        self.inner.session.lock().await.buffer.peek().cloned()
    }

    /// Places the current candidate in `bucket` and advances the feed
    ///
    /// The item is excluded and the feed advanced before the decision write
    /// is awaited. A failed write is reported in the outcome but the advance
    /// stands: re-offering a decided item is worse than losing the record.
    /// Calls overlapping another call's advance are rejected with
    /// `ClassificationInProgress` and change nothing. A pending write does
    /// not hold up the next classification.
    #[instrument(skip(self), fields(user_id = %self.inner.user_id))]
    pub async fn classify(&self, bucket: Bucket) -> Result<ClassifyOutcome, FeedError> {
        let inner = &self.inner;

        let (candidate, category, generation) = {
            if inner
                .classifying
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                tracing::debug!("Rejected overlapping classification");
                return Err(FeedError::ClassificationInProgress);
            }
            let _guard = ClassifyGuard(&inner.classifying);

            let mut session = inner.session.lock().await;
            let category = session.category.ok_or(FeedError::NoCurrentItem)?;
            let item_id = session
                .buffer
                .peek()
                .map(|c| c.id)
                .ok_or(FeedError::NoCurrentItem)?;

            session.exclusion.insert(item_id);
            let candidate = session
                .buffer
                .take_head()
                .ok_or(FeedError::NoCurrentItem)?;
            (candidate, category, session.generation)
        };

        let write_error = match inner
            .store
            .write_decision(
                &inner.user_id,
                category,
                candidate.id,
                bucket,
                &candidate.metadata(),
            )
            .await
        {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    item_id = candidate.id,
                    bucket = %bucket,
                    store = inner.store.name(),
                    "Decision write failed; feed advanced anyway"
                );
                Some(e.to_string())
            }
        };

        let state = self.after_classify(generation, write_error.is_some()).await;

        tracing::info!(
            item_id = candidate.id,
            bucket = %bucket,
            persisted = write_error.is_none(),
            state = ?state,
            "Candidate classified"
        );

        Ok(ClassifyOutcome {
            item_id: candidate.id,
            bucket,
            persisted: write_error.is_none(),
            write_error,
            state,
        })
    }

    /// Tears the session down and cancels in-flight work
    pub async fn close(&self) {
        let mut session = self.inner.session.lock().await;
        session.cancel_prefetch();
        let generation = session.generation + 1;
        *session = Session::new(generation, None, &self.inner.config);
        self.inner.publish(&session, FeedState::Uninitialized);
    }

    async fn after_classify(&self, generation: u64, write_failed: bool) -> FeedState {
        let inner = &self.inner;
        let mut session = inner.session.lock().await;

        if session.generation != generation {
            tracing::debug!(generation, "Classification finished after session was replaced");
            return self.state();
        }

        let needs_prefetch = session.buffer.is_low(inner.config.low_water_mark)
            && !session.buffer.is_exhausted()
            && !session.prefetching();

        if needs_prefetch {
            if let Some(category) = session.category {
                let task = tokio::spawn(run_prefetch(Arc::clone(inner), generation, category));
                session.prefetch_task = Some(task);
            }
        }

        let state = session.resolve_state(write_failed);
        inner.publish(&session, state);
        state
    }
}

/// Pulls pages until the buffer is above the low-water mark or the catalog runs dry
///
/// Holds the session lock only between network calls, so `current` and
/// `classify` keep working while a page is in flight.
async fn run_prefetch(inner: Arc<ControllerInner>, generation: u64, category: Category) {
    let mut catalog_failed = false;

    loop {
        let page = {
            let mut session = inner.session.lock().await;
            if session.generation != generation {
                return;
            }
            if session.buffer.is_exhausted()
                || !session.buffer.is_low(inner.config.low_water_mark)
            {
                break;
            }
            session.buffer.advance_page()
        };

        let result = inner.catalog.fetch_page(category, page).await;

        let mut session = inner.session.lock().await;
        if session.generation != generation {
            tracing::debug!(page, generation, "Discarding stale prefetch result");
            return;
        }

        match result {
            Ok(results) => {
                let Session {
                    buffer, exclusion, ..
                } = &mut *session;
                let added = buffer.append_page(results, exclusion);
                tracing::debug!(
                    user_id = %inner.user_id,
                    page,
                    added,
                    buffered = buffer.len(),
                    "Prefetched page"
                );
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %inner.user_id,
                    error = %e,
                    page,
                    buffered = session.buffer.len(),
                    "Prefetch failed, keeping buffered items"
                );
                session.buffer.requeue_page(page);
                catalog_failed = true;
                break;
            }
        }
    }

    let mut session = inner.session.lock().await;
    if session.generation != generation {
        return;
    }
    session.prefetch_task = None;
    let state = session.resolve_state(catalog_failed);
    inner.publish(&session, state);
}
