use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use super::FeedController;
use crate::{
    config::FeedConfig, db::DecisionStore, models::UserId, services::catalog::CatalogClient,
};

/// Registry of per-user feed controllers
///
/// Controllers are created on first use and live until removed; all of them
/// share the same catalog client and decision store.
#[derive(Clone)]
pub struct FeedSessions {
    catalog: Arc<dyn CatalogClient>,
    store: Arc<dyn DecisionStore>,
    config: FeedConfig,
    controllers: Arc<RwLock<HashMap<UserId, FeedController>>>,
}

impl FeedSessions {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        store: Arc<dyn DecisionStore>,
        config: FeedConfig,
    ) -> Self {
        Self {
            catalog,
            store,
            config,
            controllers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, user_id: &UserId) -> Option<FeedController> {
        self.controllers.read().await.get(user_id).cloned()
    }

    pub async fn get_or_create(&self, user_id: &UserId) -> FeedController {
        if let Some(controller) = self.get(user_id).await {
            return controller;
        }

        let mut controllers = self.controllers.write().await;
        controllers
            .entry(user_id.clone())
            .or_insert_with(|| {
                tracing::debug!(user_id = %user_id, "Creating feed controller");
                FeedController::new(
                    user_id.clone(),
                    Arc::clone(&self.catalog),
                    Arc::clone(&self.store),
                    self.config,
                )
            })
            .clone()
    }

    /// Drops a user's controller after closing its session
    pub async fn remove(&self, user_id: &UserId) -> bool {
        let removed = self.controllers.write().await.remove(user_id);
        match removed {
            Some(controller) => {
                controller.close().await;
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.controllers.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::services::feed::testing::{ControlledStore, ScriptedCatalog};
    use crate::services::feed::FeedState;

    fn sessions() -> FeedSessions {
        FeedSessions::new(
            Arc::new(ScriptedCatalog::new(100).page(Category::Movie, 1, &[1, 2])),
            Arc::new(ControlledStore::new()),
            FeedConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_controller() {
        let sessions = sessions();
        let user = UserId::new("alice");

        let first = sessions.get_or_create(&user).await;
        first.start(Category::Movie).await.unwrap();

        let second = sessions.get_or_create(&user).await;
        assert_eq!(second.state(), FeedState::Ready);
        assert_eq!(sessions.len().await, 1);
    }

    #[tokio::test]
    async fn test_users_have_separate_sessions() {
        let sessions = sessions();
        let alice = sessions.get_or_create(&UserId::new("alice")).await;
        let bob = sessions.get_or_create(&UserId::new("bob")).await;

        alice.start(Category::Movie).await.unwrap();

        assert_eq!(alice.state(), FeedState::Ready);
        assert_eq!(bob.state(), FeedState::Uninitialized);
        assert_eq!(bob.user_id().as_str(), "bob");
    }

    #[tokio::test]
    async fn test_get_never_creates() {
        let sessions = sessions();
        assert!(sessions.get(&UserId::new("alice")).await.is_none());
        assert_eq!(sessions.len().await, 0);
    }

    #[tokio::test]
    async fn test_remove_closes_session() {
        let sessions = sessions();
        let user = UserId::new("alice");
        let controller = sessions.get_or_create(&user).await;
        controller.start(Category::Movie).await.unwrap();

        assert!(sessions.remove(&user).await);
        assert_eq!(controller.state(), FeedState::Uninitialized);
        assert!(sessions.get(&user).await.is_none());
        assert!(!sessions.remove(&user).await);
    }
}
