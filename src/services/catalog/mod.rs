/// Content catalog abstraction
///
/// The discovery feed pulls ranked pages from a catalog and the search screen
/// queries it by text. Both go through [`CatalogClient`] so the engine can be
/// driven by a test double instead of the network.
use crate::{
    error::CatalogError,
    models::{CatalogPage, Candidate, Category},
};

pub mod tmdb;

pub use tmdb::TmdbCatalog;

/// Read-only, paginated source of candidate titles
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetches one page of candidates in relevance order
    ///
    /// Pages are numbered from 1.
    async fn fetch_page(&self, category: Category, page: u32) -> Result<CatalogPage, CatalogError>;

    /// Free-text search within a category
    async fn search_by_text(
        &self,
        category: Category,
        query: &str,
    ) -> Result<Vec<Candidate>, CatalogError>;

    /// Catalog name for logging and debugging
    fn name(&self) -> &'static str;
}
