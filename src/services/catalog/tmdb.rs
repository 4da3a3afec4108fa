/// TMDB catalog client
///
/// Endpoints:
/// 1. Movie feed: /discover/movie (English originals above a vote-count floor)
/// 2. Series feed: /tv/popular
/// 3. Search: /search/movie and /search/tv
///
/// Authenticates with a v4 read access token. Page and search responses are
/// memoized in Redis when a cache is configured.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::CatalogError,
    models::{
        tmdb::{TmdbMovie, TmdbPage, TmdbTvShow},
        CatalogPage, Candidate, Category,
    },
    services::catalog::CatalogClient,
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    access_token: String,
    api_url: String,
    min_vote_count: u32,
    cache: Option<Cache>,
    cache_ttl: u64,
}

impl TmdbCatalog {
    pub fn new(access_token: String, api_url: String, min_vote_count: u32) -> Self {
        Self {
            http_client: HttpClient::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
            access_token,
            api_url: api_url.trim_end_matches('/').to_string(),
            min_vote_count,
            cache: None,
            cache_ttl: 0,
        }
    }

    /// Enables response memoization
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    fn feed_endpoint(&self, category: Category) -> String {
        match category {
            Category::Movie => format!("{}/discover/movie", self.api_url),
            Category::Series => format!("{}/tv/popular", self.api_url),
        }
    }

    fn search_endpoint(&self, category: Category) -> String {
        match category {
            Category::Movie => format!("{}/search/movie", self.api_url),
            Category::Series => format!("{}/search/tv", self.api_url),
        }
    }

    fn feed_query(&self, page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("language", "en-US".to_string()),
            ("page", page.to_string()),
            ("with_original_language", "en".to_string()),
            ("vote_count.gte", self.min_vote_count.to_string()),
        ]
    }

    /// Maps a non-success status to the catalog error taxonomy
    fn status_error(status: StatusCode, body: String) -> CatalogError {
        let message = format!("TMDB API returned status {}: {}", status, body);
        if status.is_client_error() {
            CatalogError::BadRequest(message)
        } else {
            CatalogError::ServerError(message)
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, CatalogError> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.access_token)
            .header("accept", "application/json")
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, body));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(error = %e, url = %url, "Failed to deserialize TMDB response");
            CatalogError::Decode(e.to_string())
        })
    }

    async fn fetch_page_uncached(
        &self,
        category: Category,
        page: u32,
    ) -> Result<CatalogPage, CatalogError> {
        let url = self.feed_endpoint(category);
        let query = self.feed_query(page);

        let page: CatalogPage = match category {
            Category::Movie => self.get_json::<TmdbPage<TmdbMovie>>(&url, &query).await?.into(),
            Category::Series => self.get_json::<TmdbPage<TmdbTvShow>>(&url, &query).await?.into(),
        };

        tracing::info!(
            category = %category,
            page = page.page,
            total_pages = page.total_pages,
            results = page.results.len(),
            provider = "tmdb",
            "Catalog page fetched"
        );

        Ok(page)
    }

    async fn search_uncached(
        &self,
        category: Category,
        query: &str,
    ) -> Result<Vec<Candidate>, CatalogError> {
        let url = self.search_endpoint(category);
        let params = vec![
            ("query", query.to_string()),
            ("include_adult", "false".to_string()),
            ("language", "en-US".to_string()),
            ("page", "1".to_string()),
        ];

        let page: CatalogPage = match category {
            Category::Movie => self.get_json::<TmdbPage<TmdbMovie>>(&url, &params).await?.into(),
            Category::Series => self.get_json::<TmdbPage<TmdbTvShow>>(&url, &params).await?.into(),
        };

        tracing::info!(
            query = %query,
            category = %category,
            results = page.results.len(),
            provider = "tmdb",
            "Title search completed"
        );

        Ok(page.results)
    }
}

#[async_trait::async_trait]
impl CatalogClient for TmdbCatalog {
    async fn fetch_page(&self, category: Category, page: u32) -> Result<CatalogPage, CatalogError> {
        if page == 0 {
            return Err(CatalogError::BadRequest("Pages start at 1".to_string()));
        }

        match &self.cache {
            Some(cache) => cached!(
                cache,
                CacheKey::CatalogPage(category, page),
                self.cache_ttl,
                self.fetch_page_uncached(category, page)
            ),
            None => self.fetch_page_uncached(category, page).await,
        }
    }

    async fn search_by_text(
        &self,
        category: Category,
        query: &str,
    ) -> Result<Vec<Candidate>, CatalogError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CatalogError::BadRequest(
                "Search query cannot be empty".to_string(),
            ));
        }

        match &self.cache {
            Some(cache) => cached!(
                cache,
                CacheKey::CatalogSearch(category, query.to_string()),
                self.cache_ttl,
                self.search_uncached(category, query)
            ),
            None => self.search_uncached(category, query).await,
        }
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
