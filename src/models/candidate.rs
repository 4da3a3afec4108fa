use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Category, DecisionMetadata};

/// Catalog identifier of a title, unique within a category
pub type ItemId = i64;

/// Joins a catalog image path onto the image base URL; blank paths have no poster
pub fn resolve_poster_url(poster_ref: Option<&str>, image_base_url: &str) -> Option<String> {
    poster_ref
        .filter(|path| !path.is_empty())
        .map(|path| format!("{}{}", image_base_url.trim_end_matches('/'), path))
}

/// A title offered to the user for classification
///
/// Built from a catalog response and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub id: ItemId,
    pub title: String,
    pub overview: String,
    /// Catalog image path, e.g. `/qJ2tW6WMUDux911r6m7haRef0WH.jpg`
    pub poster_ref: Option<String>,
    /// Four-digit release year or `"N/A"`
    pub year: String,
    /// Average rating on a 0-10 scale
    pub rating: f64,
    pub category: Category,
    pub genre_refs: BTreeSet<i64>,
}

impl Candidate {
    /// Resolves the poster reference against an image base URL
    pub fn poster_url(&self, image_base_url: &str) -> Option<String> {
        resolve_poster_url(self.poster_ref.as_deref(), image_base_url)
    }

    /// Rating rendered with one decimal place
    pub fn rating_formatted(&self) -> String {
        format!("{:.1}", self.rating)
    }

    /// Snapshot stored alongside a decision so library screens render without the catalog
    pub fn metadata(&self) -> DecisionMetadata {
        DecisionMetadata {
            title: self.title.clone(),
            year: self.year.clone(),
            poster_ref: self.poster_ref.clone(),
            rating: self.rating,
            genre_refs: self.genre_refs.iter().copied().collect(),
        }
    }
}

/// One page of catalog results in relevance order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogPage {
    pub page: u32,
    pub total_pages: u32,
    pub results: Vec<Candidate>,
}

impl CatalogPage {
    /// True when no page after this one exists
    pub fn is_last(&self) -> bool {
        self.page >= self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(poster_ref: Option<&str>) -> Candidate {
        Candidate {
            id: 27205,
            title: "Inception".to_string(),
            overview: "A thief who steals corporate secrets".to_string(),
            poster_ref: poster_ref.map(str::to_string),
            year: "2010".to_string(),
            rating: 8.369,
            category: Category::Movie,
            genre_refs: [28, 878].into_iter().collect(),
        }
    }

    #[test]
    fn test_poster_url() {
        let c = candidate(Some("/inception.jpg"));
        assert_eq!(
            c.poster_url("https://image.tmdb.org/t/p/w500/"),
            Some("https://image.tmdb.org/t/p/w500/inception.jpg".to_string())
        );
    }

    #[test]
    fn test_poster_url_missing_or_empty() {
        assert_eq!(candidate(None).poster_url("https://img"), None);
        assert_eq!(candidate(Some("")).poster_url("https://img"), None);
    }

    #[test]
    fn test_rating_formatted() {
        assert_eq!(candidate(None).rating_formatted(), "8.4");
    }

    #[test]
    fn test_metadata_snapshot() {
        let meta = candidate(Some("/p.jpg")).metadata();
        assert_eq!(meta.title, "Inception");
        assert_eq!(meta.year, "2010");
        assert_eq!(meta.poster_ref.as_deref(), Some("/p.jpg"));
        assert_eq!(meta.genre_refs, vec![28, 878]);
    }

    #[test]
    fn test_catalog_page_is_last() {
        let page = CatalogPage {
            page: 3,
            total_pages: 3,
            results: vec![],
        };
        assert!(page.is_last());

        let page = CatalogPage {
            page: 1,
            total_pages: 500,
            results: vec![],
        };
        assert!(!page.is_last());
    }
}
