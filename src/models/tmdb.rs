// ============================================================================
// TMDB API Types
// ============================================================================

use serde::Deserialize;

use super::{CatalogPage, Candidate, Category};

/// Paged list response shared by discover, popular and search endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage<T> {
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Movie entry from `/discover/movie` or `/search/movie`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

/// TV entry from `/tv/popular` or `/search/tv`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbTvShow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

/// Extracts the year from a `YYYY-MM-DD` date, `"N/A"` when absent
fn release_year(date: Option<&str>) -> String {
    match date.map(str::trim).and_then(|d| d.get(..4)) {
        Some(year) if year.chars().all(|c| c.is_ascii_digit()) => year.to_string(),
        _ => "N/A".to_string(),
    }
}

fn clamp_rating(vote_average: f64) -> f64 {
    if vote_average.is_nan() {
        0.0
    } else {
        vote_average.clamp(0.0, 10.0)
    }
}

impl From<TmdbMovie> for Candidate {
    fn from(movie: TmdbMovie) -> Self {
        Candidate {
            id: movie.id,
            year: release_year(movie.release_date.as_deref()),
            title: movie.title,
            overview: movie.overview.unwrap_or_default(),
            poster_ref: movie.poster_path.filter(|p| !p.is_empty()),
            rating: clamp_rating(movie.vote_average),
            category: Category::Movie,
            genre_refs: movie.genre_ids.into_iter().collect(),
        }
    }
}

impl From<TmdbTvShow> for Candidate {
    fn from(show: TmdbTvShow) -> Self {
        Candidate {
            id: show.id,
            year: release_year(show.first_air_date.as_deref()),
            title: show.name,
            overview: show.overview.unwrap_or_default(),
            poster_ref: show.poster_path.filter(|p| !p.is_empty()),
            rating: clamp_rating(show.vote_average),
            category: Category::Series,
            genre_refs: show.genre_ids.into_iter().collect(),
        }
    }
}

impl<T: Into<Candidate>> From<TmdbPage<T>> for CatalogPage {
    fn from(page: TmdbPage<T>) -> Self {
        CatalogPage {
            page: page.page,
            // TMDB reports 0 total pages for an empty result set
            total_pages: page.total_pages.max(page.page),
            results: page.results.into_iter().map(Into::into).collect(),
        }
    }
}
