use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

pub mod candidate;
pub mod decision;
pub mod tmdb;

pub use candidate::{CatalogPage, Candidate, ItemId};
pub use decision::{Decision, DecisionMetadata};

/// Content category a feed session is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Movie,
    #[serde(alias = "tv")]
    Series,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Movie => "movie",
            Category::Series => "series",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movie" | "movies" => Ok(Category::Movie),
            "series" | "tv" => Ok(Category::Series),
            other => Err(format!("Unknown category: {}", other)),
        }
    }
}

/// Terminal bucket a candidate is classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Watched,
    #[serde(alias = "watchlist")]
    Watchlisted,
    #[serde(alias = "skip")]
    Skipped,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Watched, Bucket::Watchlisted, Bucket::Skipped];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Watched => "watched",
            Bucket::Watchlisted => "watchlisted",
            Bucket::Skipped => "skipped",
        }
    }
}

impl Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "watched" => Ok(Bucket::Watched),
            "watchlisted" | "watchlist" => Ok(Bucket::Watchlisted),
            "skipped" | "skip" => Ok(Bucket::Skipped),
            other => Err(format!("Unknown bucket: {}", other)),
        }
    }
}

/// Opaque identifier of an authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
