use crate::{
    error::AppResult,
    models::{Candidate, Category},
    services::catalog::CatalogClient,
};

/// Free-text title search within one category
///
/// Independent of any feed session: results are not filtered against the
/// user's decisions.
pub async fn search_titles(
    catalog: &dyn CatalogClient,
    category: Category,
    query: &str,
) -> AppResult<Vec<Candidate>> {
    let results = catalog.search_by_text(category, query).await?;
    tracing::debug!(
        category = %category,
        results = results.len(),
        catalog = catalog.name(),
        "Search served"
    );
    Ok(results)
}
