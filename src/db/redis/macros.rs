/// Memoizes an async computation in the Redis cache.
///
/// Returns the cached value on a hit. On a miss, awaits `$block`, queues the
/// result for a background write and returns it. A failed cache read is logged
/// and treated as a miss so the cache never blocks the underlying call.
///
/// # Arguments
/// * `$cache`: a [`Cache`](crate::db::Cache) (anything with `get_from_cache` and
///   `set_in_background`).
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to read and write.
/// * `$ttl`: time-to-live of the stored value in seconds.
/// * `$block`: future producing `Result<T, E>` on a miss.
///
/// # Example
/// ```rust,ignore
/// let page = cached!(cache, CacheKey::CatalogPage(category, 1), 3600, async move {
///     fetch_page_from_api().await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(cached)
            }
            miss => {
                if let Err(e) = miss {
                    tracing::warn!(error = %e, key = %key, "Cache read failed, fetching fresh");
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
