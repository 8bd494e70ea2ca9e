//! Flush command - evicts every tagged client cache entry

use tracing::info;

pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap();
    let stores = crate::create_cache_stores(&config).await?;

    let store = stores.store(config.client_cache.store.as_deref())?;
    let tags = config.client_cache.merged_tags();
    let flushed = store.flush_tags(&tags).await?;

    info!(flushed, tags = ?tags, "Flushed client cache");
    println!("{}", flushed);

    Ok(())
}
