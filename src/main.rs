use anyhow::Result;
use common::{CacheConfig, LogConfig};
use dotenvy::dotenv;
use faststr::FastStr;
use reactive::RxCache;
use std::collections::HashMap;
use storage::{Filter, LocalCache};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let _guard = common::init_logging(&LogConfig::from_env()?);

    let config = CacheConfig::from_env()?;
    let scores: RxCache<FastStr, i64, _> = RxCache::rx(LocalCache::new(&config));

    let seed: HashMap<FastStr, i64> = [("ada", 36), ("grace", 85), ("linus", 54), ("ken", 79)]
        .into_iter()
        .map(|(name, score)| (FastStr::from_static_str(name), score))
        .collect();
    scores.put_all(seed).completion().await?;
    info!(size = ?scores.size().first().await?, "seeded");

    let missing = scores.get("dennis".into()).collect().await?;
    info!(?missing, "get on an absent key emits nothing");

    let bumped = scores
        .merge("ada".into(), 10, |old, inc| Ok(Some(old + inc)))
        .first()
        .await?;
    info!(?bumped, "merged");

    let swapped = scores
        .replace_value("ken".into(), 79, 80)
        .first()
        .await?;
    info!(?swapped, "compare-and-set");

    let high = Filter::new(|_: &FastStr, score: &i64| *score >= 60);
    let mut leaders = scores.key_set_matching(high.clone()).collect().await?;
    leaders.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    info!(?leaders, "high scorers");

    scores.remove_all_matching(high).completion().await?;
    info!(
        size = ?scores.size().first().await?,
        empty = ?scores.is_empty().first().await?,
        "removed high scorers"
    );

    scores.clear().completion().await?;
    info!(empty = ?scores.is_empty().first().await?, "cleared");

    Ok(())
}
