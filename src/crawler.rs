//! Top-level crawl driver
//!
//! [`IfscCrawler`] wires the pieces together: it constructs the bounded
//! queue, the fetcher, and the progress tracker once, injects them into the
//! traversal, starts at the season index, and hands the completed tree to
//! the output sink only after the queue reports drained.

use std::path::Path;

use crate::client::ResultsClient;
use crate::config::Config;
use crate::error::Result;
use crate::progress::ProgressTracker;
use crate::queue::{BoundedQueue, QueueSignal, QueueStats};
use crate::traversal::Traversal;
use crate::types::Season;

/// Crawler instance assembling the season/league/event/results tree
///
/// Cloneable; all clones share the same queue, so concurrent crawls would
/// compete for one global ceiling.
#[derive(Clone, Debug)]
pub struct IfscCrawler {
    config: Config,
    queue: BoundedQueue,
    client: ResultsClient,
}

impl IfscCrawler {
    /// Create a crawler from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration
    /// fails validation.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let queue = BoundedQueue::new(config.concurrency);
        let client = ResultsClient::new(&config.base_url, queue.clone())?;
        Ok(Self {
            config,
            queue,
            client,
        })
    }

    /// Subscribe to the queue's lifecycle signals
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<QueueSignal> {
        self.queue.subscribe()
    }

    /// Current queue counters
    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// Crawl the full tree and return it in memory
    ///
    /// Fetches the season index, expands every season concurrently under
    /// the shared concurrency ceiling, waits for the queue to drain and the
    /// progress tracker to stop, then returns the assembled tree. The tree
    /// is immutable from this point on.
    ///
    /// # Errors
    ///
    /// Only a season-index failure surfaces here; every descendant fetch
    /// failure is contained as missing data in the returned tree.
    pub async fn crawl(&self) -> Result<Vec<Season>> {
        let listings = self.client.season_index().await?;
        tracing::info!(seasons = listings.len(), "season index fetched");

        // Spawned only after the root fetch; an index failure returns
        // before any tracker exists.
        let tracker = ProgressTracker::spawn(&self.queue, self.config.progress_interval);

        let traversal = Traversal::new(self.client.clone(), self.config.failed_league_policy);
        let tree = traversal.expand_seasons(listings).await;

        self.queue.drained().await;
        tracker.stop().await;

        let stats = self.queue.stats();
        tracing::info!(
            submitted = stats.submitted,
            finished = stats.finished,
            "crawl complete"
        );
        Ok(tree)
    }

    /// Crawl the full tree and write it to `path` as pretty-printed JSON
    ///
    /// The sink is invoked exactly once, after [`crawl`](Self::crawl) has
    /// observed the queue drain; no task is in flight while the snapshot is
    /// written.
    ///
    /// # Errors
    ///
    /// Season-index, serialization, and file-write failures.
    pub async fn crawl_to_file(&self, path: impl AsRef<Path>) -> Result<Vec<Season>> {
        let tree = self.crawl().await?;
        let document = serde_json::to_vec_pretty(&tree)?;
        tokio::fs::write(path.as_ref(), document).await?;
        tracing::info!(path = %path.as_ref().display(), "snapshot written");
        Ok(tree)
    }
}
