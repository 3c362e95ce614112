//! Polling scheduler.
//!
//! On every tick one feed, the least recently fetched, goes through a full
//! cycle: select, mark fetched, fetch, ingest. Cycles never overlap; a tick
//! that fires while a cycle runs is dropped.

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::reconciler::{ingest, IngestReport};
use crate::config::AggregatorConfig;
use crate::datetime;
use crate::feed::fetcher::{FeedSource, FetchError};
use crate::feed::store::{bounded, FeedStore, StoreError};
use crate::feed::types::Feed;
use crate::GatorError;

/// Timing for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Time between ticks.
    pub interval: Duration,
    /// Bound for one feed retrieval.
    pub fetch_timeout: Duration,
    /// Bound for one store call.
    pub store_timeout: Duration,
    /// Bound for fetching and ingesting the claimed feed.
    pub cycle_timeout: Duration,
}

impl SchedulerSettings {
    /// Settings for the given interval with timeouts from the config.
    pub fn new(interval: Duration, config: &AggregatorConfig) -> Self {
        Self {
            interval,
            fetch_timeout: config.fetch_timeout(),
            store_timeout: config.store_timeout(),
            cycle_timeout: config.cycle_timeout(),
        }
    }
}

/// A completed cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub feed: Feed,
    pub report: IngestReport,
}

/// A failed cycle, with the feed it was working on if one was selected.
#[derive(Debug)]
pub struct CycleFailure {
    pub feed: Option<Feed>,
    pub error: GatorError,
}

impl CycleFailure {
    fn new(feed: Option<&Feed>, error: impl Into<GatorError>) -> Self {
        Self {
            feed: feed.cloned(),
            error: error.into(),
        }
    }
}

impl std::fmt::Display for CycleFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.feed {
            Some(feed) => write!(f, "feed {} ({}): {}", feed.name, feed.url, self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

/// Drives fetch cycles over a store and a feed source.
pub struct Scheduler<S, F> {
    store: S,
    source: F,
    settings: SchedulerSettings,
}

impl<S, F> Scheduler<S, F>
where
    S: FeedStore,
    F: FeedSource,
{
    pub fn new(store: S, source: F, settings: SchedulerSettings) -> Self {
        Self {
            store,
            source,
            settings,
        }
    }

    /// Run one cycle for the least recently fetched feed.
    ///
    /// The feed is marked fetched before retrieval, so a failed fetch still
    /// moves it to the back of the queue.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleFailure> {
        let feed = self.claim_next_feed().await?;
        self.collect(&feed).await
    }

    /// Select the next feed and mark it fetched.
    async fn claim_next_feed(&self) -> Result<Feed, CycleFailure> {
        let store_timeout = self.settings.store_timeout;

        let feed = bounded(store_timeout, self.store.next_feed_to_fetch())
            .await
            .map_err(|e| CycleFailure::new(None, e))?;
        debug!("Selected feed {} ({})", feed.id, feed.url);

        bounded(
            store_timeout,
            self.store.mark_fetched(feed.id, datetime::now()),
        )
        .await
        .map_err(|e| CycleFailure::new(Some(&feed), e))?;

        Ok(feed)
    }

    /// Fetch a claimed feed and ingest its items.
    async fn collect(&self, feed: &Feed) -> Result<CycleReport, CycleFailure> {
        let fetch_timeout = self.settings.fetch_timeout;
        let document = match tokio::time::timeout(
            fetch_timeout,
            self.source.fetch(&feed.url, fetch_timeout),
        )
        .await
        {
            Ok(Ok(document)) => document,
            Ok(Err(e)) => return Err(CycleFailure::new(Some(feed), e)),
            Err(_) => {
                return Err(CycleFailure::new(
                    Some(feed),
                    FetchError::Timeout(fetch_timeout),
                ))
            }
        };

        let report = ingest(&self.store, feed, &document, self.settings.store_timeout)
            .await
            .map_err(|e| CycleFailure::new(Some(feed), e))?;

        Ok(CycleReport {
            feed: feed.clone(),
            report,
        })
    }

    /// Run one cycle under the whole-cycle bound and log its outcome.
    ///
    /// Selection and marking are bounded per store call; the cycle bound
    /// covers retrieval and ingestion.
    pub async fn tick(&self) -> Result<CycleReport, CycleFailure> {
        let cycle_timeout = self.settings.cycle_timeout;
        let outcome = match self.claim_next_feed().await {
            Ok(feed) => match tokio::time::timeout(cycle_timeout, self.collect(&feed)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(CycleFailure::new(
                    Some(&feed),
                    GatorError::CycleTimeout(cycle_timeout),
                )),
            },
            Err(failure) => Err(failure),
        };

        match &outcome {
            Ok(cycle) => info!(
                "Fetched {} ({}): {} saved, {} skipped, {} failed",
                cycle.feed.name,
                cycle.feed.url,
                cycle.report.saved,
                cycle.report.skipped,
                cycle.report.failed
            ),
            Err(CycleFailure {
                error: GatorError::Store(StoreError::NoFeedsRegistered),
                ..
            }) => warn!("No feeds registered; nothing to fetch"),
            Err(failure) => warn!("Fetch cycle failed: {}", failure),
        }

        outcome
    }

    /// Tick until `shutdown` completes. Returns the number of cycles run.
    ///
    /// The first cycle starts one interval after the call. Shutdown is
    /// observed between cycles.
    pub async fn run_until<Sd>(&self, shutdown: Sd) -> u64
    where
        Sd: Future<Output = ()>,
    {
        let period = self.settings.interval;
        info!("Collecting feeds every {:?}", period);

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let mut cycles = 0;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping after {} cycle(s)", cycles);
                    break;
                }
                _ = ticker.tick() => {}
            }

            // Failures are logged by `tick` and never end the loop.
            let _ = self.tick().await;
            cycles += 1;
        }

        cycles
    }
}
