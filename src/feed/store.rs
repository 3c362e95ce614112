//! Feed store: the persistence boundary used by the aggregator.
//!
//! The aggregator never writes through repositories directly; it selects
//! feeds, stamps them, and inserts posts through [`FeedStore`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::repository::{FeedRow, FEED_COLUMNS};
use super::types::{Feed, NewPost, Post};
use crate::datetime::to_storage;
use crate::Database;

/// Errors from the feed store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// There is no feed to fetch.
    #[error("no feeds registered")]
    NoFeedsRegistered,

    /// The feed ID is unknown.
    #[error("feed {0} not found")]
    FeedNotFound(i64),

    /// A post with this URL is already stored.
    #[error("duplicate post: {url}")]
    DuplicatePost { url: String },

    /// The store could not be reached or did not answer in time.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other database failure.
    #[error("store error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_) => StoreError::Unavailable(e.to_string()),
            _ => StoreError::Database(e.to_string()),
        }
    }
}

/// Whether a sqlx error is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Run a store operation with an upper bound on its duration.
///
/// An operation that runs out of time is reported as `Unavailable`.
pub async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Unavailable(format!(
            "store call timed out after {}s",
            limit.as_secs_f64()
        ))),
    }
}

/// Operations the aggregator needs from persistence.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// The feed fetched least recently. Never-fetched feeds come first,
    /// ties go to the lowest ID.
    async fn next_feed_to_fetch(&self) -> Result<Feed, StoreError>;

    /// Set a feed's `last_fetched_at` to `at`.
    async fn mark_fetched(&self, feed_id: i64, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Insert a post. Fails with `DuplicatePost` if the URL is taken.
    async fn create_post(&self, post: &NewPost) -> Result<Post, StoreError>;
}

/// SQLite-backed feed store.
#[derive(Clone, Debug)]
pub struct SqliteFeedStore {
    db: Database,
}

impl SqliteFeedStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FeedStore for SqliteFeedStore {
    async fn next_feed_to_fetch(&self) -> Result<Feed, StoreError> {
        let row = sqlx::query_as::<_, FeedRow>(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds f
             ORDER BY f.last_fetched_at ASC NULLS FIRST, f.id ASC
             LIMIT 1"
        ))
        .fetch_optional(self.db.pool())
        .await?;

        row.map(Feed::from).ok_or(StoreError::NoFeedsRegistered)
    }

    async fn mark_fetched(&self, feed_id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        let stamp = to_storage(&at);
        let result =
            sqlx::query("UPDATE feeds SET last_fetched_at = ?, updated_at = ? WHERE id = ?")
                .bind(&stamp)
                .bind(&stamp)
                .bind(feed_id)
                .execute(self.db.pool())
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::FeedNotFound(feed_id));
        }
        Ok(())
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, StoreError> {
        let now = Utc::now();
        let stamp = to_storage(&now);
        let result = sqlx::query(
            "INSERT INTO posts (feed_id, title, url, description, published_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(post.feed_id)
        .bind(&post.title)
        .bind(&post.url)
        .bind(&post.description)
        .bind(post.published_at.as_ref().map(to_storage))
        .bind(&stamp)
        .bind(&stamp)
        .execute(self.db.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicatePost {
                    url: post.url.clone(),
                }
            } else {
                StoreError::from(e)
            }
        })?;

        Ok(Post {
            id: result.last_insert_rowid(),
            feed_id: post.feed_id,
            title: post.title.clone(),
            url: post.url.clone(),
            description: post.description.clone(),
            published_at: post.published_at,
            created_at: now,
            updated_at: now,
        })
    }
}
