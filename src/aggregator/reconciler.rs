//! Ingestion: turn a fetched document into stored posts.
//!
//! Items are submitted one by one in document order. Malformed items and
//! duplicates are skipped, other store failures are counted and the batch
//! continues, except when the store keeps reporting itself unavailable.

use std::time::Duration;

use tracing::{debug, error, warn};

use crate::datetime::parse_publication_date;
use crate::feed::store::{bounded, FeedStore, StoreError};
use crate::feed::types::{Feed, NewPost, RemoteFeedDocument, RemoteItem};

/// Consecutive `Unavailable` failures after which the store is treated as down.
pub const MAX_CONSECUTIVE_STORE_FAILURES: u32 = 3;

/// Outcome of ingesting one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// New posts stored.
    pub saved: usize,
    /// Malformed items and duplicates.
    pub skipped: usize,
    /// Items the store rejected for another reason.
    pub failed: usize,
}

impl IngestReport {
    /// Total items looked at.
    pub fn total(&self) -> usize {
        self.saved + self.skipped + self.failed
    }
}

/// Why an item cannot become a post.
#[derive(Debug, PartialEq, Eq)]
enum Malformed {
    BlankTitle,
    BlankLink,
    BadDate(String),
}

impl std::fmt::Display for Malformed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Malformed::BlankTitle => write!(f, "blank title"),
            Malformed::BlankLink => write!(f, "blank link"),
            Malformed::BadDate(text) => write!(f, "unparseable publication date {text:?}"),
        }
    }
}

/// Build the post for an item, or say why it is malformed.
fn to_post(feed_id: i64, item: &RemoteItem) -> Result<NewPost, Malformed> {
    if item.title.trim().is_empty() {
        return Err(Malformed::BlankTitle);
    }
    if item.link.trim().is_empty() {
        return Err(Malformed::BlankLink);
    }

    let mut post = NewPost::new(feed_id, item.title.clone(), item.link.trim())
        .with_description(&item.description);

    if !item.publication_date_text.trim().is_empty() {
        let published_at = parse_publication_date(&item.publication_date_text)
            .map_err(|_| Malformed::BadDate(item.publication_date_text.clone()))?;
        post = post.with_published_at(published_at);
    }

    Ok(post)
}

/// Store every well-formed item of `document` as a post of `feed`.
///
/// Each store call is bounded by `store_timeout`. Returns an error only when
/// the store fails as unavailable [`MAX_CONSECUTIVE_STORE_FAILURES`] times
/// in a row.
pub async fn ingest<S>(
    store: &S,
    feed: &Feed,
    document: &RemoteFeedDocument,
    store_timeout: Duration,
) -> Result<IngestReport, StoreError>
where
    S: FeedStore + ?Sized,
{
    let mut report = IngestReport::default();
    let mut consecutive_unavailable = 0;

    for item in &document.items {
        let post = match to_post(feed.id, item) {
            Ok(post) => post,
            Err(reason) => {
                warn!(
                    "Skipping item {:?} from feed {}: {}",
                    item.title, feed.name, reason
                );
                report.skipped += 1;
                continue;
            }
        };

        match bounded(store_timeout, store.create_post(&post)).await {
            Ok(saved) => {
                debug!("Saved post {} ({})", saved.id, saved.url);
                report.saved += 1;
                consecutive_unavailable = 0;
            }
            Err(StoreError::DuplicatePost { url }) => {
                debug!("Post already stored: {}", url);
                report.skipped += 1;
                consecutive_unavailable = 0;
            }
            Err(StoreError::Unavailable(reason)) => {
                error!(
                    "Failed to store post {} for feed {}: store unavailable: {}",
                    post.url, feed.name, reason
                );
                report.failed += 1;
                consecutive_unavailable += 1;
                if consecutive_unavailable >= MAX_CONSECUTIVE_STORE_FAILURES {
                    return Err(StoreError::Unavailable(reason));
                }
            }
            Err(e) => {
                error!(
                    "Failed to store post {} for feed {}: {}",
                    post.url, feed.name, e
                );
                report.failed += 1;
                consecutive_unavailable = 0;
            }
        }
    }

    Ok(report)
}
