//! Feed and post types for Gator.

use chrono::{DateTime, Utc};

/// A registered feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    /// Feed ID.
    pub id: i64,
    /// Display name given when the feed was added.
    pub name: String,
    /// Feed URL (unique).
    pub url: String,
    /// User who added the feed.
    pub user_id: i64,
    /// Last time the feed was selected for fetching. `None` if never.
    pub last_fetched_at: Option<DateTime<Utc>>,
    /// When the feed was created.
    pub created_at: DateTime<Utc>,
    /// When the feed was last updated.
    pub updated_at: DateTime<Utc>,
}

/// New feed for creation.
#[derive(Debug, Clone)]
pub struct NewFeed {
    pub name: String,
    pub url: String,
    pub user_id: i64,
}

impl NewFeed {
    /// Create a new feed.
    pub fn new(name: impl Into<String>, url: impl Into<String>, user_id: i64) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            user_id,
        }
    }
}

/// Feed together with the name of the user who added it.
#[derive(Debug, Clone)]
pub struct FeedWithOwner {
    pub feed: Feed,
    pub owner_name: String,
}

/// A user following a feed.
#[derive(Debug, Clone)]
pub struct FeedFollow {
    pub id: i64,
    pub user_id: i64,
    pub feed_id: i64,
    /// Name of the followed feed.
    pub feed_name: String,
    /// Name of the following user.
    pub user_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored post (one ingested feed item).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Post ID.
    pub id: i64,
    /// Feed this post came from.
    pub feed_id: i64,
    /// Item title.
    pub title: String,
    /// Link to the original article (unique across all posts).
    pub url: String,
    /// Item description.
    pub description: Option<String>,
    /// When the item was published, if the feed said so.
    pub published_at: Option<DateTime<Utc>>,
    /// When the post was stored.
    pub created_at: DateTime<Utc>,
    /// When the post was last updated.
    pub updated_at: DateTime<Utc>,
}

/// New post for creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub feed_id: i64,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl NewPost {
    /// Create a new post.
    pub fn new(feed_id: i64, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            feed_id,
            title: title.into(),
            url: url.into(),
            description: None,
            published_at: None,
        }
    }

    /// Set the description. Blank descriptions are stored as `NULL`.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.trim().is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }

    /// Set the published date.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }
}

/// Post together with the name of its feed, for browsing.
#[derive(Debug, Clone)]
pub struct PostWithFeed {
    pub post: Post,
    pub feed_name: String,
}

/// A retrieved feed document. Never persisted.
///
/// Free-text fields are already HTML-unescaped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteFeedDocument {
    /// Channel title.
    pub title: String,
    /// Channel link.
    pub link: String,
    /// Channel description.
    pub description: String,
    /// Items in document order.
    pub items: Vec<RemoteItem>,
}

/// One item of a retrieved feed document.
///
/// Missing elements are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteItem {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Raw `pubDate` text; parsed during ingestion.
    pub publication_date_text: String,
}

impl RemoteItem {
    /// Create an item with a title and link.
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            ..Self::default()
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the raw publication date text.
    pub fn with_publication_date(mut self, text: impl Into<String>) -> Self {
        self.publication_date_text = text.into();
        self
    }
}
