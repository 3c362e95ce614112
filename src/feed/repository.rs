//! Feed, follow and post repositories for Gator.

use chrono::Utc;

use super::store::is_unique_violation;
use super::types::{Feed, FeedFollow, FeedWithOwner, NewFeed, Post, PostWithFeed};
use crate::datetime::{parse_storage, to_storage};
use crate::db::DbPool;
use crate::{GatorError, Result};

/// Columns selected for a feed row, qualified for joins.
pub(super) const FEED_COLUMNS: &str =
    "f.id, f.name, f.url, f.user_id, f.last_fetched_at, f.created_at, f.updated_at";

/// Row type for feed from database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(super) struct FeedRow {
    id: i64,
    name: String,
    url: String,
    user_id: i64,
    last_fetched_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<FeedRow> for Feed {
    fn from(row: FeedRow) -> Self {
        Feed {
            id: row.id,
            name: row.name,
            url: row.url,
            user_id: row.user_id,
            last_fetched_at: row.last_fetched_at.and_then(|s| parse_storage(&s)),
            created_at: parse_storage(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_storage(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Row type for feed joined with its owner.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedWithOwnerRow {
    #[sqlx(flatten)]
    feed: FeedRow,
    owner_name: String,
}

impl From<FeedWithOwnerRow> for FeedWithOwner {
    fn from(row: FeedWithOwnerRow) -> Self {
        FeedWithOwner {
            feed: row.feed.into(),
            owner_name: row.owner_name,
        }
    }
}

/// Row type for feed follow joined with feed and user names.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedFollowRow {
    id: i64,
    user_id: i64,
    feed_id: i64,
    feed_name: String,
    user_name: String,
    created_at: String,
    updated_at: String,
}

impl From<FeedFollowRow> for FeedFollow {
    fn from(row: FeedFollowRow) -> Self {
        FeedFollow {
            id: row.id,
            user_id: row.user_id,
            feed_id: row.feed_id,
            feed_name: row.feed_name,
            user_name: row.user_name,
            created_at: parse_storage(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_storage(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Row type for post from database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PostRow {
    id: i64,
    feed_id: i64,
    title: String,
    url: String,
    description: Option<String>,
    published_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            feed_id: row.feed_id,
            title: row.title,
            url: row.url,
            description: row.description,
            published_at: row.published_at.and_then(|s| parse_storage(&s)),
            created_at: parse_storage(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_storage(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Row type for post joined with its feed name.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PostWithFeedRow {
    #[sqlx(flatten)]
    post: PostRow,
    feed_name: String,
}

impl From<PostWithFeedRow> for PostWithFeed {
    fn from(row: PostWithFeedRow) -> Self {
        PostWithFeed {
            post: row.post.into(),
            feed_name: row.feed_name,
        }
    }
}

/// Repository for feed CRUD operations.
pub struct FeedRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FeedRepository<'a> {
    /// Create a new FeedRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Register a new feed.
    ///
    /// Fails with `Validation` if the URL is already registered.
    pub async fn create(&self, feed: &NewFeed) -> Result<Feed> {
        let now = to_storage(&Utc::now());
        let result = sqlx::query(
            "INSERT INTO feeds (name, url, user_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&feed.name)
        .bind(&feed.url)
        .bind(feed.user_id)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await
        .map_err(|e| feed_insert_error(e, feed))?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| GatorError::NotFound("feed".to_string()))
    }

    /// Register a new feed and make its owner follow it.
    ///
    /// Both rows are written in one transaction; if either insert fails,
    /// neither is kept.
    pub async fn create_followed(&self, feed: &NewFeed) -> Result<(Feed, FeedFollow)> {
        let now = to_storage(&Utc::now());
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        let feed_id: i64 = sqlx::query_scalar(
            "INSERT INTO feeds (name, url, user_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&feed.name)
        .bind(&feed.url)
        .bind(feed.user_id)
        .bind(&now)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| feed_insert_error(e, feed))?;

        sqlx::query(
            "INSERT INTO feed_follows (user_id, feed_id, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(feed.user_id)
        .bind(feed_id)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        let created = self
            .get_by_id(feed_id)
            .await?
            .ok_or_else(|| GatorError::NotFound("feed".to_string()))?;
        let follow = FeedFollowRepository::new(self.pool)
            .get(feed.user_id, feed_id)
            .await?
            .ok_or_else(|| GatorError::NotFound("feed follow".to_string()))?;
        Ok((created, follow))
    }

    /// Get a feed by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds f WHERE f.id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(row.map(Feed::from))
    }

    /// Get a feed by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds f WHERE f.url = ?"
        ))
        .bind(url)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(row.map(Feed::from))
    }

    /// List all feeds with the name of the user who added each.
    pub async fn list_with_owner(&self) -> Result<Vec<FeedWithOwner>> {
        let rows = sqlx::query_as::<_, FeedWithOwnerRow>(&format!(
            "SELECT {FEED_COLUMNS}, u.name AS owner_name
             FROM feeds f
             JOIN users u ON u.id = f.user_id
             ORDER BY f.name, f.id"
        ))
        .fetch_all(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(FeedWithOwner::from).collect())
    }

    /// Count all feeds.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feeds")
            .fetch_one(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;
        Ok(count)
    }
}

fn feed_insert_error(e: sqlx::Error, feed: &NewFeed) -> GatorError {
    if is_unique_violation(&e) {
        GatorError::Validation(format!("feed {} is already registered", feed.url))
    } else {
        GatorError::Database(e.to_string())
    }
}

/// Repository for feed follow operations.
pub struct FeedFollowRepository<'a> {
    pool: &'a DbPool,
}

const FOLLOW_SELECT: &str = "SELECT ff.id, ff.user_id, ff.feed_id, f.name AS feed_name,
        u.name AS user_name, ff.created_at, ff.updated_at
     FROM feed_follows ff
     JOIN feeds f ON f.id = ff.feed_id
     JOIN users u ON u.id = ff.user_id";

impl<'a> FeedFollowRepository<'a> {
    /// Create a new FeedFollowRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Follow a feed.
    ///
    /// Returns `None` if the user already follows it.
    pub async fn create(&self, user_id: i64, feed_id: i64) -> Result<Option<FeedFollow>> {
        let now = to_storage(&Utc::now());
        let result = sqlx::query(
            "INSERT INTO feed_follows (user_id, feed_id, created_at, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (user_id, feed_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(feed_id)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(user_id, feed_id).await
    }

    /// Get a single follow.
    pub async fn get(&self, user_id: i64, feed_id: i64) -> Result<Option<FeedFollow>> {
        let row = sqlx::query_as::<_, FeedFollowRow>(&format!(
            "{FOLLOW_SELECT} WHERE ff.user_id = ? AND ff.feed_id = ?"
        ))
        .bind(user_id)
        .bind(feed_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(row.map(FeedFollow::from))
    }

    /// List the feeds a user follows, ordered by feed name.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<FeedFollow>> {
        let rows = sqlx::query_as::<_, FeedFollowRow>(&format!(
            "{FOLLOW_SELECT} WHERE ff.user_id = ? ORDER BY f.name, ff.id"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(FeedFollow::from).collect())
    }

    /// Stop following a feed. Returns whether a follow was removed.
    pub async fn delete(&self, user_id: i64, feed_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM feed_follows WHERE user_id = ? AND feed_id = ?")
            .bind(user_id)
            .bind(feed_id)
            .execute(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}

/// Repository for reading posts.
///
/// Posts are written only through the feed store.
pub struct PostRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> PostRepository<'a> {
    /// Create a new PostRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Get a post by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT id, feed_id, title, url, description, published_at, created_at, updated_at
             FROM posts WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(row.map(Post::from))
    }

    /// Newest posts from the feeds a user follows.
    ///
    /// Posts without a publication date sort after dated ones.
    pub async fn list_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<PostWithFeed>> {
        let rows = sqlx::query_as::<_, PostWithFeedRow>(
            "SELECT p.id, p.feed_id, p.title, p.url, p.description, p.published_at,
                    p.created_at, p.updated_at, f.name AS feed_name
             FROM posts p
             JOIN feed_follows ff ON ff.feed_id = p.feed_id
             JOIN feeds f ON f.id = p.feed_id
             WHERE ff.user_id = ?
             ORDER BY p.published_at IS NULL, p.published_at DESC, p.id DESC
             LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(PostWithFeed::from).collect())
    }

    /// Count posts belonging to a feed.
    pub async fn count_by_feed(&self, feed_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE feed_id = ?")
            .bind(feed_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Count all posts.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;
        Ok(count)
    }
}
