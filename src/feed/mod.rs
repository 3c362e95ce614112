//! Feeds and posts for Gator.
//!
//! This module provides:
//! - Feed retrieval and RSS parsing
//! - Feed, follow and post repositories
//! - The feed store used by the aggregator

pub mod fetcher;
pub mod repository;
pub mod store;
pub mod types;

pub use fetcher::{parse_document, validate_url, FeedSource, FetchError, HttpFeedSource};
pub use repository::{FeedFollowRepository, FeedRepository, PostRepository};
pub use store::{bounded, FeedStore, SqliteFeedStore, StoreError};
pub use types::{
    Feed, FeedFollow, FeedWithOwner, NewFeed, NewPost, Post, PostWithFeed, RemoteFeedDocument,
    RemoteItem,
};
