//! Gator - a command-line RSS aggregator.
//!
//! Users register feeds and follow them; the aggregator polls one feed per
//! tick, least recently fetched first, and stores each new item once.

pub mod aggregator;
pub mod cli;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod feed;
pub mod logging;
pub mod session;

pub use aggregator::{
    parse_interval, CycleFailure, CycleReport, IngestReport, Scheduler, SchedulerSettings,
};
pub use cli::{CliContext, Command, CommandHandler, CommandOutput, CommandRegistry};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{GatorError, Result};
pub use feed::{
    Feed, FeedSource, FeedStore, FetchError, HttpFeedSource, NewFeed, NewPost, Post,
    RemoteFeedDocument, RemoteItem, SqliteFeedStore, StoreError,
};
pub use session::Session;
