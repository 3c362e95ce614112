//! Feed source client.
//!
//! Retrieves a feed URL once, bounded by a timeout, and parses the body
//! as an RSS channel. Text fields come back HTML-unescaped.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::config::AggregatorConfig;
use crate::feed::types::{RemoteFeedDocument, RemoteItem};
use crate::{GatorError, Result};

/// Connect timeout for the shared client. Requests carry their own total bound.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors from retrieving or parsing a feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL is empty, unparseable, or lacks an http(s) scheme or host.
    #[error("invalid feed URL {url:?}: {reason}")]
    InvalidFeedUrl { url: String, reason: String },

    /// The request did not complete within its bound.
    #[error("fetch timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a status of 300 or above.
    #[error("HTTP error: {status}")]
    Http { status: u16 },

    /// The body exceeded the configured size limit.
    #[error("feed too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    /// The body is not a readable RSS document.
    #[error("failed to parse feed: {0}")]
    Parse(String),
}

/// Something that can retrieve a feed document.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Retrieve and parse the feed at `url`, giving up after `timeout`.
    async fn fetch(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<RemoteFeedDocument, FetchError>;
}

/// Feed source backed by a reqwest client.
pub struct HttpFeedSource {
    client: Client,
    max_feed_size: u64,
}

impl HttpFeedSource {
    /// Create a new source from the aggregator settings.
    pub fn new(config: &AggregatorConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| GatorError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
        })
    }

    fn classify(err: reqwest::Error, timeout: Duration) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<RemoteFeedDocument, FetchError> {
        let url = validate_url(url)?;
        debug!("Fetching feed {}", url);

        let mut response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::classify(e, timeout))?;

        let status = response.status();
        if status.as_u16() >= 300 {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(FetchError::TooLarge {
                    size: content_length,
                    max: self.max_feed_size,
                });
            }
        }

        // Content-Length may be absent or wrong; count what actually arrives.
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Self::classify(e, timeout))?
        {
            body.extend_from_slice(&chunk);
            if body.len() as u64 > self.max_feed_size {
                return Err(FetchError::TooLarge {
                    size: body.len() as u64,
                    max: self.max_feed_size,
                });
            }
        }

        parse_document(&body)
    }
}

/// Validate a feed URL before any network call.
///
/// The URL must parse, use http or https, and name a host.
pub fn validate_url(url: &str) -> std::result::Result<url::Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidFeedUrl {
        url: url.to_string(),
        reason,
    };

    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(invalid("URL is empty".to_string()));
    }

    let parsed = url::Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(invalid(format!("unsupported URL scheme: {scheme}"))),
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(invalid("URL has no host".to_string())),
    }

    Ok(parsed)
}

/// Parse a response body into a feed document.
pub fn parse_document(bytes: &[u8]) -> std::result::Result<RemoteFeedDocument, FetchError> {
    let channel =
        rss::Channel::read_from(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

    let items = channel
        .items()
        .iter()
        .map(|item| RemoteItem {
            title: unescape(item.title().unwrap_or_default()),
            link: item.link().unwrap_or_default().trim().to_string(),
            description: unescape(item.description().unwrap_or_default()),
            publication_date_text: item.pub_date().unwrap_or_default().trim().to_string(),
        })
        .collect();

    Ok(RemoteFeedDocument {
        title: unescape(channel.title()),
        link: channel.link().trim().to_string(),
        description: unescape(channel.description()),
        items,
    })
}

/// Decode HTML entities left in text after XML parsing (`&amp;lt;` style
/// double encoding is common in feeds).
fn unescape(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}
