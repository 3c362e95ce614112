//! Test helpers for integration tests.
//!
//! Provides a canned-response HTTP feed server and database/context setup.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use gator::config::AggregatorConfig;
use gator::{
    CliContext, Command, CommandOutput, CommandRegistry, Config, Database, Feed, NewFeed,
    NewUser, Session, UserRepository,
};

/// How long a stalled response waits before closing the connection.
const STALL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct Response {
    status: u16,
    body: String,
    stall: bool,
}

/// Minimal HTTP server answering every request with the same canned response.
pub struct FeedServer {
    addr: SocketAddr,
    response: Arc<Mutex<Response>>,
    requests: Arc<AtomicUsize>,
}

impl FeedServer {
    /// Start a server on an ephemeral local port, answering 200 with `body`.
    pub async fn start(body: impl Into<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = Arc::new(Mutex::new(Response {
            status: 200,
            body: body.into(),
            stall: false,
        }));
        let requests = Arc::new(AtomicUsize::new(0));

        let shared = response.clone();
        let counter = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let response = shared.lock().unwrap().clone();
                let counter = counter.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, response, counter).await;
                });
            }
        });

        Self {
            addr,
            response,
            requests,
        }
    }

    /// URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Answer subsequent requests with `status` and `body`.
    pub fn respond(&self, status: u16, body: impl Into<String>) {
        let mut response = self.response.lock().unwrap();
        response.status = status;
        response.body = body.into();
    }

    /// Make subsequent requests hang without an answer.
    pub fn stall(&self, stall: bool) {
        self.response.lock().unwrap().stall = stall;
    }

    /// Number of requests received so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

async fn serve(
    mut stream: TcpStream,
    response: Response,
    counter: Arc<AtomicUsize>,
) -> std::io::Result<()> {
    // Read until the end of the request head.
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        head.extend_from_slice(&buf[..n]);
    }
    counter.fetch_add(1, Ordering::SeqCst);

    if response.stall {
        tokio::time::sleep(STALL).await;
        return Ok(());
    }

    let reply = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/rss+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        reason_phrase(response.status),
        response.body.len(),
        response.body
    );
    stream.write_all(reply.as_bytes()).await?;
    stream.shutdown().await
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        301 => "Moved Permanently",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// An RSS item for [`rss_document`].
pub struct Item<'a> {
    pub title: &'a str,
    pub link: &'a str,
    pub description: &'a str,
    pub pub_date: &'a str,
}

impl<'a> Item<'a> {
    pub fn new(title: &'a str, link: &'a str) -> Self {
        Self {
            title,
            link,
            description: "",
            pub_date: "",
        }
    }

    pub fn description(mut self, description: &'a str) -> Self {
        self.description = description;
        self
    }

    pub fn pub_date(mut self, pub_date: &'a str) -> Self {
        self.pub_date = pub_date;
        self
    }
}

/// Build an RSS 2.0 document. Text is inserted verbatim, so callers
/// escape markup themselves.
pub fn rss_document(title: &str, items: &[Item<'_>]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\">\n<channel>\n\
         <title>{title}</title>\n<link>https://example.com/</link>\n\
         <description>Test feed</description>\n"
    );
    for item in items {
        xml.push_str("<item>\n");
        xml.push_str(&format!("<title>{}</title>\n", item.title));
        xml.push_str(&format!("<link>{}</link>\n", item.link));
        if !item.description.is_empty() {
            xml.push_str(&format!("<description>{}</description>\n", item.description));
        }
        if !item.pub_date.is_empty() {
            xml.push_str(&format!("<pubDate>{}</pubDate>\n", item.pub_date));
        }
        xml.push_str("</item>\n");
    }
    xml.push_str("</channel>\n</rss>\n");
    xml
}

/// Aggregator settings suited to tests: short timeouts.
pub fn test_aggregator_config() -> AggregatorConfig {
    AggregatorConfig {
        fetch_timeout_secs: 2,
        store_timeout_secs: 2,
        cycle_timeout_secs: 10,
        ..AggregatorConfig::default()
    }
}

/// Create a user and a feed owned by them.
pub async fn create_feed(db: &Database, user: &str, name: &str, url: &str) -> Feed {
    let users = UserRepository::new(db.pool());
    let user = match users.get_by_name(user).await.unwrap() {
        Some(user) => user,
        None => users.create(&NewUser::new(user)).await.unwrap(),
    };
    gator::feed::FeedRepository::new(db.pool())
        .create(&NewFeed::new(name, url, user.id))
        .await
        .unwrap()
}

/// CLI context backed by files in a temporary directory.
pub async fn file_context() -> (CliContext, TempDir) {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.database.path = dir.path().join("gator.db").display().to_string();
    config.session.path = dir.path().join("session.json").display().to_string();
    config.aggregator = test_aggregator_config();

    let db = Database::open(&config.database.path).await.unwrap();
    let session = Session::load(&config.session.path).unwrap();
    (CliContext::new(db, config, session), dir)
}

/// Run a command through the standard registry.
pub async fn run(ctx: &mut CliContext, name: &str, args: &[&str]) -> gator::Result<CommandOutput> {
    let args = args.iter().map(|s| s.to_string()).collect();
    CommandRegistry::standard()
        .dispatch(ctx, &Command::new(name, args))
        .await
}
