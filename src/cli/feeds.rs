//! Feed commands: addfeed, feeds.

use async_trait::async_trait;
use tracing::info;

use super::{expect_args, CliContext, CommandHandler, CommandOutput, LoggedInHandler};
use crate::datetime::format_datetime;
use crate::db::User;
use crate::feed::fetcher::validate_url;
use crate::feed::repository::FeedRepository;
use crate::feed::types::NewFeed;
use crate::{GatorError, Result};

/// `addfeed <name> <url>`: register a feed and follow it.
pub struct AddFeedCommand;

#[async_trait]
impl LoggedInHandler for AddFeedCommand {
    async fn run(
        &self,
        ctx: &mut CliContext,
        args: &[String],
        user: &User,
    ) -> Result<CommandOutput> {
        let args = expect_args(args, 2, "addfeed <name> <url>")?;
        let name = args[0].trim();
        let url = args[1].trim();

        if name.is_empty() {
            return Err(GatorError::Validation("feed name must not be blank".to_string()));
        }
        validate_url(url).map_err(|e| GatorError::Validation(e.to_string()))?;

        let (feed, _follow) = FeedRepository::new(ctx.db.pool())
            .create_followed(&NewFeed::new(name, url, user.id))
            .await?;
        info!("User {} added feed {} ({})", user.name, feed.name, feed.url);

        let mut output = CommandOutput::new();
        output.push(format!("Added feed {} ({})", feed.name, feed.url));
        output.push(format!("{} now follows {}", user.name, feed.name));
        Ok(output)
    }
}

/// `feeds`: list every feed with the user who added it.
pub struct FeedsCommand;

#[async_trait]
impl CommandHandler for FeedsCommand {
    async fn run(&self, ctx: &mut CliContext, args: &[String]) -> Result<CommandOutput> {
        expect_args(args, 0, "feeds")?;

        let feeds = FeedRepository::new(ctx.db.pool()).list_with_owner().await?;
        if feeds.is_empty() {
            return Ok(CommandOutput::line("No feeds registered"));
        }

        let mut output = CommandOutput::new();
        for entry in feeds {
            let fetched = match entry.feed.last_fetched_at {
                Some(at) => format!("last fetched {}", format_datetime(&at)),
                None => "never fetched".to_string(),
            };
            output.push(format!(
                "* {} ({}) added by {}, {}",
                entry.feed.name, entry.feed.url, entry.owner_name, fetched
            ));
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use crate::cli::test_support::{context, run};
    use crate::feed::repository::FeedRepository;
    use crate::GatorError;

    #[tokio::test]
    async fn test_addfeed_requires_login() {
        let (mut ctx, _dir) = context().await;
        let result = run(&mut ctx, "addfeed", &["Blog", "https://blog.example/rss"]).await;
        assert!(matches!(result, Err(GatorError::NotLoggedIn(_))));
    }

    #[tokio::test]
    async fn test_addfeed_creates_and_follows() {
        let (mut ctx, _dir) = context().await;
        run(&mut ctx, "register", &["alice"]).await.unwrap();

        let output = run(&mut ctx, "addfeed", &["Blog", "https://blog.example/rss"])
            .await
            .unwrap();
        assert_eq!(
            output.lines,
            vec![
                "Added feed Blog (https://blog.example/rss)",
                "alice now follows Blog"
            ]
        );

        let following = run(&mut ctx, "following", &[]).await.unwrap();
        assert_eq!(following.lines, vec!["* Blog"]);
    }

    #[tokio::test]
    async fn test_addfeed_rejects_bad_url() {
        let (mut ctx, _dir) = context().await;
        run(&mut ctx, "register", &["alice"]).await.unwrap();

        let result = run(&mut ctx, "addfeed", &["Blog", "not a url"]).await;
        assert!(matches!(result, Err(GatorError::Validation(_))));
        assert_eq!(FeedRepository::new(ctx.db.pool()).count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_addfeed_duplicate_url() {
        let (mut ctx, _dir) = context().await;
        run(&mut ctx, "register", &["alice"]).await.unwrap();
        run(&mut ctx, "addfeed", &["Blog", "https://blog.example/rss"])
            .await
            .unwrap();

        let result = run(&mut ctx, "addfeed", &["Again", "https://blog.example/rss"]).await;
        assert!(matches!(result, Err(GatorError::Validation(_))));
    }

    #[tokio::test]
    async fn test_addfeed_keeps_nothing_when_follow_fails() {
        let (mut ctx, _dir) = context().await;
        run(&mut ctx, "register", &["alice"]).await.unwrap();
        sqlx::query(
            "CREATE TRIGGER reject_follows BEFORE INSERT ON feed_follows
             BEGIN SELECT RAISE(ABORT, 'follows disabled'); END",
        )
        .execute(ctx.db.pool())
        .await
        .unwrap();

        let result = run(&mut ctx, "addfeed", &["Blog", "https://blog.example/rss"]).await;
        assert!(matches!(result, Err(GatorError::Database(_))));
        assert_eq!(FeedRepository::new(ctx.db.pool()).count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_feeds_lists_owner() {
        let (mut ctx, _dir) = context().await;
        let empty = run(&mut ctx, "feeds", &[]).await.unwrap();
        assert_eq!(empty.lines, vec!["No feeds registered"]);

        run(&mut ctx, "register", &["alice"]).await.unwrap();
        run(&mut ctx, "addfeed", &["Blog", "https://blog.example/rss"])
            .await
            .unwrap();

        let output = run(&mut ctx, "feeds", &[]).await.unwrap();
        assert_eq!(
            output.lines,
            vec!["* Blog (https://blog.example/rss) added by alice, never fetched"]
        );
    }
}
