//! Follow commands: follow, following, unfollow.

use async_trait::async_trait;

use super::{expect_args, CliContext, CommandOutput, LoggedInHandler};
use crate::db::User;
use crate::feed::repository::{FeedFollowRepository, FeedRepository};
use crate::feed::types::Feed;
use crate::{GatorError, Result};

async fn feed_by_url(ctx: &CliContext, url: &str) -> Result<Feed> {
    FeedRepository::new(ctx.db.pool())
        .get_by_url(url)
        .await?
        .ok_or_else(|| GatorError::NotFound(format!("feed {url}")))
}

/// `follow <url>`: follow a registered feed.
pub struct FollowCommand;

#[async_trait]
impl LoggedInHandler for FollowCommand {
    async fn run(
        &self,
        ctx: &mut CliContext,
        args: &[String],
        user: &User,
    ) -> Result<CommandOutput> {
        let args = expect_args(args, 1, "follow <url>")?;
        let feed = feed_by_url(ctx, args[0].trim()).await?;

        let created = FeedFollowRepository::new(ctx.db.pool())
            .create(user.id, feed.id)
            .await?;

        Ok(match created {
            Some(follow) => CommandOutput::line(format!(
                "{} now follows {}",
                follow.user_name, follow.feed_name
            )),
            None => CommandOutput::line(format!("{} already follows {}", user.name, feed.name)),
        })
    }
}

/// `following`: list the feeds the current user follows.
pub struct FollowingCommand;

#[async_trait]
impl LoggedInHandler for FollowingCommand {
    async fn run(
        &self,
        ctx: &mut CliContext,
        args: &[String],
        user: &User,
    ) -> Result<CommandOutput> {
        expect_args(args, 0, "following")?;

        let follows = FeedFollowRepository::new(ctx.db.pool())
            .list_for_user(user.id)
            .await?;
        if follows.is_empty() {
            return Ok(CommandOutput::line(format!(
                "{} is not following any feeds",
                user.name
            )));
        }

        Ok(CommandOutput {
            lines: follows
                .into_iter()
                .map(|f| format!("* {}", f.feed_name))
                .collect(),
        })
    }
}

/// `unfollow <url>`: stop following a feed.
pub struct UnfollowCommand;

#[async_trait]
impl LoggedInHandler for UnfollowCommand {
    async fn run(
        &self,
        ctx: &mut CliContext,
        args: &[String],
        user: &User,
    ) -> Result<CommandOutput> {
        let args = expect_args(args, 1, "unfollow <url>")?;
        let feed = feed_by_url(ctx, args[0].trim()).await?;

        let removed = FeedFollowRepository::new(ctx.db.pool())
            .delete(user.id, feed.id)
            .await?;

        Ok(if removed {
            CommandOutput::line(format!("{} unfollowed {}", user.name, feed.name))
        } else {
            CommandOutput::line(format!("{} was not following {}", user.name, feed.name))
        })
    }
}
