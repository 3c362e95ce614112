//! `browse [limit]`: newest posts from followed feeds.

use async_trait::async_trait;

use super::{CliContext, CommandOutput, LoggedInHandler};
use crate::datetime::format_date;
use crate::db::User;
use crate::feed::repository::PostRepository;
use crate::{GatorError, Result};

const USAGE: &str = "browse [limit]";

pub struct BrowseCommand;

fn parse_limit(args: &[String], default: i64) -> Result<i64> {
    match args {
        [] => Ok(default),
        [limit] => match limit.trim().parse::<i64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(GatorError::Usage(format!(
                "{USAGE} (limit must be a positive number, got {limit:?})"
            ))),
        },
        _ => Err(GatorError::Usage(USAGE.to_string())),
    }
}

#[async_trait]
impl LoggedInHandler for BrowseCommand {
    async fn run(
        &self,
        ctx: &mut CliContext,
        args: &[String],
        user: &User,
    ) -> Result<CommandOutput> {
        let limit = parse_limit(args, ctx.config.browse.default_limit)?;

        let posts = PostRepository::new(ctx.db.pool())
            .list_for_user(user.id, limit)
            .await?;
        if posts.is_empty() {
            return Ok(CommandOutput::line(format!("No posts for {} yet", user.name)));
        }

        let mut output = CommandOutput::new();
        for entry in posts {
            let post = entry.post;
            let date = post
                .published_at
                .as_ref()
                .map(format_date)
                .unwrap_or_else(|| "undated".to_string());
            output.push(format!("{} from {}", date, entry.feed_name));
            output.push(format!("--- {} ---", post.title));
            if let Some(description) = post.description {
                output.push(format!("    {}", description.trim()));
            }
            output.push(format!("Link: {}", post.url));
            output.push("=====================================");
        }
        Ok(output)
    }
}
