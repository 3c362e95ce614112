//! Login requirement for commands.

use async_trait::async_trait;

use super::{CliContext, CommandHandler, CommandOutput};
use crate::db::{User, UserRepository};
use crate::{GatorError, Result};

/// A command that runs on behalf of the logged-in user.
#[async_trait]
pub trait LoggedInHandler: Send + Sync {
    async fn run(&self, ctx: &mut CliContext, args: &[String], user: &User)
        -> Result<CommandOutput>;
}

/// Resolve the session's user in the database.
///
/// Fails with `NotLoggedIn` if nobody is logged in or the user no longer exists.
pub async fn current_user(ctx: &CliContext) -> Result<User> {
    let name = ctx
        .session
        .current_user()
        .ok_or_else(|| GatorError::NotLoggedIn("no user is logged in".to_string()))?;

    UserRepository::new(ctx.db.pool())
        .get_by_name(name)
        .await?
        .ok_or_else(|| GatorError::NotLoggedIn(format!("user {name:?} is not registered")))
}

/// Wraps a [`LoggedInHandler`] so it runs only with a current user.
pub struct RequireLogin<H> {
    inner: H,
}

/// Make `handler` a command that needs a logged-in user.
pub fn require_login<H: LoggedInHandler>(handler: H) -> RequireLogin<H> {
    RequireLogin { inner: handler }
}

#[async_trait]
impl<H: LoggedInHandler> CommandHandler for RequireLogin<H> {
    async fn run(&self, ctx: &mut CliContext, args: &[String]) -> Result<CommandOutput> {
        let user = current_user(ctx).await?;
        self.inner.run(ctx, args, &user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::test_support::context;
    use crate::db::NewUser;

    struct WhoAmI;

    #[async_trait]
    impl LoggedInHandler for WhoAmI {
        async fn run(
            &self,
            _ctx: &mut CliContext,
            _args: &[String],
            user: &User,
        ) -> Result<CommandOutput> {
            Ok(CommandOutput::line(user.name.clone()))
        }
    }

    #[tokio::test]
    async fn test_without_session_fails() {
        let (mut ctx, _dir) = context().await;
        let result = require_login(WhoAmI).run(&mut ctx, &[]).await;
        assert!(matches!(result, Err(GatorError::NotLoggedIn(_))));
    }

    #[tokio::test]
    async fn test_unknown_session_user_fails() {
        let (mut ctx, _dir) = context().await;
        ctx.session.set_user("ghost").unwrap();
        let result = require_login(WhoAmI).run(&mut ctx, &[]).await;
        assert!(matches!(result, Err(GatorError::NotLoggedIn(_))));
    }

    #[tokio::test]
    async fn test_passes_current_user() {
        let (mut ctx, _dir) = context().await;
        UserRepository::new(ctx.db.pool())
            .create(&NewUser::new("alice"))
            .await
            .unwrap();
        ctx.session.set_user("alice").unwrap();

        let output = require_login(WhoAmI).run(&mut ctx, &[]).await.unwrap();
        assert_eq!(output.lines, vec!["alice"]);
    }
}
