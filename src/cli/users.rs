//! User commands: register, login, reset, users.

use async_trait::async_trait;
use tracing::info;

use super::{expect_args, CliContext, CommandHandler, CommandOutput};
use crate::db::{NewUser, UserRepository};
use crate::{GatorError, Result};

/// `register <name>`: create a user and log in as them.
pub struct RegisterCommand;

#[async_trait]
impl CommandHandler for RegisterCommand {
    async fn run(&self, ctx: &mut CliContext, args: &[String]) -> Result<CommandOutput> {
        let args = expect_args(args, 1, "register <name>")?;
        let name = args[0].trim();
        if name.is_empty() {
            return Err(GatorError::Validation("user name must not be blank".to_string()));
        }

        let repo = UserRepository::new(ctx.db.pool());
        if repo.exists(name).await? {
            return Err(GatorError::Validation(format!(
                "user {name:?} already exists"
            )));
        }

        let user = repo.create(&NewUser::new(name)).await?;
        ctx.session.set_user(&user.name)?;
        info!("Registered user {} (id {})", user.name, user.id);

        Ok(CommandOutput::line(format!(
            "Registered user {} and logged in",
            user.name
        )))
    }
}

/// `login <name>`: switch the current user.
pub struct LoginCommand;

#[async_trait]
impl CommandHandler for LoginCommand {
    async fn run(&self, ctx: &mut CliContext, args: &[String]) -> Result<CommandOutput> {
        let args = expect_args(args, 1, "login <name>")?;
        let name = args[0].trim();

        let user = UserRepository::new(ctx.db.pool())
            .get_by_name(name)
            .await?
            .ok_or_else(|| GatorError::NotFound(format!("user {name:?}")))?;

        ctx.session.set_user(&user.name)?;
        Ok(CommandOutput::line(format!("Logged in as {}", user.name)))
    }
}

/// `reset`: delete every user, and with them all feeds, follows and posts.
pub struct ResetCommand;

#[async_trait]
impl CommandHandler for ResetCommand {
    async fn run(&self, ctx: &mut CliContext, args: &[String]) -> Result<CommandOutput> {
        expect_args(args, 0, "reset")?;

        let removed = UserRepository::new(ctx.db.pool()).delete_all().await?;
        ctx.session.clear()?;
        info!("Reset database: removed {} user(s)", removed);

        Ok(CommandOutput::line(format!(
            "Reset complete: removed {removed} user(s)"
        )))
    }
}

/// `users`: list users, marking the current one.
pub struct UsersCommand;

#[async_trait]
impl CommandHandler for UsersCommand {
    async fn run(&self, ctx: &mut CliContext, args: &[String]) -> Result<CommandOutput> {
        expect_args(args, 0, "users")?;

        let users = UserRepository::new(ctx.db.pool()).list_all().await?;
        if users.is_empty() {
            return Ok(CommandOutput::line("No users registered"));
        }

        let current = ctx.session.current_user();
        let mut output = CommandOutput::new();
        for user in users {
            if current == Some(user.name.as_str()) {
                output.push(format!("* {} (current)", user.name));
            } else {
                output.push(format!("* {}", user.name));
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use crate::cli::test_support::{context, run};
    use crate::GatorError;

    #[tokio::test]
    async fn test_register_logs_in() {
        let (mut ctx, _dir) = context().await;
        let output = run(&mut ctx, "register", &["alice"]).await.unwrap();
        assert_eq!(output.lines, vec!["Registered user alice and logged in"]);
        assert_eq!(ctx.session.current_user(), Some("alice"));
    }

    #[tokio::test]
    async fn test_register_twice_fails() {
        let (mut ctx, _dir) = context().await;
        run(&mut ctx, "register", &["alice"]).await.unwrap();
        let result = run(&mut ctx, "register", &["alice"]).await;
        assert!(matches!(result, Err(GatorError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_blank_name_fails() {
        let (mut ctx, _dir) = context().await;
        let result = run(&mut ctx, "register", &["  "]).await;
        assert!(matches!(result, Err(GatorError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_wrong_arg_count() {
        let (mut ctx, _dir) = context().await;
        let result = run(&mut ctx, "register", &[]).await;
        assert!(matches!(result, Err(GatorError::Usage(u)) if u == "register <name>"));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let (mut ctx, _dir) = context().await;
        let result = run(&mut ctx, "login", &["nobody"]).await;
        assert!(matches!(result, Err(GatorError::NotFound(_))));
        assert!(ctx.session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_login_switches_user() {
        let (mut ctx, _dir) = context().await;
        run(&mut ctx, "register", &["alice"]).await.unwrap();
        run(&mut ctx, "register", &["bob"]).await.unwrap();

        run(&mut ctx, "login", &["alice"]).await.unwrap();
        assert_eq!(ctx.session.current_user(), Some("alice"));
    }

    #[tokio::test]
    async fn test_users_marks_current() {
        let (mut ctx, _dir) = context().await;
        run(&mut ctx, "register", &["bob"]).await.unwrap();
        run(&mut ctx, "register", &["alice"]).await.unwrap();

        let output = run(&mut ctx, "users", &[]).await.unwrap();
        assert_eq!(output.lines, vec!["* alice (current)", "* bob"]);
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let (mut ctx, _dir) = context().await;
        run(&mut ctx, "register", &["alice"]).await.unwrap();
        run(&mut ctx, "register", &["bob"]).await.unwrap();

        let output = run(&mut ctx, "reset", &[]).await.unwrap();
        assert_eq!(output.lines, vec!["Reset complete: removed 2 user(s)"]);
        assert!(ctx.session.current_user().is_none());

        let output = run(&mut ctx, "users", &[]).await.unwrap();
        assert_eq!(output.lines, vec!["No users registered"]);
    }
}
