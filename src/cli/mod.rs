//! Command dispatch for Gator.
//!
//! Commands are looked up by name in an explicit [`CommandRegistry`] and run
//! against a [`CliContext`] holding the database, configuration and session.
//! Handlers return their output as lines; the binary prints them.

mod agg;
mod browse;
mod feeds;
mod follows;
mod middleware;
mod users;

pub use agg::{run_aggregator, AggCommand};
pub use browse::BrowseCommand;
pub use feeds::{AddFeedCommand, FeedsCommand};
pub use follows::{FollowCommand, FollowingCommand, UnfollowCommand};
pub use middleware::{current_user, require_login, LoggedInHandler, RequireLogin};
pub use users::{LoginCommand, RegisterCommand, ResetCommand, UsersCommand};

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::session::Session;
use crate::{Database, GatorError, Result};

/// A parsed command line: the command name and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Lines produced by a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub lines: Vec<String>,
}

impl CommandOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output consisting of a single line.
    pub fn line(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Everything a command may touch.
pub struct CliContext {
    pub db: Database,
    pub config: Config,
    pub session: Session,
}

impl CliContext {
    pub fn new(db: Database, config: Config, session: Session) -> Self {
        Self {
            db,
            config,
            session,
        }
    }
}

/// A runnable command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn run(&self, ctx: &mut CliContext, args: &[String]) -> Result<CommandOutput>;
}

/// Name to handler table.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: BTreeMap<String, Box<dyn CommandHandler>>,
}

impl CommandRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every Gator command.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("register", RegisterCommand);
        registry.register("login", LoginCommand);
        registry.register("reset", ResetCommand);
        registry.register("users", UsersCommand);
        registry.register("addfeed", require_login(AddFeedCommand));
        registry.register("feeds", FeedsCommand);
        registry.register("follow", require_login(FollowCommand));
        registry.register("following", require_login(FollowingCommand));
        registry.register("unfollow", require_login(UnfollowCommand));
        registry.register("browse", require_login(BrowseCommand));
        registry.register("agg", AggCommand);
        registry
    }

    /// Register `handler` under `name`, replacing any previous handler.
    pub fn register(&mut self, name: impl Into<String>, handler: impl CommandHandler + 'static) {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    /// Registered command names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Run the handler registered for `command.name`.
    pub async fn dispatch(&self, ctx: &mut CliContext, command: &Command) -> Result<CommandOutput> {
        let handler = self
            .handlers
            .get(&command.name)
            .ok_or_else(|| GatorError::UnknownCommand(command.name.clone()))?;
        debug!("Dispatching {} {:?}", command.name, command.args);
        handler.run(ctx, &command.args).await
    }
}

/// Check the argument count, failing with `Usage` otherwise.
pub(crate) fn expect_args<'a>(
    args: &'a [String],
    count: usize,
    usage: &str,
) -> Result<&'a [String]> {
    if args.len() != count {
        return Err(GatorError::Usage(usage.to_string()));
    }
    Ok(args)
}


#[cfg(test)]
mod tests {
    use super::test_support::{context, run};
    use super::*;

    struct Echo;

    #[async_trait]
    impl CommandHandler for Echo {
        async fn run(&self, _ctx: &mut CliContext, args: &[String]) -> Result<CommandOutput> {
            Ok(CommandOutput {
                lines: args.to_vec(),
            })
        }
    }

    #[test]
    fn test_standard_registry_names() {
        let registry = CommandRegistry::standard();
        assert_eq!(
            registry.names(),
            vec![
                "addfeed", "agg", "browse", "feeds", "follow", "following", "login", "register",
                "reset", "unfollow", "users"
            ]
        );
    }

    #[tokio::test]
    async fn test_dispatch_custom_handler() {
        let (mut ctx, _dir) = context().await;
        let mut registry = CommandRegistry::new();
        registry.register("echo", Echo);

        let output = registry
            .dispatch(&mut ctx, &Command::new("echo", vec!["a".into(), "b".into()]))
            .await
            .unwrap();
        assert_eq!(output.lines, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let (mut ctx, _dir) = context().await;
        let result = run(&mut ctx, "frobnicate", &[]).await;
        assert!(matches!(result, Err(GatorError::UnknownCommand(name)) if name == "frobnicate"));
    }

    #[test]
    fn test_expect_args() {
        let args = vec!["one".to_string()];
        assert!(expect_args(&args, 1, "cmd <x>").is_ok());
        assert!(matches!(
            expect_args(&args, 2, "cmd <x> <y>"),
            Err(GatorError::Usage(u)) if u == "cmd <x> <y>"
        ));
    }

    #[test]
    fn test_command_output_helpers() {
        let mut output = CommandOutput::new();
        assert!(output.is_empty());
        output.push("hello");
        assert_eq!(output, CommandOutput::line("hello"));
    }
}
