use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use gator::{CliContext, Command, CommandOutput, CommandRegistry, Config, Database};

/// Gator - a command-line RSS aggregator.
#[derive(Parser, Debug)]
#[command(name = "gator", version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Command to run (register, login, reset, users, addfeed, feeds,
    /// follow, following, unfollow, browse, agg)
    command: String,

    /// Arguments for the command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match Config::load_if_present(&cli.config) {
        Ok(Some(config)) => config,
        Ok(None) => {
            eprintln!("Config file {} not found.", cli.config.display());
            eprintln!("Using default configuration.");
            Config::default()
        }
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    config.apply_env_overrides();
    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    // Initialize logging
    if let Err(e) = gator::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        gator::logging::init_console_only(&config.logging.level);
    }

    match run(Command::new(cli.command, cli.args), config).await {
        Ok(output) => {
            for line in output.lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: Config) -> gator::Result<CommandOutput> {
    let db = Database::open(&config.database.path).await?;
    let session = gator::Session::load(&config.session.path)?;
    let mut ctx = CliContext::new(db.clone(), config, session);

    debug!("Running command {}", command.name);
    let result = CommandRegistry::standard().dispatch(&mut ctx, &command).await;
    db.close().await;
    result
}
