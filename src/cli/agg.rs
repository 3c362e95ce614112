//! `agg <interval>`: run the polling scheduler until interrupted.

use std::future::Future;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{expect_args, CliContext, CommandHandler, CommandOutput};
use crate::aggregator::{parse_interval, Scheduler, SchedulerSettings};
use crate::feed::fetcher::HttpFeedSource;
use crate::feed::store::SqliteFeedStore;
use crate::Result;

pub struct AggCommand;

/// Parse `interval`, then poll feeds until `shutdown` completes.
///
/// Interval errors are returned before any tick. Returns the number of
/// cycles run.
pub async fn run_aggregator<Sd>(ctx: &CliContext, interval: &str, shutdown: Sd) -> Result<u64>
where
    Sd: Future<Output = ()>,
{
    let interval = parse_interval(interval)?;
    let settings = SchedulerSettings::new(interval, &ctx.config.aggregator);
    let source = HttpFeedSource::new(&ctx.config.aggregator)?;
    let scheduler = Scheduler::new(SqliteFeedStore::new(ctx.db.clone()), source, settings);

    Ok(scheduler.run_until(shutdown).await)
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C"),
        Err(e) => {
            // Without a signal handler the loop runs until the process is killed.
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl CommandHandler for AggCommand {
    async fn run(&self, ctx: &mut CliContext, args: &[String]) -> Result<CommandOutput> {
        let args = expect_args(args, 1, "agg <interval>")?;
        let cycles = run_aggregator(ctx, &args[0], ctrl_c()).await?;
        Ok(CommandOutput::line(format!(
            "Stopped after {cycles} fetch cycle(s)"
        )))
    }
}
