//! Entry point for the `clinker` binary: parses the command line, loads
//! configuration, wires up logging/storage/job manager, and dispatches
//! to the handlers in [`commands`].

mod cli;
mod commands;
mod dataset;
mod optimize_handler;

use anyhow::Result;
use clap::Parser;
use clinker_jobs::JobManager;
use clinker_logging::LogConfig;
use tracing::info;

use cli::{Cli, Command, JobCommand};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = clinker_config::Config::load(cli.config.as_deref())?;

    clinker_logging::init_logging(LogConfig {
        app_name: "clinker",
        verbose: cli.verbose,
        quiet_mode: false,
    })?;

    let pool = clinker_db::pool::connect(&config.database_url).await?;

    let job_manager = JobManager::new(
        pool.clone(),
        config.worker_pool_size,
        config.job_queue_capacity,
        config.queue_full_policy,
    );
    let recovered = job_manager.recover_from_restart().await?;
    if recovered > 0 {
        info!(recovered, "recovered stale jobs from a prior restart");
    }

    match cli.command {
        Command::Batch { command } => commands::batch(&pool, &config, command).await,
        Command::Job { command } => match command {
            JobCommand::SubmitOptimization { scenario_name, solver, time_limit_seconds, mip_gap } => {
                commands::submit_optimization(
                    &pool,
                    &config,
                    &job_manager,
                    scenario_name,
                    solver,
                    time_limit_seconds,
                    mip_gap,
                )
                .await
            }
            other => commands::job(&job_manager, other).await,
        },
        Command::ResolveRoute { origin_plant_id, destination_node_id, mode } => {
            commands::resolve_route(&pool, &origin_plant_id, &destination_node_id, &mode).await
        }
        Command::Kpi { scenario_name } => commands::kpi(&pool, &scenario_name).await,
    }
}
