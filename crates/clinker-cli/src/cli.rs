//! Command-line surface: one subcommand per operation in the Batch,
//! Optimization, and Route Resolver API tables (§6).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "clinker", about = "Clinker supply-chain planning service")]
pub struct Cli {
    /// Path to a TOML config file. Falls back to defaults plus `CLINKER_*`
    /// environment overrides when absent.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print detailed logs to stderr regardless of configured log level.
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest, validate, and promote batches of planning data.
    Batch {
        #[command(subcommand)]
        command: BatchCommand,
    },
    /// Submit, inspect, and cancel optimization jobs.
    Job {
        #[command(subcommand)]
        command: JobCommand,
    },
    /// Resolve a transport route between two nodes.
    ResolveRoute {
        origin_plant_id: String,
        destination_node_id: String,
        #[arg(long, default_value = "road")]
        mode: String,
    },
    /// Inspect materialized KPIs for a scenario.
    Kpi {
        scenario_name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum BatchCommand {
    /// Ingest rows from a CSV file into a fresh batch.
    Ingest {
        path: PathBuf,
        /// Force a target table instead of inferring it from the filename/columns.
        #[arg(long)]
        target_table: Option<String>,
    },
    /// Run the five-stage Validator against a batch.
    Validate { batch_id: String },
    /// Copy a validated batch into canonical tables.
    Promote { batch_id: String },
    /// Show a batch's current `ValidationBatch` snapshot.
    Status { batch_id: String },
    /// List the most recently created batches.
    List {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum JobCommand {
    /// Submit an optimization run for a named scenario.
    SubmitOptimization {
        scenario_name: String,
        #[arg(long)]
        solver: Option<String>,
        #[arg(long)]
        time_limit_seconds: Option<f64>,
        #[arg(long)]
        mip_gap: Option<f64>,
    },
    /// Show a job's current status and progress.
    Status { job_id: String },
    /// Show a completed job's result reference and summary.
    Results { job_id: String },
    /// Request cooperative cancellation of a running or pending job.
    Cancel { job_id: String },
}
