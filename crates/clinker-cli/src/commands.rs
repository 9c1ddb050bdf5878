use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clinker_core::{CellValue, JobId, RawRow, ScenarioConfig, TargetTable, TransportMode};
use clinker_ingest::{BatchLifecycleManager, Promoter, Validator};
use clinker_jobs::JobManager;
use clinker_routing::RoutingResolver;
use clinker_scenario::ScenarioRunner;
use clinker_solver::{PenaltyPolicy, SolverDriver, SolverOptions};
use comfy_table::{Cell, Table};
use sqlx::{Pool, Sqlite};

use crate::cli::{BatchCommand, JobCommand};
use crate::optimize_handler::OptimizeJobHandler;

pub async fn batch(pool: &Pool<Sqlite>, config: &clinker_config::Config, command: BatchCommand) -> Result<()> {
    match command {
        BatchCommand::Ingest { path, target_table } => ingest(pool, &path, target_table).await,
        BatchCommand::Validate { batch_id } => validate(pool, config, &batch_id).await,
        BatchCommand::Promote { batch_id } => promote(pool, &batch_id).await,
        BatchCommand::Status { batch_id } => batch_status(pool, &batch_id).await,
        BatchCommand::List { limit } => batch_list(pool, limit).await,
    }
}

async fn ingest(pool: &Pool<Sqlite>, path: &Path, target_table: Option<String>) -> Result<()> {
    let target = target_table.map(|t| t.parse::<TargetTable>()).transpose().map_err(anyhow::Error::msg)?;
    let rows = read_csv_rows(path)?;
    let source_descriptor = path.to_string_lossy().to_string();

    let manager = BatchLifecycleManager::new(pool.clone());
    let batch_id = manager.ingest(rows, target, &source_descriptor).await?;
    println!("batch_id: {batch_id}");
    Ok(())
}

fn read_csv_rows(path: &Path) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row: RawRow = RawRow::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            row.insert(header.clone(), cell_from_str(value));
        }
        rows.push(row);
    }
    Ok(rows)
}

fn cell_from_str(value: &str) -> CellValue {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return CellValue::Float(f);
    }
    CellValue::Text(trimmed.to_string())
}

async fn validate(pool: &Pool<Sqlite>, config: &clinker_config::Config, batch_id: &str) -> Result<()> {
    let validator = Validator::new(pool.clone(), config.validation_thresholds);
    let report = validator.validate(batch_id).await?;
    println!(
        "valid: {} errors: {} warnings: {}",
        report.is_valid(),
        report.error_count(),
        report.warning_count()
    );
    for finding in &report.findings {
        println!(
            "  row {} [{}] {} {}: {}",
            finding.source_row_number,
            finding.stage.as_str(),
            finding.field_path,
            finding.error_code,
            finding.message
        );
    }
    Ok(())
}

async fn promote(pool: &Pool<Sqlite>, batch_id: &str) -> Result<()> {
    let promoter = Promoter::new(pool.clone());
    let rows_promoted = promoter.promote(batch_id).await?;
    println!("rows_promoted: {rows_promoted}");
    Ok(())
}

async fn batch_status(pool: &Pool<Sqlite>, batch_id: &str) -> Result<()> {
    let batch = clinker_db::batches::get(pool, batch_id).await?;
    let mut table = Table::new();
    table.set_header(vec!["field", "value"]);
    table.add_row(vec![Cell::new("batch_id"), Cell::new(batch.batch_id.as_str())]);
    table.add_row(vec![Cell::new("source"), Cell::new(&batch.source_descriptor)]);
    table.add_row(vec![Cell::new("target_table"), Cell::new(batch.target_table.as_str())]);
    table.add_row(vec![Cell::new("status"), Cell::new(format!("{:?}", batch.status))]);
    table.add_row(vec![Cell::new("total_rows"), Cell::new(batch.total_rows)]);
    table.add_row(vec![Cell::new("valid_rows"), Cell::new(batch.valid_rows)]);
    table.add_row(vec![Cell::new("invalid_rows"), Cell::new(batch.invalid_rows)]);
    println!("{table}");
    Ok(())
}

async fn batch_list(pool: &Pool<Sqlite>, limit: i64) -> Result<()> {
    let batches = clinker_db::batches::list_recent(pool, limit).await?;
    let mut table = Table::new();
    table.set_header(vec!["batch_id", "source", "target_table", "status", "rows"]);
    for batch in batches {
        table.add_row(vec![
            Cell::new(batch.batch_id.as_str()),
            Cell::new(&batch.source_descriptor),
            Cell::new(batch.target_table.as_str()),
            Cell::new(format!("{:?}", batch.status)),
            Cell::new(batch.total_rows),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn submit_optimization(
    pool: &Pool<Sqlite>,
    config: &clinker_config::Config,
    job_manager: &JobManager,
    scenario_name: String,
    solver: Option<String>,
    time_limit_seconds: Option<f64>,
    mip_gap: Option<f64>,
) -> Result<()> {
    let dataset = crate::dataset::load(pool).await?;

    let driver = match solver.as_deref() {
        Some("commercial") => SolverDriver::new(vec![Box::new(clinker_solver::CbcBackend)]),
        Some("modern-open") => SolverDriver::new(vec![Box::new(clinker_solver::HighsBackend)]),
        Some("legacy-open") => SolverDriver::new(vec![Box::new(clinker_solver::MicrolpBackend)]),
        Some(other) => bail!("unknown solver choice: {other}"),
        None => SolverDriver::default_chain(),
    };
    let options = SolverOptions {
        time_limit_seconds: time_limit_seconds.unwrap_or(config.solver_time_limit_seconds),
        mip_gap: mip_gap.unwrap_or(config.solver_mip_gap),
    };
    let penalty = if config.penalty_rates.unmet_demand_per_tonne > 0.0 {
        PenaltyPolicy::enabled(config.penalty_rates.unmet_demand_per_tonne)
    } else {
        PenaltyPolicy::disabled()
    };
    let runner = ScenarioRunner::new(pool.clone(), driver, options, penalty);

    let handler = Arc::new(OptimizeJobHandler {
        runner,
        dataset,
        scenario: ScenarioConfig::base(scenario_name.clone()),
    });

    let payload = serde_json::json!({ "scenario_name": scenario_name });
    let job_id = job_manager
        .submit("optimize", handler, Some(&scenario_name), None, &payload)
        .await?;
    println!("job_id: {job_id}");
    println!("status: pending");
    Ok(())
}

/// Handles every job subcommand except `submit-optimization`, which
/// `main` dispatches directly since it needs the dataset and config too.
pub async fn job(job_manager: &JobManager, command: JobCommand) -> Result<()> {
    match command {
        JobCommand::SubmitOptimization { .. } => {
            bail!("submit-optimization is dispatched before reaching this handler")
        }
        JobCommand::Status { job_id } => job_status(job_manager, &job_id).await,
        JobCommand::Results { job_id } => job_results(job_manager, &job_id).await,
        JobCommand::Cancel { job_id } => job_cancel(job_manager, &job_id).await,
    }
}

async fn job_status(job_manager: &JobManager, job_id: &str) -> Result<()> {
    let job = job_manager.status(&JobId::from(job_id)).await?;
    let mut table = Table::new();
    table.set_header(vec!["field", "value"]);
    table.add_row(vec![Cell::new("job_id"), Cell::new(job.job_id.as_str())]);
    table.add_row(vec![Cell::new("status"), Cell::new(format!("{:?}", job.status))]);
    table.add_row(vec![Cell::new("progress_percent"), Cell::new(job.progress_percent)]);
    table.add_row(vec![Cell::new("progress_message"), Cell::new(job.progress_message.unwrap_or_default())]);
    println!("{table}");
    Ok(())
}

async fn job_results(job_manager: &JobManager, job_id: &str) -> Result<()> {
    let job = job_manager.status(&JobId::from(job_id)).await?;
    match job.status {
        clinker_core::JobStatus::Success => {
            println!("result_ref: {}", job.result_ref.unwrap_or_default());
            println!("result_summary: {}", job.result_summary.unwrap_or_default());
            Ok(())
        }
        clinker_core::JobStatus::Failed => bail!("job failed: {}", job.error_payload.unwrap_or_default()),
        _ => bail!("job {job_id} is not ready: status={:?}", job.status),
    }
}

async fn job_cancel(job_manager: &JobManager, job_id: &str) -> Result<()> {
    job_manager.cancel(&JobId::from(job_id)).await?;
    println!("cancellation requested for {job_id}");
    Ok(())
}

pub async fn resolve_route(
    pool: &Pool<Sqlite>,
    origin_plant_id: &str,
    destination_node_id: &str,
    mode: &str,
) -> Result<()> {
    let mode: TransportMode = mode.parse().map_err(anyhow::Error::msg)?;
    // No HTTP routing provider is configured out of the box (those
    // clients are an external collaborator); this still serves cached
    // routes and reports `RouteUnavailable` otherwise.
    let resolver = RoutingResolver::new(pool.clone(), Vec::new(), clinker_routing::RetryPolicy::default());
    let route = resolver.resolve(origin_plant_id, destination_node_id, mode).await?;
    println!("distance_km: {}", route.distance_km);
    println!("duration_minutes: {}", route.duration_minutes);
    println!("source: {}", route.provider);
    Ok(())
}

pub async fn kpi(pool: &Pool<Sqlite>, scenario_name: &str) -> Result<()> {
    let summaries = clinker_db::kpi::fetch_summaries(pool, scenario_name).await?;
    let mut table = Table::new();
    table.set_header(vec!["period", "total_cost", "service_level", "stockout_events"]);
    for (period, summary) in &summaries {
        table.add_row(vec![
            Cell::new(period),
            Cell::new(format!("{:.2}", summary.total_cost)),
            Cell::new(format!("{:.3}", summary.service_level)),
            Cell::new(summary.stockout_events),
        ]);
    }
    println!("{table}");

    if let Some(aggregated) = clinker_db::kpi::fetch_aggregated(pool, scenario_name).await? {
        println!("total_cost: {:.2}", aggregated.total_cost);
        println!("average_service_level: {:.3}", aggregated.average_service_level);
        println!("total_unmet_demand_tonnes: {:.2}", aggregated.total_unmet_demand_tonnes);
    }
    Ok(())
}
