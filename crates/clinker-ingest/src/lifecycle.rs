//! Batch Lifecycle Manager: accepts a row stream, writes it into the
//! matching staging table under a freshly minted batch id, and creates
//! the owning `ValidationBatch` record — all in one transaction.

use clinker_core::{BatchId, RawRow, TargetTable, ValidationBatch};
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::error::IngestError;

pub struct BatchLifecycleManager {
    pool: Pool<Sqlite>,
}

impl BatchLifecycleManager {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Normalize a column name: trim, lowercase, spaces to underscores.
    pub fn normalize_column(name: &str) -> String {
        name.trim().to_lowercase().replace(' ', "_")
    }

    fn normalize_row(row: &RawRow) -> RawRow {
        row.iter().map(|(k, v)| (Self::normalize_column(k), v.clone())).collect()
    }

    /// Infer the target table from a filename-style source descriptor,
    /// cross-checked against the required columns present in the first row.
    fn infer_target_table(source_descriptor: &str, first_row: &RawRow) -> Option<TargetTable> {
        let lower = source_descriptor.to_lowercase();
        let candidates: &[TargetTable] = &[
            TargetTable::Plants,
            TargetTable::ProductionCapacityCost,
            TargetTable::TransportRoutes,
            TargetTable::DemandForecast,
            TargetTable::InitialInventory,
            TargetTable::SafetyStockPolicy,
        ];

        let name_matches: Vec<TargetTable> = candidates
            .iter()
            .copied()
            .filter(|t| lower.contains(&t.as_str().replace('_', "")) || lower.contains(t.as_str()))
            .collect();

        let by_columns = |t: &TargetTable| {
            t.required_columns().iter().all(|col| first_row.contains_key(*col))
        };

        if name_matches.len() == 1 && by_columns(&name_matches[0]) {
            return Some(name_matches[0]);
        }

        candidates.iter().copied().find(by_columns)
    }

    /// `ingest(rows, target_table?, source_descriptor)` per §4.1.
    pub async fn ingest(
        &self,
        rows: Vec<RawRow>,
        target_table: Option<TargetTable>,
        source_descriptor: &str,
    ) -> Result<BatchId, IngestError> {
        let Some(first_row) = rows.first() else {
            return Err(IngestError::EmptySource);
        };
        let normalized: Vec<RawRow> = rows.iter().map(Self::normalize_row).collect();
        let first_normalized = &normalized[0];

        let target = match target_table {
            Some(t) => t,
            None => Self::infer_target_table(source_descriptor, first_normalized)
                .ok_or_else(|| IngestError::UnknownTarget {
                    source_descriptor: source_descriptor.to_string(),
                })?,
        };
        let _ = first_row;

        let batch_id = BatchId::new();
        let mut tx = self.pool.begin().await.map_err(clinker_db::DbError::from)?;

        clinker_db::batches::create(
            &mut *tx,
            &batch_id,
            source_descriptor,
            target,
            normalized.len() as i64,
        )
        .await?;

        clinker_db::staging::insert_rows(&mut tx, batch_id.as_str(), target, &normalized).await?;

        tx.commit().await.map_err(clinker_db::DbError::from)?;

        info!(
            batch_id = batch_id.as_str(),
            target_table = target.as_str(),
            rows = normalized.len(),
            "batch ingested"
        );
        clinker_db::audit::log_event(
            &self.pool,
            "batch_ingested",
            Some(batch_id.as_str()),
            None,
            Some(&format!("target_table={} rows={}", target.as_str(), normalized.len())),
        )
        .await;
        Ok(batch_id)
    }

    pub async fn status(&self, batch_id: &str) -> Result<ValidationBatch, IngestError> {
        Ok(clinker_db::batches::get(&self.pool, batch_id).await?)
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<ValidationBatch>, IngestError> {
        Ok(clinker_db::batches::list_recent(&self.pool, limit).await?)
    }
}
