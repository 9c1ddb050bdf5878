//! The five-stage Validator (§4.2). Stages run in order over every row
//! of a batch; a later stage still runs even if an earlier one found
//! errors, and findings from all five accumulate before row status is
//! decided.

use std::collections::BTreeMap;

use clinker_core::{
    CellValue, RawRow, Severity, Stage, TargetTable, ValidationFinding, ValidationReport,
};
use clinker_config::ValidationThresholds;
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::error::IngestError;

pub struct Validator {
    pool: Pool<Sqlite>,
    thresholds: ValidationThresholds,
}

impl Validator {
    pub fn new(pool: Pool<Sqlite>, thresholds: ValidationThresholds) -> Self {
        Self { pool, thresholds }
    }

    pub async fn validate(&self, batch_id: &str) -> Result<ValidationReport, IngestError> {
        let batch = clinker_db::batches::get(&self.pool, batch_id).await?;
        let rows = clinker_db::staging::fetch_batch_rows(&self.pool, batch_id, batch.target_table)
            .await?;

        let capacity_periods = clinker_db::canonical::capacity_cost_periods(&self.pool).await?;
        let capacity_table_empty =
            clinker_db::canonical::table_is_empty(&self.pool, "production_capacity_cost").await?;
        let holding_cost_variance = self.holding_cost_variance_findings(batch.target_table, &rows);

        let mut report = ValidationReport::default();
        let mut valid_rows = 0i64;
        let mut invalid_rows = 0i64;

        for (row_number, row) in &rows {
            let mut findings = Vec::new();
            findings.extend(self.schema_stage(*row_number, batch.target_table, row));
            findings.extend(self.business_rules_stage(*row_number, batch.target_table, row));
            if let Some(finding) = holding_cost_variance.get(row_number) {
                findings.push(finding.clone());
            }
            findings.extend(
                self.referential_integrity_stage(*row_number, batch.target_table, row).await?,
            );
            findings.extend(self.unit_consistency_stage(*row_number, batch.target_table, row));
            findings.extend(self.missing_data_scan_stage(
                *row_number,
                batch.target_table,
                row,
                &capacity_periods,
                capacity_table_empty,
            ));

            let is_row_valid = !findings.iter().any(ValidationFinding::is_error);
            if is_row_valid {
                valid_rows += 1;
            } else {
                invalid_rows += 1;
            }

            let errors_json = if findings.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&findings).unwrap_or_default())
            };
            let status = if is_row_valid {
                clinker_core::StagingRowStatus::Valid
            } else {
                clinker_core::StagingRowStatus::Invalid
            };
            clinker_db::staging::update_row_status(
                &self.pool,
                batch_id,
                batch.target_table,
                *row_number,
                status,
                errors_json.as_deref(),
            )
            .await?;

            report.findings.extend(findings);
        }

        let error_summary = if report.is_valid() {
            None
        } else {
            Some(format!(
                "{} error(s), {} warning(s) across {} row(s)",
                report.error_count(),
                report.warning_count(),
                rows.len()
            ))
        };
        clinker_db::batches::record_validation_outcome(
            &self.pool,
            batch_id,
            valid_rows,
            invalid_rows,
            error_summary.as_deref(),
        )
        .await?;

        info!(
            batch_id,
            valid_rows,
            invalid_rows,
            errors = report.error_count(),
            warnings = report.warning_count(),
            "batch validated"
        );
        clinker_db::audit::log_event(
            &self.pool,
            "batch_validated",
            Some(batch_id),
            None,
            Some(&format!(
                "valid_rows={valid_rows} invalid_rows={invalid_rows} errors={} warnings={}",
                report.error_count(),
                report.warning_count()
            )),
        )
        .await;
        Ok(report)
    }

    fn schema_stage(
        &self,
        row_number: i64,
        target: TargetTable,
        row: &RawRow,
    ) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();
        for col in target.required_columns() {
            match row.get(*col) {
                None | Some(CellValue::Null) => {
                    findings.push(ValidationFinding::error(
                        row_number,
                        Stage::Schema,
                        col.to_string(),
                        "MISSING_REQUIRED_VALUE",
                        format!("required column '{col}' is missing or empty"),
                        None,
                    ));
                }
                Some(CellValue::Text(s)) if s.trim().is_empty() => {
                    findings.push(ValidationFinding::error(
                        row_number,
                        Stage::Schema,
                        col.to_string(),
                        "MISSING_REQUIRED_VALUE",
                        format!("required column '{col}' is empty"),
                        Some(s.clone()),
                    ));
                }
                _ => {}
            }
        }

        if target == TargetTable::Plants {
            if let Some(value) = row.get("plant_type") {
                if let Some(s) = value.as_str() {
                    if s.parse::<clinker_core::PlantType>().is_err() {
                        findings.push(ValidationFinding::error(
                            row_number,
                            Stage::Schema,
                            "plant_type",
                            "INVALID_ENUM_VALUE",
                            format!("'{s}' is not one of clinker, grinding, terminal, customer"),
                            Some(s.to_string()),
                        ));
                    }
                }
            }
        }
        if target == TargetTable::TransportRoutes {
            if let Some(value) = row.get("transport_mode") {
                if let Some(s) = value.as_str() {
                    if s.parse::<clinker_core::TransportMode>().is_err() {
                        findings.push(ValidationFinding::error(
                            row_number,
                            Stage::Schema,
                            "transport_mode",
                            "INVALID_ENUM_VALUE",
                            format!("'{s}' is not one of road, rail, sea, barge"),
                            Some(s.to_string()),
                        ));
                    }
                }
            }
        }
        findings
    }

    fn business_rules_stage(
        &self,
        row_number: i64,
        target: TargetTable,
        row: &RawRow,
    ) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();
        let f64_of = |col: &str| row.get(col).and_then(CellValue::as_f64);

        match target {
            TargetTable::DemandForecast => {
                if let Some(demand) = f64_of("demand_tonnes") {
                    if demand < 0.0 {
                        findings.push(ValidationFinding::error(
                            row_number,
                            Stage::BusinessRules,
                            "demand_tonnes",
                            "NEGATIVE_VALUE",
                            "demand tonnage must be >= 0",
                            Some(demand.to_string()),
                        ));
                    }
                }
            }
            TargetTable::ProductionCapacityCost => {
                if let Some(cap) = f64_of("max_capacity_tonnes") {
                    if cap <= 0.0 {
                        findings.push(ValidationFinding::error(
                            row_number,
                            Stage::BusinessRules,
                            "max_capacity_tonnes",
                            "NON_POSITIVE_CAPACITY",
                            "production capacity must be > 0",
                            Some(cap.to_string()),
                        ));
                    }
                }
                for col in ["variable_cost_per_tonne", "fixed_cost_per_period", "holding_cost_per_tonne"]
                {
                    if let Some(v) = f64_of(col) {
                        if v < 0.0 {
                            findings.push(ValidationFinding::error(
                                row_number,
                                Stage::BusinessRules,
                                col,
                                "NEGATIVE_COST",
                                format!("{col} must be >= 0"),
                                Some(v.to_string()),
                            ));
                        }
                    }
                }
                if let Some(cost) = f64_of("variable_cost_per_tonne") {
                    if cost >= 0.0 && cost < self.thresholds.min_production_cost_per_tonne {
                        findings.push(ValidationFinding::warning(
                            row_number,
                            Stage::BusinessRules,
                            "variable_cost_per_tonne",
                            "SUSPICIOUSLY_LOW_COST",
                            format!(
                                "production cost {cost} is below the floor of {}",
                                self.thresholds.min_production_cost_per_tonne
                            ),
                            Some(cost.to_string()),
                        ));
                    }
                }
            }
            TargetTable::TransportRoutes => {
                let origin = row.get("origin_plant_id").and_then(CellValue::as_str);
                let destination = row.get("destination_node_id").and_then(CellValue::as_str);
                if let (Some(o), Some(d)) = (origin, destination) {
                    if o == d {
                        findings.push(ValidationFinding::error(
                            row_number,
                            Stage::BusinessRules,
                            "destination_node_id",
                            "ORIGIN_EQUALS_DESTINATION",
                            "route origin must differ from destination",
                            Some(d.to_string()),
                        ));
                    }
                }
                let vehicle_capacity = f64_of("vehicle_capacity_tonnes");
                let sbq = f64_of("minimum_batch_quantity_tonnes");
                let is_active = row
                    .get("is_active")
                    .map(|v| !matches!(v, CellValue::Bool(false) | CellValue::Integer(0)))
                    .unwrap_or(true);
                if is_active {
                    if let Some(cap) = vehicle_capacity {
                        if cap <= 0.0 {
                            findings.push(ValidationFinding::error(
                                row_number,
                                Stage::BusinessRules,
                                "vehicle_capacity_tonnes",
                                "NON_POSITIVE_VEHICLE_CAPACITY",
                                "vehicle capacity must be > 0 for active routes",
                                Some(cap.to_string()),
                            ));
                        }
                    }
                }
                if let (Some(sbq), Some(cap)) = (sbq, vehicle_capacity) {
                    if sbq > cap {
                        findings.push(ValidationFinding::error(
                            row_number,
                            Stage::BusinessRules,
                            "minimum_batch_quantity_tonnes",
                            "SBQ_EXCEEDS_VEHICLE_CAPACITY",
                            "minimum batch quantity must be <= vehicle capacity",
                            Some(sbq.to_string()),
                        ));
                    }
                }
                for col in ["cost_per_tonne", "cost_per_tonne_km", "fixed_cost_per_trip"] {
                    if let Some(v) = f64_of(col) {
                        if v < 0.0 {
                            findings.push(ValidationFinding::error(
                                row_number,
                                Stage::BusinessRules,
                                col,
                                "NEGATIVE_COST",
                                format!("{col} must be >= 0"),
                                Some(v.to_string()),
                            ));
                        }
                    }
                }
            }
            TargetTable::SafetyStockPolicy => {
                if let (Some(ss), Some(max_inv)) =
                    (f64_of("safety_stock_tonnes"), f64_of("max_inventory_tonnes"))
                {
                    if ss > max_inv {
                        findings.push(ValidationFinding::error(
                            row_number,
                            Stage::BusinessRules,
                            "safety_stock_tonnes",
                            "SAFETY_STOCK_EXCEEDS_MAX",
                            "safety stock must be <= maximum inventory when both are present",
                            Some(ss.to_string()),
                        ));
                    }
                }
            }
            TargetTable::Plants | TargetTable::InitialInventory => {}
        }
        findings
    }

    async fn referential_integrity_stage(
        &self,
        row_number: i64,
        target: TargetTable,
        row: &RawRow,
    ) -> Result<Vec<ValidationFinding>, IngestError> {
        let mut findings = Vec::new();
        let references: &[(&str, &str)] = match target {
            TargetTable::ProductionCapacityCost => &[("plant_id", "plants")],
            TargetTable::TransportRoutes => {
                &[("origin_plant_id", "plants"), ("destination_node_id", "plants")]
            }
            TargetTable::InitialInventory => &[("node_id", "plants")],
            TargetTable::SafetyStockPolicy => &[("node_id", "plants")],
            TargetTable::DemandForecast | TargetTable::Plants => &[],
        };

        for (column, canonical_table) in references {
            // Bootstrapping escape hatch: skip the check when the
            // referenced canonical table has no rows yet.
            if clinker_db::canonical::table_is_empty(&self.pool, canonical_table).await? {
                continue;
            }
            let Some(value) = row.get(*column).and_then(CellValue::as_str) else { continue };
            if !clinker_db::canonical::plant_exists(&self.pool, value).await? {
                findings.push(ValidationFinding::error(
                    row_number,
                    Stage::ReferentialIntegrity,
                    column.to_string(),
                    "DANGLING_REFERENCE",
                    format!("'{value}' does not resolve to an existing canonical row"),
                    Some(value.to_string()),
                ));
            }
        }
        Ok(findings)
    }

    fn unit_consistency_stage(
        &self,
        row_number: i64,
        target: TargetTable,
        row: &RawRow,
    ) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();
        if target == TargetTable::TransportRoutes {
            let has_per_tonne = row.get("cost_per_tonne").map(|v| !v.is_null()).unwrap_or(false);
            let has_per_km = row.get("cost_per_tonne_km").map(|v| !v.is_null()).unwrap_or(false);
            let has_distance = row.get("distance_km").map(|v| !v.is_null()).unwrap_or(false);
            if has_per_km && !has_per_tonne && !has_distance {
                findings.push(ValidationFinding::warning(
                    row_number,
                    Stage::UnitConsistency,
                    "cost_per_tonne_km",
                    "CANNOT_EXPAND_PER_TONNE_KM",
                    "per-tonne-km cost present but distance_km is absent; cannot expand to per-tonne",
                    None,
                ));
            }
        }
        findings
    }

    /// Flags (not rejects) `ProductionCapacityCost` rows whose plant's
    /// holding cost differs from that plant's first-period value, since the
    /// Model Builder only indexes holding cost per-plant (first period).
    fn holding_cost_variance_findings(
        &self,
        target: TargetTable,
        rows: &[(i64, RawRow)],
    ) -> BTreeMap<i64, ValidationFinding> {
        let mut findings = BTreeMap::new();
        if target != TargetTable::ProductionCapacityCost {
            return findings;
        }

        let mut first_period_cost: BTreeMap<String, f64> = BTreeMap::new();
        for (row_number, row) in rows {
            let Some(plant_id) = row.get("plant_id").and_then(CellValue::as_str) else { continue };
            let Some(holding_cost) = row.get("holding_cost_per_tonne").and_then(CellValue::as_f64) else {
                continue;
            };
            match first_period_cost.get(plant_id) {
                None => {
                    first_period_cost.insert(plant_id.to_string(), holding_cost);
                }
                Some(&first_cost) if (holding_cost - first_cost).abs() > 1e-9 => {
                    findings.insert(
                        *row_number,
                        ValidationFinding::warning(
                            *row_number,
                            Stage::BusinessRules,
                            "holding_cost_per_tonne",
                            "HOLDING_COST_VARIES_ACROSS_PERIODS",
                            format!(
                                "plant '{plant_id}' holding cost {holding_cost} differs from its first-period value {first_cost}; the Model Builder only uses the first-period value"
                            ),
                            Some(holding_cost.to_string()),
                        ),
                    );
                }
                Some(_) => {}
            }
        }
        findings
    }

    fn missing_data_scan_stage(
        &self,
        row_number: i64,
        target: TargetTable,
        row: &RawRow,
        capacity_periods: &std::collections::HashSet<String>,
        capacity_table_empty: bool,
    ) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();
        if target == TargetTable::TransportRoutes {
            let has_per_tonne = row.get("cost_per_tonne").map(|v| !v.is_null()).unwrap_or(false);
            let has_per_km = row.get("cost_per_tonne_km").map(|v| !v.is_null()).unwrap_or(false);
            if !has_per_tonne && !has_per_km {
                findings.push(ValidationFinding::error(
                    row_number,
                    Stage::MissingDataScan,
                    "cost_per_tonne",
                    "NO_TRANSPORT_COST_BASIS",
                    "route has neither a per-tonne nor a per-tonne-km cost; planning would be blind to its cost",
                    None,
                ));
            }
        }
        if target == TargetTable::DemandForecast && !capacity_table_empty {
            if let Some(period) = row.get("period").and_then(CellValue::as_str) {
                if !capacity_periods.contains(period) {
                    findings.push(ValidationFinding::error(
                        row_number,
                        Stage::MissingDataScan,
                        "period",
                        "DEMAND_PERIOD_NOT_IN_CAPACITY_PERIODS",
                        format!(
                            "demand period '{period}' has no matching production capacity/cost period; planning would have no capacity data for it"
                        ),
                        Some(period.to_string()),
                    ));
                }
            }
        }
        findings
    }
}
