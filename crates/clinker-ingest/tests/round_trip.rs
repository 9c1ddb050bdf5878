use clinker_core::{CellValue, RawRow, TargetTable};
use clinker_ingest::{BatchLifecycleManager, Promoter, Validator};
use sqlx::sqlite::SqlitePoolOptions;

async fn memory_pool() -> sqlx::Pool<sqlx::Sqlite> {
    let pool = SqlitePoolOptions::new().connect(":memory:").await.unwrap();
    clinker_db::schema::init_schema(&pool).await.unwrap();
    pool
}

fn plant_row(id: &str, name: &str, plant_type: &str) -> RawRow {
    let mut row = RawRow::new();
    row.insert("plant_id".to_string(), CellValue::Text(id.to_string()));
    row.insert("name".to_string(), CellValue::Text(name.to_string()));
    row.insert("plant_type".to_string(), CellValue::Text(plant_type.to_string()));
    row
}

#[tokio::test]
async fn ingest_validate_promote_round_trip() {
    let pool = memory_pool().await;
    let lifecycle = BatchLifecycleManager::new(pool.clone());
    let validator = Validator::new(pool.clone(), Default::default());
    let promoter = Promoter::new(pool.clone());

    let rows = vec![
        plant_row("P1", "Clinker Plant One", "clinker"),
        plant_row("P2", "Grinding Unit Two", "grinding"),
    ];

    let batch_id = lifecycle
        .ingest(rows, Some(TargetTable::Plants), "plants.csv")
        .await
        .expect("ingest should succeed");

    let report = validator.validate(batch_id.as_str()).await.expect("validate should succeed");
    assert!(report.is_valid(), "expected no errors, got: {:?}", report.findings);

    let status = lifecycle.status(batch_id.as_str()).await.unwrap();
    assert_eq!(status.valid_rows, 2);
    assert_eq!(status.invalid_rows, 0);

    let promoted = promoter.promote(batch_id.as_str()).await.expect("promote should succeed");
    assert_eq!(promoted, 2);

    let plants = clinker_db::canonical::fetch_plants(&pool).await.unwrap();
    assert_eq!(plants.len(), 2);

    let final_status = lifecycle.status(batch_id.as_str()).await.unwrap();
    assert_eq!(final_status.status, clinker_core::BatchStatus::Promoted);
}

#[tokio::test]
async fn invalid_rows_block_promotion() {
    let pool = memory_pool().await;
    let lifecycle = BatchLifecycleManager::new(pool.clone());
    let validator = Validator::new(pool.clone(), Default::default());
    let promoter = Promoter::new(pool.clone());

    let rows = vec![plant_row("P1", "Clinker Plant One", "not_a_real_type")];
    let batch_id = lifecycle
        .ingest(rows, Some(TargetTable::Plants), "plants.csv")
        .await
        .expect("ingest should succeed");

    let report = validator.validate(batch_id.as_str()).await.unwrap();
    assert!(!report.is_valid());

    let outcome = promoter.promote(batch_id.as_str()).await;
    assert!(matches!(outcome, Err(clinker_ingest::PromoteError::IllegalState { .. })));
}

#[tokio::test]
async fn target_table_inference_from_source_descriptor() {
    let pool = memory_pool().await;
    let lifecycle = BatchLifecycleManager::new(pool.clone());

    let rows = vec![plant_row("P1", "Clinker Plant One", "clinker")];
    let batch_id = lifecycle.ingest(rows, None, "2026_plants_master.csv").await.unwrap();

    let status = lifecycle.status(batch_id.as_str()).await.unwrap();
    assert_eq!(status.target_table, TargetTable::Plants);
}
