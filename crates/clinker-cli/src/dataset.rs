//! Assembles a [`clinker_solver::PlanningDataset`] from the canonical
//! tables. The Model Builder stays pure (§9); this I/O is the caller's
//! job, and the CLI is the only caller that needs the whole dataset at
//! once.

use clinker_solver::PlanningDataset;
use sqlx::{Pool, Sqlite};

pub async fn load(pool: &Pool<Sqlite>) -> Result<PlanningDataset, clinker_db::DbError> {
    let plants = clinker_db::canonical::fetch_plants(pool).await?;
    let capacity_costs = clinker_db::canonical::fetch_capacity_costs(pool).await?;
    let routes = clinker_db::canonical::fetch_active_routes(pool).await?;
    let demand = clinker_db::canonical::fetch_demand(pool).await?;
    let initial_inventory = clinker_db::canonical::fetch_initial_inventory(pool).await?;
    let safety_stock = clinker_db::canonical::fetch_safety_stock(pool).await?;

    Ok(PlanningDataset {
        plants,
        capacity_costs,
        routes,
        demand,
        initial_inventory,
        safety_stock,
        periods: Vec::new(),
    })
}
