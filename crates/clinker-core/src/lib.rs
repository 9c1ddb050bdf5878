//! Domain types shared across the clinker supply-chain planning workspace.
//!
//! This crate is intentionally inert: no I/O, no async, no database access.
//! Every other crate in the workspace depends on it for the canonical
//! entity shapes and the row/cell vocabulary used by ingestion.

pub mod cell;
pub mod domain;
pub mod ids;
pub mod scenario;
pub mod validation;

pub use cell::{CellValue, RawRow};
pub use domain::*;
pub use ids::*;
pub use scenario::*;
pub use validation::*;
