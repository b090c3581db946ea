pub mod types;
pub mod columns;
pub mod lof;
pub mod convertible;
pub mod repo;
pub mod calendar;

pub use types::*;
pub use columns::{NormalizeError, ColumnRule, ColumnMap, resolve_columns, cell_decimal, cell_string};
pub use lof::{normalize_funds, premium_rate};
pub use convertible::normalize_bonds;
pub use repo::normalize_repo;
pub use calendar::{ipo_for_date, parse_notices};
