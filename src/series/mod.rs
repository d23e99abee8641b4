//! Series data model
//!
//! The values accepted by `insert` commands and handed to the store client:
//!
//! - **Value**: integer, float or text, decided by best-effort parsing
//! - **Point**: one row of values
//! - **Series**: a name, its columns and one or more points

mod types;

pub use types::{Point, Series, Value, DEFAULT_COLUMNS};
