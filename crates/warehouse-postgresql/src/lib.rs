//! PostgreSQL implementation of the metrology warehouse client.
//!
//! # Example
//!
//! ```ignore
//! use warehouse_postgresql::PostgreSQLWarehouse;
//!
//! let warehouse = PostgreSQLWarehouse::connect(
//!     "host=localhost user=postgres password=postgres dbname=fab_data_analytics",
//! )
//! .await?;
//! warehouse.use_schema("metrology").await?;
//! ```

mod convert;
pub mod warehouse;

pub use warehouse::PostgreSQLWarehouse;
