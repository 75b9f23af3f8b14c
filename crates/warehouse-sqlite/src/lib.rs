//! Embedded SQLite implementation of the metrology warehouse client.
//!
//! Backs local runs that have no warehouse server, and the test suite,
//! with the same SQL the PostgreSQL backend executes.

pub mod warehouse;

pub use warehouse::SqliteWarehouse;
