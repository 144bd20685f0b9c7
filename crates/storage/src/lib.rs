//! CSV warehouse adapter — loads the raw entity tables and persists the
//! denormalized feature table. Bulk storage is a black box to the rest of
//! the system; this is its only concrete implementation.

pub mod csv_store;

pub use csv_store::CsvWarehouse;
