// Data source and export writers - SQLite store, CSV, Excel

pub mod csv;
pub mod store;
pub mod xlsx;

pub use store::{MidStore, StoreError, SCHEMA};
