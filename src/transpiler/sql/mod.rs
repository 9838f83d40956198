pub mod duckdb;
pub mod mysql;
pub mod postgres;
pub mod sqlite;
