//! Database module: the normalized make/model store.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: the store itself

pub mod models;
pub mod schema;
pub mod sqlite;

pub use sqlite::CatalogStorage;
