pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod service;
pub mod types;

pub use api::{CatalogApi, CatalogSource};
pub use db::CatalogStorage;
pub use error::CatalogError;
pub use types::export::ExportDocument;
