pub mod catalog_api;

pub use catalog_api::{CatalogApi, CatalogSource};
