//! Shared services used by client frontends.

mod catalog;

pub use catalog::{Catalog, CatalogStatus};
