// src/process/mod.rs

pub mod cas;
pub mod driver;
pub mod summary;

pub use cas::clean_cas;
pub use driver::{enrich, EnrichOptions, Enriched};
pub use summary::RunSummary;
