// src/integrations/mod.rs
//
// External services the engine talks to

pub mod catalog;
pub mod jikan;

pub use catalog::CatalogSource;
pub use jikan::JikanClient;

#[cfg(test)]
pub use catalog::MockCatalogSource;
