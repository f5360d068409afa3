pub mod input;
pub mod normalizer;

pub use input::{CatalogPayload, EntryInput, ImageVariants, ImportRecord, RawId, TagRef};
pub use normalizer::normalize;
