//! Mappings de identidad old id -> new id

pub mod store;

pub use store::{EntityType, MappingStore};
