// src/grid/cache/mod.rs

pub mod entity_cache;

pub use entity_cache::{CacheErrorReporter, EntityCache, EntityLoader, FnLoader};
