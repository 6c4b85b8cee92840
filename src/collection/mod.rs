// src/collection/mod.rs
//! Backing collection services.

pub mod memory;
pub mod seed;
pub mod sqlite;

pub use memory::MemoryCollection;
pub use sqlite::SqliteCollection;
