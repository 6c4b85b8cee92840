// src/collection/sqlite/test_helpers.rs
// Test utilities for the SQLite collection

#![cfg(test)]

use serde_json::json;

use super::{SqliteCollection, DEFAULT_TABLE};
use crate::grid::definitions::Row;

/// Five contacts: three in Lyon, two tagged "donor", one protected system row.
pub fn sample_rows() -> Vec<Row> {
    vec![
        Row::new("r1")
            .with_field("name", "Ana")
            .with_field("city", "Lyon")
            .with_field("score", 20)
            .with_tags(["donor"]),
        Row::new("r2").with_field("name", "Bruno").with_field("city", "Lyon"),
        Row::new("r3")
            .with_field("name", "Carla")
            .with_field("city", "lyon")
            .with_field("score", 35),
        Row::new("r4")
            .with_field("name", "Zoë")
            .with_field("city", "Accra")
            .with_field("score", json!(4.5))
            .with_tags(["donor", "board"]),
        Row::new("r5")
            .with_field("name", "System")
            .with_field("city", "Osaka")
            .protected(),
    ]
}

/// In-memory collection pre-filled with `sample_rows`.
pub fn seeded_collection() -> SqliteCollection {
    let collection = SqliteCollection::open_in_memory(DEFAULT_TABLE).unwrap();
    collection.upsert_rows(&sample_rows()).unwrap();
    collection
}
