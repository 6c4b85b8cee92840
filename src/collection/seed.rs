// src/collection/seed.rs
//! Demo contact rows for the CLI and manual testing.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use crate::grid::definitions::{ColumnDataType, ColumnDefinition, Row};

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Carla", "Dmitri", "Élodie", "Farah", "Gustavo", "Hana", "Ivo", "Júlia",
    "Kwame", "Lena", "Mateo", "Nadia", "Oskar", "Priya",
];
const LAST_NAMES: &[&str] = &[
    "Silva", "Novak", "Okafor", "Müller", "Tanaka", "Rossi", "García", "Nguyen", "Cohen",
    "Larsen",
];
const CITIES: &[&str] = &["Lisbon", "Lyon", "Accra", "Kraków", "Osaka", "Quito", "Tallinn"];
const TAGS: &[&str] = &["donor", "volunteer", "board", "newsletter", "event"];

/// Columns matching the rows produced by `generate_contacts`.
pub fn contact_columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::text("name").with_header("Name"),
        ColumnDefinition::text("email").with_header("Email"),
        ColumnDefinition::text("city").with_header("City"),
        ColumnDefinition::new("donations", ColumnDataType::I64).with_header("Donations"),
        ColumnDefinition::new("lifetime_value", ColumnDataType::F64).with_header("Lifetime value"),
        ColumnDefinition::new("subscribed", ColumnDataType::Bool).with_header("Subscribed"),
        ColumnDefinition::new("last_contacted", ColumnDataType::Date).with_header("Last contacted"),
    ]
}

/// Generates `count` contacts. The first `system_rows` are protected system rows.
/// A fixed `seed` gives reproducible data.
pub fn generate_contacts(count: usize, system_rows: usize, seed: Option<u64>) -> Vec<Row> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    (0..count)
        .map(|i| {
            let first = FIRST_NAMES[rng.random_range(0..FIRST_NAMES.len())];
            let last = LAST_NAMES[rng.random_range(0..LAST_NAMES.len())];
            let tag_count = rng.random_range(0..=2);
            let tags: Vec<&str> = (0..tag_count)
                .map(|_| TAGS[rng.random_range(0..TAGS.len())])
                .collect();
            let id = match seed {
                Some(_) => format!("c{:06}", i),
                None => uuid::Uuid::new_v4().to_string(),
            };
            let row = Row::new(id)
                .with_field("name", format!("{} {}", first, last))
                .with_field(
                    "email",
                    format!("{}.{}{}@example.org", first, last, i).to_lowercase(),
                )
                .with_field("city", CITIES[rng.random_range(0..CITIES.len())])
                .with_field("donations", rng.random_range(0..40))
                .with_field(
                    "lifetime_value",
                    json!((rng.random_range(0.0..5_000.0_f64) * 100.0).round() / 100.0),
                )
                .with_field("subscribed", rng.random_bool(0.6))
                .with_field(
                    "last_contacted",
                    format!(
                        "2024-{:02}-{:02}",
                        rng.random_range(1..=12),
                        rng.random_range(1..=28)
                    ),
                )
                .with_tags(tags);
            if i < system_rows {
                row.protected()
            } else {
                row
            }
        })
        .collect()
}
