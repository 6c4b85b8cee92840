// src/cli/seed.rs
use super::{open_collection, Cli, CliResult};
use crate::collection::seed::generate_contacts;

pub fn run(cli: &Cli, count: usize, system_rows: usize, seed: Option<u64>) -> CliResult<()> {
    let collection = open_collection(cli)?;
    let rows = generate_contacts(count, system_rows.min(count), seed);
    let written = collection.upsert_rows(&rows)?;
    println!(
        "Seeded {} contact(s) into '{}' ({} protected)",
        written,
        collection.table(),
        system_rows.min(count)
    );
    Ok(())
}
