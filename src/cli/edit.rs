// src/cli/edit.rs
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use super::{open_collection, Cli, CliResult, ConsoleSink};
use crate::collection::seed::contact_columns;
use crate::grid::cache::EntityCache;
use crate::grid::definitions::{resolve_column, value_text, Row};
use crate::grid::editing::{CommitOutcome, EditBlockPolicy, EditingController};
use crate::grid::service::PageResult;
use crate::grid::store::RowStore;

/// Commits one cell of one row, fetched by id through the detail cache.
pub async fn run(cli: &Cli, row_id: &str, field: &str, value: Value) -> CliResult<()> {
    let collection = open_collection(cli)?;
    let details: Arc<EntityCache<Option<Row>>> =
        Arc::new(EntityCache::new("row_detail", collection.clone()));

    let Some(row) = details.load(row_id).await? else {
        eprintln!("error: no row with id '{}'", row_id);
        return Ok(());
    };
    let store = Mutex::new(RowStore::new());
    store.lock().apply_page(PageResult::new(vec![row], 1), false);

    let mut editor =
        EditingController::new(collection, EditBlockPolicy::default(), Arc::new(ConsoleSink));
    editor.add_refresh_hook(details.clone());

    let column = resolve_column(&contact_columns(), field);
    match editor.commit_single_cell(&store, row_id, &column, value).await? {
        CommitOutcome::Committed { previous, value } => {
            println!(
                "{}.{}: '{}' -> '{}'",
                row_id,
                field,
                value_text(&previous),
                value_text(&value)
            );
            if let Some(Some(row)) = details.get(row_id) {
                println!("{}", serde_json::to_string_pretty(&row).unwrap_or_default());
            }
        }
        CommitOutcome::Unchanged => println!("{}.{} unchanged", row_id, field),
        CommitOutcome::NoRow => eprintln!("error: row '{}' is not loaded", row_id),
    }
    Ok(())
}
