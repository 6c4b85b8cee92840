// src/cli/delete.rs
use std::sync::Arc;

use super::{open_collection, open_grid, Cli, CliResult, ConsoleSink};
use crate::grid::cache::EntityLoader;
use crate::grid::definitions::Criteria;
use crate::grid::editing::EditBlockPolicy;
use crate::grid::error::{GridError, GridResult};
use crate::grid::notify::ConfirmationService;
use crate::grid::selection::{BulkDeleter, DeleteOutcome};

pub enum Target {
    Ids(Vec<String>),
    AllMatching { criteria: Criteria, exclude: Vec<String> },
}

pub async fn run(
    cli: &Cli,
    target: Target,
    confirm: Arc<dyn ConfirmationService>,
) -> CliResult<()> {
    let outcome = match target {
        Target::Ids(ids) => delete_ids(cli, &ids, confirm).await?,
        Target::AllMatching { criteria, exclude } => {
            let grid = open_grid(cli, criteria, confirm).await?;
            grid.select_all_matching();
            for id in &exclude {
                grid.deselect(id);
            }
            grid.delete_selected().await
        }
    };
    match outcome {
        Ok(DeleteOutcome::Deleted { ids, blocked }) => {
            println!("{} deleted, {} protected row(s) kept", ids.len(), blocked);
            Ok(())
        }
        Ok(DeleteOutcome::Cancelled) => {
            println!("Cancelled");
            Ok(())
        }
        // Already reported through the console sink.
        Err(GridError::NothingSelected) | Err(GridError::AllRowsProtected) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Explicit ids need not be on any loaded page, so rows are fetched one by one.
async fn delete_ids(
    cli: &Cli,
    ids: &[String],
    confirm: Arc<dyn ConfirmationService>,
) -> CliResult<GridResult<DeleteOutcome>> {
    let collection = open_collection(cli)?;
    let mut rows = Vec::with_capacity(ids.len());
    for id in ids {
        match collection.fetch(id).await {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => eprintln!("warning: no row with id '{}'", id),
            Err(e) => return Ok(Err(GridError::LoadFailed(e))),
        }
    }
    let deleter = BulkDeleter::new(
        collection,
        EditBlockPolicy::default(),
        Arc::new(ConsoleSink),
        confirm,
    );
    Ok(deleter.execute(&rows).await)
}
