// src/cli/count.rs
use super::{open_collection, Cli, CliResult};
use crate::grid::definitions::Criteria;
use crate::grid::fetch::select_row_model;
use crate::grid::GridError;

pub async fn run(cli: &Cli, criteria: Criteria) -> CliResult<()> {
    let collection = open_collection(cli)?;
    let threshold = super::grid_settings(cli).full_set_threshold;
    let model = select_row_model(collection, &criteria, threshold)
        .await
        .map_err(GridError::LoadFailed)?;
    let matching = model
        .count_matching(&criteria)
        .await
        .map_err(GridError::LoadFailed)?;
    println!("{} matching row(s) ({:?} mode)", matching, model.kind());
    Ok(())
}
