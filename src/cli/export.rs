// src/cli/export.rs
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use super::{open_grid, Cli, CliResult};
use crate::grid::definitions::Criteria;
use crate::grid::notify::ConfirmationService;

pub async fn run(
    cli: &Cli,
    out: &Path,
    criteria: Criteria,
    confirm: Arc<dyn ConfirmationService>,
) -> CliResult<()> {
    let grid = open_grid(cli, criteria, confirm).await?;
    let file = File::create(out)?;
    match grid.export_json(BufWriter::new(file)).await? {
        Some(count) => println!("Wrote {} row(s) to {}", count, out.display()),
        None => {
            std::fs::remove_file(out)?;
            println!("Cancelled");
        }
    }
    Ok(())
}
