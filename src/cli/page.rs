// src/cli/page.rs
use super::{confirmation, open_grid, Cli, CliResult};
use crate::grid::definitions::{value_text, Criteria, Row};
use crate::grid::GridRuntime;

const CELL_WIDTH: usize = 22;

pub async fn run(cli: &Cli, index: usize, criteria: Criteria) -> CliResult<()> {
    let grid = open_grid(cli, criteria, confirmation(true)).await?;
    // Page 0 is already held after initialization; later pages replace it.
    if index > 0 {
        grid.load_page(index, false).await?;
    }
    let snapshot = grid.snapshot();
    if let Some(message) = &snapshot.load_failed {
        println!("{}", message);
        return Ok(());
    }
    print_rows(&grid, &grid.rows());
    let start = index * grid.page_size();
    println!(
        "\nPage {} (rows {}..{}) of {} matching, {:?} mode",
        index,
        start,
        start + grid.row_count(),
        snapshot.total_count,
        grid.model_kind()
    );
    Ok(())
}

pub(crate) fn print_rows(grid: &GridRuntime, rows: &[Row]) {
    let columns = grid.columns();
    print!("{:<10}", "id");
    for column in columns {
        print!(" {:<width$}", truncate(column.header_or_field()), width = CELL_WIDTH);
    }
    println!();
    println!("{}", "-".repeat(10 + columns.len() * (CELL_WIDTH + 1)));
    for row in rows {
        let marker = if row.deletable { "" } else { "*" };
        print!("{:<10}", format!("{}{}", truncate(&row.id), marker));
        for column in columns {
            let text = row.field(&column.field).map(value_text).unwrap_or_default();
            print!(" {:<width$}", truncate(&text), width = CELL_WIDTH);
        }
        println!();
    }
}

fn truncate(s: &str) -> String {
    if s.chars().count() <= CELL_WIDTH {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(CELL_WIDTH - 1).collect();
        out.push('…');
        out
    }
}
