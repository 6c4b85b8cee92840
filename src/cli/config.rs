// src/cli/config.rs
use std::io;

use super::{grid_settings, Cli, CliResult};
use crate::settings::io::save_settings_to_file;

/// Prints the effective grid settings. With `save` they are written, overrides
/// included, to `grid_settings.json`.
pub fn run(cli: &Cli, save: bool) -> CliResult<()> {
    let settings = grid_settings(cli);
    let pretty = serde_json::to_string_pretty(&settings).map_err(io::Error::other)?;
    println!("{}", pretty);
    if save {
        save_settings_to_file(&settings)?;
        println!("Settings saved.");
    }
    Ok(())
}
