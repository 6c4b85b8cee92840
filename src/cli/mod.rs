// src/cli/mod.rs
// Command-line front end: seed a SQLite collection and drive a grid over it.

pub mod browse;
pub mod config;
pub mod count;
pub mod delete;
pub mod edit;
pub mod export;
pub mod page;
pub mod seed;

use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::collection::seed::contact_columns;
use crate::collection::sqlite::{DbConfig, DbError, DEFAULT_TABLE};
use crate::collection::SqliteCollection;
use crate::grid::definitions::{ColumnFilter, Criteria, FilterOperator, SortSpec};
use crate::grid::notify::{AutoConfirm, ConfirmationService, Notice, NoticeLevel, NotificationSink};
use crate::grid::{GridError, GridRuntime};
use crate::settings::io::load_settings_from_file;
use crate::settings::GridSettings;

#[derive(Parser)]
#[command(name = "gridwind")]
#[command(
    about = "Gridwind - windowed data grid over a SQLite contact collection",
    long_about = None
)]
pub struct Cli {
    /// Database file (defaults to Documents/Gridwind/grid.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Table holding the collection
    #[arg(long, global = true, default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Overrides page_size from grid_settings.json
    #[arg(long, global = true)]
    pub page_size: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Insert generated demo contacts
    Seed {
        /// Number of contacts to generate
        #[arg(long, default_value_t = 1_000)]
        count: usize,
        /// How many of them are protected system rows
        #[arg(long, default_value_t = 3)]
        system_rows: usize,
        /// Fixed RNG seed for reproducible data
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Count rows matching the criteria
    Count {
        #[command(flatten)]
        criteria: CriteriaArgs,
    },

    /// Print one page of rows
    Page {
        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        index: usize,
        #[command(flatten)]
        criteria: CriteriaArgs,
    },

    /// Commit a single cell
    Edit {
        row_id: String,
        field: String,
        /// JSON literal or plain text
        value: String,
    },

    /// Delete rows by id, or every row matching the criteria
    Delete {
        ids: Vec<String>,
        #[arg(long, conflicts_with = "ids")]
        all_matching: bool,
        /// Ids to keep when using --all-matching
        #[arg(long)]
        exclude: Vec<String>,
        #[command(flatten)]
        criteria: CriteriaArgs,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Write every matching row to a JSON file
    Export {
        out: PathBuf,
        #[command(flatten)]
        criteria: CriteriaArgs,
        #[arg(long, short)]
        yes: bool,
    },

    /// Show the effective grid settings
    Config {
        /// Write them (including --page-size) to grid_settings.json
        #[arg(long)]
        save: bool,
    },

    /// Scroll through the collection in a headless Bevy app
    Browse {
        /// Pixels scrolled per frame
        #[arg(long, default_value_t = 240.0)]
        step: f32,
        /// Stop after this many frames
        #[arg(long, default_value_t = 600)]
        max_frames: u32,
        #[arg(long, default_value_t = 600.0)]
        viewport: f32,
        #[command(flatten)]
        criteria: CriteriaArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct CriteriaArgs {
    /// Free-text search across all fields
    #[arg(long)]
    pub search: Option<String>,
    /// Restrict to rows carrying at least one of these tags
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Column filter: `field=value`, `field!=value`, `field~text`, `field>n`, `field<n`
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, ColumnFilter)>,
    /// Sort column; prefix with `-` for descending
    #[arg(long = "sort", allow_hyphen_values = true)]
    pub sort: Vec<String>,
}

impl CriteriaArgs {
    pub fn to_criteria(&self) -> Criteria {
        let mut criteria = Criteria::default().with_tags(self.tags.iter().cloned());
        if let Some(search) = &self.search {
            criteria = criteria.with_search(search.clone());
        }
        for (field, filter) in &self.filters {
            criteria = criteria.with_filter(field.clone(), filter.clone());
        }
        for column in &self.sort {
            criteria = criteria.with_sort(match column.strip_prefix('-') {
                Some(column) => SortSpec::desc(column),
                None => SortSpec::asc(column.as_str()),
            });
        }
        criteria
    }
}

pub fn parse_filter(s: &str) -> Result<(String, ColumnFilter), String> {
    // Two-character operators first so `!=` isn't read as `=`.
    const OPERATORS: &[(&str, FilterOperator)] = &[
        ("!=", FilterOperator::NotEqual),
        ("!~", FilterOperator::NotContains),
        ("=", FilterOperator::Equals),
        ("~", FilterOperator::Contains),
        (">", FilterOperator::GreaterThan),
        ("<", FilterOperator::LessThan),
    ];
    let (field, operator, value) = OPERATORS
        .iter()
        .filter_map(|(token, op)| s.find(token).map(|pos| (pos, *token, *op)))
        .min_by_key(|(pos, token, _)| (*pos, std::cmp::Reverse(token.len())))
        .map(|(pos, token, op)| (&s[..pos], op, &s[pos + token.len()..]))
        .ok_or_else(|| format!("'{}' has no operator (=, !=, ~, !~, >, <)", s))?;

    let field = field.trim();
    if field.is_empty() {
        return Err(format!("'{}' has no field name", s));
    }
    let value = value.trim();
    let filter = match (operator, value.is_empty()) {
        (FilterOperator::Equals, true) => ColumnFilter::new(FilterOperator::Blank, Value::Null),
        (FilterOperator::NotEqual, true) => {
            ColumnFilter::new(FilterOperator::NotBlank, Value::Null)
        }
        _ => ColumnFilter::new(operator, parse_value(value)),
    };
    Ok((field.to_string(), filter))
}

/// JSON literal when it parses as one (`42`, `true`, `null`), plain text otherwise.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("database error: {0}")]
    Db(#[from] DbError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type CliResult<T> = Result<T, CliError>;

/// Prints notices to the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => eprintln!("error: {}", notice.message),
            NoticeLevel::Warning => eprintln!("warning: {}", notice.message),
            NoticeLevel::Info | NoticeLevel::Success => println!("{}", notice.message),
        }
    }
}

/// Asks on stdin; anything but `y`/`yes` declines.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

#[async_trait]
impl ConfirmationService for StdinConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = prompt.to_string();
        let answer = tokio::task::spawn_blocking(move || -> io::Result<String> {
            print!("{} [y/N] ", prompt);
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await;
        matches!(
            answer,
            Ok(Ok(line)) if matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
        )
    }
}

pub fn confirmation(yes: bool) -> Arc<dyn ConfirmationService> {
    if yes {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(StdinConfirm)
    }
}

pub fn database_path(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.db {
        Some(path) => Ok(path.clone()),
        None => {
            let config = DbConfig::new();
            config.ensure_directories()?;
            Ok(config.database_file())
        }
    }
}

pub fn open_collection(cli: &Cli) -> CliResult<Arc<SqliteCollection>> {
    let path = database_path(cli)?;
    Ok(Arc::new(SqliteCollection::open(&path, &cli.table)?))
}

/// `grid_settings.json` with the command-line overrides applied.
pub fn grid_settings(cli: &Cli) -> GridSettings {
    let mut settings = load_settings_from_file::<GridSettings>().unwrap_or_else(|e| {
        eprintln!("warning: could not read grid settings ({}); using defaults", e);
        GridSettings::default()
    });
    if let Some(page_size) = cli.page_size {
        settings.page_size = page_size;
    }
    settings
}

/// A grid over the CLI's collection, initialized with the first page loaded.
pub async fn open_grid(
    cli: &Cli,
    criteria: Criteria,
    confirm: Arc<dyn ConfirmationService>,
) -> CliResult<GridRuntime> {
    let collection = open_collection(cli)?;
    let grid = GridRuntime::builder(collection)
        .settings(grid_settings(cli))
        .criteria(criteria)
        .columns(contact_columns())
        .notifications(Arc::new(ConsoleSink))
        .confirmation(confirm)
        .initialize()
        .await?;
    Ok(grid)
}

/// Runs the selected subcommand. Everything except `browse` runs on a plain
/// tokio runtime.
pub fn run(cli: Cli) -> CliResult<()> {
    if let Commands::Browse {
        step,
        max_frames,
        viewport,
        criteria,
    } = &cli.command
    {
        let collection = open_collection(&cli)?;
        browse::run(
            collection,
            grid_settings(&cli),
            criteria.to_criteria(),
            browse::BrowseOptions {
                step: *step,
                max_frames: *max_frames,
                viewport: *viewport,
            },
        );
        return Ok(());
    }
    if let Commands::Config { save } = &cli.command {
        return config::run(&cli, *save);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        match &cli.command {
            Commands::Seed {
                count,
                system_rows,
                seed,
            } => seed::run(&cli, *count, *system_rows, *seed),
            Commands::Count { criteria } => count::run(&cli, criteria.to_criteria()).await,
            Commands::Page { index, criteria } => {
                page::run(&cli, *index, criteria.to_criteria()).await
            }
            Commands::Edit {
                row_id,
                field,
                value,
            } => edit::run(&cli, row_id, field, parse_value(value)).await,
            Commands::Delete {
                ids,
                all_matching,
                exclude,
                criteria,
                yes,
            } => {
                let target = if *all_matching {
                    delete::Target::AllMatching {
                        criteria: criteria.to_criteria(),
                        exclude: exclude.clone(),
                    }
                } else {
                    delete::Target::Ids(ids.clone())
                };
                delete::run(&cli, target, confirmation(*yes)).await
            }
            Commands::Export { out, criteria, yes } => {
                export::run(&cli, out, criteria.to_criteria(), confirmation(*yes)).await
            }
            Commands::Browse { .. } | Commands::Config { .. } => Ok(()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filters_parse_operators_and_blank_checks() {
        let (field, filter) = parse_filter("score>10").unwrap();
        assert_eq!(field, "score");
        assert_eq!(filter, ColumnFilter::new(FilterOperator::GreaterThan, json!(10)));

        let (_, filter) = parse_filter("city!=Lyon").unwrap();
        assert_eq!(filter, ColumnFilter::new(FilterOperator::NotEqual, "Lyon"));

        let (_, filter) = parse_filter("email=").unwrap();
        assert_eq!(filter.operator, FilterOperator::Blank);

        assert!(parse_filter("nooperator").is_err());
        assert!(parse_filter("=x").is_err());
    }

    #[test]
    fn criteria_args_map_sort_prefix() {
        let args = CriteriaArgs {
            search: Some("ana".into()),
            tags: vec!["donor".into()],
            filters: vec![],
            sort: vec!["-score".into(), "name".into()],
        };
        let criteria = args.to_criteria();
        assert_eq!(criteria.search, "ana");
        assert_eq!(criteria.tags, vec!["donor".to_string()]);
        assert_eq!(criteria.sort, vec![SortSpec::desc("score"), SortSpec::asc("name")]);
    }

    #[test]
    fn values_parse_as_json_or_text() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("Lyon"), json!("Lyon"));
    }
}
