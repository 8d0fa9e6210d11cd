use clap::Parser;
use std::path::PathBuf;

use crate::store::View;
use crate::table::ServiceKind;

#[derive(Parser, Debug)]
#[command(
    name = "infradash",
    about = "Explore domain infrastructure data from the dashboard API in the terminal",
    version,
    long_about = None
)]
pub struct Args {
    /// Base URL of the dashboard API
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    pub api_url: String,

    /// Read the domains payload from a JSON file instead of the API
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// View to show (defaults to the last saved view)
    #[arg(long, value_enum)]
    pub view: Option<View>,

    /// Case-insensitive search text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Restrict the table search to a single field
    #[arg(short, long)]
    pub field: Option<String>,

    /// Column to sort the table by
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending (same as selecting the sort column twice)
    #[arg(long)]
    pub desc: bool,

    /// Service node to report domain usage for in the graph view
    #[arg(long)]
    pub node: Option<String>,

    /// Kind of the service node given with --node
    #[arg(long, value_enum)]
    pub kind: Option<ServiceKind>,

    /// Show or hide a column (repeatable)
    #[arg(short = 'c', long = "toggle-column")]
    pub toggle_column: Vec<String>,

    /// Show every column, or the defaults if all are already shown
    #[arg(long)]
    pub show_all: bool,

    /// Restore and save the default column set
    #[arg(long)]
    pub reset_columns: bool,

    /// Save the resulting column set
    #[arg(long)]
    pub save_columns: bool,

    /// Path to the preference database
    #[arg(long)]
    pub prefs: Option<PathBuf>,

    /// Write a JSON snapshot of graph and domain data to this file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
