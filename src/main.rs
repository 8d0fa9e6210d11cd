use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::time::Instant;
use tracing::{error, info};

use infradash::api::{self, DataSource, FileSource, HttpSource};
use infradash::render::render_view;
use infradash::store::{default_preferences_path, SqliteStore, View};
use infradash::utils::{setup_logging, validate_args};
use infradash::{Args, Column, Dashboard};

async fn refresh<S: DataSource>(dashboard: &mut Dashboard, source: &S) {
    let data = api::load_dashboard(source).await;
    dashboard.apply(data);
    if dashboard.view() == View::Analysis {
        let analysis = api::load_analysis(source).await;
        dashboard.apply_analysis(analysis);
    }
}

async fn run(args: &Args) -> Result<String> {
    let total_start_time = Instant::now();
    info!(action = "start", component = "infradash", "Starting dashboard");

    let prefs_path = args.prefs.clone().unwrap_or_else(default_preferences_path);
    let store = SqliteStore::open(&prefs_path)
        .with_context(|| format!("Failed to open preferences at {:?}", prefs_path))?;
    let mut dashboard = Dashboard::new(Box::new(store));

    if let Some(view) = args.view {
        dashboard
            .switch_view(view)
            .context("Failed to save last view")?;
    }

    match args.input.as_deref() {
        Some(path) => refresh(&mut dashboard, &FileSource::new(path)).await,
        None => {
            let source = HttpSource::new(&args.api_url)?;
            refresh(&mut dashboard, &source).await;
        }
    }

    if let Some(query) = args.search.as_deref() {
        dashboard.set_search(query, args.field.as_deref());
        dashboard.set_list_search(query);
    }

    if let Some(key) = args.sort.as_deref() {
        let column: Column = key.parse()?;
        dashboard.sort_by(column);
        if args.desc {
            dashboard.sort_by(column);
        }
    }

    if let (Some(name), Some(kind)) = (args.node.as_deref(), args.kind) {
        dashboard.select_service(name, kind);
    }

    if args.reset_columns {
        dashboard
            .reset_columns()
            .context("Failed to reset column preferences")?;
    }
    if args.show_all {
        dashboard.show_all_columns();
    }
    for key in &args.toggle_column {
        dashboard.toggle_column(key.parse()?);
    }
    if args.save_columns {
        dashboard
            .save_columns()
            .context("Failed to save column preferences")?;
    }

    if let Some(path) = args.export.as_deref() {
        let snapshot = serde_json::to_string_pretty(&dashboard.export_snapshot())?;
        fs::write(path, snapshot).with_context(|| format!("Failed to write export {:?}", path))?;
        info!(action = "export", component = "infradash", path = ?path, "Exported dashboard data");
    }

    let output = render_view(&dashboard);
    info!(
        action = "complete",
        component = "infradash",
        duration_ms = total_start_time.elapsed().as_millis(),
        "Dashboard rendered"
    );
    Ok(output)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    validate_args(&args)?;

    match run(&args).await {
        Ok(output) => {
            print!("{output}");
            Ok(())
        }
        Err(e) => {
            error!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
