use chrono::{DateTime, NaiveDate, NaiveDateTime};
use time::macros::format_description;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

use crate::columns::Column;

pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let timer = LocalTime::new(format_description!(
        "[hour]:[minute]:[second].[subsecond digits:3]"
    ));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_writer(std::io::stderr)
        .init();
}

pub fn format_number(num: u64) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// First `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Joins the first `max_items` values and notes how many were left out.
pub fn format_list(values: &[String], max_items: usize) -> String {
    let shown = values
        .iter()
        .take(max_items)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if values.len() > max_items {
        format!("{} (+{})", shown, values.len() - max_items)
    } else {
        shown
    }
}

/// Renders a backend date as `Jan 5, 2020`, or its first ten characters if unparseable.
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok());

    match date {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => truncate_chars(raw, 10),
    }
}

pub fn validate_args(args: &crate::args::Args) -> anyhow::Result<()> {
    if args.field.is_some() && args.search.is_none() {
        anyhow::bail!("--field requires --search");
    }

    if args.api_url.trim().is_empty() && args.input.is_none() {
        anyhow::bail!("--api-url must not be empty");
    }

    for key in &args.toggle_column {
        if let Err(e) = key.parse::<Column>() {
            anyhow::bail!("--toggle-column: {}", e);
        }
    }

    if let Some(key) = args.sort.as_deref() {
        if let Err(e) = key.parse::<Column>() {
            anyhow::bail!("--sort: {}", e);
        }
    }

    if args.node.is_some() != args.kind.is_some() {
        anyhow::bail!("--node and --kind must be given together");
    }

    if args.show_all && args.reset_columns {
        anyhow::bail!("--show-all and --reset-columns cannot be combined");
    }

    Ok(())
}
