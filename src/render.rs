use crate::columns::Column;
use crate::dashboard::{Dashboard, Region};
use crate::derive::{CanonicalRecord, MultiField};
use crate::record::field_text;
use crate::stats::{AnalysisReport, AnalyticsReport, GraphData, GraphStats};
use crate::store::View;
use crate::table::list_count_label;
use crate::utils::{format_date, format_list, format_number, truncate_chars};

pub const EMPTY_CELL: &str = "—";

fn or_empty(text: String) -> String {
    if text.is_empty() {
        EMPTY_CELL.to_string()
    } else {
        text
    }
}

fn max_chars(column: Column) -> Option<usize> {
    match column {
        Column::Isp => Some(30),
        Column::HostName | Column::Registrar => Some(25),
        Column::WebServer | Column::PaymentProcessor => Some(20),
        _ => None,
    }
}

fn max_items(field: MultiField) -> usize {
    match field {
        MultiField::IpAddresses
        | MultiField::Ipv6Addresses
        | MultiField::NameServers
        | MultiField::MxRecords => 2,
        _ => 3,
    }
}

/// Display text of one table cell.
pub fn cell_text(row: &CanonicalRecord<'_>, column: Column) -> String {
    if let Some(field) = MultiField::from_column(column) {
        return or_empty(format_list(row.get(field), max_items(field)));
    }

    let raw = field_text(row.record, column.key());
    match column {
        Column::Domain if raw.is_empty() => "N/A".to_string(),
        Column::CreationDate | Column::ExpirationDate => {
            if raw.is_empty() {
                EMPTY_CELL.to_string()
            } else {
                format_date(&raw)
            }
        }
        _ => match max_chars(column) {
            Some(max) => or_empty(truncate_chars(&raw, max)),
            None => or_empty(raw),
        },
    }
}

pub fn render_table(dashboard: &Dashboard) -> String {
    if let Region::Failed(e) = dashboard.domains_region() {
        return format!("Error loading data: {e}\n");
    }

    let rows = dashboard.canonical_rows();
    if rows.is_empty() {
        return "No domains found\n".to_string();
    }

    let columns = dashboard.columns().rendered();
    let sort = dashboard.sort_state();
    let mut header = vec!["#".to_string()];
    header.extend(columns.iter().map(|c| match sort.column {
        Some(active) if active == *c => format!("{} {}", c.label(), sort.direction.arrow()),
        _ => c.label().to_string(),
    }));

    let body: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut cells = vec![(i + 1).to_string()];
            cells.extend(columns.iter().map(|c| cell_text(row, *c)));
            cells
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for cells in &body {
        for (w, cell) in widths.iter_mut().zip(cells) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&format_row(&header, &widths));
    out.push_str(&format_row(
        &widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>(),
        &widths,
    ));
    for cells in &body {
        out.push_str(&format_row(cells, &widths));
    }
    out.push('\n');
    out.push_str(&dashboard.table().count_label());
    out.push('\n');
    out
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect::<Vec<_>>()
        .join("  ");
    format!("{}\n", line.trim_end())
}

pub fn render_list(dashboard: &Dashboard) -> String {
    let items = dashboard.list();
    if items.is_empty() {
        return format!("No domains found\n{}\n", list_count_label(0));
    }

    let mut out = String::new();
    for record in &items {
        let name = match record.domain() {
            "" => "N/A",
            name => name,
        };
        let meta: Vec<String> = [("CMS", "cms"), ("CDN", "cdn"), ("ISP", "isp"), ("Country", "country")]
            .iter()
            .filter_map(|(label, key)| record.str_field(key).map(|v| format!("{label}: {v}")))
            .collect();
        if meta.is_empty() {
            out.push_str(&format!("{name}\n"));
        } else {
            out.push_str(&format!("{name}\n    {}\n", meta.join(" | ")));
        }
    }
    out.push_str(&list_count_label(items.len()));
    out.push('\n');
    out
}

pub fn render_stats(stats: &GraphStats) -> String {
    let mut parts = vec![
        format!("Nodes: {}", format_number(stats.total_nodes)),
        format!("Edges: {}", format_number(stats.total_edges)),
    ];
    parts.extend(
        stats
            .node_types
            .iter()
            .map(|(node_type, count)| format!("{}: {}", node_type, format_number(*count))),
    );
    parts.join(" | ")
}

pub fn render_summary(analytics: &AnalyticsReport) -> String {
    let s = &analytics.statistics;
    let cards = [
        ("Total Domains", s.total_domains),
        ("With CMS", s.domains_with_cms),
        ("With CDN", s.domains_with_cdn),
        ("Unique Countries", s.unique_countries),
        ("Unique ISPs", s.unique_isps),
        ("Unique Hosts", s.unique_hosts),
    ];

    let mut out = String::new();
    for (label, value) in cards {
        out.push_str(&format!("{:<18}{}\n", label, format_number(value)));
    }

    if !analytics.outliers.is_empty() {
        out.push_str("\nOutliers Detected\n");
        for outlier in &analytics.outliers {
            out.push_str(&format!(
                "[{}] {}: {} - {} domains ({}%)\n",
                outlier.severity,
                outlier.label,
                crate::record::value_text(&outlier.value),
                format_number(outlier.count),
                outlier.percentage
            ));
        }
    }
    out
}

pub fn render_graph(graph: &GraphData) -> String {
    format!(
        "Graph: {} nodes, {} edges\n",
        format_number(graph.nodes.len() as u64),
        format_number(graph.edges.len() as u64)
    )
}

pub fn render_analysis(report: &AnalysisReport) -> String {
    let mut out = report
        .analysis
        .clone()
        .unwrap_or_else(|| "No analysis available".to_string());
    if let Some(updated_at) = report.updated_at.as_deref().filter(|_| report.cached) {
        out.push_str(&format!("\n\n(cached, updated {updated_at})"));
    }
    out.push('\n');

    let sections = report
        .bad_actors
        .as_ref()
        .map(|b| b.sections())
        .unwrap_or_default();
    if !sections.is_empty() {
        out.push_str("\nTop Infrastructure Providers by Domain Count\n");
        for (heading, shares) in sections {
            out.push_str(&format!("\n{heading}:\n"));
            for share in shares {
                out.push_str(&format!(
                    "  {}: {} domains ({}%)\n",
                    share.name, share.count, share.percentage
                ));
            }
        }
    }
    out
}

fn region_text<T>(name: &str, region: &Region<T>, render: impl Fn(&T) -> String) -> String {
    match region {
        Region::Loaded(value) => render(value),
        Region::Failed(e) => format!("Error loading {name}: {e}\n"),
        Region::NotLoaded => format!("Loading {name}...\n"),
    }
}

/// Full screen for the current view: stats line, summary, then the view body.
pub fn render_view(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    out.push_str(&region_text("stats", dashboard.stats(), |s| {
        format!("{}\n", render_stats(s))
    }));
    out.push('\n');
    out.push_str(&region_text("analytics", dashboard.analytics(), render_summary));
    out.push('\n');

    let body = match dashboard.view() {
        View::Graph => {
            let mut text = region_text("graph", dashboard.graph(), render_graph);
            if let Some(usage) = dashboard.service_usage() {
                text.push_str(&format!("{usage}\n"));
            }
            text
        }
        View::Table => render_table(dashboard),
        View::List => render_list(dashboard),
        View::Analysis => region_text("analysis", dashboard.analysis(), render_analysis),
    };
    out.push_str(&body);
    out
}
