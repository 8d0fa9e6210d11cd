use feruca::Collator;
use std::fmt;

use crate::columns::Column;
use crate::record::{field_text, value_text, DomainRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => f.write_str("asc"),
            SortDirection::Descending => f.write_str("desc"),
        }
    }
}

/// Active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub column: Option<Column>,
    pub direction: SortDirection,
}

impl SortState {
    /// Selecting the active column flips direction, a new column starts ascending.
    pub fn select(&mut self, column: Column) {
        if self.column == Some(column) {
            self.direction = self.direction.flipped();
        } else {
            self.column = Some(column);
            self.direction = SortDirection::Ascending;
        }
    }
}

/// Records whose string form contains `query`, case-insensitively.
///
/// With a `scope` only that field is searched, otherwise any field may match.
/// An empty query keeps everything. Input order is preserved.
pub fn filter_records<'a>(
    records: &'a [DomainRecord],
    query: &str,
    scope: Option<&str>,
) -> Vec<&'a DomainRecord> {
    if query.is_empty() {
        return records.iter().collect();
    }
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|record| record_matches(record, &needle, scope))
        .collect()
}

fn record_matches(record: &DomainRecord, needle: &str, scope: Option<&str>) -> bool {
    match scope {
        Some(field) => field_text(record, field).to_lowercase().contains(needle),
        None => record
            .fields()
            .any(|(_, value)| value_text(value).to_lowercase().contains(needle)),
    }
}

/// Sorts on the lowercased string form of `column` with Unicode collation;
/// missing values sort as empty.
pub fn sort_records<'a>(rows: &mut [&'a DomainRecord], column: Column, direction: SortDirection) {
    let key = column.key();
    let mut collator = Collator::default();
    let mut keyed: Vec<(String, &'a DomainRecord)> = rows
        .iter()
        .map(|record| (field_text(record, key).to_lowercase(), *record))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| {
        let order = collator.collate(a.as_str(), b.as_str());
        match direction {
            SortDirection::Ascending => order,
            SortDirection::Descending => order.reverse(),
        }
    });
    for (slot, (_, record)) in rows.iter_mut().zip(keyed) {
        *slot = record;
    }
}

/// Filtered and sorted rows, recomputed from the full collection.
#[derive(Debug, Clone)]
pub struct TableView<'a> {
    pub rows: Vec<&'a DomainRecord>,
    pub total: usize,
}

impl<'a> TableView<'a> {
    pub fn compute(
        records: &'a [DomainRecord],
        query: &str,
        scope: Option<&str>,
        sort: &SortState,
    ) -> Self {
        let mut rows = filter_records(records, query, scope);
        if let Some(column) = sort.column {
            sort_records(&mut rows, column, sort.direction);
        }
        Self {
            rows,
            total: records.len(),
        }
    }

    pub fn visible(&self) -> usize {
        self.rows.len()
    }

    pub fn counts(&self) -> (usize, usize) {
        (self.visible(), self.total)
    }

    pub fn count_label(&self) -> String {
        table_count_label(self.visible(), self.total)
    }
}

const LIST_SEARCH_FIELDS: [&str; 5] = ["domain", "cms", "cdn", "isp", "country"];

/// Search used by the list view, limited to the summary fields it shows.
pub fn list_search<'a>(records: &'a [DomainRecord], query: &str) -> Vec<&'a DomainRecord> {
    if query.is_empty() {
        return records.iter().collect();
    }
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|record| {
            LIST_SEARCH_FIELDS
                .iter()
                .any(|field| field_text(record, field).to_lowercase().contains(&needle))
        })
        .collect()
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "domain"
    } else {
        "domains"
    }
}

pub fn table_count_label(visible: usize, total: usize) -> String {
    if visible == total {
        format!("{} {}", visible, plural(visible))
    } else {
        format!("{} {} of {}", visible, plural(visible), total)
    }
}

pub fn list_count_label(count: usize) -> String {
    format!("{} {}", count, plural(count))
}

/// Kind of service node in the infrastructure graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ServiceKind {
    Host,
    Cms,
    Cdn,
    Registrar,
}

impl ServiceKind {
    /// Record field naming the provider of this kind.
    pub fn field(self) -> &'static str {
        match self {
            ServiceKind::Host => "host_name",
            ServiceKind::Cms => "cms",
            ServiceKind::Cdn => "cdn",
            ServiceKind::Registrar => "registrar",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceKind::Host => "host",
            ServiceKind::Cms => "cms",
            ServiceKind::Cdn => "cdn",
            ServiceKind::Registrar => "registrar",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many records name a provider containing `name`, case-insensitively.
pub fn count_domains_using_service(records: &[DomainRecord], name: &str, kind: ServiceKind) -> usize {
    let needle = name.to_lowercase();
    records
        .iter()
        .filter(|record| {
            record
                .str_field(kind.field())
                .is_some_and(|value| value.to_lowercase().contains(&needle))
        })
        .count()
}

/// Usage of one service node across the loaded records.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceUsage {
    pub name: String,
    pub kind: ServiceKind,
    pub count: usize,
    pub total: usize,
}

impl ServiceUsage {
    pub fn compute(records: &[DomainRecord], name: &str, kind: ServiceKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            count: count_domains_using_service(records, name, kind),
            total: records.len(),
        }
    }

    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count as f64 / self.total as f64 * 100.0
        }
    }
}

impl fmt::Display for ServiceUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} {}, {:.1}% of all domains",
            self.name,
            self.kind,
            self.count,
            plural(self.count),
            self.percentage()
        )
    }
}
