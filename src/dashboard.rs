use chrono::Utc;
use rayon::prelude::*;
use serde_json::{json, Value};
use tracing::info;

use crate::api::{DashboardData, RegionResult};
use crate::columns::{Column, ColumnVisibility};
use crate::derive::{derive_all, CanonicalRecord};
use crate::error::StoreError;
use crate::record::DomainRecord;
use crate::stats::{AnalysisReport, AnalyticsReport, GraphData, GraphStats};
use crate::store::{load_last_view, save_last_view, PreferenceStore, View};
use crate::table::{list_search, ServiceKind, ServiceUsage, SortState, TableView};

/// Load state of one output region.
#[derive(Debug, Clone, PartialEq)]
pub enum Region<T> {
    NotLoaded,
    Loaded(T),
    Failed(String),
}

impl<T> Region<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Region::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<RegionResult<T>> for Region<T> {
    fn from(result: RegionResult<T>) -> Self {
        match result {
            Ok(value) => Region::Loaded(value),
            Err(e) => Region::Failed(e.to_string()),
        }
    }
}

/// Application state: the loaded data plus everything the user has chosen.
pub struct Dashboard {
    store: Box<dyn PreferenceStore>,
    records: Vec<DomainRecord>,
    domains: Region<()>,
    graph: Region<GraphData>,
    stats: Region<GraphStats>,
    analytics: Region<AnalyticsReport>,
    analysis: Region<AnalysisReport>,
    query: String,
    scope: Option<String>,
    list_query: String,
    sort: SortState,
    columns: ColumnVisibility,
    view: View,
    selected_service: Option<(String, ServiceKind)>,
}

impl Dashboard {
    /// Starts with saved column and view preferences.
    pub fn new(store: Box<dyn PreferenceStore>) -> Self {
        let columns = ColumnVisibility::load(store.as_ref());
        let view = load_last_view(store.as_ref());
        Self {
            store,
            records: Vec::new(),
            domains: Region::NotLoaded,
            graph: Region::NotLoaded,
            stats: Region::NotLoaded,
            analytics: Region::NotLoaded,
            analysis: Region::NotLoaded,
            query: String::new(),
            scope: None,
            list_query: String::new(),
            sort: SortState::default(),
            columns,
            view,
            selected_service: None,
        }
    }

    /// Takes the result of a load. A failed domains fetch keeps the previous records.
    pub fn apply(&mut self, data: DashboardData) {
        self.graph = data.graph.into();
        self.stats = data.stats.into();
        self.analytics = data.analytics.into();
        match data.domains {
            Ok(response) => {
                self.replace_records(response.domains);
                self.domains = Region::Loaded(());
            }
            Err(e) => self.domains = Region::Failed(e.to_string()),
        }
    }

    pub fn apply_analysis(&mut self, result: RegionResult<AnalysisReport>) {
        self.analysis = result.into();
    }

    /// Replaces the record collection wholesale and hides columns without data.
    pub fn replace_records(&mut self, records: Vec<DomainRecord>) {
        info!(
            action = "load",
            component = "dashboard",
            record_count = records.len(),
            "Replacing record collection"
        );
        self.records = records;
        self.columns.auto_hide_empty_columns(&self.records);
    }

    pub fn records(&self) -> &[DomainRecord] {
        &self.records
    }

    pub fn set_search(&mut self, query: &str, scope: Option<&str>) {
        self.query = query.to_string();
        self.scope = scope.filter(|s| !s.is_empty()).map(str::to_string);
    }

    pub fn set_list_search(&mut self, query: &str) {
        self.list_query = query.to_string();
    }

    /// Header click: same column flips direction, a new one sorts ascending.
    pub fn sort_by(&mut self, column: Column) {
        self.sort.select(column);
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    /// Visible table rows: filter then sort, from the full collection.
    pub fn table(&self) -> TableView<'_> {
        TableView::compute(&self.records, &self.query, self.scope.as_deref(), &self.sort)
    }

    /// Derived view of the visible table rows.
    pub fn canonical_rows(&self) -> Vec<CanonicalRecord<'_>> {
        derive_all(self.table().rows.into_par_iter())
    }

    pub fn list(&self) -> Vec<&DomainRecord> {
        list_search(&self.records, &self.list_query)
    }

    pub fn columns(&self) -> &ColumnVisibility {
        &self.columns
    }

    pub fn toggle_column(&mut self, column: Column) -> bool {
        self.columns.toggle(column)
    }

    pub fn show_all_columns(&mut self) {
        self.columns.show_all();
    }

    pub fn reset_columns(&mut self) -> Result<(), StoreError> {
        self.columns.reset(self.store.as_ref())
    }

    pub fn save_columns(&self) -> Result<(), StoreError> {
        self.columns.persist(self.store.as_ref())
    }

    /// Selects a service node to report usage for in the graph view.
    pub fn select_service(&mut self, name: &str, kind: ServiceKind) {
        self.selected_service = Some((name.to_string(), kind));
    }

    pub fn service_usage(&self) -> Option<ServiceUsage> {
        self.selected_service
            .as_ref()
            .map(|(name, kind)| ServiceUsage::compute(&self.records, name, *kind))
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn switch_view(&mut self, view: View) -> Result<(), StoreError> {
        self.view = view;
        save_last_view(self.store.as_ref(), view)
    }

    pub fn domains_region(&self) -> &Region<()> {
        &self.domains
    }

    pub fn graph(&self) -> &Region<GraphData> {
        &self.graph
    }

    pub fn stats(&self) -> &Region<GraphStats> {
        &self.stats
    }

    pub fn analytics(&self) -> &Region<AnalyticsReport> {
        &self.analytics
    }

    pub fn analysis(&self) -> &Region<AnalysisReport> {
        &self.analysis
    }

    /// JSON export of the graph and all records.
    pub fn export_snapshot(&self) -> Value {
        json!({
            "graph": self.graph.loaded().cloned().unwrap_or_default(),
            "domains": self.records,
            "exported_at": Utc::now().to_rfc3339(),
        })
    }
}
