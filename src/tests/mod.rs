use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{json, Value};

use crate::api::{load_analysis, load_dashboard, DataSource, Endpoint, FileSource};
use crate::columns::{Column, ColumnVisibility, DEFAULT_VISIBLE, TABLE_COLUMNS_KEY};
use crate::dashboard::{Dashboard, Region};
use crate::derive::derive_canonical;
use crate::error::FetchError;
use crate::record::{field_text, DomainRecord};
use crate::store::{MemoryStore, PreferenceStore};
use crate::table::{filter_records, sort_records, SortDirection};

fn records(values: Value) -> Vec<DomainRecord> {
    serde_json::from_value(values).unwrap()
}

#[test]
fn filter_wordpress_scenario() {
    let data = records(json!([
        {"domain": "a.com", "cms": "WordPress"},
        {"domain": "b.com", "cms": ""}
    ]));
    let hits = filter_records(&data, "wordpress", None);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].domain(), "a.com");
}

#[test]
fn filter_is_an_idempotent_subset() {
    let data = records(json!([
        {"domain": "alpha.io", "isp": "Hetzner"},
        {"domain": "beta.net", "isp": "OVH", "cdn": "Cloudflare"},
        {"domain": "gamma.org", "frameworks": ["Alpine.js"]}
    ]));
    for query in ["al", "NET", "o", "zzz"] {
        let once = filter_records(&data, query, None);
        let owned: Vec<DomainRecord> = once.iter().map(|r| (*r).clone()).collect();
        let twice = filter_records(&owned, query, None);
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(&twice) {
            assert_eq!(*a, *b);
            assert!(data.contains(*a));
        }
    }
}

#[test]
fn flipping_sort_direction_reverses_distinct_keys() {
    let data = records(json!([
        {"domain": "delta.com"}, {"domain": "Alpha.com"}, {"domain": "charlie.com"}, {"domain": "bravo.com"}
    ]));
    let mut asc = filter_records(&data, "", None);
    sort_records(&mut asc, Column::Domain, SortDirection::Ascending);
    let mut desc = asc.clone();
    sort_records(&mut desc, Column::Domain, SortDirection::Descending);
    desc.reverse();
    assert_eq!(asc, desc);
    assert_eq!(asc[0].domain(), "Alpha.com");
}

#[test]
fn dns_text_scenario_yields_ip_addresses() {
    let record = DomainRecord::from(json!({"dns_records": "{\"A\":[\"1.2.3.4\"]}"}));
    assert_eq!(derive_canonical(&record).ip_addresses, vec!["1.2.3.4"]);
}

#[test]
fn corrupt_table_columns_scenario() {
    let store = MemoryStore::default();
    store.set(TABLE_COLUMNS_KEY, "not valid json").unwrap();
    assert_eq!(ColumnVisibility::load(&store), ColumnVisibility::defaults());
}

#[test]
fn restore_then_show_all_scenario() {
    let mut columns = ColumnVisibility::defaults();
    columns.toggle(Column::Cms);
    columns.restore_defaults();
    columns.show_all();
    assert_eq!(columns.columns(), &Column::ALL);
    columns.show_all();
    assert_eq!(columns.columns(), &DEFAULT_VISIBLE);
}

#[test]
fn auto_hide_on_load_never_touches_defaults() {
    let mut dashboard = Dashboard::new(Box::new(MemoryStore::default()));
    dashboard.show_all_columns();
    dashboard.replace_records(records(json!([{"domain": "a.com"}, {"domain": "b.com", "web_server": "nginx"}])));

    let visible = dashboard.columns();
    for column in DEFAULT_VISIBLE {
        assert!(visible.is_visible(column));
    }
    assert!(visible.is_visible(Column::WebServer));
    assert!(!visible.is_visible(Column::Country));
    assert!(!visible.all_visible());
}

#[test]
fn frameworks_are_always_a_sequence() {
    let data = records(json!([
        {"frameworks": "Laravel"},
        {"frameworks": null, "tech_stack": "oops"},
        {"tech_stack": {"frameworks": "Django"}},
        {}
    ]));
    let derived: Vec<Vec<String>> = data.iter().map(|r| derive_canonical(r).frameworks).collect();
    assert_eq!(
        derived,
        vec![vec!["Laravel".to_string()], vec![], vec!["Django".to_string()], vec![]]
    );
}

#[test]
fn scoped_search_treats_missing_field_as_empty() {
    let data = records(json!([{"domain": "a.com"}, {"domain": "b.com", "registrar": "GoDaddy"}]));
    assert_eq!(field_text(&data[0], "registrar"), "");
    let hits = filter_records(&data, "daddy", Some("registrar"));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].domain(), "b.com");
}

/// Serves canned responses and counts requests.
#[derive(Default)]
struct StubSource {
    responses: HashMap<&'static str, Result<Value, u16>>,
    calls: AtomicUsize,
}

impl StubSource {
    fn with(mut self, endpoint: Endpoint, response: Result<Value, u16>) -> Self {
        self.responses.insert(endpoint.name(), response);
        self
    }
}

impl DataSource for StubSource {
    async fn fetch(&self, endpoint: Endpoint) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        match self.responses.get(endpoint.name()) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(status)) => Err(FetchError::Status(*status)),
            None => Err(FetchError::Unavailable(endpoint.name())),
        }
    }
}

#[tokio::test]
async fn one_failed_fetch_does_not_cancel_the_others() {
    let source = StubSource::default()
        .with(Endpoint::Graph, Err(500))
        .with(Endpoint::Stats, Ok(json!({"total_nodes": 3, "total_edges": 2, "node_types": {"Domain": 2, "CDN": 1}})))
        .with(Endpoint::Analytics, Ok(json!({"statistics": {"total_domains": 2}, "outliers": []})))
        .with(Endpoint::Domains, Ok(json!({"domains": [{"domain": "a.com"}, {"domain": "b.com"}], "count": 2})));

    let data = load_dashboard(&source).await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 4);
    assert!(matches!(data.graph, Err(FetchError::Status(500))));
    assert_eq!(data.stats.as_ref().unwrap().total_nodes, 3);

    let mut dashboard = Dashboard::new(Box::new(MemoryStore::default()));
    dashboard.apply(data);
    assert!(matches!(dashboard.graph(), Region::Failed(_)));
    assert_eq!(dashboard.table().counts(), (2, 2));
}

#[tokio::test]
async fn malformed_payload_is_a_region_decode_error() {
    let source = StubSource::default().with(Endpoint::Domains, Ok(json!({"domains": "nope"})));
    let data = load_dashboard(&source).await;
    assert!(matches!(data.domains, Err(FetchError::Decode(_))));
    assert!(matches!(data.stats, Err(FetchError::Unavailable("stats"))));
}

#[tokio::test]
async fn analysis_error_body_is_reported() {
    let source = StubSource::default().with(Endpoint::Analysis, Ok(json!({"error": "No domains found"})));
    let err = load_analysis(&source).await.unwrap_err();
    assert_eq!(err.to_string(), "No domains found");
}

#[tokio::test]
async fn file_source_accepts_bare_arrays() {
    let path = std::env::temp_dir().join(format!("infradash-domains-{}.json", std::process::id()));
    std::fs::write(&path, r#"[{"domain": "a.com", "cms": "Ghost"}]"#).unwrap();

    let data = load_dashboard(&FileSource::new(&path)).await;
    std::fs::remove_file(&path).unwrap();

    let domains = data.domains.unwrap();
    assert_eq!(domains.domains.len(), 1);
    assert_eq!(domains.domains[0].domain(), "a.com");
    assert!(matches!(data.graph, Err(FetchError::Unavailable("graph"))));
}
