use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::FetchError;
use crate::record::DomainRecord;

/// Reads a number that the backend may send as `null`.
fn null_as_zero<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// `/api/graph` payload. Nodes and edges are passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphData {
    pub nodes: Vec<Value>,
    pub edges: Vec<Value>,
}

/// `/api/stats` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphStats {
    #[serde(deserialize_with = "null_as_zero")]
    pub total_nodes: u64,
    #[serde(deserialize_with = "null_as_zero")]
    pub total_edges: u64,
    pub node_types: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    #[serde(deserialize_with = "null_as_zero")]
    pub total_domains: u64,
    #[serde(deserialize_with = "null_as_zero")]
    pub domains_with_cms: u64,
    #[serde(deserialize_with = "null_as_zero")]
    pub domains_with_cdn: u64,
    #[serde(deserialize_with = "null_as_zero")]
    pub domains_with_payment: u64,
    #[serde(deserialize_with = "null_as_zero")]
    pub unique_countries: u64,
    #[serde(deserialize_with = "null_as_zero")]
    pub unique_isps: u64,
    #[serde(deserialize_with = "null_as_zero")]
    pub unique_hosts: u64,
}

/// A provider used by a large share of all domains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Outlier {
    pub column: String,
    pub label: String,
    pub value: Value,
    #[serde(deserialize_with = "null_as_zero")]
    pub count: u64,
    #[serde(deserialize_with = "null_as_zero")]
    pub percentage: f64,
    pub severity: String,
}

/// `/api/analytics` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsReport {
    pub statistics: Statistics,
    pub outliers: Vec<Outlier>,
}

/// `/api/domains` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainsResponse {
    pub domains: Vec<DomainRecord>,
    pub count: Option<usize>,
}

/// One provider line of the analysis report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderShare {
    pub name: String,
    #[serde(deserialize_with = "null_as_zero")]
    pub count: u64,
    #[serde(deserialize_with = "null_as_zero")]
    pub percentage: f64,
}

/// Providers serving the most domains, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BadActors {
    pub top_service_providers: Vec<ProviderShare>,
    pub top_hosts: Vec<ProviderShare>,
    pub top_registrars: Vec<ProviderShare>,
    pub top_isps: Vec<ProviderShare>,
    pub top_cdns: Vec<ProviderShare>,
}

impl BadActors {
    /// Non-empty sections with their headings, in display order.
    pub fn sections(&self) -> Vec<(&'static str, &[ProviderShare])> {
        [
            ("Service Providers (CDN + Host + ISP)", &self.top_service_providers),
            ("Hosting Providers", &self.top_hosts),
            ("Registrars", &self.top_registrars),
            ("ISPs", &self.top_isps),
            ("CDNs", &self.top_cdns),
        ]
        .into_iter()
        .filter(|(_, shares)| !shares.is_empty())
        .map(|(heading, shares)| (heading, shares.as_slice()))
        .collect()
    }
}

/// `/api/analysis` payload, which carries either a report or an `error` message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisReport {
    pub analysis: Option<String>,
    pub bad_actors: Option<BadActors>,
    pub cached: bool,
    pub updated_at: Option<String>,
    pub error: Option<String>,
}

impl AnalysisReport {
    pub fn into_result(self) -> Result<Self, FetchError> {
        match self.error {
            Some(message) => Err(FetchError::Backend(message)),
            None => Ok(self),
        }
    }
}
