use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};
use url::Url;

use crate::error::FetchError;
use crate::stats::{AnalysisReport, AnalyticsReport, DomainsResponse, GraphData, GraphStats};

/// Backend endpoints the dashboard reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Graph,
    Stats,
    Analytics,
    Domains,
    Analysis,
}

impl Endpoint {
    /// Path relative to the API base url.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Graph => "api/graph",
            Endpoint::Stats => "api/stats",
            Endpoint::Analytics => "api/analytics",
            Endpoint::Domains => "api/domains",
            Endpoint::Analysis => "api/analysis",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Graph => "graph",
            Endpoint::Stats => "stats",
            Endpoint::Analytics => "analytics",
            Endpoint::Domains => "domains",
            Endpoint::Analysis => "analysis",
        }
    }
}

/// Something that can answer endpoint requests with JSON.
#[allow(async_fn_in_trait)]
pub trait DataSource {
    async fn fetch(&self, endpoint: Endpoint) -> Result<Value, FetchError>;
}

/// Reads endpoints from a running backend over HTTP.
pub struct HttpSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let mut base = Url::parse(base_url).map_err(|source| FetchError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base,
        })
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url, FetchError> {
        self.base
            .join(endpoint.path())
            .map_err(|source| FetchError::InvalidUrl {
                url: format!("{}{}", self.base, endpoint.path()),
                source,
            })
    }
}

impl DataSource for HttpSource {
    async fn fetch(&self, endpoint: Endpoint) -> Result<Value, FetchError> {
        let url = self.endpoint_url(endpoint)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Serves the domains payload from a JSON file; other regions are unavailable.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataSource for FileSource {
    async fn fetch(&self, endpoint: Endpoint) -> Result<Value, FetchError> {
        if endpoint != Endpoint::Domains {
            return Err(FetchError::Unavailable(endpoint.name()));
        }
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| FetchError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        // A bare array of records is accepted as well as the API envelope.
        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Array(domains) => Ok(serde_json::json!({ "domains": domains })),
            other => Ok(other),
        }
    }
}

pub type RegionResult<T> = Result<T, FetchError>;

/// Fetches one endpoint and decodes it into its payload type.
pub async fn fetch_region<S, T>(source: &S, endpoint: Endpoint) -> RegionResult<T>
where
    S: DataSource,
    T: DeserializeOwned,
{
    let start_time = Instant::now();
    info!(action = "start", component = "fetch", endpoint = endpoint.name(), "Fetching region");

    let result = match source.fetch(endpoint).await {
        Ok(value) => serde_json::from_value::<T>(value).map_err(FetchError::from),
        Err(e) => Err(e),
    };

    match &result {
        Ok(_) => info!(
            action = "complete",
            component = "fetch",
            endpoint = endpoint.name(),
            duration_ms = start_time.elapsed().as_millis(),
            "Region loaded"
        ),
        Err(e) => error!(
            action = "complete",
            component = "fetch",
            endpoint = endpoint.name(),
            error = %e,
            "Error loading region"
        ),
    }
    result
}

/// Result of one load or refresh; each region succeeds or fails on its own.
#[derive(Debug)]
pub struct DashboardData {
    pub graph: RegionResult<GraphData>,
    pub stats: RegionResult<GraphStats>,
    pub analytics: RegionResult<AnalyticsReport>,
    pub domains: RegionResult<DomainsResponse>,
}

/// Runs the four load-time fetches concurrently and waits for all of them.
pub async fn load_dashboard<S: DataSource>(source: &S) -> DashboardData {
    let start_time = Instant::now();
    let (graph, stats, analytics, domains) = tokio::join!(
        fetch_region::<S, GraphData>(source, Endpoint::Graph),
        fetch_region::<S, GraphStats>(source, Endpoint::Stats),
        fetch_region::<S, AnalyticsReport>(source, Endpoint::Analytics),
        fetch_region::<S, DomainsResponse>(source, Endpoint::Domains),
    );
    info!(
        action = "complete",
        component = "dashboard_load",
        failed_regions = [graph.is_err(), stats.is_err(), analytics.is_err(), domains.is_err()]
            .iter()
            .filter(|failed| **failed)
            .count(),
        duration_ms = start_time.elapsed().as_millis(),
        "Dashboard load finished"
    );
    DashboardData {
        graph,
        stats,
        analytics,
        domains,
    }
}

/// The analysis region is only fetched on demand.
pub async fn load_analysis<S: DataSource>(source: &S) -> RegionResult<AnalysisReport> {
    fetch_region::<S, AnalysisReport>(source, Endpoint::Analysis)
        .await
        .and_then(AnalysisReport::into_result)
}
