use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

use crate::record::{is_empty_value, DomainRecord};
use crate::store::PreferenceStore;

pub const TABLE_COLUMNS_KEY: &str = "tableColumns";

/// Table columns, in definition (and render) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Domain,
    Isp,
    HostName,
    Cms,
    Cdn,
    Registrar,
    CreationDate,
    Frameworks,
    IpAddress,
    Country,
    Asn,
    WebServer,
    PaymentProcessor,
    ExpirationDate,
    Analytics,
    Languages,
    IpAddresses,
    Ipv6Addresses,
    NameServers,
    MxRecords,
}

/// Columns shown on first run and never auto-hidden.
pub const DEFAULT_VISIBLE: [Column; 8] = [
    Column::Domain,
    Column::Isp,
    Column::HostName,
    Column::Cms,
    Column::Cdn,
    Column::Registrar,
    Column::CreationDate,
    Column::Frameworks,
];

impl Column {
    pub const ALL: [Column; 20] = [
        Column::Domain,
        Column::Isp,
        Column::HostName,
        Column::Cms,
        Column::Cdn,
        Column::Registrar,
        Column::CreationDate,
        Column::Frameworks,
        Column::IpAddress,
        Column::Country,
        Column::Asn,
        Column::WebServer,
        Column::PaymentProcessor,
        Column::ExpirationDate,
        Column::Analytics,
        Column::Languages,
        Column::IpAddresses,
        Column::Ipv6Addresses,
        Column::NameServers,
        Column::MxRecords,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Column::Domain => "domain",
            Column::Isp => "isp",
            Column::HostName => "host_name",
            Column::Cms => "cms",
            Column::Cdn => "cdn",
            Column::Registrar => "registrar",
            Column::CreationDate => "creation_date",
            Column::Frameworks => "frameworks",
            Column::IpAddress => "ip_address",
            Column::Country => "country",
            Column::Asn => "asn",
            Column::WebServer => "web_server",
            Column::PaymentProcessor => "payment_processor",
            Column::ExpirationDate => "expiration_date",
            Column::Analytics => "analytics",
            Column::Languages => "languages",
            Column::IpAddresses => "ip_addresses",
            Column::Ipv6Addresses => "ipv6_addresses",
            Column::NameServers => "name_servers",
            Column::MxRecords => "mx_records",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Column::Domain => "Domain",
            Column::Isp => "ISP",
            Column::HostName => "Host",
            Column::Cms => "CMS",
            Column::Cdn => "CDN",
            Column::Registrar => "Registrar",
            Column::CreationDate => "Created",
            Column::Frameworks => "Frameworks",
            Column::IpAddress => "IP Address",
            Column::Country => "Country",
            Column::Asn => "ASN",
            Column::WebServer => "Web Server",
            Column::PaymentProcessor => "Payment",
            Column::ExpirationDate => "Expires",
            Column::Analytics => "Analytics",
            Column::Languages => "Languages",
            Column::IpAddresses => "IPs (IPv4)",
            Column::Ipv6Addresses => "IPv6",
            Column::NameServers => "Name Servers",
            Column::MxRecords => "MX Records",
        }
    }

    pub fn is_default(self) -> bool {
        DEFAULT_VISIBLE.contains(&self)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown column '{0}'")]
pub struct UnknownColumn(pub String);

impl FromStr for Column {
    type Err = UnknownColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|c| c.key() == s)
            .ok_or_else(|| UnknownColumn(s.to_string()))
    }
}

/// Ordered set of columns currently rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnVisibility {
    columns: Vec<Column>,
}

impl Default for ColumnVisibility {
    fn default() -> Self {
        Self::defaults()
    }
}

impl ColumnVisibility {
    pub fn defaults() -> Self {
        Self {
            columns: DEFAULT_VISIBLE.to_vec(),
        }
    }

    pub fn all() -> Self {
        Self {
            columns: Column::ALL.to_vec(),
        }
    }

    /// Builds a set from keys, skipping unknown and repeated entries.
    pub fn from_keys<S: AsRef<str>>(keys: &[S]) -> Self {
        let mut columns = Vec::new();
        for key in keys {
            match key.as_ref().parse::<Column>() {
                Ok(column) if !columns.contains(&column) => columns.push(column),
                Ok(_) => {}
                Err(e) => warn!(action = "parse", component = "column_preferences", error = %e, "Ignoring persisted column"),
            }
        }
        Self { columns }
    }

    /// Reads the persisted set; anything unreadable yields the defaults.
    pub fn load(store: &dyn PreferenceStore) -> Self {
        let saved = match store.get(TABLE_COLUMNS_KEY) {
            Ok(Some(saved)) => saved,
            Ok(None) => return Self::defaults(),
            Err(e) => {
                warn!(action = "load", component = "column_preferences", error = %e, "Error loading column preferences");
                return Self::defaults();
            }
        };

        match serde_json::from_str::<Vec<String>>(&saved) {
            Ok(keys) => {
                let loaded = Self::from_keys(&keys);
                info!(
                    action = "loaded",
                    component = "column_preferences",
                    column_count = loaded.columns.len(),
                    "Loaded column preferences"
                );
                loaded
            }
            Err(e) => {
                warn!(action = "load", component = "column_preferences", error = %e, "Corrupt column preferences, using defaults");
                Self::defaults()
            }
        }
    }

    pub fn persist(&self, store: &dyn PreferenceStore) -> Result<(), crate::error::StoreError> {
        let keys: Vec<&str> = self.columns.iter().map(|c| c.key()).collect();
        store.set(TABLE_COLUMNS_KEY, &serde_json::to_string(&keys)?)?;
        info!(
            action = "save",
            component = "column_preferences",
            column_count = keys.len(),
            "Saved column preferences"
        );
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn is_visible(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Visible columns in definition order, as the table renders them.
    pub fn rendered(&self) -> Vec<Column> {
        Column::ALL
            .into_iter()
            .filter(|c| self.is_visible(*c))
            .collect()
    }

    pub fn all_visible(&self) -> bool {
        Column::ALL.iter().all(|c| self.columns.contains(c))
    }

    /// Adds the column at the end or removes it. Returns whether it is now visible.
    pub fn toggle(&mut self, column: Column) -> bool {
        if let Some(pos) = self.columns.iter().position(|c| *c == column) {
            self.columns.remove(pos);
            false
        } else {
            self.columns.push(column);
            true
        }
    }

    /// Shows every column, or goes back to the defaults when all are already shown.
    pub fn show_all(&mut self) {
        if self.all_visible() {
            self.restore_defaults();
        } else {
            self.columns = Column::ALL.to_vec();
        }
    }

    pub fn restore_defaults(&mut self) {
        self.columns = DEFAULT_VISIBLE.to_vec();
    }

    /// Restores the defaults and writes them back.
    pub fn reset(&mut self, store: &dyn PreferenceStore) -> Result<(), crate::error::StoreError> {
        self.restore_defaults();
        self.persist(store)
    }

    /// Hides non-default columns that have no data in any record.
    pub fn auto_hide_empty_columns(&mut self, records: &[DomainRecord]) {
        if records.is_empty() {
            return;
        }

        let empty: Vec<Column> = Column::ALL
            .into_iter()
            .filter(|c| !c.is_default())
            .filter(|c| !column_has_data(records, *c))
            .collect();

        let before = self.columns.len();
        self.columns.retain(|c| !empty.contains(c));
        info!(
            action = "auto_hide",
            component = "column_visibility",
            empty_columns = empty.len(),
            hidden = before - self.columns.len(),
            "Hid columns without data"
        );
    }
}

pub fn column_has_data(records: &[DomainRecord], column: Column) -> bool {
    records
        .par_iter()
        .any(|r| r.get(column.key()).is_some_and(|v| !is_empty_value(v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn keys_round_trip_through_from_str() {
        for column in Column::ALL {
            assert_eq!(column.key().parse::<Column>(), Ok(column));
        }
        assert!("row-number".parse::<Column>().is_err());
    }

    #[test]
    fn default_set_has_eight_columns() {
        let v = ColumnVisibility::defaults();
        assert_eq!(v.columns().len(), 8);
        assert!(!v.all_visible());
        assert!(ColumnVisibility::all().all_visible());
    }

    #[test]
    fn toggle_adds_and_removes() {
        let mut v = ColumnVisibility::defaults();
        assert!(v.toggle(Column::Country));
        assert_eq!(v.columns().last(), Some(&Column::Country));
        assert!(!v.toggle(Column::Country));
        assert!(!v.is_visible(Column::Country));
        assert!(!v.toggle(Column::Domain));
        assert!(!v.is_visible(Column::Domain));
    }

    #[test]
    fn show_all_toggles_between_all_and_defaults() {
        let mut v = ColumnVisibility::defaults();
        v.restore_defaults();
        v.show_all();
        assert_eq!(v, ColumnVisibility::all());
        v.show_all();
        assert_eq!(v, ColumnVisibility::defaults());
    }

    #[test]
    fn rendered_follows_definition_order() {
        let mut v = ColumnVisibility::from_keys(&["country", "domain"]);
        v.toggle(Column::Isp);
        assert_eq!(v.columns(), &[Column::Country, Column::Domain, Column::Isp]);
        assert_eq!(v.rendered(), vec![Column::Domain, Column::Isp, Column::Country]);
    }

    #[test]
    fn auto_hide_keeps_defaults_and_removes_empty_columns() {
        let records = vec![
            DomainRecord::from(json!({"domain": "a.com", "country": "US", "asn": "", "analytics": []})),
            DomainRecord::from(json!({"domain": "b.com", "asn": null, "mx_records": {}})),
        ];
        let mut v = ColumnVisibility::all();
        v.auto_hide_empty_columns(&records);

        for column in DEFAULT_VISIBLE {
            assert!(v.is_visible(column));
        }
        assert!(v.is_visible(Column::Country));
        assert!(!v.is_visible(Column::Asn));
        assert!(!v.is_visible(Column::Analytics));
        assert!(!v.is_visible(Column::MxRecords));
        assert!(!v.is_visible(Column::WebServer));
    }

    #[test]
    fn auto_hide_ignores_empty_collections() {
        let mut v = ColumnVisibility::all();
        v.auto_hide_empty_columns(&[]);
        assert!(v.all_visible());
    }

    #[test]
    fn corrupt_preferences_fall_back_to_defaults() {
        let store = MemoryStore::default();
        store.set(TABLE_COLUMNS_KEY, "not valid json").unwrap();
        assert_eq!(ColumnVisibility::load(&store), ColumnVisibility::defaults());

        store.set(TABLE_COLUMNS_KEY, r#"{"domain": true}"#).unwrap();
        assert_eq!(ColumnVisibility::load(&store), ColumnVisibility::defaults());
    }

    #[test]
    fn persist_then_load_restores_the_set() {
        let store = MemoryStore::default();
        let mut v = ColumnVisibility::defaults();
        v.toggle(Column::MxRecords);
        v.toggle(Column::Isp);
        v.persist(&store).unwrap();

        assert_eq!(
            store.get(TABLE_COLUMNS_KEY).unwrap().as_deref(),
            Some(r#"["domain","host_name","cms","cdn","registrar","creation_date","frameworks","mx_records"]"#)
        );
        assert_eq!(ColumnVisibility::load(&store), v);
    }

    #[test]
    fn load_skips_unknown_and_duplicate_keys() {
        let store = MemoryStore::default();
        store
            .set(TABLE_COLUMNS_KEY, r#"["domain","bogus","domain","cms"]"#)
            .unwrap();
        let v = ColumnVisibility::load(&store);
        assert_eq!(v.columns(), &[Column::Domain, Column::Cms]);
    }

    #[test]
    fn reset_persists_defaults() {
        let store = MemoryStore::default();
        let mut v = ColumnVisibility::all();
        v.reset(&store).unwrap();
        assert_eq!(v, ColumnVisibility::defaults());
        assert_eq!(ColumnVisibility::load(&store), ColumnVisibility::defaults());
    }
}
