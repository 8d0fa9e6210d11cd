use rayon::prelude::*;
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::{debug, info};

use crate::columns::Column;
use crate::record::{value_text, DomainRecord};

/// The multi-value fields reconstructed for every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultiField {
    IpAddresses,
    Ipv6Addresses,
    NameServers,
    MxRecords,
    Frameworks,
    Analytics,
    Languages,
}

impl MultiField {
    pub const ALL: [MultiField; 7] = [
        MultiField::IpAddresses,
        MultiField::Ipv6Addresses,
        MultiField::NameServers,
        MultiField::MxRecords,
        MultiField::Frameworks,
        MultiField::Analytics,
        MultiField::Languages,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MultiField::IpAddresses => "ip_addresses",
            MultiField::Ipv6Addresses => "ipv6_addresses",
            MultiField::NameServers => "name_servers",
            MultiField::MxRecords => "mx_records",
            MultiField::Frameworks => "frameworks",
            MultiField::Analytics => "analytics",
            MultiField::Languages => "languages",
        }
    }

    pub fn from_column(column: Column) -> Option<Self> {
        MultiField::ALL
            .into_iter()
            .find(|field| field.key() == column.key())
    }
}

/// Embedded sub-documents that may carry fallback values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubDocument {
    DnsRecords,
    WhoisData,
    TechStack,
}

impl SubDocument {
    pub fn key(self) -> &'static str {
        match self {
            SubDocument::DnsRecords => "dns_records",
            SubDocument::WhoisData => "whois_data",
            SubDocument::TechStack => "tech_stack",
        }
    }
}

/// One source a multi-value field can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionRule {
    /// The record's own field.
    Direct(&'static str),
    /// A key inside an embedded sub-document, which may be stored as JSON text.
    Nested {
        document: SubDocument,
        key: &'static str,
    },
}

impl ExtractionRule {
    /// Values produced by this rule, or `None` when it yields nothing.
    pub fn extract(&self, record: &DomainRecord) -> Option<Vec<String>> {
        match *self {
            ExtractionRule::Direct(key) => record.get(key).and_then(normalize),
            ExtractionRule::Nested { document, key } => {
                let doc = sub_document(record, document)?;
                doc.get(key).and_then(normalize)
            }
        }
    }
}

/// Rules for `field`, highest priority first.
pub fn rules_for(field: MultiField) -> Vec<ExtractionRule> {
    use ExtractionRule::{Direct, Nested};
    use SubDocument::{DnsRecords, TechStack, WhoisData};

    let mut rules = vec![Direct(field.key())];
    match field {
        MultiField::IpAddresses => rules.push(Nested {
            document: DnsRecords,
            key: "A",
        }),
        MultiField::Ipv6Addresses => rules.push(Nested {
            document: DnsRecords,
            key: "AAAA",
        }),
        MultiField::NameServers => rules.extend([
            Nested {
                document: DnsRecords,
                key: "NS",
            },
            Nested {
                document: WhoisData,
                key: "name_servers",
            },
        ]),
        MultiField::MxRecords => rules.push(Nested {
            document: DnsRecords,
            key: "MX",
        }),
        MultiField::Frameworks => rules.extend([
            Nested {
                document: TechStack,
                key: "frameworks",
            },
            Nested {
                document: TechStack,
                key: "javascript_frameworks",
            },
        ]),
        MultiField::Analytics => rules.push(Nested {
            document: TechStack,
            key: "analytics",
        }),
        MultiField::Languages => rules.extend([
            Nested {
                document: TechStack,
                key: "programming_languages",
            },
            Nested {
                document: TechStack,
                key: "languages",
            },
        ]),
    }
    rules
}

/// Applies the rules for `field` in order; the first one that yields data wins.
pub fn extract_field(record: &DomainRecord, field: MultiField) -> Vec<String> {
    rules_for(field)
        .iter()
        .find_map(|rule| rule.extract(record))
        .unwrap_or_default()
}

// A non-empty array is taken as-is, a truthy scalar becomes a one-element list.
fn normalize(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    Value::Number(_) | Value::Bool(_) => item.to_string(),
                    other => value_text(other),
                })
                .collect(),
        ),
        other => {
            let text = value_text(other);
            if text.is_empty() {
                None
            } else {
                Some(vec![text])
            }
        }
    }
}

fn sub_document(record: &DomainRecord, document: SubDocument) -> Option<Map<String, Value>> {
    match record.get(document.key())? {
        Value::Object(map) => Some(map.clone()),
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => {
                debug!(
                    action = "decode",
                    component = "derivation",
                    domain = record.domain(),
                    document = document.key(),
                    "Embedded document is not an object, treating as absent"
                );
                None
            }
            Err(e) => {
                debug!(
                    action = "decode",
                    component = "derivation",
                    domain = record.domain(),
                    document = document.key(),
                    error = %e,
                    "Malformed embedded document, treating as absent"
                );
                None
            }
        },
        _ => None,
    }
}

/// A record with its multi-value fields resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord<'a> {
    pub record: &'a DomainRecord,
    pub ip_addresses: Vec<String>,
    pub ipv6_addresses: Vec<String>,
    pub name_servers: Vec<String>,
    pub mx_records: Vec<String>,
    pub frameworks: Vec<String>,
    pub analytics: Vec<String>,
    pub languages: Vec<String>,
}

impl<'a> CanonicalRecord<'a> {
    pub fn get(&self, field: MultiField) -> &[String] {
        match field {
            MultiField::IpAddresses => &self.ip_addresses,
            MultiField::Ipv6Addresses => &self.ipv6_addresses,
            MultiField::NameServers => &self.name_servers,
            MultiField::MxRecords => &self.mx_records,
            MultiField::Frameworks => &self.frameworks,
            MultiField::Analytics => &self.analytics,
            MultiField::Languages => &self.languages,
        }
    }

    pub fn domain(&self) -> &str {
        self.record.domain()
    }
}

pub fn derive_canonical(record: &DomainRecord) -> CanonicalRecord<'_> {
    CanonicalRecord {
        record,
        ip_addresses: extract_field(record, MultiField::IpAddresses),
        ipv6_addresses: extract_field(record, MultiField::Ipv6Addresses),
        name_servers: extract_field(record, MultiField::NameServers),
        mx_records: extract_field(record, MultiField::MxRecords),
        frameworks: extract_field(record, MultiField::Frameworks),
        analytics: extract_field(record, MultiField::Analytics),
        languages: extract_field(record, MultiField::Languages),
    }
}

/// Derives every record, keeping input order.
pub fn derive_all<'a, I>(records: I) -> Vec<CanonicalRecord<'a>>
where
    I: IntoParallelIterator<Item = &'a DomainRecord>,
    I::Iter: IndexedParallelIterator,
{
    let start_time = Instant::now();
    let canonical: Vec<CanonicalRecord<'a>> =
        records.into_par_iter().map(derive_canonical).collect();
    info!(
        action = "complete",
        component = "derivation",
        record_count = canonical.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Derived canonical records"
    );
    canonical
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> DomainRecord {
        DomainRecord::from(value)
    }

    #[test]
    fn direct_sequence_is_used_as_is() {
        let r = record(json!({
            "ip_addresses": ["9.9.9.9", "8.8.8.8"],
            "dns_records": {"A": ["1.2.3.4"]}
        }));
        assert_eq!(
            extract_field(&r, MultiField::IpAddresses),
            vec!["9.9.9.9", "8.8.8.8"]
        );
    }

    #[test]
    fn direct_scalar_becomes_single_element() {
        let r = record(json!({"frameworks": "React"}));
        assert_eq!(derive_canonical(&r).frameworks, vec!["React"]);
    }

    #[test]
    fn empty_direct_field_falls_back_to_dns_text() {
        let r = record(json!({
            "ip_addresses": [],
            "dns_records": "{\"A\":[\"1.2.3.4\"],\"AAAA\":\"::1\",\"MX\":[\"mx.a.com\"]}"
        }));
        let c = derive_canonical(&r);
        assert_eq!(c.ip_addresses, vec!["1.2.3.4"]);
        assert_eq!(c.ipv6_addresses, vec!["::1"]);
        assert_eq!(c.mx_records, vec!["mx.a.com"]);
    }

    #[test]
    fn name_servers_prefer_dns_then_whois() {
        let both = record(json!({
            "dns_records": {"NS": ["ns1.dns.com"]},
            "whois_data": {"name_servers": ["ns.whois.com"]}
        }));
        assert_eq!(derive_canonical(&both).name_servers, vec!["ns1.dns.com"]);

        let whois_only = record(json!({
            "dns_records": {"A": "1.1.1.1"},
            "whois_data": "{\"name_servers\": \"ns.whois.com\"}"
        }));
        assert_eq!(
            derive_canonical(&whois_only).name_servers,
            vec!["ns.whois.com"]
        );
    }

    #[test]
    fn tech_stack_alternate_keys_are_consulted_in_order() {
        let r = record(json!({
            "tech_stack": {
                "javascript_frameworks": ["jQuery"],
                "languages": "PHP",
                "analytics": ["Google Analytics", "Hotjar"]
            }
        }));
        let c = derive_canonical(&r);
        assert_eq!(c.frameworks, vec!["jQuery"]);
        assert_eq!(c.languages, vec!["PHP"]);
        assert_eq!(c.analytics, vec!["Google Analytics", "Hotjar"]);

        let preferred = record(json!({
            "tech_stack": {
                "programming_languages": ["Python"],
                "languages": ["PHP"]
            }
        }));
        assert_eq!(derive_canonical(&preferred).languages, vec!["Python"]);
    }

    #[test]
    fn malformed_sub_document_is_absent() {
        let r = record(json!({
            "dns_records": "{not json",
            "tech_stack": "[1, 2]"
        }));
        let c = derive_canonical(&r);
        assert!(c.ip_addresses.is_empty());
        assert!(c.frameworks.is_empty());
    }

    #[test]
    fn missing_sources_yield_empty_sequences() {
        let r = record(json!({"domain": "a.com"}));
        let c = derive_canonical(&r);
        for field in MultiField::ALL {
            assert!(c.get(field).is_empty(), "{} should be empty", field.key());
        }
    }

    #[test]
    fn rules_start_with_the_direct_field() {
        for field in MultiField::ALL {
            assert_eq!(rules_for(field)[0], ExtractionRule::Direct(field.key()));
        }
        assert_eq!(rules_for(MultiField::NameServers).len(), 3);
    }

    #[test]
    fn derive_all_preserves_order() {
        let records: Vec<DomainRecord> = (0..50)
            .map(|i| record(json!({"domain": format!("d{i}.com"), "frameworks": format!("f{i}")})))
            .collect();
        let canonical = derive_all(&records);
        assert_eq!(canonical.len(), 50);
        for (i, c) in canonical.iter().enumerate() {
            assert_eq!(c.domain(), format!("d{i}.com"));
            assert_eq!(c.frameworks, vec![format!("f{i}")]);
        }
    }
}
