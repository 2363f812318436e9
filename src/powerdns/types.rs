use serde::{Deserialize, Serialize};

use crate::template::ZoneRecord;

#[derive(Debug, Serialize, Deserialize)]
pub struct PdnsZone {
    pub id: String,   // "/api/.../zones/example.com."
    pub name: String, // "example.com."
    pub kind: String, // "Native", etc.
    #[serde(default)]
    pub rrsets: Vec<PdnsRrset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdnsRrset {
    pub name: String, // "www.example.com."
    #[serde(rename = "type")]
    pub rrtype: String, // "A", "NS", ...
    pub ttl: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changetype: Option<String>, // "REPLACE" / "DELETE" when patching
    pub records: Vec<PdnsRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdnsRecord {
    pub content: String, // "192.0.2.1" or "ns1.example.net."
    #[serde(default)]
    pub disabled: bool,
}

/// Types whose content ends in a host name the API wants fully qualified.
const HOSTNAME_TYPES: &[&str] = &["CNAME", "DNAME", "MX", "NS", "PTR", "SRV"];

pub fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

fn strip_dot(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

fn has_prio(rtype: &str) -> bool {
    matches!(rtype, "MX" | "SRV")
}

/// Rewrite the first `n` fields of an SOA with `f`, keeping the rest as is.
fn map_soa_hosts(content: &str, f: impl Fn(&str) -> String) -> String {
    content
        .split_whitespace()
        .enumerate()
        .map(|(i, part)| if i < 2 { f(part) } else { part.to_string() })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Flatten API rrsets into console records. Names and host names lose their
/// trailing dot and MX/SRV priorities move into `prio`.
pub fn rrsets_to_records(zone: &str, rrsets: &[PdnsRrset]) -> Vec<ZoneRecord> {
    let zone = strip_dot(zone);
    let mut out = Vec::new();
    for rrset in rrsets {
        for record in &rrset.records {
            let (prio, content) = match record.content.split_once(' ') {
                Some((p, rest)) if has_prio(&rrset.rrtype) => match p.parse::<i64>() {
                    Ok(p) => (p, rest),
                    Err(_) => (0, record.content.as_str()),
                },
                _ => (0, record.content.as_str()),
            };
            let content = if rrset.rrtype == "SOA" {
                map_soa_hosts(content, |h| strip_dot(h).to_string())
            } else if HOSTNAME_TYPES.contains(&rrset.rrtype.as_str()) {
                strip_dot(content).to_string()
            } else {
                content.to_string()
            };
            out.push(ZoneRecord {
                id: None,
                zone: zone.to_string(),
                name: strip_dot(&rrset.name).to_string(),
                rtype: rrset.rrtype.clone(),
                content,
                ttl: rrset.ttl,
                prio,
            });
        }
    }
    out
}

fn api_content(record: &ZoneRecord) -> String {
    let content = if record.is_soa() {
        map_soa_hosts(&record.content, fqdn)
    } else if HOSTNAME_TYPES.contains(&record.rtype.as_str()) {
        fqdn(&record.content)
    } else {
        record.content.clone()
    };
    if has_prio(&record.rtype) {
        format!("{} {content}", record.prio)
    } else {
        content
    }
}

/// Group records into `REPLACE` rrsets keyed by name and type, in first-seen
/// order. An rrset takes the TTL of its first record.
pub fn records_to_rrsets(records: &[ZoneRecord]) -> Vec<PdnsRrset> {
    let mut rrsets: Vec<PdnsRrset> = Vec::new();
    for record in records {
        let name = fqdn(&record.name);
        let entry = PdnsRecord {
            content: api_content(record),
            disabled: false,
        };
        match rrsets
            .iter_mut()
            .find(|r| r.name == name && r.rrtype == record.rtype)
        {
            Some(rrset) => rrset.records.push(entry),
            None => rrsets.push(PdnsRrset {
                name,
                rrtype: record.rtype.clone(),
                ttl: record.ttl,
                changetype: Some("REPLACE".to_string()),
                records: vec![entry],
            }),
        }
    }
    rrsets
}
