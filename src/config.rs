//! Deployment settings consumed by the template engine.
use chrono::{Local, NaiveDate, Utc};
use serde::Deserialize;

/// SOA timer values, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SoaTimers {
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

impl Default for SoaTimers {
    fn default() -> Self {
        Self {
            refresh: 28800,
            retry: 7200,
            expire: 604800,
            minimum: 86400,
        }
    }
}

impl SoaTimers {
    /// The four timers joined by single spaces, in SOA field order.
    pub fn as_soa_fields(&self) -> String {
        format!(
            "{} {} {} {}",
            self.refresh, self.retry, self.expire, self.minimum
        )
    }
}

/// Which calendar the generated `[SERIAL]` date is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerialClock {
    #[default]
    Utc,
    Local,
}

impl SerialClock {
    pub fn today(self) -> NaiveDate {
        match self {
            SerialClock::Utc => Utc::now().date_naive(),
            SerialClock::Local => Local::now().date_naive(),
        }
    }
}

/// What triggers appending the SOA timers to a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SoaCompletion {
    /// Any resolved value containing the text `SOA` (historic behaviour).
    #[default]
    ContentSubstring,
    /// Only the content of records whose type is `SOA`.
    RecordType,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    pub ns1: String, // "ns1.example.net"
    pub ns2: String,
    pub ns3: String,
    pub ns4: String,
    pub hostmaster: String, // "hostmaster.example.net"
    pub soa: SoaTimers,
    pub default_ttl: u32,
    pub serial_clock: SerialClock,
    pub soa_completion: SoaCompletion,
    pub txt_auto_quote: bool,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            ns1: String::new(),
            ns2: String::new(),
            ns3: String::new(),
            ns4: String::new(),
            hostmaster: String::new(),
            soa: SoaTimers::default(),
            default_ttl: 86400,
            serial_clock: SerialClock::default(),
            soa_completion: SoaCompletion::default(),
            txt_auto_quote: false,
        }
    }
}

impl DnsConfig {
    /// Nameservers in `[NS1]`..`[NS4]` order.
    pub fn nameservers(&self) -> [&str; 4] {
        [&self.ns1, &self.ns2, &self.ns3, &self.ns4]
    }

    /// Content of the SOA record every new template starts with.
    pub fn bootstrap_soa_content(&self) -> String {
        format!("[NS1] [HOSTMASTER] [SERIAL] {}", self.soa.as_soa_fields())
    }
}
