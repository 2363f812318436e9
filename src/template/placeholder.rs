//! The placeholder vocabulary and the values it resolves to for one zone.
use std::borrow::Cow;

use chrono::NaiveDate;

use super::domain::parse_domain;
use super::serial::serial_for_date;
use crate::config::{DnsConfig, SoaTimers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Zone,
    Domain,
    Tld,
    Serial,
    Ns1,
    Ns2,
    Ns3,
    Ns4,
    Hostmaster,
    SoaRefresh,
    SoaRetry,
    SoaExpire,
    SoaMinimum,
}

/// Every placeholder, in the order substitution applies them.
pub const PLACEHOLDERS: [Placeholder; 13] = [
    Placeholder::Zone,
    Placeholder::Domain,
    Placeholder::Tld,
    Placeholder::Serial,
    Placeholder::Ns1,
    Placeholder::Ns2,
    Placeholder::Ns3,
    Placeholder::Ns4,
    Placeholder::Hostmaster,
    Placeholder::SoaRefresh,
    Placeholder::SoaRetry,
    Placeholder::SoaExpire,
    Placeholder::SoaMinimum,
];

impl Placeholder {
    pub const fn token(self) -> &'static str {
        match self {
            Placeholder::Zone => "[ZONE]",
            Placeholder::Domain => "[DOMAIN]",
            Placeholder::Tld => "[TLD]",
            Placeholder::Serial => "[SERIAL]",
            Placeholder::Ns1 => "[NS1]",
            Placeholder::Ns2 => "[NS2]",
            Placeholder::Ns3 => "[NS3]",
            Placeholder::Ns4 => "[NS4]",
            Placeholder::Hostmaster => "[HOSTMASTER]",
            Placeholder::SoaRefresh => "[SOA_REFRESH]",
            Placeholder::SoaRetry => "[SOA_RETRY]",
            Placeholder::SoaExpire => "[SOA_EXPIRE]",
            Placeholder::SoaMinimum => "[SOA_MINIMUM]",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        PLACEHOLDERS.into_iter().find(|p| p.token() == token)
    }
}

/// Resolved values for instantiating templates into one zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderContext {
    pub zone: String,
    pub domain: String,
    pub tld: String,
    pub nameservers: [String; 4],
    pub hostmaster: String,
    pub timers: SoaTimers,
    pub serial: String,
}

impl PlaceholderContext {
    /// Context for `zone`, with the serial dated by the configured clock.
    pub fn for_zone(zone: &str, config: &DnsConfig) -> Self {
        Self::for_date(zone, config, config.serial_clock.today())
    }

    /// Context for `zone` with the serial generated for `date`.
    pub fn for_date(zone: &str, config: &DnsConfig, date: NaiveDate) -> Self {
        let parsed = parse_domain(zone);
        Self {
            zone: zone.to_string(),
            domain: parsed.domain,
            tld: parsed.tld,
            nameservers: config.nameservers().map(str::to_string),
            hostmaster: config.hostmaster.clone(),
            timers: config.soa,
            serial: serial_for_date(date),
        }
    }

    /// Value substituted for `placeholder`. Empty means "leave the token".
    pub fn value(&self, placeholder: Placeholder) -> Cow<'_, str> {
        match placeholder {
            Placeholder::Zone => Cow::Borrowed(&self.zone),
            Placeholder::Domain => Cow::Borrowed(&self.domain),
            Placeholder::Tld => Cow::Borrowed(&self.tld),
            Placeholder::Serial => Cow::Borrowed(&self.serial),
            Placeholder::Ns1 => Cow::Borrowed(&self.nameservers[0]),
            Placeholder::Ns2 => Cow::Borrowed(&self.nameservers[1]),
            Placeholder::Ns3 => Cow::Borrowed(&self.nameservers[2]),
            Placeholder::Ns4 => Cow::Borrowed(&self.nameservers[3]),
            Placeholder::Hostmaster => Cow::Borrowed(&self.hostmaster),
            Placeholder::SoaRefresh => Cow::Owned(self.timers.refresh.to_string()),
            Placeholder::SoaRetry => Cow::Owned(self.timers.retry.to_string()),
            Placeholder::SoaExpire => Cow::Owned(self.timers.expire.to_string()),
            Placeholder::SoaMinimum => Cow::Owned(self.timers.minimum.to_string()),
        }
    }
}
