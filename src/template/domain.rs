//! Splitting zone names into the labels used by `[DOMAIN]` and `[TLD]`.

/// Registrable label and top-level label of a zone name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDomain {
    pub domain: String,
    pub tld: String,
}

/// Split `fqdn` into its second-to-last and last labels.
///
/// A trailing dot is ignored. Single-label input yields the whole string as
/// `domain` and an empty `tld`; empty or malformed input yields empty
/// components. There is no public-suffix awareness: `example.co.uk` parses as
/// `co` / `uk`.
pub fn parse_domain(fqdn: &str) -> ParsedDomain {
    let fqdn = fqdn.strip_suffix('.').unwrap_or(fqdn);
    let mut labels = fqdn.rsplit('.');

    match (labels.next(), labels.next()) {
        (Some(tld), Some(domain)) => ParsedDomain {
            domain: domain.to_string(),
            tld: tld.to_string(),
        },
        (Some(single), None) => ParsedDomain {
            domain: single.to_string(),
            tld: String::new(),
        },
        _ => ParsedDomain::default(),
    }
}

/// Whether `zone` is an IPv4 or IPv6 reverse-mapping zone.
pub fn is_reverse_zone(zone: &str) -> bool {
    let zone = zone.trim_end_matches('.').to_ascii_lowercase();
    zone.ends_with("in-addr.arpa") || zone.ends_with("ip6.arpa")
}
