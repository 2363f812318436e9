//! Instance → template: turning a zone's concrete records back into
//! placeholder form.
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use super::ZoneRecord;
use super::domain::parse_domain;
use super::placeholder::Placeholder;

lazy_static::lazy_static! {
    /// Ten digits, the shape of a `YYYYMMDDnn` serial
    static ref SERIAL_RE: Regex = Regex::new(r"^\d{10}$").unwrap();
}

/// Known values that mark SOA fields as placeholders.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub ns1: Option<String>,
    pub hostmaster: Option<String>,
}

/// Templatized name and content of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Templatized {
    pub name: String,
    pub content: String,
}

fn zone_suffix_regex(zone_name: &str) -> Option<Regex> {
    match Regex::new(&format!(r"(\.)?{}$", regex::escape(zone_name))) {
        Ok(re) => Some(re),
        Err(err) => {
            warn!(zone = zone_name, %err, "cannot build zone pattern");
            None
        }
    }
}

/// Replace the zone-derived parts of `record` with placeholders.
///
/// The zone name is replaced where it ends `name` and `content`. In content,
/// the hyphenated `domain-tld` form is replaced everywhere. For SOA records
/// the primary nameserver and mailbox are replaced when they equal the
/// configured values, and a ten-digit serial becomes `[SERIAL]`.
pub fn extract(zone_name: &str, record: &ZoneRecord, options: &ExtractOptions) -> Templatized {
    let unchanged = Templatized {
        name: record.name.clone(),
        content: record.content.clone(),
    };
    if zone_name.is_empty() {
        return unchanged;
    }
    let Some(zone_re) = zone_suffix_regex(zone_name) else {
        return unchanged;
    };

    let replacement = format!("${{1}}{}", Placeholder::Zone.token());
    let name = zone_re.replace_all(&record.name, replacement.as_str()).into_owned();
    let mut content = zone_re
        .replace_all(&record.content, replacement.as_str())
        .into_owned();

    let parsed = parse_domain(zone_name);
    if !parsed.domain.is_empty() && !parsed.tld.is_empty() {
        let hyphenated = format!("{}-{}", parsed.domain, parsed.tld);
        if content.contains(&hyphenated) {
            let tokens = format!(
                "{}-{}",
                Placeholder::Domain.token(),
                Placeholder::Tld.token()
            );
            content = content.replace(&hyphenated, &tokens);
        }
    }

    if record.is_soa() {
        content = templatize_soa(&content, options);
    }

    Templatized { name, content }
}

fn templatize_soa(content: &str, options: &ExtractOptions) -> String {
    let mut parts: Vec<&str> = content.split(' ').collect();

    if let (Some(ns1), Some(field)) = (options.ns1.as_deref(), parts.get_mut(0)) {
        if *field == ns1 {
            *field = Placeholder::Ns1.token();
        }
    }
    if let (Some(hostmaster), Some(field)) = (options.hostmaster.as_deref(), parts.get_mut(1)) {
        if *field == hostmaster {
            *field = Placeholder::Hostmaster.token();
        }
    }
    if let Some(field) = parts.get_mut(2) {
        if SERIAL_RE.is_match(field) {
            *field = Placeholder::Serial.token();
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, rtype: &str, content: &str) -> ZoneRecord {
        ZoneRecord {
            id: None,
            zone: "example.com".into(),
            name: name.into(),
            rtype: rtype.into(),
            content: content.into(),
            ttl: 3600,
            prio: 0,
        }
    }

    fn extracted(zone: &str, name: &str, rtype: &str, content: &str) -> (String, String) {
        let t = extract(zone, &record(name, rtype, content), &ExtractOptions::default());
        (t.name, t.content)
    }

    #[test]
    fn zone_suffix_in_name_and_content() {
        assert_eq!(
            extracted("example.com", "www.example.com", "A", "192.168.1.1"),
            ("www.[ZONE]".into(), "192.168.1.1".into())
        );
        assert_eq!(
            extracted("example.com", "@", "CNAME", "mail.example.com"),
            ("@".into(), "mail.[ZONE]".into())
        );
        assert_eq!(
            extracted("example.org", "deep.sub.level.example.org", "CNAME", "target.example.org"),
            ("deep.sub.level.[ZONE]".into(), "target.[ZONE]".into())
        );
        assert_eq!(
            extracted("example.com", "example.com", "NS", "ns1.example.com"),
            ("[ZONE]".into(), "ns1.[ZONE]".into())
        );
    }

    #[test]
    fn only_the_end_is_replaced() {
        assert_eq!(
            extracted("company.org", "_dmarc.company.org", "TXT", "v=DMARC1; p=reject; rua=mailto:dmarc@company.org"),
            ("_dmarc.[ZONE]".into(), "v=DMARC1; p=reject; rua=mailto:dmarc@[ZONE]".into())
        );
        assert_eq!(
            extracted("service.com", "_http._tcp.service.com", "SRV", "10 80 server.service.com"),
            ("_http._tcp.[ZONE]".into(), "10 80 server.[ZONE]".into())
        );
        assert_eq!(
            extracted("example.com", "other.domain.com", "CNAME", "target.org"),
            ("other.domain.com".into(), "target.org".into())
        );
        assert_eq!(
            extracted("secure.com", "secure.com", "CAA", "0 issue \"letsencrypt.org\""),
            ("[ZONE]".into(), "0 issue \"letsencrypt.org\"".into())
        );
    }

    #[test]
    fn empty_zone_is_a_no_op() {
        assert_eq!(
            extracted("", "www.example.com", "A", "192.168.1.1"),
            ("www.example.com".into(), "192.168.1.1".into())
        );
    }

    #[test]
    fn matching_is_case_sensitive_and_literal() {
        assert_eq!(
            extracted("Example.Com", "www.Example.Com", "CNAME", "mail.Example.Com"),
            ("www.[ZONE]".into(), "mail.[ZONE]".into())
        );
        assert_eq!(
            extracted("example.com", "www.EXAMPLE.COM", "A", "192.0.2.1"),
            ("www.EXAMPLE.COM".into(), "192.0.2.1".into())
        );
        // The dot in the zone name is not a wildcard.
        assert_eq!(
            extracted("example.com", "examplexcom", "A", "192.0.2.1"),
            ("examplexcom".into(), "192.0.2.1".into())
        );
    }

    #[test]
    fn hyphenated_domain_in_content() {
        assert_eq!(
            extracted(
                "example.com",
                "@",
                "MX",
                "mail.protection.outlook.com example-com.mail.protection.outlook.com"
            ),
            (
                "@".into(),
                "mail.protection.outlook.com [DOMAIN]-[TLD].mail.protection.outlook.com".into()
            )
        );
        // Bare domain or TLD labels are not touched.
        assert_eq!(
            extracted("example.com", "@", "TXT", "example com"),
            ("@".into(), "example com".into())
        );
    }

    #[test]
    fn soa_fields() {
        let options = ExtractOptions {
            ns1: Some("ns1.example.net".into()),
            hostmaster: Some("hostmaster.example.com".into()),
        };
        let t = extract(
            "example.com",
            &record(
                "example.com",
                "SOA",
                "ns1.example.net hostmaster.example.com 2024010100 28800 7200 604800 86400",
            ),
            &options,
        );
        assert_eq!(t.name, "[ZONE]");
        assert_eq!(
            t.content,
            "[NS1] [HOSTMASTER] [SERIAL] 28800 7200 604800 86400"
        );
    }

    #[test]
    fn soa_serial_pattern() {
        let (_, content) = extracted("test.org", "test.org", "SOA", "a.test.org b.test.org 12345 1 2 3 4");
        assert_eq!(content, "a.test.org b.test.org 12345 1 2 3 4");

        let (_, content) = extracted("test.org", "test.org", "SOA", "a.test.org b.test.org 2024120501 1 2 3 4");
        assert_eq!(content, "a.test.org b.test.org [SERIAL] 1 2 3 4");

        // Eleven digits are not a serial either.
        let (_, content) = extracted("test.org", "test.org", "SOA", "a b 20241205011 1 2 3 4");
        assert_eq!(content, "a b 20241205011 1 2 3 4");
    }

    #[test]
    fn soa_pass_ignores_other_types_and_short_content() {
        let (_, content) = extracted("test.org", "test.org", "TXT", "a b 2024120501");
        assert_eq!(content, "a b 2024120501");

        let (_, content) = extracted("test.org", "test.org", "SOA", "ns1");
        assert_eq!(content, "ns1");
    }
}
