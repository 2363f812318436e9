//! Template → instance: replacing placeholder tokens with zone values.
use super::placeholder::{PLACEHOLDERS, PlaceholderContext};
use super::{NewTemplateRecord, ZoneRecord};
use crate::config::{SoaCompletion, SoaTimers};

/// SOA content has primary NS, mailbox, serial and four timers.
const SOA_FIELD_COUNT: usize = 7;

/// Replace every placeholder token in `value`, in `PLACEHOLDERS` order.
/// Tokens whose value is empty stay in place.
pub fn substitute_tokens(value: &str, ctx: &PlaceholderContext) -> String {
    PLACEHOLDERS.iter().fold(value.to_string(), |acc, placeholder| {
        let resolved = ctx.value(*placeholder);
        if resolved.is_empty() || !acc.contains(placeholder.token()) {
            acc
        } else {
            acc.replace(placeholder.token(), &resolved)
        }
    })
}

/// Append the SOA timers when `value` has fewer than seven space-separated
/// fields.
pub fn complete_soa(value: String, timers: &SoaTimers) -> String {
    if value.split(' ').count() < SOA_FIELD_COUNT {
        format!("{value} {}", timers.as_soa_fields())
    } else {
        value
    }
}

/// Resolve `value` for the zone in `ctx`.
///
/// After substitution, any result containing the text `SOA` is completed
/// with the configured timers. The check is on the substituted text, not on
/// a record type; see [`Resolver`] for the type-based variant.
pub fn resolve(value: &str, ctx: &PlaceholderContext) -> String {
    let resolved = substitute_tokens(value, ctx);
    if resolved.contains("SOA") {
        complete_soa(resolved, &ctx.timers)
    } else {
        resolved
    }
}

/// Resolves whole template records for one zone.
pub struct Resolver<'a> {
    ctx: &'a PlaceholderContext,
    completion: SoaCompletion,
}

impl<'a> Resolver<'a> {
    pub fn new(ctx: &'a PlaceholderContext, completion: SoaCompletion) -> Self {
        Self { ctx, completion }
    }

    /// Concrete `(name, content)` for a template record. SOA completion only
    /// ever applies to the content.
    pub fn resolve_fields(&self, name: &str, rtype: &str, content: &str) -> (String, String) {
        let name = substitute_tokens(name, self.ctx);
        let content = match self.completion {
            SoaCompletion::ContentSubstring => resolve(content, self.ctx),
            SoaCompletion::RecordType if rtype == "SOA" => {
                complete_soa(substitute_tokens(content, self.ctx), &self.ctx.timers)
            }
            SoaCompletion::RecordType => substitute_tokens(content, self.ctx),
        };
        (name, content)
    }

    /// Instantiate `record` as a record of the context's zone. A zero TTL
    /// becomes `default_ttl`.
    pub fn resolve_record(&self, record: &NewTemplateRecord, default_ttl: u32) -> ZoneRecord {
        let (name, content) = self.resolve_fields(&record.name, &record.rtype, &record.content);
        ZoneRecord {
            id: None,
            zone: self.ctx.zone.clone(),
            name,
            rtype: record.rtype.clone(),
            content,
            ttl: if record.ttl == 0 { default_ttl } else { record.ttl },
            prio: record.prio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DnsConfig;
    use chrono::NaiveDate;

    fn ctx() -> PlaceholderContext {
        let config = DnsConfig {
            ns1: "ns1.example.net".into(),
            ns2: "ns2.example.net".into(),
            hostmaster: "hostmaster.example.net".into(),
            ..DnsConfig::default()
        };
        PlaceholderContext::for_date(
            "example.com",
            &config,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        )
    }

    #[test]
    fn zone_token() {
        let ctx = ctx();
        assert_eq!(resolve("[ZONE]", &ctx), "example.com");
        assert_eq!(resolve("www.[ZONE]", &ctx), "www.example.com");
    }

    #[test]
    fn every_token_resolves() {
        let ctx = ctx();
        assert_eq!(
            resolve("[DOMAIN]-[TLD].mail.protection.outlook.com", &ctx),
            "example-com.mail.protection.outlook.com"
        );
        assert_eq!(
            resolve(
                "[NS1] [HOSTMASTER] [SERIAL] [SOA_REFRESH] [SOA_RETRY] [SOA_EXPIRE] [SOA_MINIMUM]",
                &ctx
            ),
            "ns1.example.net hostmaster.example.net 2024060100 28800 7200 604800 86400"
        );
        assert_eq!(resolve("[NS2]", &ctx), "ns2.example.net");
    }

    #[test]
    fn empty_values_leave_tokens() {
        let ctx = ctx();
        assert_eq!(resolve("[NS3]", &ctx), "[NS3]");

        let config = DnsConfig::default();
        let single = PlaceholderContext::for_zone("localhost", &config);
        assert_eq!(resolve("[DOMAIN].[TLD]", &single), "localhost.[TLD]");
    }

    #[test]
    fn soa_substring_triggers_completion() {
        let ctx = ctx();
        let resolved = resolve("SOA [NS1] [HOSTMASTER] [SERIAL]", &ctx);
        let parts: Vec<&str> = resolved.split(' ').collect();
        assert!(parts.len() >= 7);
        assert_eq!(&parts[parts.len() - 4..], ["28800", "7200", "604800", "86400"]);
    }

    #[test]
    fn completion_limits_of_the_substring_check() {
        let ctx = ctx();
        // An SOA content without the literal text is left short...
        assert_eq!(
            resolve("[NS1] [HOSTMASTER] [SERIAL]", &ctx),
            "ns1.example.net hostmaster.example.net 2024060100"
        );
        // ...while unrelated text mentioning SOA is completed.
        assert_eq!(
            resolve("v=spf1 SOA-test", &ctx),
            "v=spf1 SOA-test 28800 7200 604800 86400"
        );
        // Seven fields already present: untouched.
        assert_eq!(resolve("SOA a b c d e f", &ctx), "SOA a b c d e f");
    }

    #[test]
    fn names_are_never_completed() {
        let ctx = ctx();
        for completion in [SoaCompletion::ContentSubstring, SoaCompletion::RecordType] {
            let resolver = Resolver::new(&ctx, completion);
            let (name, content) = resolver.resolve_fields("SOA-monitor.[ZONE]", "A", "192.0.2.1");
            assert_eq!(name, "SOA-monitor.example.com");
            assert_eq!(content, "192.0.2.1");
        }
    }

    #[test]
    fn record_type_completion() {
        let ctx = ctx();
        let resolver = Resolver::new(&ctx, SoaCompletion::RecordType);
        let (_, content) = resolver.resolve_fields("[ZONE]", "SOA", "[NS1] [HOSTMASTER] [SERIAL]");
        assert_eq!(
            content,
            "ns1.example.net hostmaster.example.net 2024060100 28800 7200 604800 86400"
        );
        let (_, content) = resolver.resolve_fields("[ZONE]", "TXT", "SOA mention");
        assert_eq!(content, "SOA mention");
    }

    #[test]
    fn resolve_record_applies_default_ttl() {
        let ctx = ctx();
        let resolver = Resolver::new(&ctx, SoaCompletion::ContentSubstring);
        let record = NewTemplateRecord {
            name: "mail.[ZONE]".into(),
            rtype: "MX".into(),
            content: "mx.[ZONE]".into(),
            ttl: 0,
            prio: 10,
        };
        let resolved = resolver.resolve_record(&record, 3600);
        assert_eq!(resolved.zone, "example.com");
        assert_eq!(resolved.name, "mail.example.com");
        assert_eq!(resolved.content, "mx.example.com");
        assert_eq!(resolved.ttl, 3600);
        assert_eq!(resolved.prio, 10);
    }
}
