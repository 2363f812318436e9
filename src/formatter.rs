//! Content normalisation applied before records are persisted.

pub trait ContentFormatter: Send + Sync {
    fn format_content(&self, rtype: &str, content: &str) -> String;
}

/// PowerDNS expects TXT and SPF content as quoted character-strings.
#[derive(Debug, Clone, Default)]
pub struct DnsFormatter {
    pub txt_auto_quote: bool,
}

impl DnsFormatter {
    pub fn new(txt_auto_quote: bool) -> Self {
        Self { txt_auto_quote }
    }
}

fn is_quoted(content: &str) -> bool {
    content.len() >= 2 && content.starts_with('"') && content.ends_with('"')
}

fn quote(content: &str) -> String {
    format!("\"{}\"", content.replace('"', "\\\""))
}

impl ContentFormatter for DnsFormatter {
    fn format_content(&self, rtype: &str, content: &str) -> String {
        match rtype {
            "TXT" | "SPF" if self.txt_auto_quote && !is_quoted(content) => quote(content),
            _ => content.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_txt_when_enabled() {
        let f = DnsFormatter::new(true);
        assert_eq!(f.format_content("TXT", "v=spf1 -all"), "\"v=spf1 -all\"");
        assert_eq!(f.format_content("SPF", "say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(f.format_content("TXT", "\"already\""), "\"already\"");
        assert_eq!(f.format_content("A", "192.0.2.1"), "192.0.2.1");
    }

    #[test]
    fn leaves_content_alone_when_disabled() {
        let f = DnsFormatter::default();
        assert_eq!(f.format_content("TXT", "v=spf1 -all"), "v=spf1 -all");
    }
}
