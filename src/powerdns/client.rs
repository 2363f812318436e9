use crate::powerdns::types::*;
use crate::store::ZoneRecordStore;
use crate::template::ZoneRecord;
use reqwest::{Client, StatusCode};
use serde::Serialize;

/// Live zones served through the PowerDNS HTTP API.
///
/// The API has no notion of template linkage, so applying a template
/// replaces whole rrsets by name and type.
#[derive(Clone)]
pub struct PowerDnsClient {
    http: Client,
    base_url: String, // e.g. "http://127.0.0.1:8081/api/v1"
    api_key: String,
    server_id: String, // usually "localhost"
}

impl PowerDnsClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        server_id: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            server_id: server_id.into(),
        }
    }

    fn auth_header(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("X-API-Key", &self.api_key)
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/servers/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.server_id,
            path.trim_start_matches('/')
        )
    }

    /// Fetch a zone with its rrsets. Unknown zones yield `None`.
    pub async fn get_zone(&self, name: &str) -> anyhow::Result<Option<PdnsZone>> {
        let url = self.url(&format!("zones/{}", fqdn(name)));
        let res = self.auth_header(self.http.get(url)).send().await?;
        match res.status() {
            StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => return Ok(None),
            s if !s.is_success() => anyhow::bail!("PowerDNS get_zone failed with {}", s),
            _ => {}
        }
        Ok(Some(res.json::<PdnsZone>().await?))
    }

    pub async fn patch_rrsets(&self, zone_name: &str, rrsets: &[PdnsRrset]) -> anyhow::Result<()> {
        #[derive(Serialize)]
        struct PatchBody<'a> {
            rrsets: &'a [PdnsRrset],
        }

        let url = self.url(&format!("zones/{}", fqdn(zone_name)));
        let body = PatchBody { rrsets };
        let res = self
            .auth_header(self.http.patch(url))
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            anyhow::bail!("PowerDNS patch_rrsets failed with {}", res.status());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ZoneRecordStore for PowerDnsClient {
    #[tracing::instrument(skip_all, fields(zone = %zone), level = "debug")]
    async fn zone_records(&self, zone: &str) -> anyhow::Result<Option<Vec<ZoneRecord>>> {
        let Some(pdns_zone) = self.get_zone(zone).await? else {
            return Ok(None);
        };
        Ok(Some(rrsets_to_records(&pdns_zone.name, &pdns_zone.rrsets)))
    }

    #[tracing::instrument(skip_all, fields(zone = %zone, template = template_id), level = "debug")]
    async fn replace_template_records(
        &self,
        zone: &str,
        template_id: i64,
        records: &[ZoneRecord],
    ) -> anyhow::Result<()> {
        let rrsets = records_to_rrsets(records);
        tracing::debug!(rrsets = rrsets.len(), "replacing rrsets");
        self.patch_rrsets(zone, &rrsets).await
    }
}
