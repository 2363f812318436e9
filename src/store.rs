//! Storage seams the template service is written against.
use crate::template::{NewTemplate, NewTemplateRecord, TemplateRecord, ZoneRecord, ZoneTemplate};

/// Another template already holds the name being written.
#[derive(Debug, thiserror::Error)]
#[error("zone template name already in use")]
pub struct DuplicateTemplateName;

/// Persistence for zone templates and their records.
///
/// Implementations must make `create_template` and `delete_template` atomic:
/// either every row is written (or removed), or none is. Writes that hit a
/// taken name fail with [`DuplicateTemplateName`].
#[async_trait::async_trait]
pub trait TemplateStore: Send + Sync {
    /// Templates visible to `owner` (its own plus global ones), or all
    /// templates when `owner` is `None`. Ordered by name.
    async fn list_templates(&self, owner: Option<i64>) -> anyhow::Result<Vec<ZoneTemplate>>;

    async fn find_template(&self, id: i64) -> anyhow::Result<Option<ZoneTemplate>>;

    /// Whether another template already uses `name`.
    async fn name_exists(&self, name: &str, exclude_id: Option<i64>) -> anyhow::Result<bool>;

    /// Insert a template together with its initial records.
    async fn create_template(
        &self,
        template: &NewTemplate,
        records: &[NewTemplateRecord],
    ) -> anyhow::Result<i64>;

    async fn update_template(&self, id: i64, template: &NewTemplate) -> anyhow::Result<()>;

    /// Remove a template, its records and its zone cross-references.
    async fn delete_template(&self, id: i64) -> anyhow::Result<()>;

    async fn template_records(&self, template_id: i64) -> anyhow::Result<Vec<TemplateRecord>>;

    async fn find_record(&self, record_id: i64) -> anyhow::Result<Option<TemplateRecord>>;

    async fn add_record(&self, template_id: i64, record: &NewTemplateRecord) -> anyhow::Result<i64>;

    async fn update_record(&self, record_id: i64, record: &NewTemplateRecord) -> anyhow::Result<()>;

    async fn delete_record(&self, record_id: i64) -> anyhow::Result<()>;
}

/// Access to the live records of zones.
#[async_trait::async_trait]
pub trait ZoneRecordStore: Send + Sync {
    /// Current records of `zone`, or `None` when the zone does not exist.
    async fn zone_records(&self, zone: &str) -> anyhow::Result<Option<Vec<ZoneRecord>>>;

    /// Replace the records `zone` previously received from `template_id`
    /// with `records`. When `records` holds an SOA record it replaces the
    /// zone's current SOA.
    async fn replace_template_records(
        &self,
        zone: &str,
        template_id: i64,
        records: &[ZoneRecord],
    ) -> anyhow::Result<()>;
}
