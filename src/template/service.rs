//! Template operations: create, save-as, instantiate, apply and CRUD.
use std::sync::Arc;

use tracing::{debug, info};

use super::domain::is_reverse_zone;
use super::extract::{ExtractOptions, extract};
use super::placeholder::PlaceholderContext;
use super::serial::{next_serial, set_soa_serial, soa_serial};
use super::substitute::Resolver;
use super::{
    NewTemplate, NewTemplateRecord, TemplateDetails, TemplateOwner, TemplateRecord, ZoneRecord,
    ZoneTemplate,
};
use crate::auth::{Permission, PermissionContext};
use crate::config::DnsConfig;
use crate::error::{AppError, AppResult};
use crate::formatter::{ContentFormatter, DnsFormatter};
use crate::store::{DuplicateTemplateName, TemplateStore, ZoneRecordStore};
use crate::validation::{validate_template_name, validate_template_record, validate_zone_name};

const DUPLICATE_NAME: &str =
    "zone template with this name already exists, please choose another one";

/// Store failure on a template write. A name taken between the uniqueness
/// check and the write is still a conflict.
fn write_error(err: anyhow::Error) -> AppError {
    if err.is::<DuplicateTemplateName>() {
        AppError::conflict(DUPLICATE_NAME)
    } else {
        AppError::store(err)
    }
}

pub struct TemplateService {
    config: DnsConfig,
    templates: Arc<dyn TemplateStore>,
    zones: Arc<dyn ZoneRecordStore>,
    formatter: Arc<dyn ContentFormatter>,
}

impl TemplateService {
    pub fn new(
        config: DnsConfig,
        templates: Arc<dyn TemplateStore>,
        zones: Arc<dyn ZoneRecordStore>,
    ) -> Self {
        let formatter = Arc::new(DnsFormatter::new(config.txt_auto_quote));
        Self {
            config,
            templates,
            zones,
            formatter,
        }
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn ContentFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn config(&self) -> &DnsConfig {
        &self.config
    }

    /// The SOA record every template starts with.
    pub fn bootstrap_soa(&self) -> NewTemplateRecord {
        NewTemplateRecord {
            name: "[ZONE]".into(),
            rtype: "SOA".into(),
            content: self.config.bootstrap_soa_content(),
            ttl: self.config.default_ttl,
            prio: 0,
        }
    }

    /// SOA field values recognised when deriving a template from a zone.
    pub fn default_extract_options(&self) -> ExtractOptions {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        ExtractOptions {
            ns1: non_empty(&self.config.ns1),
            hostmaster: non_empty(&self.config.hostmaster),
        }
    }

    fn new_template(perm: &PermissionContext, details: &TemplateDetails) -> NewTemplate {
        NewTemplate {
            name: details.name.trim().to_string(),
            description: details.description.clone(),
            owner: if details.global {
                TemplateOwner::Global
            } else {
                TemplateOwner::User(perm.user_id)
            },
            created_by: Some(perm.user_id),
        }
    }

    fn prepare_record(&self, record: &NewTemplateRecord) -> AppResult<NewTemplateRecord> {
        validate_template_record(&record.name, &record.rtype, &record.content, record.prio)?;
        Ok(NewTemplateRecord {
            content: self.formatter.format_content(&record.rtype, &record.content),
            ..record.clone()
        })
    }

    async fn ensure_unique_name(&self, name: &str, exclude_id: Option<i64>) -> AppResult<()> {
        let exists = self
            .templates
            .name_exists(name, exclude_id)
            .await
            .map_err(AppError::store)?;
        if exists {
            return Err(AppError::conflict(DUPLICATE_NAME));
        }
        Ok(())
    }

    async fn load_visible(&self, perm: &PermissionContext, id: i64) -> AppResult<ZoneTemplate> {
        let template = self
            .templates
            .find_template(id)
            .await
            .map_err(AppError::store)?
            .ok_or(AppError::NotFound)?;
        if !perm.can_view(&template) {
            return Err(AppError::NotFound);
        }
        Ok(template)
    }

    async fn load_modifiable(&self, perm: &PermissionContext, id: i64) -> AppResult<ZoneTemplate> {
        let template = self.load_visible(perm, id).await?;
        if !perm.can_modify(&template) {
            return Err(AppError::forbidden(
                "you do not have the permission to edit this zone template",
            ));
        }
        Ok(template)
    }

    pub async fn list_templates(&self, perm: &PermissionContext) -> AppResult<Vec<ZoneTemplate>> {
        self.templates
            .list_templates(perm.visible_owner())
            .await
            .map_err(AppError::store)
    }

    pub async fn get_template(&self, perm: &PermissionContext, id: i64) -> AppResult<ZoneTemplate> {
        self.load_visible(perm, id).await
    }

    pub async fn template_records(
        &self,
        perm: &PermissionContext,
        id: i64,
    ) -> AppResult<Vec<TemplateRecord>> {
        self.load_visible(perm, id).await?;
        self.templates
            .template_records(id)
            .await
            .map_err(AppError::store)
    }

    /// Create an empty template holding only the bootstrap SOA record.
    pub async fn create_template(
        &self,
        perm: &PermissionContext,
        details: &TemplateDetails,
    ) -> AppResult<i64> {
        perm.require(Permission::ZoneMasterAdd, "add a zone template")?;
        validate_template_name(&details.name)?;
        let template = Self::new_template(perm, details);
        self.ensure_unique_name(&template.name, None).await?;

        let id = self
            .templates
            .create_template(&template, &[self.bootstrap_soa()])
            .await
            .map_err(write_error)?;

        info!(template_id = id, name = %template.name, "zone template created");
        Ok(id)
    }

    /// Derive a new template from the current records of `zone`.
    ///
    /// Every record is templatized with [`extract`]. When the zone has no SOA
    /// record the bootstrap SOA is added, so the template ends up with exactly
    /// one SOA either way.
    pub async fn save_as(
        &self,
        perm: &PermissionContext,
        zone: &str,
        details: &TemplateDetails,
        options: Option<ExtractOptions>,
    ) -> AppResult<i64> {
        perm.require(Permission::ZoneMasterAdd, "add a zone template")?;
        validate_template_name(&details.name)?;
        let template = Self::new_template(perm, details);
        self.ensure_unique_name(&template.name, None).await?;

        let zone_records = self
            .zones
            .zone_records(zone)
            .await
            .map_err(AppError::store)?
            .ok_or(AppError::NotFound)?;
        let options = options.unwrap_or_else(|| self.default_extract_options());

        let mut records = Vec::with_capacity(zone_records.len() + 1);
        let mut has_soa = false;
        for record in &zone_records {
            has_soa |= record.is_soa();
            let templatized = extract(zone, record, &options);
            // Live records may carry a stray prio on types that have none.
            let prio = match record.rtype.as_str() {
                "MX" | "SRV" => record.prio,
                _ => 0,
            };
            records.push(self.prepare_record(&NewTemplateRecord {
                name: templatized.name,
                rtype: record.rtype.clone(),
                content: templatized.content,
                ttl: record.ttl,
                prio,
            })?);
        }
        if !has_soa {
            debug!(zone, "zone has no SOA record, adding the default one");
            records.push(self.bootstrap_soa());
        }

        let id = self
            .templates
            .create_template(&template, &records)
            .await
            .map_err(write_error)?;

        info!(
            template_id = id,
            zone,
            records = records.len(),
            "zone template saved from zone"
        );
        Ok(id)
    }

    /// Rename, describe, or flip a template between owned and global.
    pub async fn update_template(
        &self,
        perm: &PermissionContext,
        id: i64,
        details: &TemplateDetails,
    ) -> AppResult<()> {
        let current = self.load_modifiable(perm, id).await?;
        validate_template_name(&details.name)?;
        let name = details.name.trim().to_string();
        self.ensure_unique_name(&name, Some(id)).await?;

        let owner = match (details.global, current.owner) {
            (true, _) => TemplateOwner::Global,
            (false, TemplateOwner::User(owner)) => TemplateOwner::User(owner),
            (false, TemplateOwner::Global) => TemplateOwner::User(perm.user_id),
        };
        let update = NewTemplate {
            name,
            description: details.description.clone(),
            owner,
            created_by: current.created_by,
        };

        self.templates
            .update_template(id, &update)
            .await
            .map_err(write_error)?;
        debug!(template_id = id, ?owner, "zone template updated");
        Ok(())
    }

    pub async fn delete_template(&self, perm: &PermissionContext, id: i64) -> AppResult<()> {
        perm.require(Permission::ZoneMasterAdd, "delete zone templates")?;
        self.load_modifiable(perm, id).await?;
        self.templates
            .delete_template(id)
            .await
            .map_err(AppError::store)?;
        info!(template_id = id, "zone template deleted");
        Ok(())
    }

    pub async fn add_record(
        &self,
        perm: &PermissionContext,
        template_id: i64,
        record: &NewTemplateRecord,
    ) -> AppResult<i64> {
        perm.require(Permission::ZoneMasterAdd, "add a record to this zone template")?;
        self.load_modifiable(perm, template_id).await?;
        let record = self.prepare_record(record)?;
        self.templates
            .add_record(template_id, &record)
            .await
            .map_err(AppError::store)
    }

    async fn load_record(
        &self,
        perm: &PermissionContext,
        record_id: i64,
    ) -> AppResult<TemplateRecord> {
        let record = self
            .templates
            .find_record(record_id)
            .await
            .map_err(AppError::store)?
            .ok_or(AppError::NotFound)?;
        self.load_modifiable(perm, record.template_id).await?;
        Ok(record)
    }

    pub async fn update_record(
        &self,
        perm: &PermissionContext,
        record_id: i64,
        record: &NewTemplateRecord,
    ) -> AppResult<()> {
        perm.require(Permission::ZoneMasterAdd, "edit this record")?;
        self.load_record(perm, record_id).await?;
        let record = self.prepare_record(record)?;
        self.templates
            .update_record(record_id, &record)
            .await
            .map_err(AppError::store)
    }

    /// Delete a template record. The last record of a template cannot go.
    pub async fn delete_record(&self, perm: &PermissionContext, record_id: i64) -> AppResult<()> {
        perm.require(Permission::ZoneMasterAdd, "delete this record")?;
        let record = self.load_record(perm, record_id).await?;
        let remaining = self
            .templates
            .template_records(record.template_id)
            .await
            .map_err(AppError::store)?
            .len();
        if remaining <= 1 {
            return Err(AppError::bad_request(
                "a zone template must keep at least one record",
            ));
        }
        self.templates
            .delete_record(record_id)
            .await
            .map_err(AppError::store)
    }

    /// Resolve `records` for the zone in `ctx`. Reverse zones only receive
    /// the NS and SOA records.
    pub fn instantiate_records(
        &self,
        records: &[TemplateRecord],
        ctx: &PlaceholderContext,
    ) -> Vec<ZoneRecord> {
        let resolver = Resolver::new(ctx, self.config.soa_completion);
        let reverse = is_reverse_zone(&ctx.zone);

        records
            .iter()
            .filter(|r| !reverse || r.rtype == "NS" || r.rtype == "SOA")
            .map(|r| {
                let mut record =
                    resolver.resolve_record(&NewTemplateRecord::from(r), self.config.default_ttl);
                record.content = self.formatter.format_content(&record.rtype, &record.content);
                record
            })
            .collect()
    }

    /// Concrete records `template_id` yields for `zone`, without storing them.
    pub async fn instantiate(
        &self,
        perm: &PermissionContext,
        template_id: i64,
        zone: &str,
    ) -> AppResult<Vec<ZoneRecord>> {
        let records = self.template_records(perm, template_id).await?;
        let ctx = PlaceholderContext::for_zone(zone, &self.config);
        Ok(self.instantiate_records(&records, &ctx))
    }

    /// Write the records of `template_id` into `zone`, replacing those a
    /// previous application of the same template produced. An existing SOA
    /// record is kept with its serial bumped.
    pub async fn apply_to_zone(
        &self,
        perm: &PermissionContext,
        template_id: i64,
        zone: &str,
    ) -> AppResult<Vec<ZoneRecord>> {
        perm.require(Permission::ZoneMasterAdd, "add a master zone")?;
        validate_zone_name(zone)?;

        let existing = self
            .zones
            .zone_records(zone)
            .await
            .map_err(AppError::store)?
            .ok_or(AppError::NotFound)?;
        let mut records = self.instantiate(perm, template_id, zone).await?;

        if let Some(current_soa) = existing.iter().find(|r| r.is_soa()) {
            let today = self.config.serial_clock.today();
            let serial = soa_serial(&current_soa.content)
                .map(|s| next_serial(s, today))
                .unwrap_or_else(|| next_serial("", today));
            for record in records.iter_mut().filter(|r| r.is_soa()) {
                record.content = set_soa_serial(&current_soa.content, &serial);
            }
        }

        self.zones
            .replace_template_records(zone, template_id, &records)
            .await
            .map_err(AppError::store)?;

        info!(
            template_id,
            zone,
            records = records.len(),
            "zone template applied"
        );
        Ok(records)
    }
}
