//! Live zone records in the PowerDNS generic SQL schema.
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::store::ZoneRecordStore;
use crate::template::ZoneRecord;

#[derive(Clone)]
pub struct SqliteZoneRecordStore {
    db: SqlitePool,
}

impl SqliteZoneRecordStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create an empty native zone owned by `owner`, returning its domain id.
    pub async fn create_zone(&self, name: &str, owner: i64) -> anyhow::Result<i64> {
        let mut tx = self.db.begin().await?;
        let res = sqlx::query("INSERT INTO domains (name, type) VALUES (?, 'NATIVE')")
            .bind(name)
            .execute(&mut *tx)
            .await?;
        let domain_id = res.last_insert_rowid();
        sqlx::query("INSERT INTO zones (domain_id, owner, zone_templ_id) VALUES (?, ?, 0)")
            .bind(domain_id)
            .bind(owner)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::info!(zone = name, domain_id, "zone created");
        Ok(domain_id)
    }

    /// Insert a record that was not produced by a template.
    pub async fn add_record(&self, record: &ZoneRecord) -> anyhow::Result<i64> {
        let Some(domain_id) = self.domain_id(&record.zone).await? else {
            anyhow::bail!("zone {} does not exist", record.zone);
        };
        let res = sqlx::query(
            r#"
            INSERT INTO records (domain_id, name, type, content, ttl, prio)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(domain_id)
        .bind(&record.name)
        .bind(&record.rtype)
        .bind(&record.content)
        .bind(record.ttl)
        .bind(record.prio)
        .execute(&self.db)
        .await?;
        Ok(res.last_insert_rowid())
    }

    /// Template the zone was last built from, if any.
    pub async fn zone_template(&self, zone: &str) -> anyhow::Result<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT z.zone_templ_id FROM zones z
            JOIN domains d ON d.id = z.domain_id
            WHERE d.name = ? AND z.zone_templ_id != 0
            "#,
        )
        .bind(zone)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(|r| r.0))
    }

    async fn domain_id(&self, zone: &str) -> sqlx::Result<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM domains WHERE name = ?")
            .bind(zone)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(|r| r.0))
    }
}

fn record_from_row(zone: &str, row: &SqliteRow) -> sqlx::Result<ZoneRecord> {
    Ok(ZoneRecord {
        id: Some(row.try_get("id")?),
        zone: zone.to_string(),
        name: row.try_get("name")?,
        rtype: row.try_get("type")?,
        content: row.try_get("content")?,
        ttl: row.try_get("ttl")?,
        prio: row.try_get("prio")?,
    })
}

#[async_trait::async_trait]
impl ZoneRecordStore for SqliteZoneRecordStore {
    #[tracing::instrument(skip_all, fields(zone = %zone), level = "debug")]
    async fn zone_records(&self, zone: &str) -> anyhow::Result<Option<Vec<ZoneRecord>>> {
        let Some(domain_id) = self.domain_id(zone).await? else {
            return Ok(None);
        };
        let rows = sqlx::query(
            "SELECT id, name, type, content, ttl, prio FROM records WHERE domain_id = ? ORDER BY id",
        )
        .bind(domain_id)
        .fetch_all(&self.db)
        .await?;

        let records = rows
            .iter()
            .map(|row| record_from_row(zone, row))
            .collect::<sqlx::Result<_>>()?;
        Ok(Some(records))
    }

    #[tracing::instrument(skip_all, fields(zone = %zone, template = template_id, records = records.len()), level = "debug")]
    async fn replace_template_records(
        &self,
        zone: &str,
        template_id: i64,
        records: &[ZoneRecord],
    ) -> anyhow::Result<()> {
        let Some(domain_id) = self.domain_id(zone).await? else {
            anyhow::bail!("zone {zone} does not exist");
        };
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM records WHERE id IN (
                SELECT record_id FROM records_zone_templ
                WHERE domain_id = ? AND zone_templ_id = ?
            )
            "#,
        )
        .bind(domain_id)
        .bind(template_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM records_zone_templ WHERE domain_id = ? AND zone_templ_id = ?")
            .bind(domain_id)
            .bind(template_id)
            .execute(&mut *tx)
            .await?;

        if records.iter().any(ZoneRecord::is_soa) {
            sqlx::query("DELETE FROM records WHERE domain_id = ? AND type = 'SOA'")
                .bind(domain_id)
                .execute(&mut *tx)
                .await?;
        }

        for record in records {
            let res = sqlx::query(
                r#"
                INSERT INTO records (domain_id, name, type, content, ttl, prio)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(domain_id)
            .bind(&record.name)
            .bind(&record.rtype)
            .bind(&record.content)
            .bind(record.ttl)
            .bind(record.prio)
            .execute(&mut *tx)
            .await?;
            sqlx::query(
                "INSERT INTO records_zone_templ (domain_id, record_id, zone_templ_id) VALUES (?, ?, ?)",
            )
            .bind(domain_id)
            .bind(res.last_insert_rowid())
            .bind(template_id)
            .execute(&mut *tx)
            .await?;
        }

        let updated = sqlx::query("UPDATE zones SET zone_templ_id = ? WHERE domain_id = ?")
            .bind(template_id)
            .bind(domain_id)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            sqlx::query("INSERT INTO zones (domain_id, owner, zone_templ_id) VALUES (?, 0, ?)")
                .bind(domain_id)
                .bind(template_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
