//! SQLite-backed storage for `zone_templ` and `zone_templ_records`.
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::store::{DuplicateTemplateName, TemplateStore};
use crate::template::{NewTemplate, NewTemplateRecord, TemplateOwner, TemplateRecord, ZoneTemplate};

#[derive(Clone)]
pub struct SqliteTemplateStore {
    db: SqlitePool,
}

impl SqliteTemplateStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

fn template_from_row(row: &SqliteRow) -> sqlx::Result<ZoneTemplate> {
    Ok(ZoneTemplate {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("descr")?,
        owner: TemplateOwner::from_column(row.try_get("owner")?),
        created_by: row.try_get("created_by")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn record_from_row(row: &SqliteRow) -> sqlx::Result<TemplateRecord> {
    Ok(TemplateRecord {
        id: row.try_get("id")?,
        template_id: row.try_get("zone_templ_id")?,
        name: row.try_get("name")?,
        rtype: row.try_get("type")?,
        content: row.try_get("content")?,
        ttl: row.try_get("ttl")?,
        prio: row.try_get("prio")?,
    })
}

/// `zone_templ.name` is UNIQUE; a violation on it is reported as a
/// [`DuplicateTemplateName`].
fn name_taken(err: sqlx::Error) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => DuplicateTemplateName.into(),
        _ => err.into(),
    }
}

const TEMPLATE_COLUMNS: &str = "id, name, descr, owner, created_by, created_at, updated_at";
const RECORD_COLUMNS: &str = "id, zone_templ_id, name, type, content, ttl, prio";

#[async_trait::async_trait]
impl TemplateStore for SqliteTemplateStore {
    #[tracing::instrument(skip_all, fields(owner = ?owner), level = "debug")]
    async fn list_templates(&self, owner: Option<i64>) -> anyhow::Result<Vec<ZoneTemplate>> {
        let rows = sqlx::query(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM zone_templ \
             WHERE ?1 IS NULL OR owner = ?1 OR owner = 0 \
             ORDER BY name"
        ))
        .bind(owner)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .iter()
            .map(template_from_row)
            .collect::<sqlx::Result<_>>()?)
    }

    #[tracing::instrument(skip_all, fields(template = id), level = "debug")]
    async fn find_template(&self, id: i64) -> anyhow::Result<Option<ZoneTemplate>> {
        let row = sqlx::query(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM zone_templ WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.as_ref().map(template_from_row).transpose()?)
    }

    async fn name_exists(&self, name: &str, exclude_id: Option<i64>) -> anyhow::Result<bool> {
        let cnt: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM zone_templ WHERE name = ? AND (? IS NULL OR id != ?)",
        )
        .bind(name)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_one(&self.db)
        .await?;
        Ok(cnt.0 > 0)
    }

    #[tracing::instrument(skip_all, fields(name = %template.name, records = records.len()), level = "debug")]
    async fn create_template(
        &self,
        template: &NewTemplate,
        records: &[NewTemplateRecord],
    ) -> anyhow::Result<i64> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        let res = sqlx::query(
            r#"
            INSERT INTO zone_templ (name, descr, owner, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&template.name)
        .bind(&template.description)
        .bind(template.owner.as_column())
        .bind(template.created_by)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(name_taken)?;
        let template_id = res.last_insert_rowid();

        for record in records {
            insert_record(&mut tx, template_id, record).await?;
        }

        tx.commit().await?;
        tracing::debug!(template_id, "template committed");
        Ok(template_id)
    }

    async fn update_template(&self, id: i64, template: &NewTemplate) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE zone_templ
            SET name = ?, descr = ?, owner = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&template.name)
        .bind(&template.description)
        .bind(template.owner.as_column())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.db)
        .await
        .map_err(name_taken)?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(template = id), level = "debug")]
    async fn delete_template(&self, id: i64) -> anyhow::Result<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM records_zone_templ WHERE zone_templ_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE zones SET zone_templ_id = 0 WHERE zone_templ_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM zone_templ_records WHERE zone_templ_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM zone_templ WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn template_records(&self, template_id: i64) -> anyhow::Result<Vec<TemplateRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM zone_templ_records WHERE zone_templ_id = ? ORDER BY id"
        ))
        .bind(template_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .iter()
            .map(record_from_row)
            .collect::<sqlx::Result<_>>()?)
    }

    async fn find_record(&self, record_id: i64) -> anyhow::Result<Option<TemplateRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM zone_templ_records WHERE id = ?"
        ))
        .bind(record_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.as_ref().map(record_from_row).transpose()?)
    }

    async fn add_record(&self, template_id: i64, record: &NewTemplateRecord) -> anyhow::Result<i64> {
        let mut tx = self.db.begin().await?;
        let id = insert_record(&mut tx, template_id, record).await?;
        touch(&mut tx, template_id).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn update_record(&self, record_id: i64, record: &NewTemplateRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE zone_templ_records
            SET name = ?, type = ?, content = ?, ttl = ?, prio = ?
            WHERE id = ?
            "#,
        )
        .bind(&record.name)
        .bind(&record.rtype)
        .bind(&record.content)
        .bind(record.ttl)
        .bind(record.prio)
        .bind(record_id)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn delete_record(&self, record_id: i64) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM zone_templ_records WHERE id = ?")
            .bind(record_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

async fn insert_record(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    template_id: i64,
    record: &NewTemplateRecord,
) -> sqlx::Result<i64> {
    let res = sqlx::query(
        r#"
        INSERT INTO zone_templ_records (zone_templ_id, name, type, content, ttl, prio)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(template_id)
    .bind(&record.name)
    .bind(&record.rtype)
    .bind(&record.content)
    .bind(record.ttl)
    .bind(record.prio)
    .execute(&mut **tx)
    .await?;
    Ok(res.last_insert_rowid())
}

async fn touch(tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>, template_id: i64) -> sqlx::Result<()> {
    sqlx::query("UPDATE zone_templ SET updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(template_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_db;

    fn soa() -> NewTemplateRecord {
        NewTemplateRecord {
            name: "[ZONE]".into(),
            rtype: "SOA".into(),
            content: "[NS1] [HOSTMASTER] [SERIAL] 28800 7200 604800 86400".into(),
            ttl: 86400,
            prio: 0,
        }
    }

    fn new_template(name: &str, owner: TemplateOwner) -> NewTemplate {
        NewTemplate {
            name: name.into(),
            description: "desc".into(),
            owner,
            created_by: Some(1),
        }
    }

    #[tokio::test]
    async fn create_and_read_back() {
        let store = SqliteTemplateStore::new(init_memory_db().await.unwrap());
        let id = store
            .create_template(&new_template("basic", TemplateOwner::User(1)), &[soa()])
            .await
            .unwrap();

        let template = store.find_template(id).await.unwrap().unwrap();
        assert_eq!(template.name, "basic");
        assert_eq!(template.owner, TemplateOwner::User(1));

        let records = store.template_records(id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, soa().content);
        assert!(store.name_exists("basic", None).await.unwrap());
        assert!(!store.name_exists("basic", Some(id)).await.unwrap());
    }

    #[tokio::test]
    async fn failing_record_rolls_back_template() {
        let store = SqliteTemplateStore::new(init_memory_db().await.unwrap());
        let bad = NewTemplateRecord {
            name: "[ZONE]".into(),
            rtype: "MX".into(),
            content: "mail.[ZONE]".into(),
            ttl: 0,
            prio: 70000,
        };
        let res = store
            .create_template(&new_template("broken", TemplateOwner::Global), &[soa(), bad])
            .await;
        assert!(res.is_err());
        assert!(!store.name_exists("broken", None).await.unwrap());
        assert!(store.list_templates(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_name_is_reported_as_such() {
        let store = SqliteTemplateStore::new(init_memory_db().await.unwrap());
        store
            .create_template(&new_template("same", TemplateOwner::User(1)), &[soa()])
            .await
            .unwrap();
        let other = store
            .create_template(&new_template("other", TemplateOwner::User(1)), &[soa()])
            .await
            .unwrap();

        let err = store
            .create_template(&new_template("same", TemplateOwner::User(2)), &[soa()])
            .await
            .unwrap_err();
        assert!(err.is::<DuplicateTemplateName>());

        let err = store
            .update_template(other, &new_template("same", TemplateOwner::User(1)))
            .await
            .unwrap_err();
        assert!(err.is::<DuplicateTemplateName>());
        assert_eq!(store.list_templates(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn listing_filters_by_owner() {
        let store = SqliteTemplateStore::new(init_memory_db().await.unwrap());
        for (name, owner) in [
            ("b-global", TemplateOwner::Global),
            ("a-mine", TemplateOwner::User(1)),
            ("c-theirs", TemplateOwner::User(2)),
        ] {
            store
                .create_template(&new_template(name, owner), &[soa()])
                .await
                .unwrap();
        }

        let mine: Vec<String> = store
            .list_templates(Some(1))
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(mine, ["a-mine", "b-global"]);
        assert_eq!(store.list_templates(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn delete_cascades() {
        let db = init_memory_db().await.unwrap();
        let store = SqliteTemplateStore::new(db.clone());
        let id = store
            .create_template(&new_template("gone", TemplateOwner::User(1)), &[soa()])
            .await
            .unwrap();
        sqlx::query("INSERT INTO records_zone_templ (domain_id, record_id, zone_templ_id) VALUES (1, 1, ?)")
            .bind(id)
            .execute(&db)
            .await
            .unwrap();

        store.delete_template(id).await.unwrap();

        assert!(store.find_template(id).await.unwrap().is_none());
        assert!(store.template_records(id).await.unwrap().is_empty());
        let links: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM records_zone_templ")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(links.0, 0);
    }

    #[tokio::test]
    async fn record_updates() {
        let store = SqliteTemplateStore::new(init_memory_db().await.unwrap());
        let id = store
            .create_template(&new_template("edit", TemplateOwner::User(1)), &[soa()])
            .await
            .unwrap();
        let rid = store
            .add_record(
                id,
                &NewTemplateRecord {
                    name: "www.[ZONE]".into(),
                    rtype: "A".into(),
                    content: "192.0.2.1".into(),
                    ttl: 300,
                    prio: 0,
                },
            )
            .await
            .unwrap();

        store
            .update_record(
                rid,
                &NewTemplateRecord {
                    name: "web.[ZONE]".into(),
                    rtype: "A".into(),
                    content: "192.0.2.2".into(),
                    ttl: 600,
                    prio: 0,
                },
            )
            .await
            .unwrap();
        let record = store.find_record(rid).await.unwrap().unwrap();
        assert_eq!((record.name.as_str(), record.ttl), ("web.[ZONE]", 600));

        store.delete_record(rid).await.unwrap();
        assert!(store.find_record(rid).await.unwrap().is_none());
    }
}
