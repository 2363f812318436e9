#![allow(unused)]

use std::sync::{Arc, Once};

use kata::db::{self, SqliteTemplateStore, SqliteZoneRecordStore};
use kata::template::ZoneRecord;
use kata::{DnsConfig, Permission, PermissionContext, TemplateService};

/// Registers a global default tracing subscriber when called for the first time. This is intended
/// for use in tests.
pub fn subscribe() {
    static INSTALL_TRACING_SUBSCRIBER: Once = Once::new();
    INSTALL_TRACING_SUBSCRIBER.call_once(|| {
        let subscriber = tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).unwrap();
    });
}

pub fn config() -> DnsConfig {
    DnsConfig {
        ns1: "ns1.example.net".into(),
        ns2: "ns2.example.net".into(),
        hostmaster: "hostmaster.example.net".into(),
        ..DnsConfig::default()
    }
}

pub fn admin(user_id: i64) -> PermissionContext {
    PermissionContext::new(user_id, [Permission::ZoneMasterAdd])
}

/// Template service over a fresh in-memory database, plus direct access to
/// its zones.
pub async fn service() -> (TemplateService, SqliteZoneRecordStore) {
    subscribe();
    let db = db::init_memory_db().await.unwrap();
    let zones = SqliteZoneRecordStore::new(db.clone());
    let service = TemplateService::new(
        config(),
        Arc::new(SqliteTemplateStore::new(db)),
        Arc::new(zones.clone()),
    );
    (service, zones)
}

pub fn record(zone: &str, name: &str, rtype: &str, content: &str, prio: i64) -> ZoneRecord {
    ZoneRecord {
        id: None,
        zone: zone.into(),
        name: name.into(),
        rtype: rtype.into(),
        content: content.into(),
        ttl: 3600,
        prio,
    }
}
