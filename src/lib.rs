//! Zone template engine for a PowerDNS admin console: placeholder templates,
//! their storage, and the operations that turn them into zone records.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod formatter;
pub mod powerdns;
pub mod store;
pub mod template;
pub mod validation;

pub use auth::{Permission, PermissionContext};
pub use config::DnsConfig;
pub use error::{AppError, AppResult};
pub use store::{TemplateStore, ZoneRecordStore};
pub use template::TemplateService;
