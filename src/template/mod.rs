//! Zone templates: placeholder-based record sets that are instantiated for a
//! zone, or derived back from one.

pub mod domain;
pub mod extract;
pub mod placeholder;
pub mod serial;
pub mod service;
pub mod substitute;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use domain::{ParsedDomain, parse_domain};
pub use extract::{ExtractOptions, Templatized, extract};
pub use placeholder::{PLACEHOLDERS, Placeholder, PlaceholderContext};
pub use service::TemplateService;
pub use substitute::{Resolver, resolve};

/// Owner of a zone template. Stored as `0` (or NULL) for global templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateOwner {
    Global,
    User(i64),
}

impl TemplateOwner {
    pub fn from_column(owner: Option<i64>) -> Self {
        match owner {
            None | Some(0) => TemplateOwner::Global,
            Some(id) => TemplateOwner::User(id),
        }
    }

    pub fn as_column(self) -> i64 {
        match self {
            TemplateOwner::Global => 0,
            TemplateOwner::User(id) => id,
        }
    }

    pub fn is_global(self) -> bool {
        self == TemplateOwner::Global
    }
}

/// Stored zone template header.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneTemplate {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub owner: TemplateOwner,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied template details for create, save-as and edit.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateDetails {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Make the template visible to every user.
    #[serde(default)]
    pub global: bool,
}

/// Template header as handed to the store for insertion or update.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub name: String,
    pub description: String,
    pub owner: TemplateOwner,
    pub created_by: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateRecord {
    pub id: i64,
    pub template_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub rtype: String,
    pub content: String,
    pub ttl: u32,
    pub prio: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTemplateRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub rtype: String,
    pub content: String,
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub prio: i64,
}

impl From<&TemplateRecord> for NewTemplateRecord {
    fn from(r: &TemplateRecord) -> Self {
        NewTemplateRecord {
            name: r.name.clone(),
            rtype: r.rtype.clone(),
            content: r.content.clone(),
            ttl: r.ttl,
            prio: r.prio,
        }
    }
}

/// A concrete record of a live zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneRecord {
    /// Store-assigned id, if the record has been persisted.
    pub id: Option<i64>,
    /// Name of the zone the record belongs to.
    pub zone: String,
    pub name: String,
    #[serde(rename = "type")]
    pub rtype: String,
    pub content: String,
    pub ttl: u32,
    pub prio: i64,
}

impl ZoneRecord {
    pub fn is_soa(&self) -> bool {
        self.rtype == "SOA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_column_mapping() {
        assert_eq!(TemplateOwner::from_column(None), TemplateOwner::Global);
        assert_eq!(TemplateOwner::from_column(Some(0)), TemplateOwner::Global);
        assert_eq!(TemplateOwner::from_column(Some(4)), TemplateOwner::User(4));
        assert_eq!(TemplateOwner::User(4).as_column(), 4);
        assert_eq!(TemplateOwner::Global.as_column(), 0);
    }
}
