use regex::Regex;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("template name is empty")]
    EmptyTemplateName,
    #[error("template name too long (max 128 characters)")]
    TemplateNameTooLong,
    #[error("invalid hostname: record name is empty")]
    EmptyName,
    #[error("record content is empty")]
    EmptyContent,
    #[error("record type must be an uppercase mnemonic such as A, MX or TXT")]
    InvalidType,
    #[error("invalid value for prio field: {prio} is not allowed for {rtype} records")]
    InvalidPriority { prio: i64, rtype: String },
    #[error("zone name is empty")]
    EmptyZone,
    #[error("zone name label '{0}' is invalid")]
    InvalidZoneLabel(String),
}

lazy_static::lazy_static! {
    /// Record type mnemonics: uppercase letters and digits
    static ref RTYPE_RE: Regex = Regex::new(r"^[A-Z][A-Z0-9]*$").unwrap();
    /// Letters, digits, '-' and '_' (service labels)
    static ref ZONE_LABEL_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,63}$").unwrap();
}

pub fn validate_template_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyTemplateName);
    }
    if name.chars().count() > 128 {
        return Err(ValidationError::TemplateNameTooLong);
    }
    Ok(())
}

/// MX and SRV accept 0..=65535; every other type only 0.
pub fn is_valid_priority(prio: i64, rtype: &str) -> bool {
    match rtype {
        "MX" | "SRV" => (0..=65535).contains(&prio),
        _ => prio == 0,
    }
}

/// Checks a template record before it is stored. Name and content may hold
/// placeholder tokens, so only emptiness is checked for them.
pub fn validate_template_record(
    name: &str,
    rtype: &str,
    content: &str,
    prio: i64,
) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if content.is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    if !RTYPE_RE.is_match(rtype) {
        return Err(ValidationError::InvalidType);
    }
    if !is_valid_priority(prio, rtype) {
        return Err(ValidationError::InvalidPriority {
            prio,
            rtype: rtype.to_string(),
        });
    }
    Ok(())
}

pub fn validate_zone_name(zone: &str) -> Result<(), ValidationError> {
    let z = zone.trim_end_matches('.');
    if z.is_empty() {
        return Err(ValidationError::EmptyZone);
    }
    for label in z.split('.') {
        if !ZONE_LABEL_RE.is_match(label) || label.starts_with('-') || label.ends_with('-') {
            return Err(ValidationError::InvalidZoneLabel(label.to_string()));
        }
    }
    Ok(())
}
