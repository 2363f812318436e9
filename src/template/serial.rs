//! SOA serial numbers: the generation-time default and the next-serial bump.
use chrono::{Days, NaiveDate};

/// Highest serial treated as a plain counter rather than `YYYYMMDDnn`.
const COUNTER_SERIAL_LIMIT: u64 = 1_979_999_999;

/// `YYYYMMDD00` for `date`.
pub fn serial_for_date(date: NaiveDate) -> String {
    format!("{}00", date.format("%Y%m%d"))
}

fn next_date(date: &str) -> Option<String> {
    let parsed = NaiveDate::parse_from_str(date, "%Y%m%d").ok()?;
    let next = parsed.checked_add_days(Days::new(1))?;
    Some(next.format("%Y%m%d").to_string())
}

/// Serial that must follow `current` so secondaries pick up a change.
///
/// `0` is left alone (PowerDNS autoserial). Counter-style serials increment,
/// wrapping to `1` at the limit. Date-style serials bump their two-digit
/// revision while dated today or in the future, roll to the following day
/// after revision `99`, and restart at `today00` when older than today.
pub fn next_serial(current: &str, today: NaiveDate) -> String {
    let Ok(value) = current.parse::<u64>() else {
        return serial_for_date(today);
    };

    if value == 0 {
        return "0".to_string();
    }
    if value < COUNTER_SERIAL_LIMIT {
        return (value + 1).to_string();
    }
    if value == COUNTER_SERIAL_LIMIT {
        return "1".to_string();
    }

    let today_str = today.format("%Y%m%d").to_string();
    if current == format!("{today_str}99") {
        return match next_date(&today_str) {
            Some(date) => format!("{date}00"),
            None => (value + 1).to_string(),
        };
    }

    let (ser_date, revision) = current.split_at(current.len().saturating_sub(2));
    let revision: u32 = revision.parse().unwrap_or(0);

    if ser_date == today_str {
        format!("{ser_date}{:02}", revision + 1)
    } else if ser_date > today_str.as_str() {
        if revision >= 99 {
            match next_date(ser_date) {
                Some(date) => format!("{date}00"),
                None => (value + 1).to_string(),
            }
        } else {
            format!("{ser_date}{:02}", revision + 1)
        }
    } else {
        serial_for_date(today)
    }
}

/// Replace the third field of an SOA content string with `serial`.
pub fn set_soa_serial(content: &str, serial: &str) -> String {
    let mut parts: Vec<&str> = content.split(' ').collect();
    if let Some(field) = parts.get_mut(2) {
        *field = serial;
    }
    parts.join(" ").trim_end().to_string()
}

/// The serial field of an SOA content string, if present.
pub fn soa_serial(content: &str) -> Option<&str> {
    content.split(' ').nth(2)
}
