//! XMLTV timestamp handling
//!
//! XMLTV times look like `20240115180000 +0800`. Programme days are decided on
//! the wall-clock time exactly as the feed writes it; the offset is parsed for
//! completeness but never used to shift the time.

use chrono::{FixedOffset, NaiveDateTime};

/// Request date format, also used to compare programme days
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const XMLTV_STAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const XMLTV_STAMP_LEN: usize = 14;

/// A parsed XMLTV timestamp in the feed's own local time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmltvTimestamp {
    pub local: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

impl XmltvTimestamp {
    /// Local calendar day as `YYYY-MM-DD`
    pub fn date_string(&self) -> String {
        self.local.date().format(DATE_FORMAT).to_string()
    }

    /// Local wall-clock time as `HH:MM`
    pub fn clock_string(&self) -> String {
        self.local.format("%H:%M").to_string()
    }
}

/// Parse `YYYYMMDDHHmmss` with an optional `±HHMM` offset
///
/// The offset may be separated by whitespace or follow the digits directly.
/// Returns `None` for anything shorter than 14 digits or not a real calendar
/// time; an unreadable offset is dropped rather than failing the timestamp.
pub fn parse_xmltv_timestamp(raw: &str) -> Option<XmltvTimestamp> {
    let trimmed = raw.trim();
    let stamp = trimmed.get(..XMLTV_STAMP_LEN)?;
    if !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let local = NaiveDateTime::parse_from_str(stamp, XMLTV_STAMP_FORMAT).ok()?;
    let offset = trimmed
        .get(XMLTV_STAMP_LEN..)
        .and_then(|rest| parse_offset(rest.trim()));

    Some(XmltvTimestamp { local, offset })
}

fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let token = raw.split_whitespace().next()?;
    let (sign, digits) = match token.as_bytes().first()? {
        b'+' => (1, &token[1..]),
        b'-' => (-1, &token[1..]),
        _ => return None,
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
