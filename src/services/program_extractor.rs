use crate::models::ProgramRecord;
use crate::sources::xmltv::XmltvFeed;
use crate::utils::time::parse_xmltv_timestamp;

/// Clock value used when a programme's stop time cannot be read
pub const UNKNOWN_END: &str = "00:00";

/// Programmes of one channel on one day, in feed order
///
/// `channel_id` is compared verbatim against each programme's channel
/// reference. A programme belongs to `date` (`YYYY-MM-DD`) when its start time,
/// read in the feed's own local time, falls on that day. Programmes with an
/// unreadable start time are skipped.
pub fn extract_programs(channel_id: &str, date: &str, feed: &XmltvFeed) -> Vec<ProgramRecord> {
    feed.programmes
        .iter()
        .filter(|programme| programme.channel == channel_id)
        .filter_map(|programme| {
            let start = parse_xmltv_timestamp(&programme.start)?;
            if start.date_string() != date {
                return None;
            }

            let end = programme
                .stop
                .as_deref()
                .and_then(parse_xmltv_timestamp)
                .map(|stop| stop.clock_string())
                .unwrap_or_else(|| UNKNOWN_END.to_string());

            Some(ProgramRecord {
                start: start.clock_string(),
                end,
                title: programme.title.clone().unwrap_or_default(),
                desc: programme.description.clone().unwrap_or_default(),
            })
        })
        .collect()
}
