//! Quick-XML based XMLTV parser
//!
//! Streams over the document once and keeps only what the lookup needs:
//! channel ids, display names and icons, and each programme's channel
//! reference, start/stop stamps, title and description.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::{SourceError, SourceResult};
use crate::models::ChannelRecord;

/// Parsed feed: channels and programmes in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmltvFeed {
    pub channels: Vec<ChannelRecord>,
    pub programmes: Vec<XmltvProgramme>,
}

/// A `<programme>` entry with its raw XMLTV timestamps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmltvProgramme {
    pub channel: String,
    pub start: String,
    pub stop: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum TextTarget {
    DisplayName,
    Title,
    Description,
}

/// Parse an XMLTV document
///
/// Fails on malformed XML or when there is no `<tv>` root element. Only the
/// first `display-name`, `title` and `desc` of an entry are kept.
pub fn parse_feed(data: &[u8]) -> SourceResult<XmltvFeed> {
    let content = String::from_utf8_lossy(data);
    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    let mut feed = XmltvFeed::default();
    let mut saw_root = false;
    let mut channel: Option<ChannelRecord> = None;
    let mut programme: Option<XmltvProgramme> = None;
    let mut target: Option<TextTarget> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"tv" => saw_root = true,
                b"channel" => {
                    channel = Some(ChannelRecord::new(
                        attribute(e, b"id").unwrap_or_default(),
                        "",
                    ));
                }
                b"programme" => programme = Some(programme_from(e)),
                b"display-name" if channel.is_some() => {
                    target = Some(TextTarget::DisplayName);
                    text.clear();
                }
                b"title" if programme.is_some() => {
                    target = Some(TextTarget::Title);
                    text.clear();
                }
                b"desc" if programme.is_some() => {
                    target = Some(TextTarget::Description);
                    text.clear();
                }
                b"icon" => set_channel_icon(channel.as_mut(), e),
                _ => {}
            },

            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"tv" => saw_root = true,
                b"icon" => set_channel_icon(channel.as_mut(), e),
                b"channel" => feed.channels.push(ChannelRecord::new(
                    attribute(e, b"id").unwrap_or_default(),
                    "",
                )),
                b"programme" => feed.programmes.push(programme_from(e)),
                _ => {}
            },

            Ok(Event::Text(e)) => {
                if target.is_some() {
                    let unescaped = e
                        .unescape()
                        .map_err(|err| SourceError::parse(format!("invalid text: {err}")))?;
                    text.push_str(&unescaped);
                }
            }

            Ok(Event::CData(e)) => {
                if target.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }

            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"display-name" | b"title" | b"desc" => {
                    if let Some(t) = target.take() {
                        store_text(t, text.trim(), channel.as_mut(), programme.as_mut());
                    }
                    text.clear();
                }
                b"channel" => {
                    if let Some(c) = channel.take() {
                        feed.channels.push(c);
                    }
                }
                b"programme" => {
                    if let Some(p) = programme.take() {
                        feed.programmes.push(p);
                    }
                }
                _ => {}
            },

            Ok(Event::Eof) => break,

            Err(e) => {
                return Err(SourceError::parse(format!(
                    "XML error at byte {}: {e}",
                    reader.error_position()
                )));
            }

            _ => {}
        }
    }

    if !saw_root {
        return Err(SourceError::parse("missing <tv> root element"));
    }

    Ok(feed)
}

fn programme_from(e: &BytesStart) -> XmltvProgramme {
    XmltvProgramme {
        channel: attribute(e, b"channel").unwrap_or_default(),
        start: attribute(e, b"start").unwrap_or_default(),
        stop: attribute(e, b"stop"),
        title: None,
        description: None,
    }
}

fn set_channel_icon(channel: Option<&mut ChannelRecord>, e: &BytesStart) {
    if let Some(channel) = channel {
        if channel.icon.is_none() {
            channel.icon = attribute(e, b"src").filter(|src| !src.is_empty());
        }
    }
}

fn store_text(
    target: TextTarget,
    value: &str,
    channel: Option<&mut ChannelRecord>,
    programme: Option<&mut XmltvProgramme>,
) {
    match target {
        TextTarget::DisplayName => {
            if let Some(channel) = channel {
                if channel.name.is_empty() {
                    channel.name = value.to_string();
                }
            }
        }
        TextTarget::Title => {
            if let Some(programme) = programme {
                programme.title.get_or_insert_with(|| value.to_string());
            }
        }
        TextTarget::Description => {
            if let Some(programme) = programme {
                programme.description.get_or_insert_with(|| value.to_string());
            }
        }
    }
}

/// Unescaped attribute value; malformed attributes are skipped
fn attribute(element: &BytesStart, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}
