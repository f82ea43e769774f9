//! RSS/XML item extraction.
//!
//! Deliberately forgiving: feeds in the wild mix RSS 2.0, Dublin Core dates
//! and CDATA-wrapped titles, and a kiosk ticker would rather show a slightly
//! odd headline than none.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

/// At most this many items are taken from a single feed.
pub const MAX_ITEMS_PER_FEED: usize = 10;

/// One headline extracted from a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub published: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Title,
    Link,
    Date,
}

/// Parse feed XML and extract up to [`MAX_ITEMS_PER_FEED`] items.
pub fn parse_items(xml: &str) -> Result<Vec<FeedItem>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut in_item = false;
    let mut field: Option<Field> = None;
    let mut title = String::new();
    let mut link = String::new();
    let mut date_raw = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"item" => {
                    in_item = true;
                    title.clear();
                    link.clear();
                    date_raw.clear();
                    field = None;
                }
                b"title" if in_item => field = Some(Field::Title),
                b"link" if in_item => field = Some(Field::Link),
                b"pubDate" if in_item => {
                    // A real pubDate always wins over a Dublin Core fallback
                    date_raw.clear();
                    field = Some(Field::Date);
                }
                b"date" if in_item && date_raw.is_empty() => field = Some(Field::Date),
                _ => field = None,
            },
            Ok(Event::Text(t)) => {
                if in_item {
                    if let (Some(f), Ok(text)) = (field, t.unescape()) {
                        push_field(f, &text, &mut title, &mut link, &mut date_raw);
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if in_item {
                    if let Some(f) = field {
                        let text = String::from_utf8_lossy(t.as_ref()).into_owned();
                        push_field(f, &text, &mut title, &mut link, &mut date_raw);
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"item" {
                    in_item = false;
                    if !title.is_empty() {
                        items.push(FeedItem {
                            title: strip_tag_prefix(&title),
                            link: link.trim().to_string(),
                            published: parse_date(&date_raw),
                        });
                        if items.len() >= MAX_ITEMS_PER_FEED {
                            break;
                        }
                    }
                } else {
                    field = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("feed XML is malformed: {}", e)),
            _ => {}
        }
    }

    Ok(items)
}

fn push_field(field: Field, text: &str, title: &mut String, link: &mut String, date: &mut String) {
    match field {
        Field::Title => title.push_str(text),
        Field::Link => link.push_str(text),
        Field::Date => date.push_str(text),
    }
}

/// Strip leading bracketed tags some feeds prefix headlines with,
/// e.g. `[Science] Neutrino observed` -> `Neutrino observed`.
fn strip_tag_prefix(title: &str) -> String {
    let mut rest = title.trim();
    while let Some(after_open) = rest.strip_prefix('[') {
        match after_open.find(']') {
            Some(close) => rest = after_open[close + 1..].trim_start(),
            None => break,
        }
    }
    rest.to_string()
}

/// Publish dates come as RFC 2822 in RSS and RFC 3339 in Dublin Core;
/// anything unparsable is treated as "now" so the item still sorts in.
fn parse_date(raw: &str) -> DateTime<Utc> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn feed(items: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Channel</title>{}</channel></rss>"#,
            items
        )
    }

    #[test]
    fn test_extracts_title_link_date() {
        let xml = feed(
            r#"<item>
                 <title>Neutrino observed</title>
                 <link>https://example.org/a</link>
                 <pubDate>Tue, 05 May 2026 10:30:00 +0300</pubDate>
               </item>"#,
        );
        let items = parse_items(&xml).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Neutrino observed");
        assert_eq!(items[0].link, "https://example.org/a");
        assert_eq!(
            items[0].published,
            Utc.with_ymd_and_hms(2026, 5, 5, 7, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_caps_items_per_feed() {
        let mut body = String::new();
        for i in 0..25 {
            body.push_str(&format!(
                "<item><title>Item {}</title><link>https://example.org/{}</link></item>",
                i, i
            ));
        }
        let items = parse_items(&feed(&body)).unwrap();
        assert_eq!(items.len(), MAX_ITEMS_PER_FEED);
        assert_eq!(items[0].title, "Item 0");
    }

    #[test]
    fn test_strips_bracketed_prefixes() {
        assert_eq!(strip_tag_prefix("[Science] Headline"), "Headline");
        assert_eq!(strip_tag_prefix("[A][B] Headline"), "Headline");
        assert_eq!(strip_tag_prefix("No tags here"), "No tags here");
        assert_eq!(strip_tag_prefix("[unclosed headline"), "[unclosed headline");
    }

    #[test]
    fn test_cdata_title() {
        let xml = feed(
            r#"<item><title><![CDATA[5 < 6 is news]]></title><link>https://example.org</link></item>"#,
        );
        let items = parse_items(&xml).unwrap();
        assert_eq!(items[0].title, "5 < 6 is news");
    }

    #[test]
    fn test_missing_date_defaults_to_now() {
        let before = Utc::now();
        let xml = feed("<item><title>Undated</title></item>");
        let items = parse_items(&xml).unwrap();
        assert!(items[0].published >= before);
    }

    #[test]
    fn test_dc_date_fallback() {
        let xml = feed(
            r#"<item xmlns:dc="http://purl.org/dc/elements/1.1/">
                 <title>Dated</title>
                 <dc:date>2026-04-01T09:00:00+00:00</dc:date>
               </item>"#,
        );
        let items = parse_items(&xml).unwrap();
        assert_eq!(items[0].published.to_rfc3339(), "2026-04-01T09:00:00+00:00");
    }

    #[test]
    fn test_items_without_title_are_skipped() {
        let xml = feed("<item><link>https://example.org</link></item><item><title>Ok</title></item>");
        let items = parse_items(&xml).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Ok");
    }
}
