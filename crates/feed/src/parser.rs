//! Parser for watchlist RSS/XML feeds.
//!
//! The feed is read with a streaming `quick_xml` reader. Every `<item>`
//! element, at any depth, contributes at most one entry: the text of its
//! first direct `<title>` child, split into title and year by
//! [`WatchlistEntry::from_item_title`].
//!
//! Items without a usable title are skipped silently. Only a document
//! that is not well-formed XML is an error.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;

use crate::error::{FeedError, Result};
use crate::types::WatchlistEntry;

/// Title text being collected for the innermost open `<item>`
#[derive(Default)]
struct ItemFrame {
    /// Element depth of the `<item>` start tag
    depth: usize,
    /// Index of this item's slot in the output
    slot: usize,
    title: Option<String>,
    /// True while the reader sits directly inside this item's first `<title>`
    in_title: bool,
    /// Set once the first `<title>` closes or gains a child element
    title_done: bool,
}

impl ItemFrame {
    fn push_text(&mut self, text: &str) {
        if self.in_title && !self.title_done {
            self.title.get_or_insert_with(String::new).push_str(text);
        }
    }
}

/// Load and parse a watchlist feed from disk
pub fn load_watchlist(path: &Path) -> Result<Vec<WatchlistEntry>> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => FeedError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => FeedError::IoError(e),
    })?;

    parse_watchlist(&bytes)
}

/// Parse a watchlist feed from raw XML bytes
///
/// Entries are returned in document order; duplicates are kept.
pub fn parse_watchlist(xml: &[u8]) -> Result<Vec<WatchlistEntry>> {
    let mut reader = Reader::from_reader(xml);

    // One slot per <item>, reserved at its start tag so nested items keep
    // document order
    let mut slots: Vec<Option<WatchlistEntry>> = Vec::new();
    let mut buf = Vec::new();

    // Open <item> elements, innermost last
    let mut items: Vec<ItemFrame> = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| malformed(&reader, e.to_string()))?;

        match event {
            Event::Start(e) => {
                if depth == 0 && seen_root {
                    return Err(malformed(&reader, "multiple root elements".into()));
                }
                check_attributes(&reader, &e)?;
                seen_root = true;
                depth += 1;

                if let Some(item) = items.last_mut() {
                    if item.in_title {
                        // Only text ahead of the first child element counts
                        item.title_done = true;
                    } else if depth == item.depth + 1
                        && !item.title_done
                        && e.name().as_ref() == b"title"
                    {
                        item.in_title = true;
                    }
                }

                if e.name().as_ref() == b"item" {
                    items.push(ItemFrame {
                        depth,
                        slot: slots.len(),
                        ..ItemFrame::default()
                    });
                    slots.push(None);
                }
            }
            Event::Empty(e) => {
                if depth == 0 && seen_root {
                    return Err(malformed(&reader, "multiple root elements".into()));
                }
                check_attributes(&reader, &e)?;
                seen_root = true;

                if let Some(item) = items.last_mut() {
                    if item.in_title {
                        item.title_done = true;
                    } else if depth == item.depth && e.name().as_ref() == b"title" {
                        // <title/> is a present but empty title
                        item.title_done = true;
                    }
                }
            }
            Event::End(e) => {
                if depth == 0 {
                    return Err(malformed(&reader, "unexpected closing tag".into()));
                }

                if let Some(item) = items.last_mut() {
                    if item.depth == depth && e.name().as_ref() == b"item" {
                        if let Some(frame) = items.pop() {
                            let slot = frame.slot;
                            slots[slot] = finish_item(frame);
                        }
                    } else if item.in_title && depth == item.depth + 1 {
                        item.in_title = false;
                        item.title_done = true;
                    }
                }

                depth -= 1;
            }
            Event::Text(e) => {
                let text = e.decode().map_err(|e| malformed(&reader, e.to_string()))?;
                if depth == 0 {
                    if !text.trim().is_empty() {
                        return Err(malformed(&reader, "text outside the root element".into()));
                    }
                } else if let Some(item) = items.last_mut() {
                    item.push_text(&text);
                }
            }
            Event::CData(e) => {
                if depth == 0 {
                    return Err(malformed(&reader, "CDATA outside the root element".into()));
                }
                if let Some(item) = items.last_mut() {
                    let text = e.decode().map_err(|e| malformed(&reader, e.to_string()))?;
                    item.push_text(&text);
                }
            }
            Event::GeneralRef(e) => {
                if depth == 0 {
                    return Err(malformed(&reader, "reference outside the root element".into()));
                }
                let resolved = resolve_reference(&e).map_err(|reason| malformed(&reader, reason))?;
                if let Some(item) = items.last_mut() {
                    item.push_text(&resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(malformed(&reader, "no root element".into()));
    }
    if depth != 0 {
        return Err(malformed(&reader, "unexpected end of document".into()));
    }

    let entries: Vec<WatchlistEntry> = slots.into_iter().flatten().collect();
    debug!("Parsed {} watchlist entries from feed", entries.len());
    Ok(entries)
}

fn finish_item(frame: ItemFrame) -> Option<WatchlistEntry> {
    let title = frame.title?;
    let entry = WatchlistEntry::from_item_title(&title);
    if entry.is_none() {
        debug!("Skipping feed item without a year: {:?}", title);
    }
    entry
}

/// Reject malformed or duplicate attributes
fn check_attributes(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<()> {
    for attribute in start.attributes() {
        attribute.map_err(|e| malformed(reader, e.to_string()))?;
    }
    Ok(())
}

/// Resolve `&amp;`-style and `&#38;`-style references to their text
fn resolve_reference(reference: &BytesRef<'_>) -> std::result::Result<String, String> {
    if let Some(ch) = reference.resolve_char_ref().map_err(|e| e.to_string())? {
        return Ok(ch.to_string());
    }

    let name = reference.decode().map_err(|e| e.to_string())?;
    resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| format!("unknown entity &{};", name))
}

fn malformed(reader: &Reader<&[u8]>, reason: String) -> FeedError {
    FeedError::ParseError {
        position: reader.buffer_position(),
        reason,
    }
}
