use anyhow::{bail, Result};
use feed_rs::model::FeedType;
use feed_rs::parser;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Count the entries of an Atom feed.
///
/// Never fails: a body that is not XML, not a feed, or a feed in some other
/// syndication format counts as zero entries.
pub fn count_entries(bytes: &[u8]) -> usize {
    match atom_entry_count(bytes) {
        Ok(count) => count,
        Err(e) => {
            tracing::debug!(error = %e, bytes = bytes.len(), "Feed body not usable, counting no entries");
            0
        }
    }
}

fn atom_entry_count(bytes: &[u8]) -> Result<usize> {
    let feed = parser::parse(bytes)?;
    if !matches!(feed.feed_type, FeedType::Atom) {
        bail!("expected an Atom feed, got {:?}", feed.feed_type);
    }
    if !feed.entries.is_empty() {
        return Ok(feed.entries.len());
    }

    // feed-rs only picks up entries in the Atom 1.0 namespace. Mail feeds
    // still served as Atom 0.3 (xmlns="http://purl.org/atom/ns#") parse as
    // an empty Atom feed, so count the root's <entry> children directly.
    count_root_entries(bytes)
}

/// Number of `<entry>` children of a root `<feed>` element, ignoring
/// namespaces. The document must be well formed up to the root's end tag.
fn count_root_entries(bytes: &[u8]) -> Result<usize> {
    let mut reader = Reader::from_reader(bytes);
    let mut depth = 0usize;
    let mut entries = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = start.local_name();
                if depth == 0 && name.as_ref() != b"feed" {
                    bail!(
                        "root element is <{}>, not <feed>",
                        String::from_utf8_lossy(name.as_ref())
                    );
                }
                if depth == 1 && name.as_ref() == b"entry" {
                    entries += 1;
                }
                depth += 1;
            }
            Event::Empty(empty) => {
                let name = empty.local_name();
                if depth == 0 {
                    // <feed/>: a root with no children
                    if name.as_ref() != b"feed" {
                        bail!("root element is not <feed>");
                    }
                    return Ok(0);
                }
                if depth == 1 && name.as_ref() == b"entry" {
                    entries += 1;
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(entries);
                }
            }
            Event::Eof => bail!("document ended inside <feed>"),
            _ => {}
        }
    }
}
