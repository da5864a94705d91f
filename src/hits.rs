//! Hit testing for read rectangles in backend SVG fragments.
//!
//! The backend draws every aligned read as
//! `<rect x=".." y=".." width=".." height=".." class="read" data-readid="..." .../>`
//! with attributes in no particular order. The parsed SVG tree drops `class` and `data-*`
//! attributes, so reads are indexed straight from the markup.

use regex::Regex;
use std::collections::HashMap;

/// One read rectangle in content coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadHit {
    pub read_id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ReadHit {
    fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// All read rectangles of one fragment, in drawing order.
#[derive(Debug, Clone, Default)]
pub struct ReadIndex {
    reads: Vec<ReadHit>,
}

impl ReadIndex {
    pub fn from_markup(markup: &str) -> Self {
        let reads = scan_reads(markup).unwrap_or_default();
        Self { reads }
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    /// Read under the content point `(x, y)`. Later rectangles are drawn on top and win.
    pub fn read_at(&self, x: f64, y: f64) -> Option<&str> {
        self.reads
            .iter()
            .rev()
            .find(|read| read.contains(x, y))
            .map(|read| read.read_id.as_str())
    }
}

fn scan_reads(markup: &str) -> Option<Vec<ReadHit>> {
    let rect_re = Regex::new(r"<rect\b(?<attrs>[^>]*)>").ok()?;
    let attr_re = Regex::new(r#"(?<key>[\w:-]+)\s*=\s*"(?<value>[^"]*)""#).ok()?;

    let reads = rect_re
        .captures_iter(markup)
        .filter_map(|caps| {
            let attrs: HashMap<&str, &str> = attr_re
                .captures_iter(caps.name("attrs")?.as_str())
                .filter_map(|attr| Some((attr.name("key")?.as_str(), attr.name("value")?.as_str())))
                .collect();

            let is_read = attrs
                .get("class")
                .is_some_and(|class| class.split_whitespace().any(|c| c == "read"));
            if !is_read {
                return None;
            }

            Some(ReadHit {
                read_id: attrs.get("data-readid")?.to_string(),
                x: attrs.get("x")?.parse().ok()?,
                y: attrs.get("y")?.parse().ok()?,
                width: attrs.get("width")?.parse().ok()?,
                height: attrs.get("height")?.parse().ok()?,
            })
        })
        .collect();

    Some(reads)
}
