//! Header block parsing.
//!
//! A header is only recognized when the file starts with the open marker:
//!
//! ```text
//! /*
//!  * Title: Getting started
//!  * Flags: no-directory, Draft
//!  */
//! ```
//!
//! Each line is trimmed, a leading `*` is dropped, and `key: value` pairs are
//! collected with lower-cased keys. The first occurrence of a key wins. Lines
//! without a colon are ignored. A missing close marker means there is no
//! header at all.

use std::collections::HashMap;

use quire_config::HeaderMarkers;

/// Raw key/value pairs of a header block.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct RawHeader {
    pub fields: HashMap<String, String>,
    /// Byte offset where the body starts.
    pub end: usize,
}

impl RawHeader {
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

pub(crate) fn parse(source: &str, markers: &HeaderMarkers) -> RawHeader {
    let Some(after_open) = source.strip_prefix(markers.open.as_str()) else {
        return RawHeader::default();
    };
    let Some(close) = after_open.find(markers.close.as_str()) else {
        tracing::debug!("header block has no close marker, using defaults");
        return RawHeader::default();
    };

    let mut fields = HashMap::new();
    for line in after_open[..close].lines() {
        let line = line.trim();
        let line = line.strip_prefix('*').unwrap_or(line).trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        fields.entry(key).or_insert_with(|| value.trim().to_owned());
    }

    RawHeader {
        fields,
        end: markers.open.len() + close + markers.close.len(),
    }
}

/// Split a `flags` value: comma separated, trimmed, lower-cased.
pub(crate) fn parse_flags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|flag| flag.trim().to_lowercase())
        .filter(|flag| !flag.is_empty())
        .collect()
}
