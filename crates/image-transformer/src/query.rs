//! Query strings attached to resource paths.

use std::fmt;

use indexmap::IndexMap;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Bytes left as-is when a key or value is written, matching
/// `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// An ordered `key -> value` query. Keys with an empty value are flags and
/// serialize without `=`.
///
/// Keys and values are held decoded and percent-encoded when written, so an
/// already encoded query survives a merge unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: IndexMap<String, String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `a=1&b`. Empty segments are skipped; `+` and percent escapes
    /// are decoded.
    pub fn parse(query: &str) -> Self {
        let params = query
            .split('&')
            .filter(|segment| !segment.is_empty())
            .map(|segment| match segment.split_once('=') {
                Some((key, value)) => (decode(key), decode(value)),
                None => (decode(segment), String::new()),
            })
            .collect();
        Self { params }
    }

    /// Sets `key`. An existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn insert_flag(&mut self, key: impl Into<String>) {
        self.insert(key, String::new());
    }

    pub fn with_flag(mut self, key: impl Into<String>) -> Self {
        self.insert_flag(key);
        self
    }

    #[cfg(test)]
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Overlays `other`: its values win, keys already present keep their
    /// position, new keys are appended in `other`'s order.
    pub fn merge(&mut self, other: &Query) {
        for (key, value) in other.iter() {
            self.insert(key, value);
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{}", utf8_percent_encode(key, COMPONENT))?;
            if !value.is_empty() {
                write!(f, "={}", utf8_percent_encode(value, COMPONENT))?;
            }
        }
        Ok(())
    }
}

fn decode(raw: &str) -> String {
    percent_decode_str(&raw.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

/// Merges `query` into the query part of `path`, e.g. `./a.png?url` with
/// `width=400` gives `./a.png?url&width=400`.
pub fn merge_into_path(path: &str, query: &Query) -> String {
    let (base, existing) = match path.split_once('?') {
        Some((base, existing)) => (base, Query::parse(existing)),
        None => (path, Query::new()),
    };
    let mut merged = existing;
    merged.merge(query);

    if merged.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{merged}")
    }
}
