//! Locations: path/query/hash parsing and assembly

use crate::record::{Redirect, RouteRecord};
use crate::Params;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::collections::HashMap;
use std::sync::Arc;
use waypoint_trie::split_path;

/// Query pairs, in insertion order. Repeated keys are allowed.
pub type Query = Vec<(String, String)>;

/// Characters escaped in query keys and values
const QUERY: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'`');

/// Characters escaped in a path segment
pub(crate) const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Canonical form of a path: leading slash, no empty segments, no
/// trailing slash.
///
/// ```
/// use waypoint_core::normalize_path;
///
/// assert_eq!(normalize_path("users//42/"), "/users/42");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    for segment in split_path(path) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Split `"/path?query#hash"` into its parts.
///
/// The hash is returned with its leading `#`, or empty.
pub fn parse_location(raw: &str) -> (&str, Query, String) {
    let (rest, hash) = match raw.find('#') {
        Some(i) => (&raw[..i], raw[i..].to_string()),
        None => (raw, String::new()),
    };
    let (path, query) = match rest.find('?') {
        Some(i) => (&rest[..i], parse_query(&rest[i + 1..])),
        None => (rest, Query::new()),
    };
    let hash = if hash == "#" { String::new() } else { hash };
    (path, query, hash)
}

/// Parse `a=1&b=two%20words` into pairs. `+` decodes to a space.
pub fn parse_query(query: &str) -> Query {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (decode_query(k), decode_query(v)),
            None => (decode_query(pair), String::new()),
        })
        .collect()
}

fn decode_query(s: &str) -> String {
    let s = s.replace('+', " ");
    percent_decode_str(&s).decode_utf8_lossy().into_owned()
}

/// Serialize query pairs; `sorted` orders by key for reproducible output.
pub fn stringify_query(query: &[(String, String)], sorted: bool) -> String {
    let mut pairs: Vec<&(String, String)> = query.iter().collect();
    if sorted {
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
    }
    pairs
        .into_iter()
        .map(|(k, v)| {
            let key = utf8_percent_encode(k, QUERY);
            if v.is_empty() {
                key.to_string()
            } else {
                format!("{}={}", key, utf8_percent_encode(v, QUERY))
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Merge two queries; keys present in `overrides` replace those in `base`.
pub fn merge_query(mut base: Query, overrides: &[(String, String)]) -> Query {
    if overrides.is_empty() {
        return base;
    }
    base.retain(|(k, _)| !overrides.iter().any(|(ok, _)| ok == k));
    base.extend(overrides.iter().cloned());
    base
}

pub(crate) fn normalize_hash(hash: &str) -> String {
    match hash {
        "" | "#" => String::new(),
        h if h.starts_with('#') => h.to_string(),
        h => format!("#{}", h),
    }
}

/// Assemble `path?query#hash`.
pub fn full_path(path: &str, query: &[(String, String)], hash: &str, sorted: bool) -> String {
    let mut out = path.to_string();
    let qs = stringify_query(query, sorted);
    if !qs.is_empty() {
        out.push('?');
        out.push_str(&qs);
    }
    out.push_str(hash);
    out
}

/// Location described by parts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationDescriptor {
    pub name: Option<String>,
    pub path: Option<String>,
    pub params: Params,
    pub query: Query,
    pub hash: Option<String>,
}

impl LocationDescriptor {
    /// Location for a named route
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Location for a path (which may carry its own query and hash)
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }
}

/// Location input to [`RouteMatcher::resolve`](crate::RouteMatcher::resolve)
#[derive(Debug, Clone, PartialEq)]
pub enum RouteLocationRaw {
    /// Raw string such as `/users/42?tab=posts#top`
    Path(String),
    Descriptor(LocationDescriptor),
}

impl From<&str> for RouteLocationRaw {
    fn from(path: &str) -> Self {
        RouteLocationRaw::Path(path.to_string())
    }
}

impl From<String> for RouteLocationRaw {
    fn from(path: String) -> Self {
        RouteLocationRaw::Path(path)
    }
}

impl From<LocationDescriptor> for RouteLocationRaw {
    fn from(descriptor: LocationDescriptor) -> Self {
        RouteLocationRaw::Descriptor(descriptor)
    }
}

/// Fully resolved location
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    /// Normalized path, without query or hash
    pub path: String,
    /// Name of the primary record
    pub name: Option<String>,
    pub params: Params,
    pub query: Query,
    /// Hash with its leading `#`, or empty
    pub hash: String,
    /// `path?query#hash`
    pub full_path: String,
    /// Matched records, outermost first
    pub matched: Vec<Arc<RouteRecord>>,
}

impl ResolvedLocation {
    /// Primary (innermost) record
    pub fn record(&self) -> Option<&Arc<RouteRecord>> {
        self.matched.last()
    }

    /// Meta merged along the chain; inner records override outer ones.
    pub fn meta(&self) -> HashMap<String, String> {
        let mut meta = HashMap::new();
        for record in &self.matched {
            meta.extend(record.meta().iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        meta
    }

    /// Redirect of the primary record
    pub fn redirect(&self) -> Option<&Redirect> {
        self.record().and_then(|r| r.redirect())
    }

    /// First query value for `key`
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Query {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("//a///b//"), "/a/b");
        assert_eq!(normalize_path("a/b"), "/a/b");
    }

    #[test]
    fn test_parse_location() {
        let (path, query, hash) = parse_location("/search?q=rust+lang&page=2#results");
        assert_eq!(path, "/search");
        assert_eq!(query, pairs(&[("q", "rust lang"), ("page", "2")]));
        assert_eq!(hash, "#results");

        let (path, query, hash) = parse_location("/plain");
        assert_eq!(path, "/plain");
        assert!(query.is_empty());
        assert!(hash.is_empty());
    }

    #[test]
    fn test_query_decoding() {
        assert_eq!(
            parse_query("name=J%C3%BCrgen&flag&&x="),
            pairs(&[("name", "Jürgen"), ("flag", ""), ("x", "")])
        );
    }

    #[test]
    fn test_stringify_sorted() {
        let query = pairs(&[("b", "2"), ("a", "x y")]);
        assert_eq!(stringify_query(&query, false), "b=2&a=x%20y");
        assert_eq!(stringify_query(&query, true), "a=x%20y&b=2");
    }

    #[test]
    fn test_merge_caller_wins() {
        let merged = merge_query(pairs(&[("a", "1"), ("b", "2")]), &pairs(&[("b", "3")]));
        assert_eq!(merged, pairs(&[("a", "1"), ("b", "3")]));
    }

    #[test]
    fn test_full_path() {
        let query = pairs(&[("tab", "posts")]);
        assert_eq!(full_path("/u/1", &query, "#top", false), "/u/1?tab=posts#top");
        assert_eq!(full_path("/u/1", &[], "", false), "/u/1");
    }

    #[test]
    fn test_normalize_hash() {
        assert_eq!(normalize_hash("top"), "#top");
        assert_eq!(normalize_hash("#top"), "#top");
        assert_eq!(normalize_hash("#"), "");
    }
}
