//! Route pattern matching.
//!
//! # Responsibilities
//! - Parse route patterns (`/infractions/p/:page/pp/:perPage`) into segments
//! - Match a request path against one pattern
//! - Bind named parameters from the path
//!
//! # Design Decisions
//! - Path matching is case-sensitive and byte-exact for literal segments
//! - Fixed arity: segment counts must be equal, no prefix or wildcard matching
//! - No regex to guarantee O(n) matching
//! - Parameter values are bound verbatim; validation belongs to the handler

use std::collections::HashMap;
use std::fmt;

/// Parameters bound by a successful match, keyed by parameter name.
pub type Params = HashMap<String, String>;

/// One `/`-separated piece of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the path segment exactly.
    Literal(String),
    /// Binds the path segment under this name.
    Param(String),
}

/// A parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse a pattern. Segments starting with `:` are parameters.
    pub fn parse(pattern: impl Into<String>) -> Self {
        let raw = pattern.into();
        let segments = raw
            .split('/')
            .map(|s| match s.strip_prefix(':') {
                Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                _ => Segment::Literal(s.to_string()),
            })
            .collect();
        Self { raw, segments }
    }

    /// The pattern as it was registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the parameters in positional order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a request path against this pattern.
    pub fn match_path(&self, path: &str) -> Option<Params> {
        match_path(path, self)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Match `path` against `pattern`, returning the bound parameters on success.
pub fn match_path(path: &str, pattern: &RoutePattern) -> Option<Params> {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() != pattern.segments.len() {
        return None;
    }

    let mut params = Params::new();
    for (segment, part) in pattern.segments.iter().zip(parts) {
        match segment {
            Segment::Literal(expected) => {
                if expected != part {
                    return None;
                }
            }
            Segment::Param(name) => {
                params.insert(name.clone(), part.to_string());
            }
        }
    }
    Some(params)
}
