//! Path pattern segment grammar
//!
//! Shared by the trie and the path compiler so both agree on what a
//! pattern means.

use std::collections::HashSet;
use std::fmt;

/// Parameter name bound by a wildcard segment.
pub const WILDCARD_PARAM: &str = "pathMatch";

/// Weight of a static segment, in half-point units.
pub const STATIC_WEIGHT: u32 = 6;
/// Weight of a required parameter, in half-point units.
pub const PARAM_WEIGHT: u32 = 4;
/// Weight of an optional parameter, in half-point units.
pub const OPTIONAL_WEIGHT: u32 = 2;
/// Weight of a wildcard, in half-point units.
pub const WILDCARD_WEIGHT: u32 = 1;

/// One `/`-separated piece of a path pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text, matched exactly
    Static(&'a str),
    /// `:name`, `:name?`, `:name(regex)` or `:name(regex)?`
    Param {
        name: &'a str,
        optional: bool,
        constraint: Option<&'a str>,
    },
    /// `*` - absorbs the rest of the path into `pathMatch`
    Wildcard,
}

impl<'a> Segment<'a> {
    /// Parse a single segment (no slashes).
    pub fn parse(raw: &'a str) -> Result<Self, PatternError> {
        if raw == "*" {
            return Ok(Segment::Wildcard);
        }

        let Some(rest) = raw.strip_prefix(':') else {
            return Ok(Segment::Static(raw));
        };

        let (rest, optional) = match rest.strip_suffix('?') {
            Some(rest) => (rest, true),
            None => (rest, false),
        };

        let (name, constraint) = match rest.find('(') {
            Some(open) => {
                let inner = rest[open + 1..]
                    .strip_suffix(')')
                    .ok_or_else(|| PatternError::UnclosedConstraint(raw.to_string()))?;
                let constraint = if inner.is_empty() { None } else { Some(inner) };
                (&rest[..open], constraint)
            }
            None => (rest, None),
        };

        if name.is_empty() {
            return Err(PatternError::EmptyParamName(raw.to_string()));
        }

        Ok(Segment::Param {
            name,
            optional,
            constraint,
        })
    }

    /// Disambiguation weight in half-point units
    /// (static 3, required 2, optional 1, wildcard 0.5).
    pub fn weight_units(&self) -> u32 {
        match self {
            Segment::Static(_) => STATIC_WEIGHT,
            Segment::Param { optional: false, .. } => PARAM_WEIGHT,
            Segment::Param { optional: true, .. } => OPTIONAL_WEIGHT,
            Segment::Wildcard => WILDCARD_WEIGHT,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Segment::Static(_))
    }
}

/// Reasons a pattern is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// `:` or `:?` with no name
    EmptyParamName(String),
    /// `:name(` without the closing parenthesis
    UnclosedConstraint(String),
    /// `*` somewhere other than the final segment
    WildcardNotLast,
    /// The same parameter name used twice in one pattern
    DuplicateParam(String),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::EmptyParamName(seg) => write!(f, "empty parameter name in `{}`", seg),
            PatternError::UnclosedConstraint(seg) => {
                write!(f, "unclosed parameter constraint in `{}`", seg)
            }
            PatternError::WildcardNotLast => write!(f, "wildcard must be the final segment"),
            PatternError::DuplicateParam(name) => write!(f, "duplicate parameter `{}`", name),
        }
    }
}

impl std::error::Error for PatternError {}

/// Split a path into segments, discarding empty ones (`//`, leading and
/// trailing slashes).
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Parse and validate a whole pattern.
///
/// A wildcard must be last and parameter names must be unique.
///
/// ```
/// use waypoint_trie::{parse_pattern, Segment};
///
/// let segments = parse_pattern("/post/:id(\\d+)").unwrap();
/// assert_eq!(segments[0], Segment::Static("post"));
/// assert!(matches!(segments[1], Segment::Param { name: "id", .. }));
/// assert!(parse_pattern("/files/*/tail").is_err());
/// ```
pub fn parse_pattern(pattern: &str) -> Result<Vec<Segment<'_>>, PatternError> {
    let segments = split_path(pattern)
        .map(Segment::parse)
        .collect::<Result<Vec<_>, _>>()?;

    let mut names = HashSet::new();
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Wildcard if i + 1 != segments.len() => {
                return Err(PatternError::WildcardNotLast);
            }
            Segment::Param { name, .. } if !names.insert(*name) => {
                return Err(PatternError::DuplicateParam(name.to_string()));
            }
            _ => {}
        }
    }

    Ok(segments)
}

/// Total weight of a parsed pattern, in half-point units.
pub fn pattern_weight(segments: &[Segment<'_>]) -> u32 {
    segments.iter().map(Segment::weight_units).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_static() {
        assert_eq!(Segment::parse("users").unwrap(), Segment::Static("users"));
    }

    #[test]
    fn test_parse_params() {
        assert_eq!(
            Segment::parse(":id").unwrap(),
            Segment::Param { name: "id", optional: false, constraint: None }
        );
        assert_eq!(
            Segment::parse(":id?").unwrap(),
            Segment::Param { name: "id", optional: true, constraint: None }
        );
        assert_eq!(
            Segment::parse(r":id(\d+)").unwrap(),
            Segment::Param { name: "id", optional: false, constraint: Some(r"\d+") }
        );
        assert_eq!(
            Segment::parse(r":id(\d+)?").unwrap(),
            Segment::Param { name: "id", optional: true, constraint: Some(r"\d+") }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Segment::parse(":"), Err(PatternError::EmptyParamName(_))));
        assert!(matches!(Segment::parse(":?"), Err(PatternError::EmptyParamName(_))));
        assert!(matches!(
            Segment::parse(r":id(\d+"),
            Err(PatternError::UnclosedConstraint(_))
        ));
        assert_eq!(parse_pattern("/a/*/b"), Err(PatternError::WildcardNotLast));
        assert_eq!(
            parse_pattern("/a/:id/b/:id"),
            Err(PatternError::DuplicateParam("id".to_string()))
        );
    }

    #[test]
    fn test_split_discards_empty() {
        let segments: Vec<&str> = split_path("//users///42/").collect();
        assert_eq!(segments, vec!["users", "42"]);
        assert_eq!(split_path("/").count(), 0);
    }

    #[test]
    fn test_weights() {
        let w = |p| pattern_weight(&parse_pattern(p).unwrap());
        assert_eq!(w("/user/profile"), 12);
        assert_eq!(w("/user/:id"), 10);
        assert_eq!(w("/user/:id?"), 8);
        assert_eq!(w("/files/*"), 7);
    }
}
