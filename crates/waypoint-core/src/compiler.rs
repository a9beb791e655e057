//! Path compiler
//!
//! Turns a pattern such as `/post/:id(\d+)` into an anchored regex, the
//! ordered parameter names and a disambiguation weight. Results are cached
//! by pattern string.

use crate::location::{normalize_path, SEGMENT};
use crate::{Error, Params, Result};
use percent_encoding::{percent_decode_str, utf8_percent_encode};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use waypoint_trie::{parse_pattern, ConstraintCheck, Segment, WILDCARD_PARAM};

/// Build-side view of one pattern segment
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Static(String),
    Param { name: String, optional: bool },
    Wildcard,
}

/// Precompiled matcher for one pattern
#[derive(Debug)]
pub struct CompiledPath {
    pattern: String,
    regex: Regex,
    param_names: Vec<String>,
    /// Capture group name per parameter, parallel to `param_names`
    groups: Vec<String>,
    tokens: Vec<Token>,
    is_static: bool,
    weight_units: u32,
}

impl PartialEq for CompiledPath {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl CompiledPath {
    fn compile(pattern: &str) -> Result<Self> {
        let segments = parse_pattern(pattern).map_err(|e| Error::invalid_pattern(pattern, e))?;

        let mut source = String::from("^");
        let mut param_names = Vec::new();
        let mut groups = Vec::new();
        let mut tokens = Vec::with_capacity(segments.len());
        let mut weight_units = 0;

        for segment in &segments {
            weight_units += segment.weight_units();
            match *segment {
                Segment::Static(text) => {
                    source.push('/');
                    source.push_str(&regex::escape(text));
                    tokens.push(Token::Static(text.to_string()));
                }
                Segment::Param {
                    name,
                    optional,
                    constraint,
                } => {
                    if let Some(c) = constraint {
                        Regex::new(c).map_err(|e| Error::invalid_pattern(pattern, e))?;
                    }
                    // Named, so groups inside the constraint do not shift later params
                    let name_of_group = group_name(groups.len());
                    let group = format!("(?P<{}>{})", name_of_group, constraint.unwrap_or("[^/]+"));
                    groups.push(name_of_group);
                    if optional {
                        source.push_str("(?:/");
                        source.push_str(&group);
                        source.push_str(")?");
                    } else {
                        source.push('/');
                        source.push_str(&group);
                    }
                    param_names.push(name.to_string());
                    tokens.push(Token::Param {
                        name: name.to_string(),
                        optional,
                    });
                }
                Segment::Wildcard => {
                    let name_of_group = group_name(groups.len());
                    source.push_str(&format!("/(?P<{}>.*)", name_of_group));
                    groups.push(name_of_group);
                    param_names.push(WILDCARD_PARAM.to_string());
                    tokens.push(Token::Wildcard);
                }
            }
        }

        if segments.is_empty() {
            source.push('/');
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| Error::invalid_pattern(pattern, e))?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            param_names,
            groups,
            is_static: segments.iter().all(Segment::is_static),
            tokens,
            weight_units,
        })
    }

    /// Source pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Parameter names in pattern order
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// True if the pattern has no parameters or wildcard
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Disambiguation weight (+3 static, +2 param, +1 optional, +0.5 wildcard)
    pub fn weight(&self) -> f64 {
        f64::from(self.weight_units) / 2.0
    }

    /// Weight in half-point units
    pub fn weight_units(&self) -> u32 {
        self.weight_units
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(&normalize_path(path))
    }

    /// Extract parameters from a concrete path.
    ///
    /// Values are percent-decoded. Absent optional parameters are omitted.
    ///
    /// ```
    /// use waypoint_core::PathCompiler;
    ///
    /// let mut compiler = PathCompiler::new();
    /// let compiled = compiler.compile("/user/:id").unwrap();
    /// let params = compiled.extract("/user/a%20b").unwrap();
    /// assert_eq!(params["id"], "a b");
    /// ```
    pub fn extract(&self, path: &str) -> Option<Params> {
        let path = normalize_path(path);
        let captures = self.regex.captures(&path)?;
        let params = self
            .param_names
            .iter()
            .zip(&self.groups)
            .filter_map(|(name, group)| {
                let value = captures.name(group)?;
                let decoded = percent_decode_str(value.as_str()).decode_utf8_lossy();
                Some((name.clone(), decoded.into_owned()))
            })
            .collect();
        Some(params)
    }

    /// Substitute parameters into the pattern.
    ///
    /// Absent optional parameters drop their segment; an absent required
    /// parameter (or wildcard) is an error.
    pub fn build(&self, params: &Params) -> Result<String> {
        let mut out = String::new();
        for token in &self.tokens {
            match token {
                Token::Static(text) => {
                    out.push('/');
                    out.push_str(text);
                }
                Token::Param { name, optional } => match params.get(name) {
                    Some(value) if !value.is_empty() => {
                        out.push('/');
                        out.extend(utf8_percent_encode(value, SEGMENT));
                    }
                    _ if *optional => {}
                    _ => return Err(self.missing(name)),
                },
                Token::Wildcard => match params.get(WILDCARD_PARAM) {
                    Some(value) if !value.is_empty() => {
                        for part in value.split('/') {
                            out.push('/');
                            out.extend(utf8_percent_encode(part, SEGMENT));
                        }
                    }
                    _ => return Err(self.missing(WILDCARD_PARAM)),
                },
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        Ok(out)
    }

    fn missing(&self, param: &str) -> Error {
        Error::MissingParameter {
            route: self.pattern.clone(),
            param: param.to_string(),
        }
    }
}

/// Compile cache keyed by pattern string
#[derive(Debug, Default)]
pub struct PathCompiler {
    compiled: HashMap<String, Arc<CompiledPath>>,
    /// Anchored constraint regexes, keyed by constraint source
    constraints: HashMap<String, Regex>,
}

impl PathCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a pattern, or return the cached result.
    pub fn compile(&mut self, pattern: &str) -> Result<Arc<CompiledPath>> {
        if let Some(compiled) = self.compiled.get(pattern) {
            return Ok(compiled.clone());
        }

        let compiled = Arc::new(CompiledPath::compile(pattern)?);
        for segment in parse_pattern(pattern).into_iter().flatten() {
            if let Segment::Param {
                constraint: Some(c),
                ..
            } = segment
            {
                if !self.constraints.contains_key(c) {
                    let anchored = anchored(c).map_err(|e| Error::invalid_pattern(pattern, e))?;
                    self.constraints.insert(c.to_string(), anchored);
                }
            }
        }
        self.compiled.insert(pattern.to_string(), compiled.clone());
        Ok(compiled)
    }

    /// Cached compile result, if any
    pub fn get(&self, pattern: &str) -> Option<Arc<CompiledPath>> {
        self.compiled.get(pattern).cloned()
    }

    /// Number of cached patterns
    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }

    /// Drop every cached pattern and constraint
    pub fn clear(&mut self) {
        self.compiled.clear();
        self.constraints.clear();
    }
}

impl ConstraintCheck for PathCompiler {
    fn check(&self, constraint: &str, segment: &str) -> bool {
        match self.constraints.get(constraint) {
            Some(regex) => regex.is_match(segment),
            None => anchored(constraint).is_ok_and(|regex| regex.is_match(segment)),
        }
    }
}

fn group_name(index: usize) -> String {
    format!("__wp{}", index)
}

fn anchored(constraint: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", constraint))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(items: &[(&str, &str)]) -> Params {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_compile_static() {
        let mut compiler = PathCompiler::new();
        let compiled = compiler.compile("/user/profile").unwrap();

        assert!(compiled.is_static());
        assert_eq!(compiled.weight(), 6.0);
        assert!(compiled.is_match("/user/profile"));
        assert!(!compiled.is_match("/user/profiles"));
        assert!(compiled.param_names().is_empty());
    }

    #[test]
    fn test_compile_is_cached() {
        let mut compiler = PathCompiler::new();
        let a = compiler.compile("/user/:id").unwrap();
        let b = compiler.compile("/user/:id").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(compiler.len(), 1);

        compiler.clear();
        assert!(compiler.is_empty());
    }

    #[test]
    fn test_weights() {
        let mut compiler = PathCompiler::new();
        assert_eq!(compiler.compile("/user/:id").unwrap().weight(), 5.0);
        assert_eq!(compiler.compile("/user/:id?").unwrap().weight(), 4.0);
        assert_eq!(compiler.compile("/files/*").unwrap().weight(), 3.5);
        assert_eq!(compiler.compile("/").unwrap().weight(), 0.0);
    }

    #[test]
    fn test_constrained_param() {
        let mut compiler = PathCompiler::new();
        let compiled = compiler.compile(r"/post/:id(\d+)").unwrap();

        assert!(compiled.extract("/post/abc").is_none());
        assert_eq!(compiled.extract("/post/42").unwrap(), params(&[("id", "42")]));
        assert!(compiler.check(r"\d+", "42"));
        assert!(!compiler.check(r"\d+", "4a"));
    }

    #[test]
    fn test_constraint_with_alternation_stays_anchored() {
        let mut compiler = PathCompiler::new();
        let compiled = compiler.compile("/lang/:code(en|de)").unwrap();

        assert!(compiled.is_match("/lang/en"));
        assert!(!compiled.is_match("/lang/english"));
        assert!(!compiler.check("en|de", "dex"));
    }

    #[test]
    fn test_groups_inside_constraint_keep_later_params() {
        let mut compiler = PathCompiler::new();
        let compiled = compiler.compile("/p/:a(x(y)?)/:b").unwrap();
        assert_eq!(
            compiled.extract("/p/xy/hello").unwrap(),
            params(&[("a", "xy"), ("b", "hello")])
        );

        let compiled = compiler.compile(r"/assets/:file(.*\.(js|css))/:rev").unwrap();
        assert_eq!(
            compiled.extract("/assets/app.js/3").unwrap(),
            params(&[("file", "app.js"), ("rev", "3")])
        );
    }

    #[test]
    fn test_optional_param() {
        let mut compiler = PathCompiler::new();
        let compiled = compiler.compile("/user/:id?").unwrap();

        assert_eq!(compiled.extract("/user").unwrap(), Params::new());
        assert_eq!(compiled.extract("/user/7").unwrap(), params(&[("id", "7")]));
        assert_eq!(compiled.build(&Params::new()).unwrap(), "/user");
    }

    #[test]
    fn test_wildcard() {
        let mut compiler = PathCompiler::new();
        let compiled = compiler.compile("/files/*").unwrap();

        assert_eq!(
            compiled.extract("/files/x/y/z").unwrap(),
            params(&[("pathMatch", "x/y/z")])
        );
        assert_eq!(
            compiled.build(&params(&[("pathMatch", "x/y/z")])).unwrap(),
            "/files/x/y/z"
        );
    }

    #[test]
    fn test_root() {
        let mut compiler = PathCompiler::new();
        let compiled = compiler.compile("/").unwrap();

        assert!(compiled.is_match("/"));
        assert!(compiled.is_match(""));
        assert!(!compiled.is_match("/a"));
        assert_eq!(compiled.build(&Params::new()).unwrap(), "/");
    }

    #[test]
    fn test_literal_is_escaped() {
        let mut compiler = PathCompiler::new();
        let compiled = compiler.compile("/v1.0/a+b").unwrap();

        assert!(compiled.is_match("/v1.0/a+b"));
        assert!(!compiled.is_match("/v1x0/aab"));
    }

    #[test]
    fn test_build_missing_required() {
        let mut compiler = PathCompiler::new();
        let compiled = compiler.compile("/user/:id/posts/:post").unwrap();

        let err = compiled.build(&params(&[("id", "1")])).unwrap_err();
        assert_eq!(
            err,
            Error::MissingParameter {
                route: "/user/:id/posts/:post".to_string(),
                param: "post".to_string(),
            }
        );
    }

    #[test]
    fn test_round_trip() {
        let mut compiler = PathCompiler::new();
        let compiled = compiler
            .compile("/org/:org/repo/:repo?/tree/*")
            .unwrap();

        for values in [
            params(&[("org", "acme"), ("repo", "waypoint"), ("pathMatch", "src/lib.rs")]),
            params(&[("org", "a b"), ("pathMatch", "docs")]),
            params(&[("org", "100%"), ("repo", "x?y"), ("pathMatch", "a/b/c")]),
        ] {
            let path = compiled.build(&values).unwrap();
            assert_eq!(compiled.extract(&path).unwrap(), values, "path {}", path);
        }
    }

    #[test]
    fn test_rejects_invalid_patterns() {
        let mut compiler = PathCompiler::new();
        for pattern in ["/a/*/b", "/a/:x/:x", "/a/:", r"/a/:id(\d+", "/a/:id([)"] {
            assert!(
                matches!(compiler.compile(pattern), Err(Error::InvalidPattern { .. })),
                "{} should be rejected",
                pattern
            );
        }
        assert!(compiler.is_empty());
    }
}
