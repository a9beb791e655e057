//! Ordered trie walk
//!
//! Depth-first over segments with a fixed priority at each level:
//! static child, then parameter child, then wildcard child. The walk uses
//! an explicit stack, so path depth is bounded by memory rather than by
//! the call stack.

use crate::node::Node;
use crate::segment::{split_path, WILDCARD_PARAM};
use crate::trie::Trie;

/// Result of a trie walk
#[derive(Debug, Clone, PartialEq)]
pub struct TrieMatch<R> {
    /// Primary record (a default child when one is substituted)
    pub record: R,
    /// Every record along the matched path, outermost first
    pub chain: Vec<R>,
    /// Captured parameters as (name, value) pairs, in path order
    pub params: Vec<(String, String)>,
    /// Path segments the walk consumed
    pub segments: Vec<String>,
}

/// Validates a constrained parameter segment, e.g. `:id(\d+)`.
pub trait ConstraintCheck {
    fn check(&self, constraint: &str, segment: &str) -> bool;
}

impl<F> ConstraintCheck for F
where
    F: Fn(&str, &str) -> bool,
{
    fn check(&self, constraint: &str, segment: &str) -> bool {
        self(constraint, segment)
    }
}

/// Ignores constraints; every segment satisfies every constraint.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ConstraintCheck for AcceptAll {
    fn check(&self, _constraint: &str, _segment: &str) -> bool {
        true
    }
}

enum Frame<'t, 'p, R> {
    Visit {
        node: &'t Node<R>,
        index: usize,
        params: Vec<(&'t str, &'p str)>,
        chain: Vec<R>,
    },
    Absorb {
        node: &'t Node<R>,
        index: usize,
        params: Vec<(&'t str, &'p str)>,
        chain: Vec<R>,
    },
}

impl<R: Copy + PartialEq> Trie<R> {
    /// Find the best match for a path, ignoring parameter constraints
    ///
    /// # Example
    /// ```
    /// use waypoint_trie::Trie;
    ///
    /// let mut trie = Trie::new();
    /// trie.insert("/users", 0u32).unwrap();
    /// trie.insert("/users/:id", 1u32).unwrap();
    ///
    /// let m = trie.find("/users/42").unwrap();
    /// assert_eq!(m.record, 1);
    /// assert_eq!(m.chain, vec![0, 1]);
    /// assert_eq!(m.params, vec![("id".to_string(), "42".to_string())]);
    /// ```
    pub fn find(&self, path: &str) -> Option<TrieMatch<R>> {
        self.find_with(path, &AcceptAll)
    }

    /// Find the best match for a path, validating constrained parameters
    /// with `check`.
    pub fn find_with<C>(&self, path: &str, check: &C) -> Option<TrieMatch<R>>
    where
        C: ConstraintCheck + ?Sized,
    {
        let segments: Vec<&str> = split_path(path).collect();

        // Root path resolves without walking
        if segments.is_empty() {
            self.root.touch();
            return accept(&self.root, &segments, Vec::new(), Vec::new());
        }

        let mut stack = vec![Frame::Visit {
            node: &self.root,
            index: 0,
            params: Vec::new(),
            chain: Vec::new(),
        }];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Visit {
                    node,
                    index,
                    params,
                    mut chain,
                } => {
                    node.touch();

                    if index == segments.len() {
                        if let Some(m) = accept(node, &segments, params, chain) {
                            return Some(m);
                        }
                        continue;
                    }

                    // Ancestors that terminate a pattern join the chain
                    if let Some(record) = node.record {
                        chain.push(record);
                    }
                    let segment = segments[index];

                    // Pushed in reverse priority: the static child is tried first
                    if let Some(wildcard) = node.wildcard_child.as_deref() {
                        stack.push(Frame::Absorb {
                            node: wildcard,
                            index,
                            params: params.clone(),
                            chain: chain.clone(),
                        });
                    }

                    if let Some(param) = node.param_child.as_deref() {
                        let allowed = param
                            .constraint
                            .as_deref()
                            .map_or(true, |c| check.check(c, segment));
                        if allowed {
                            let mut params = params.clone();
                            params.push((param.name.as_str(), segment));
                            stack.push(Frame::Visit {
                                node: &param.node,
                                index: index + 1,
                                params,
                                chain: chain.clone(),
                            });
                        }
                    }

                    if let Some(child) = node.children.get(segment) {
                        stack.push(Frame::Visit {
                            node: child,
                            index: index + 1,
                            params,
                            chain,
                        });
                    }
                }
                Frame::Absorb {
                    node,
                    index,
                    params,
                    mut chain,
                } => {
                    // Wildcard absorbs the rest of the path, no deeper descent
                    let Some(record) = node.record else {
                        continue;
                    };
                    node.touch();
                    chain.push(record);

                    let mut params = owned(params);
                    params.push((WILDCARD_PARAM.to_string(), segments[index..].join("/")));
                    return Some(TrieMatch {
                        record,
                        chain,
                        params,
                        segments: segments.iter().map(|s| s.to_string()).collect(),
                    });
                }
            }
        }

        None
    }
}

/// Terminal acceptance at `node` once every segment is consumed.
fn accept<R: Copy>(
    node: &Node<R>,
    segments: &[&str],
    params: Vec<(&str, &str)>,
    mut chain: Vec<R>,
) -> Option<TrieMatch<R>> {
    let record = match node.record {
        Some(record) => {
            chain.push(record);
            substitute_default(node, record, &mut chain)
        }
        None => {
            // `/user` accepted through `/user/:id?`
            let param = node.param_child.as_deref().filter(|p| p.optional)?;
            let record = param.node.record?;
            param.node.touch();
            chain.push(record);
            substitute_default(&param.node, record, &mut chain)
        }
    };

    Some(TrieMatch {
        record,
        chain,
        params: owned(params),
        segments: segments.iter().map(|s| s.to_string()).collect(),
    })
}

fn substitute_default<R: Copy>(node: &Node<R>, record: R, chain: &mut Vec<R>) -> R {
    match node.default_child {
        Some(default) => {
            chain.push(default);
            default
        }
        None => record,
    }
}

fn owned(params: Vec<(&str, &str)>) -> Vec<(String, String)> {
    params
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie(routes: &[(&str, u32)]) -> Trie<u32> {
        let mut trie = Trie::new();
        for (path, id) in routes {
            trie.insert(path, *id).unwrap();
        }
        trie
    }

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_static_routes() {
        let trie = trie(&[("/", 0), ("/users", 1), ("/users/list", 2)]);

        assert_eq!(trie.find("/").unwrap().record, 0);
        assert_eq!(trie.find("").unwrap().record, 0);
        assert_eq!(trie.find("/users").unwrap().record, 1);
        assert_eq!(trie.find("/users/list").unwrap().record, 2);
        assert!(trie.find("/unknown").is_none());
    }

    #[test]
    fn test_param_routes() {
        let trie = trie(&[("/users/:id", 1), ("/users/:id/posts/:post_id", 2)]);

        let m = trie.find("/users/42").unwrap();
        assert_eq!(m.record, 1);
        assert_eq!(m.params, vec![pair("id", "42")]);

        let m = trie.find("/users/42/posts/99").unwrap();
        assert_eq!(m.record, 2);
        assert_eq!(m.params, vec![pair("id", "42"), pair("post_id", "99")]);
        assert_eq!(m.chain, vec![1, 2]);
    }

    #[test]
    fn test_priority_exact_over_param() {
        let trie = trie(&[("/user/:id", 1), ("/user/profile", 2)]);

        assert_eq!(trie.find("/user/profile").unwrap().record, 2);
        assert_eq!(trie.find("/user/123").unwrap().record, 1);
    }

    #[test]
    fn test_static_dead_end_falls_back_to_param() {
        let trie = trie(&[("/user/profile/edit", 1), ("/user/:id", 2)]);

        let m = trie.find("/user/profile").unwrap();
        assert_eq!(m.record, 2);
        assert_eq!(m.params, vec![pair("id", "profile")]);
    }

    #[test]
    fn test_priority_param_over_wildcard() {
        let trie = trie(&[("/api/:version", 1), ("/api/*", 2)]);

        assert_eq!(trie.find("/api/v1").unwrap().record, 1);
        let m = trie.find("/api/v1/users").unwrap();
        assert_eq!(m.record, 2);
        assert_eq!(m.params, vec![pair("pathMatch", "v1/users")]);
    }

    #[test]
    fn test_wildcard_absorbs_rest() {
        let trie = trie(&[("/files/*", 1)]);

        let m = trie.find("/files/x/y/z").unwrap();
        assert_eq!(m.params, vec![pair("pathMatch", "x/y/z")]);
        assert_eq!(m.chain, vec![1]);
        // The wildcard only applies past its parent
        assert!(trie.find("/files").is_none());
    }

    #[test]
    fn test_nested_chain() {
        let trie = trie(&[("/a", 1), ("/a/b", 2), ("/a/b/c", 3)]);

        assert_eq!(trie.find("/a/b").unwrap().chain, vec![1, 2]);
        assert_eq!(trie.find("/a/b/c").unwrap().chain, vec![1, 2, 3]);
    }

    #[test]
    fn test_default_child_substitution() {
        let mut trie = trie(&[("/a", 1), ("/a/b", 2)]);
        trie.insert_default_child("/a", 3).unwrap();

        let m = trie.find("/a").unwrap();
        assert_eq!(m.record, 3);
        assert_eq!(m.chain, vec![1, 3]);
        // Default child only applies when the match ends at the parent
        assert_eq!(trie.find("/a/b").unwrap().chain, vec![1, 2]);
    }

    #[test]
    fn test_optional_param() {
        let trie = trie(&[("/user/:id?", 1)]);

        let m = trie.find("/user").unwrap();
        assert_eq!(m.record, 1);
        assert!(m.params.is_empty());

        let m = trie.find("/user/7").unwrap();
        assert_eq!(m.params, vec![pair("id", "7")]);
    }

    #[test]
    fn test_constraint_check() {
        let trie = trie(&[(r"/post/:id(\d+)", 1)]);
        let digits = |_: &str, seg: &str| seg.chars().all(|c| c.is_ascii_digit());

        assert!(trie.find_with("/post/abc", &digits).is_none());
        assert_eq!(trie.find_with("/post/42", &digits).unwrap().record, 1);
        // Without a checker constraints are ignored
        assert!(trie.find("/post/abc").is_some());
    }

    #[test]
    fn test_trailing_and_double_slashes() {
        let trie = trie(&[("/users/", 1)]);

        assert_eq!(trie.find("/users").unwrap().record, 1);
        assert_eq!(trie.find("/users/").unwrap().record, 1);
        assert_eq!(trie.find("//users//").unwrap().record, 1);
    }

    #[test]
    fn test_complex_nested_params() {
        let trie = trie(&[("/api/v1/orgs/:orgId/teams/:teamId/members/:memberId", 1)]);

        let m = trie.find("/api/v1/orgs/org1/teams/team2/members/mem3").unwrap();
        assert_eq!(m.record, 1);
        assert_eq!(
            m.params,
            vec![pair("orgId", "org1"), pair("teamId", "team2"), pair("memberId", "mem3")]
        );
        assert_eq!(m.segments.len(), 9);
    }

    #[test]
    fn test_deep_path_does_not_recurse() {
        let pattern = "/:p".to_string() + &"/x".repeat(2_000);
        let trie = trie(&[(pattern.as_str(), 1)]);
        let path = "/v".to_string() + &"/x".repeat(2_000);

        assert_eq!(trie.find(&path).unwrap().record, 1);
    }

    #[test]
    fn test_access_counter() {
        let trie = trie(&[("/a/b", 1)]);
        let _ = trie.find("/a/b");
        let _ = trie.find("/a/b");
        assert_eq!(trie.find_node("/a").unwrap().hits(), 2);
    }
}
