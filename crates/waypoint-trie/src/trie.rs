//! Trie index: insertion, removal and node lookup

use crate::node::{Node, ParamNode};
use crate::segment::{parse_pattern, pattern_weight, PatternError, Segment};

/// Multi-way segment trie
///
/// Each edge is one path segment. Lookup cost is proportional to the
/// number of segments in the path, not to the number of routes.
#[derive(Debug)]
pub struct Trie<R> {
    pub(crate) root: Node<R>,
    len: usize,
}

impl<R> Default for Trie<R> {
    fn default() -> Self {
        Self {
            root: Node::default(),
            len: 0,
        }
    }
}

impl<R: Copy + PartialEq> Trie<R> {
    /// Create an empty trie
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pattern
    ///
    /// Returns the record previously stored at the same terminal node, if
    /// any (a later insertion overwrites an earlier one).
    ///
    /// # Example
    /// ```
    /// use waypoint_trie::Trie;
    ///
    /// let mut trie = Trie::new();
    /// assert_eq!(trie.insert("/users/:id", 1u32).unwrap(), None);
    /// assert_eq!(trie.insert("/users/:uid", 2u32).unwrap(), Some(1));
    /// ```
    pub fn insert(&mut self, pattern: &str, record: R) -> Result<Option<R>, PatternError> {
        let node = self.walk_mut(pattern, true)?;
        let previous = node.record.replace(record);
        if previous.is_none() {
            self.len += 1;
        }
        Ok(previous)
    }

    /// Attach an empty-path child record to the node for `parent`.
    ///
    /// The record is stored on the parent node itself, not on a new child.
    pub fn insert_default_child(
        &mut self,
        parent: &str,
        record: R,
    ) -> Result<Option<R>, PatternError> {
        let node = self.walk_mut(parent, false)?;
        let previous = node.default_child.replace(record);
        if previous.is_none() {
            self.len += 1;
        }
        Ok(previous)
    }

    /// Clear the record terminating at `pattern`.
    ///
    /// Intermediate nodes are left in place.
    pub fn remove(&mut self, pattern: &str) -> bool {
        self.take_where(pattern, |_| true)
    }

    /// Clear the terminal record at `pattern` only if it is `record`.
    pub fn remove_record(&mut self, pattern: &str, record: R) -> bool {
        self.take_where(pattern, |r| r == record)
    }

    /// Clear the default child at `parent` only if it is `record`.
    pub fn remove_default_child(&mut self, parent: &str, record: R) -> bool {
        let Some(node) = self.find_node_mut(parent) else {
            return false;
        };
        if node.default_child != Some(record) {
            return false;
        }
        node.default_child = None;
        self.len -= 1;
        true
    }

    fn take_where(&mut self, pattern: &str, pred: impl Fn(R) -> bool) -> bool {
        let Ok(segments) = parse_pattern(pattern) else {
            return false;
        };
        let weight = pattern_weight(&segments);

        let Some(node) = self.find_node_mut(pattern) else {
            return false;
        };
        match node.record {
            Some(r) if pred(r) => node.record = None,
            _ => return false,
        }
        self.len -= 1;

        // Walk again to release the weight contributed by this pattern
        let mut node = &mut self.root;
        node.weight = node.weight.saturating_sub(weight);
        for segment in &segments {
            let next = match segment {
                Segment::Static(s) => node.children.get_mut(*s),
                Segment::Param { .. } => node.param_child.as_deref_mut().map(|p| &mut p.node),
                Segment::Wildcard => node.wildcard_child.as_deref_mut(),
            };
            match next {
                Some(child) => {
                    child.weight = child.weight.saturating_sub(weight);
                    node = child;
                }
                None => break,
            }
        }
        true
    }

    /// Find the node a pattern terminates at, without creating anything.
    ///
    /// Parameter segments follow the parameter child whatever its name.
    pub fn find_node(&self, pattern: &str) -> Option<&Node<R>> {
        let segments = parse_pattern(pattern).ok()?;
        let mut node = &self.root;
        for segment in segments {
            node = match segment {
                Segment::Static(s) => node.children.get(s)?,
                Segment::Param { .. } => &node.param_child.as_deref()?.node,
                Segment::Wildcard => node.wildcard_child.as_deref()?,
            };
        }
        Some(node)
    }

    fn find_node_mut(&mut self, pattern: &str) -> Option<&mut Node<R>> {
        let segments = parse_pattern(pattern).ok()?;
        let mut node = &mut self.root;
        for segment in segments {
            node = match segment {
                Segment::Static(s) => node.children.get_mut(s)?,
                Segment::Param { .. } => &mut node.param_child.as_deref_mut()?.node,
                Segment::Wildcard => node.wildcard_child.as_deref_mut()?,
            };
        }
        Some(node)
    }

    /// Walk to (creating as needed) the node for `pattern`.
    fn walk_mut(&mut self, pattern: &str, add_weight: bool) -> Result<&mut Node<R>, PatternError> {
        let segments = parse_pattern(pattern)?;
        let weight = if add_weight { pattern_weight(&segments) } else { 0 };

        let mut node = &mut self.root;
        node.weight += weight;
        for segment in segments {
            node = match segment {
                Segment::Static(s) => node.children.entry(s.to_string()).or_default(),
                Segment::Param {
                    name,
                    optional,
                    constraint,
                } => {
                    let param = node.param_child.get_or_insert_with(|| {
                        Box::new(ParamNode {
                            name: name.to_string(),
                            optional,
                            constraint: constraint.map(str::to_string),
                            node: Node::default(),
                        })
                    });
                    // First-seen name and constraint win; optionality accumulates
                    param.optional |= optional;
                    &mut param.node
                }
                Segment::Wildcard => &mut **node.wildcard_child.get_or_insert_with(Box::default),
            };
            node.weight += weight;
        }
        Ok(node)
    }

    /// Root node
    pub fn root(&self) -> &Node<R> {
        &self.root
    }

    /// Number of records stored (terminal and default-child)
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_find_node() {
        let mut trie = Trie::new();
        trie.insert("/users/:id", 1u32).unwrap();
        trie.insert("/files/*", 2u32).unwrap();

        assert_eq!(trie.find_node("/users/:id").unwrap().record(), Some(1));
        // Parameter names do not matter for node lookup
        assert_eq!(trie.find_node("/users/:other").unwrap().record(), Some(1));
        assert_eq!(trie.find_node("/files/*").unwrap().record(), Some(2));
        assert!(trie.find_node("/users/list").is_none());
        assert_eq!(trie.len(), 2);
    }

    #[test]
    fn test_first_param_name_wins() {
        let mut trie = Trie::new();
        trie.insert("/users/:id", 1u32).unwrap();
        trie.insert("/users/:uid/edit", 2u32).unwrap();

        let param = trie.find_node("/users").unwrap().param().unwrap();
        assert_eq!(param.name(), "id");
    }

    #[test]
    fn test_remove_keeps_structure() {
        let mut trie = Trie::new();
        trie.insert("/a/b/c", 1u32).unwrap();
        assert!(trie.remove("/a/b/c"));
        assert!(!trie.remove("/a/b/c"));
        assert!(trie.find_node("/a/b/c").is_some());
        assert!(trie.find_node("/a/b/c").unwrap().is_empty());
        assert!(trie.is_empty());
    }

    #[test]
    fn test_remove_record_checks_owner() {
        let mut trie = Trie::new();
        trie.insert("/a", 1u32).unwrap();
        trie.insert("/a", 2u32).unwrap();
        assert!(!trie.remove_record("/a", 1));
        assert!(trie.remove_record("/a", 2));
    }

    #[test]
    fn test_default_child() {
        let mut trie = Trie::new();
        trie.insert("/a", 1u32).unwrap();
        trie.insert_default_child("/a", 2u32).unwrap();

        let node = trie.find_node("/a").unwrap();
        assert_eq!(node.record(), Some(1));
        assert_eq!(node.default_child(), Some(2));
        // Stored on the parent, not as a child node
        assert_eq!(node.static_len(), 0);

        assert!(!trie.remove_default_child("/a", 3));
        assert!(trie.remove_default_child("/a", 2));
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn test_weight_accumulates() {
        let mut trie = Trie::new();
        trie.insert("/user/:id", 1u32).unwrap();
        trie.insert("/user/profile", 2u32).unwrap();

        assert_eq!(trie.find_node("/user").unwrap().weight(), 10 + 12);
        assert!(trie.remove("/user/profile"));
        assert_eq!(trie.find_node("/user").unwrap().weight(), 10);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut trie = Trie::new();
        assert_eq!(trie.insert("/a/*/b", 1u32), Err(PatternError::WildcardNotLast));
        assert!(trie.is_empty());
    }
}
