//! Trie nodes

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Trie node for path segment matching
///
/// `R` is a record handle (typically an arena index); the trie never owns
/// route data itself.
#[derive(Debug)]
pub struct Node<R> {
    /// Static children (key = path segment)
    pub(crate) children: HashMap<String, Node<R>>,
    /// Parameter child (:id)
    pub(crate) param_child: Option<Box<ParamNode<R>>>,
    /// Wildcard child (*)
    pub(crate) wildcard_child: Option<Box<Node<R>>>,
    /// Record if a pattern terminates here
    pub(crate) record: Option<R>,
    /// Empty-path nested route, substituted when the match ends here
    pub(crate) default_child: Option<R>,
    /// Sum of the weights of patterns inserted through this node
    pub(crate) weight: u32,
    /// Number of times a lookup visited this node
    pub(crate) hits: AtomicU64,
}

/// The single parameter child of a node.
///
/// Name and constraint come from the first pattern that created it.
#[derive(Debug)]
pub struct ParamNode<R> {
    pub(crate) name: String,
    pub(crate) optional: bool,
    pub(crate) constraint: Option<String>,
    pub(crate) node: Node<R>,
}

impl<R> Default for Node<R> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            param_child: None,
            wildcard_child: None,
            record: None,
            default_child: None,
            weight: 0,
            hits: AtomicU64::new(0),
        }
    }
}

impl<R: Copy> Node<R> {
    /// Record stored at this node, if a pattern terminates here
    pub fn record(&self) -> Option<R> {
        self.record
    }

    /// Default (empty-path) child record
    pub fn default_child(&self) -> Option<R> {
        self.default_child
    }
}

impl<R> Node<R> {
    /// Static child for an exact segment
    pub fn static_child(&self, segment: &str) -> Option<&Node<R>> {
        self.children.get(segment)
    }

    /// Number of static children
    pub fn static_len(&self) -> usize {
        self.children.len()
    }

    pub fn param(&self) -> Option<&ParamNode<R>> {
        self.param_child.as_deref()
    }

    pub fn wildcard(&self) -> Option<&Node<R>> {
        self.wildcard_child.as_deref()
    }

    /// Accumulated weight of the patterns passing through this node
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Lookup visits so far
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// True if the node has no children and carries no record.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
            && self.param_child.is_none()
            && self.wildcard_child.is_none()
            && self.record.is_none()
            && self.default_child.is_none()
    }

    #[inline]
    pub(crate) fn touch(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }
}

impl<R> ParamNode<R> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn constraint(&self) -> Option<&str> {
        self.constraint.as_deref()
    }

    pub fn node(&self) -> &Node<R> {
        &self.node
    }
}
