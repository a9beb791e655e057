//! waypoint-trie: Zero-dependency segment trie for nested route matching
//!
//! Single Source of Truth (SSOT) for the path pattern grammar and the trie
//! walk, used by both waypoint-core (the matching engine) and
//! waypoint-wasm (browser bindings).
//!
//! ## Features
//! - O(k) path lookup where k = number of path segments
//! - Static segments: `/users`, `/settings/profile`
//! - Parameters: `/users/:id`, optional `/users/:id?`, constrained `/post/:id(\d+)`
//! - Wildcard: `/files/*` (captured as `pathMatch`)
//! - Nested chains: every ancestor pattern that terminates on the matched
//!   path is reported, outermost first
//! - Default (empty-path) children stored on their parent node
//! - Zero external dependencies
//!
//! ## Priority
//! 1. Exact static match (highest)
//! 2. Parameter match
//! 3. Wildcard match (lowest)
//!
//! ## Example
//! ```
//! use waypoint_trie::Trie;
//!
//! let mut trie = Trie::new();
//! trie.insert("/users", 0u32).unwrap();
//! trie.insert("/users/:id", 1u32).unwrap();
//! trie.insert("/files/*", 2u32).unwrap();
//!
//! let m = trie.find("/users/123").unwrap();
//! assert_eq!(m.record, 1);
//! assert_eq!(m.chain, vec![0, 1]);
//! assert_eq!(m.params, vec![("id".to_string(), "123".to_string())]);
//! ```

mod matching;
mod node;
mod segment;
mod trie;

pub use matching::{AcceptAll, ConstraintCheck, TrieMatch};
pub use node::{Node, ParamNode};
pub use segment::{
    parse_pattern, pattern_weight, split_path, PatternError, Segment, OPTIONAL_WEIGHT,
    PARAM_WEIGHT, STATIC_WEIGHT, WILDCARD_PARAM, WILDCARD_WEIGHT,
};
pub use trie::Trie;
