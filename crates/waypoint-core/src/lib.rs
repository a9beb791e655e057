//! waypoint-core: Route matching engine for client-side navigation
//!
//! Resolves URL-like paths to registered route records, with nested
//! chains, named routes and path reconstruction. Shared between the WASM
//! bindings and native hosts.
//!
//! ## Pipeline
//! 1. LRU match cache, sized adaptively from route count and hit rate
//! 2. Fast path: precompiled regexes for standalone routes no other pattern prefixes
//! 3. Trie walk from `waypoint-trie` (static > param > wildcard)
//!
//! ## Example
//! ```
//! use waypoint_core::{LocationDescriptor, RouteDefinition, RouteMatcher};
//!
//! let mut matcher = RouteMatcher::new();
//! matcher
//!     .add_route(
//!         RouteDefinition::new("/users/:id")
//!             .name("user")
//!             .child(RouteDefinition::new("").name("user-overview"))
//!             .child(RouteDefinition::new("posts").name("user-posts")),
//!     )
//!     .unwrap();
//!
//! let m = matcher.match_by_path("/users/7/posts").unwrap();
//! assert_eq!(m.matched.len(), 2);
//! assert_eq!(m.params["id"], "7");
//!
//! let loc = matcher
//!     .resolve(LocationDescriptor::named("user-overview").param("id", "7"))
//!     .unwrap();
//! assert_eq!(loc.full_path, "/users/7");
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod adaptive;
pub mod cache;
pub mod compiler;
pub mod config;
pub mod error;
pub mod fast_path;
pub mod hotspot;
pub mod location;
pub mod matcher;
pub mod record;
mod resolver;
pub mod shared;
pub mod stats;

use std::collections::HashMap;

/// Route parameters by name
pub type Params = HashMap<String, String>;

// Re-exports
pub use adaptive::{AdaptiveCache, AdaptiveState};
pub use cache::{cache_key, CacheStats, LruCache};
pub use compiler::{CompiledPath, PathCompiler};
pub use config::{AdaptiveConfig, HotspotConfig, MatcherConfig};
pub use error::{Error, Result};
pub use fast_path::{FastEntry, FastLookup, FastPathIndex};
pub use hotspot::{Hotspot, HotspotTracker};
pub use location::{
    full_path, merge_query, normalize_path, parse_location, parse_query, stringify_query,
    LocationDescriptor, Query, ResolvedLocation, RouteLocationRaw,
};
pub use matcher::{MatchResult, RouteMatcher};
pub use record::{
    Component, Loader, Opaque, Props, PropsFn, RecordId, Redirect, RouteDefinition, RouteRecord,
    DEFAULT_VIEW,
};
pub use shared::SharedMatcher;
pub use stats::MatcherStats;

// Time types used by `tick` and the statistics
pub use web_time::{Duration, Instant};
