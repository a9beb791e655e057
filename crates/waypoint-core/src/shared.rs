//! Thread-safe matcher handle
//!
//! [`RouteMatcher`] is a plain single-threaded value. Hosts that register,
//! match and tick from several threads share it through [`SharedMatcher`],
//! which puts every operation behind one lock.

use crate::location::{ResolvedLocation, RouteLocationRaw};
use crate::matcher::{MatchResult, RouteMatcher};
use crate::record::{RouteDefinition, RouteRecord};
use crate::stats::MatcherStats;
use crate::{MatcherConfig, Result};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use web_time::Instant;

/// Cloneable handle to one matcher behind a mutex
#[derive(Debug, Clone, Default)]
pub struct SharedMatcher {
    inner: Arc<Mutex<RouteMatcher>>,
}

impl SharedMatcher {
    pub fn new(matcher: RouteMatcher) -> Self {
        Self {
            inner: Arc::new(Mutex::new(matcher)),
        }
    }

    pub fn with_config(config: MatcherConfig) -> Self {
        Self::new(RouteMatcher::with_config(config))
    }

    /// Exclusive access for a sequence of operations
    pub fn lock(&self) -> MutexGuard<'_, RouteMatcher> {
        self.inner.lock()
    }

    pub fn add_route(&self, definition: RouteDefinition) -> Result<Arc<RouteRecord>> {
        self.inner.lock().add_route(definition)
    }

    pub fn add_child_route(&self, parent: &str, definition: RouteDefinition) -> Result<Arc<RouteRecord>> {
        self.inner.lock().add_child_route(parent, definition)
    }

    pub fn remove_route(&self, name: &str) -> bool {
        self.inner.lock().remove_route(name)
    }

    pub fn match_by_path(&self, path: &str) -> Option<MatchResult> {
        self.inner.lock().match_by_path(path)
    }

    pub fn match_by_name(&self, name: &str) -> Option<Arc<RouteRecord>> {
        self.inner.lock().match_by_name(name)
    }

    pub fn resolve(&self, location: impl Into<RouteLocationRaw>) -> Result<ResolvedLocation> {
        self.inner.lock().resolve(location)
    }

    pub fn preheat(&self, paths: Option<&[&str]>) -> usize {
        self.inner.lock().preheat(paths)
    }

    pub fn tick(&self, now: Instant) -> Option<usize> {
        self.inner.lock().tick(now)
    }

    pub fn stats(&self) -> MatcherStats {
        self.inner.lock().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_is_send_sync() {
        assert_send_sync::<SharedMatcher>();
        assert_send_sync::<MatchResult>();
    }

    #[test]
    fn test_concurrent_lookups() {
        let shared = SharedMatcher::default();
        shared
            .add_route(RouteDefinition::new("/item/:id").name("item"))
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let m = shared.match_by_path(&format!("/item/{}", i % 10)).unwrap();
                        assert_eq!(m.params["id"], (i % 10).to_string());
                    }
                    t
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = shared.stats();
        assert_eq!(stats.hit_count + stats.miss_count, 200);
        assert_eq!(stats.miss_count, 10);
    }

    #[test]
    fn test_registration_while_shared() {
        let shared = SharedMatcher::default();
        let writer = {
            let shared = shared.clone();
            thread::spawn(move || {
                for i in 0..20 {
                    shared
                        .add_route(RouteDefinition::new(format!("/p{}", i)))
                        .unwrap();
                }
            })
        };
        writer.join().unwrap();

        assert_eq!(shared.lock().route_count(), 20);
        assert!(shared.match_by_path("/p19").is_some());
        assert!(!shared.remove_route("missing"));
    }
}
