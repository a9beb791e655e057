//! Matcher statistics

use crate::adaptive::AdaptiveState;
use crate::cache::CacheStats;
use crate::hotspot::Hotspot;
use crate::matcher::RouteMatcher;
use web_time::Duration;

/// Snapshot returned by [`RouteMatcher::stats`]
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherStats {
    /// Tracked lookups served from the match cache
    pub hit_count: u64,
    /// Tracked lookups that had to be computed
    pub miss_count: u64,
    /// Mean latency over tracked lookups
    pub average_match_time: Duration,
    /// Live records
    pub routes: usize,
    pub cache: CacheStats,
    /// Tracked paths, most hit first
    pub hotspots: Vec<Hotspot>,
    pub adaptive: AdaptiveState,
}

impl MatcherStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

impl RouteMatcher {
    pub fn stats(&self) -> MatcherStats {
        let (hit_count, miss_count, lookups, total) = self.counters();
        let (cache, hotspots, adaptive) = self.parts();

        let average_match_time = match u32::try_from(lookups) {
            Ok(0) => Duration::ZERO,
            Ok(n) => total / n,
            Err(_) => Duration::from_secs_f64(total.as_secs_f64() / lookups as f64),
        };

        MatcherStats {
            hit_count,
            miss_count,
            average_match_time,
            routes: self.route_count(),
            cache: cache.stats(),
            hotspots: hotspots.top(hotspots.len()),
            adaptive: adaptive.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{RouteDefinition, RouteMatcher};

    #[test]
    fn test_stats_snapshot() {
        let mut matcher = RouteMatcher::new();
        matcher.add_route(RouteDefinition::new("/a").name("a")).unwrap();
        matcher.add_route(RouteDefinition::new("/b").name("b")).unwrap();

        matcher.match_by_path("/a");
        matcher.match_by_path("/a");
        matcher.match_by_path("/b");
        matcher.match_by_path("/missing");

        let stats = matcher.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 3);
        assert_eq!(stats.hit_rate(), 0.25);
        assert_eq!(stats.routes, 2);
        assert_eq!(stats.cache.len, 2);
        assert_eq!(stats.cache.capacity, 50);
        assert_eq!(stats.hotspots[0].path, "/a");
        assert_eq!(stats.hotspots[0].hits, 2);
        assert_eq!(stats.hotspots.len(), 3);
        assert_eq!(stats.adaptive.capacity, 50);
    }

    #[test]
    fn test_empty_stats() {
        let stats = RouteMatcher::new().stats();
        assert_eq!(stats.average_match_time, web_time::Duration::ZERO);
        assert_eq!(stats.hit_rate(), 0.0);
        assert!(stats.hotspots.is_empty());
    }
}
