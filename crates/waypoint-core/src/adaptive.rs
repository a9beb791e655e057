//! Adaptive match-cache sizing
//!
//! Two independent signals drive the capacity, always clamped to the
//! configured bounds:
//! - route count, applied on every registration change
//! - hit rate, evaluated at most once per interval from [`AdaptiveCache::tick`]

use crate::config::AdaptiveConfig;
use web_time::Instant;

/// Snapshot of the controller
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveState {
    pub capacity: usize,
    pub min_capacity: usize,
    pub max_capacity: usize,
    /// Hit rate at the last evaluation, if one has happened
    pub last_hit_rate: Option<f64>,
    /// Number of capacity changes so far
    pub adjustments: u64,
}

/// Cache capacity controller
///
/// Holds no timer; the host drives it through `tick`.
#[derive(Debug)]
pub struct AdaptiveCache {
    config: AdaptiveConfig,
    capacity: usize,
    last_hit_rate: Option<f64>,
    adjustments: u64,
    last_tick: Option<Instant>,
    window_hits: u64,
    window_misses: u64,
}

impl AdaptiveCache {
    pub fn new(config: AdaptiveConfig) -> Self {
        let capacity = config.clamp(config.initial_capacity);
        Self {
            config,
            capacity,
            last_hit_rate: None,
            adjustments: 0,
            last_tick: None,
            window_hits: 0,
            window_misses: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Count one lookup in the current evaluation window
    pub fn record_lookup(&mut self, hit: bool) {
        if hit {
            self.window_hits += 1;
        } else {
            self.window_misses += 1;
        }
    }

    /// Route-count signal: `clamp(routes * ratio, min, max)`.
    ///
    /// Returns the new capacity when it changed.
    pub fn on_route_count(&mut self, routes: usize) -> Option<usize> {
        let target = (routes as f64 * self.config.route_ratio) as usize;
        self.apply(self.config.clamp(target))
    }

    /// Hit-rate signal: grow by one step above the high-water mark,
    /// shrink by one step below the low-water mark.
    pub fn on_hit_rate(&mut self, hit_rate: f64) -> Option<usize> {
        self.last_hit_rate = Some(hit_rate);
        let step = self.config.step;
        let target = if hit_rate > self.config.high_water && self.capacity < self.config.max_capacity {
            self.capacity.saturating_add(step)
        } else if hit_rate < self.config.low_water && self.capacity > self.config.min_capacity {
            self.capacity.saturating_sub(step)
        } else {
            return None;
        };
        self.apply(self.config.clamp(target))
    }

    /// Periodic evaluation. The first call starts the window; later calls
    /// evaluate the window once `interval` has elapsed.
    pub fn tick(&mut self, now: Instant) -> Option<usize> {
        let Some(last) = self.last_tick else {
            self.last_tick = Some(now);
            return None;
        };
        if now.saturating_duration_since(last) < self.config.interval {
            return None;
        }
        self.last_tick = Some(now);

        let hits = std::mem::take(&mut self.window_hits);
        let misses = std::mem::take(&mut self.window_misses);
        let total = hits + misses;
        if total == 0 {
            return None;
        }
        self.on_hit_rate(hits as f64 / total as f64)
    }

    fn apply(&mut self, target: usize) -> Option<usize> {
        if target == self.capacity {
            return None;
        }
        self.capacity = target;
        self.adjustments += 1;
        Some(target)
    }

    pub fn state(&self) -> AdaptiveState {
        AdaptiveState {
            capacity: self.capacity,
            min_capacity: self.config.min_capacity,
            max_capacity: self.config.max_capacity,
            last_hit_rate: self.last_hit_rate,
            adjustments: self.adjustments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use web_time::Duration;

    fn controller() -> AdaptiveCache {
        AdaptiveCache::new(AdaptiveConfig::default())
    }

    #[test]
    fn test_starts_at_min() {
        assert_eq!(controller().capacity(), 50);
    }

    #[test]
    fn test_route_count_is_clamped() {
        let mut c = controller();
        assert_eq!(c.on_route_count(10), None);
        assert_eq!(c.on_route_count(1_000), Some(100));
        assert_eq!(c.on_route_count(100_000), Some(500));
        assert_eq!(c.on_route_count(0), Some(50));
    }

    #[test]
    fn test_hit_rate_steps() {
        let mut c = controller();
        assert_eq!(c.on_hit_rate(0.95), Some(70));
        assert_eq!(c.on_hit_rate(0.7), None);
        assert_eq!(c.on_hit_rate(0.3), Some(50));
        // Already at the floor
        assert_eq!(c.on_hit_rate(0.1), None);
        assert_eq!(c.state().last_hit_rate, Some(0.1));
    }

    #[test]
    fn test_growth_stops_at_max() {
        let mut c = AdaptiveCache::new(AdaptiveConfig::new().bounds(50, 60));
        assert_eq!(c.on_hit_rate(0.99), Some(60));
        assert_eq!(c.on_hit_rate(0.99), None);
    }

    #[test]
    fn test_tick_evaluates_window() {
        let mut c = controller();
        let start = Instant::now();
        assert_eq!(c.tick(start), None);

        for _ in 0..19 {
            c.record_lookup(true);
        }
        c.record_lookup(false);

        // Interval not yet elapsed
        assert_eq!(c.tick(start + Duration::from_secs(30)), None);
        assert_eq!(c.tick(start + Duration::from_secs(61)), Some(70));

        // Window was reset; nothing observed since
        assert_eq!(c.tick(start + Duration::from_secs(200)), None);
    }

    #[test]
    fn test_adjustments_counted() {
        let mut c = controller();
        c.on_hit_rate(0.95);
        c.on_route_count(0);
        assert_eq!(c.state().adjustments, 2);
    }
}
