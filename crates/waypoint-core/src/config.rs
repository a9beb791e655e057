//! Matcher configuration

use web_time::Duration;

/// Adaptive match-cache sizing
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveConfig {
    /// Lower capacity bound
    pub min_capacity: usize,
    /// Upper capacity bound
    pub max_capacity: usize,
    /// Capacity change per hit-rate adjustment
    pub step: usize,
    /// Grow when the hit rate is above this
    pub high_water: f64,
    /// Shrink when the hit rate is below this
    pub low_water: f64,
    /// Minimum time between hit-rate evaluations
    pub interval: Duration,
    /// Capacity per registered route
    pub route_ratio: f64,
    /// Capacity before any feedback arrives
    pub initial_capacity: usize,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            min_capacity: 50,
            max_capacity: 500,
            step: 20,
            high_water: 0.9,
            low_water: 0.5,
            interval: Duration::from_secs(60),
            route_ratio: 0.1,
            initial_capacity: 50,
        }
    }
}

impl AdaptiveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounds(mut self, min: usize, max: usize) -> Self {
        self.min_capacity = min.max(1);
        self.max_capacity = max.max(self.min_capacity);
        self
    }

    pub fn step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    pub fn thresholds(mut self, low: f64, high: f64) -> Self {
        self.low_water = low;
        self.high_water = high;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval_seconds(mut self, seconds: u64) -> Self {
        self.interval = Duration::from_secs(seconds);
        self
    }

    pub fn route_ratio(mut self, ratio: f64) -> Self {
        self.route_ratio = ratio;
        self
    }

    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Clamp a capacity into the configured bounds
    pub fn clamp(&self, capacity: usize) -> usize {
        let max = self.max_capacity.max(self.min_capacity);
        capacity.clamp(self.min_capacity, max)
    }
}

/// Hotspot tracking and preheating
#[derive(Debug, Clone, PartialEq)]
pub struct HotspotConfig {
    /// Tracked-path count above which idle entries are pruned
    pub max_tracked: usize,
    /// Entries idle for longer than this are pruned
    pub inactivity: Duration,
    /// Paths warmed by a preheat without explicit paths
    pub preheat_top: usize,
}

impl Default for HotspotConfig {
    fn default() -> Self {
        Self {
            max_tracked: 500,
            inactivity: Duration::from_secs(300), // 5 minutes
            preheat_top: 20,
        }
    }
}

impl HotspotConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_tracked(mut self, max: usize) -> Self {
        self.max_tracked = max;
        self
    }

    pub fn inactivity(mut self, inactivity: Duration) -> Self {
        self.inactivity = inactivity;
        self
    }

    pub fn preheat_top(mut self, n: usize) -> Self {
        self.preheat_top = n;
        self
    }
}

/// Route matcher configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherConfig {
    pub cache: AdaptiveConfig,
    pub hotspot: HotspotConfig,
    /// Try precompiled regexes before the trie walk
    pub fast_path: bool,
    /// Sort query keys when assembling full paths
    pub sorted_query: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            cache: AdaptiveConfig::default(),
            hotspot: HotspotConfig::default(),
            fast_path: true,
            sorted_query: false,
        }
    }
}

impl MatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(mut self, cache: AdaptiveConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn hotspot(mut self, hotspot: HotspotConfig) -> Self {
        self.hotspot = hotspot;
        self
    }

    pub fn fast_path(mut self, enabled: bool) -> Self {
        self.fast_path = enabled;
        self
    }

    pub fn sorted_query(mut self) -> Self {
        self.sorted_query = true;
        self
    }
}
