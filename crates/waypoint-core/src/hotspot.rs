//! Per-path hit tracking
//!
//! Feeds the preheater with the most frequently matched paths.

use crate::config::HotspotConfig;
use std::collections::HashMap;
use web_time::{Duration, Instant};

/// Observed statistics for one path
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    pub path: String,
    pub hits: u64,
    pub last_access: Instant,
    /// Running average of match latency
    pub average_latency: Duration,
}

/// Hit counts and latency per path, bounded by `max_tracked`
#[derive(Debug)]
pub struct HotspotTracker {
    entries: HashMap<String, Hotspot>,
    max_tracked: usize,
    inactivity: Duration,
}

impl HotspotTracker {
    pub fn new(config: &HotspotConfig) -> Self {
        Self {
            entries: HashMap::new(),
            max_tracked: config.max_tracked,
            inactivity: config.inactivity,
        }
    }

    /// Record one lookup of `path`.
    pub fn record(&mut self, path: &str, latency: Duration, now: Instant) {
        match self.entries.get_mut(path) {
            Some(entry) => {
                entry.hits += 1;
                entry.last_access = now;
                // Incremental mean: avg += (x - avg) / n
                let avg = entry.average_latency.as_secs_f64();
                let next = avg + (latency.as_secs_f64() - avg) / entry.hits as f64;
                entry.average_latency = Duration::from_secs_f64(next.max(0.0));
            }
            None => {
                self.entries.insert(
                    path.to_string(),
                    Hotspot {
                        path: path.to_string(),
                        hits: 1,
                        last_access: now,
                        average_latency: latency,
                    },
                );
            }
        }

        if self.entries.len() > self.max_tracked {
            self.prune(now);
        }
    }

    /// Drop entries idle longer than the inactivity window; if the ceiling
    /// is still exceeded, drop the least recently seen down to 90% of it.
    ///
    /// Returns the number of entries removed.
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let inactivity = self.inactivity;
        self.entries
            .retain(|_, e| now.saturating_duration_since(e.last_access) <= inactivity);

        if self.entries.len() > self.max_tracked {
            let target = self.max_tracked - self.max_tracked / 10;
            let excess = self.entries.len() - target;
            let mut ages: Vec<Instant> = self.entries.values().map(|e| e.last_access).collect();
            let (_, cutoff, _) = ages.select_nth_unstable(excess - 1);
            let cutoff = *cutoff;
            self.entries.retain(|_, e| e.last_access > cutoff);
        }

        before - self.entries.len()
    }

    /// The `n` most hit paths, highest first (ties by path).
    pub fn top(&self, n: usize) -> Vec<Hotspot> {
        let mut all: Vec<&Hotspot> = self.entries.values().collect();
        all.sort_by(|a, b| b.hits.cmp(&a.hits).then_with(|| a.path.cmp(&b.path)));
        all.into_iter().take(n).cloned().collect()
    }

    pub fn get(&self, path: &str) -> Option<&Hotspot> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
