//! Sweep statistics
//!
//! Tracks what a single expiry sweep observed and retired.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Statistics from a single expiry sweep
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepStats {
    /// Records observed past their expiry
    pub lapsed: usize,

    /// Records actually retired (journal deleted, notification emitted)
    pub retired: usize,

    /// Lapsed records skipped because the observed record was no longer
    /// current (a manual clear or replacement raced the sweep)
    pub skipped: usize,

    /// Time taken to complete the sweep
    pub duration: Option<Duration>,
}

impl SweepStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Format a human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Sweep: {} lapsed | {} retired | {} skipped (raced)",
            self.lapsed, self.retired, self.skipped
        )
    }
}

/// Accumulates stats while a sweep is in progress
#[derive(Debug, Clone)]
pub struct SweepStatsBuilder {
    stats: SweepStats,
    start_time: Instant,
}

impl SweepStatsBuilder {
    pub fn new() -> Self {
        Self {
            stats: SweepStats::new(),
            start_time: Instant::now(),
        }
    }

    pub fn record_lapsed(&mut self) {
        self.stats.lapsed += 1;
    }

    pub fn record_retired(&mut self) {
        self.stats.retired += 1;
    }

    pub fn record_skipped(&mut self) {
        self.stats.skipped += 1;
    }

    /// Finalize and return the stats
    pub fn finish(mut self) -> SweepStats {
        self.stats.duration = Some(self.start_time.elapsed());
        self.stats
    }
}

impl Default for SweepStatsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_builder() {
        let mut builder = SweepStatsBuilder::new();

        builder.record_lapsed();
        builder.record_lapsed();
        builder.record_retired();
        builder.record_skipped();

        let stats = builder.finish();
        assert_eq!(stats.lapsed, 2);
        assert_eq!(stats.retired, 1);
        assert_eq!(stats.skipped, 1);
        assert!(stats.duration.is_some());
    }

    #[test]
    fn test_summary() {
        let mut builder = SweepStatsBuilder::new();
        builder.record_lapsed();
        builder.record_retired();

        let summary = builder.finish().summary();
        assert!(summary.contains("1 lapsed"));
        assert!(summary.contains("1 retired"));
        assert!(summary.contains("0 skipped"));
    }
}
