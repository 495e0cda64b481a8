//! Sweeper Daemon: periodic retirement of lapsed restrictions
//!
//! The sweep is a liveness mechanism, not a correctness one: every store
//! query already applies read-time lazy expiry, so a lapsed record is never
//! *enforced* past its expiry. The sweep's job is to proactively drop lapsed
//! records, delete their journal documents, and emit exactly one `Expired`
//! notification each.
//!
//! Each tick:
//! 1. List records observed past `expires_at` from the store.
//! 2. Conditionally retire each one - the retire only succeeds if the
//!    observed record is still current, so a manual clear that raced the
//!    sweep is skipped without a second notification.
//! 3. Delete the retired record's journal document and notify the sink.

use crate::stats::{SweepStats, SweepStatsBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use warden_core_restrict::journal::{confinement_key, mute_key};
use warden_core_restrict::{
    NotificationSink, RestrictionEvent, RestrictionKind, RestrictionStore, StateJournal,
};

/// Sweeper operational configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    /// Seconds between expiry sweeps
    ///
    /// **Default:** 60
    pub interval_secs: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

impl SweeperConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.interval_secs == 0 {
            return Err("interval_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Background task that retires lapsed restrictions
pub struct Sweeper {
    store: Arc<RestrictionStore>,
    journal: Arc<dyn StateJournal>,
    sink: Arc<dyn NotificationSink>,
    config: SweeperConfig,
}

impl Sweeper {
    /// Create a new Sweeper
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid (zero interval).
    pub fn new(
        store: Arc<RestrictionStore>,
        journal: Arc<dyn StateJournal>,
        sink: Arc<dyn NotificationSink>,
        config: SweeperConfig,
    ) -> Self {
        if let Err(e) = config.validate() {
            panic!("Invalid sweeper config: {}", e);
        }

        Self {
            store,
            journal,
            sink,
            config,
        }
    }

    /// Main loop - runs forever
    ///
    /// Typically spawned as a background tokio task:
    ///
    /// ```no_run
    /// # use warden_sweeper::Sweeper;
    /// # fn wire(sweeper: Sweeper) {
    /// tokio::spawn(async move {
    ///     sweeper.run().await;
    /// });
    /// # }
    /// ```
    pub async fn run(self) {
        info!(
            "🧹 Sweeper active | interval: {}s",
            self.config.interval_secs
        );

        let mut interval = tokio::time::interval(Duration::from_secs(self.config.interval_secs));

        loop {
            interval.tick().await;
            let stats = self.run_sweep();
            if stats.lapsed > 0 {
                info!("{}", stats.summary());
            } else {
                debug!("sweep found nothing lapsed");
            }
        }
    }

    /// Execute a single expiry sweep
    ///
    /// Note: public for integration testing and for embedders that drive
    /// their own schedule.
    pub fn run_sweep(&self) -> SweepStats {
        let mut stats = SweepStatsBuilder::new();

        for record in self.store.expired_records() {
            stats.record_lapsed();

            let retired = match record.kind {
                RestrictionKind::TempMute => self
                    .store
                    .retire_mute_if(record.entity, record.issued_at)
                    .is_some(),
                RestrictionKind::TempJail => self
                    .store
                    .retire_confinement_if(record.entity, record.issued_at)
                    .is_some(),
                // Permanent kinds and warning ledgers never lapse
                _ => false,
            };

            if !retired {
                // The observed record was cleared or replaced since we
                // looked: someone else already handled it.
                stats.record_skipped();
                continue;
            }
            stats.record_retired();

            let key = match record.kind {
                RestrictionKind::TempJail => confinement_key(record.entity),
                _ => mute_key(record.entity),
            };
            if let Err(e) = self.journal.delete(&key) {
                error!(%key, "failed to delete journal document for retired record: {}", e);
            }

            self.sink.notify(
                record.entity,
                RestrictionEvent::Expired { kind: record.kind },
            );
        }

        stats.finish()
    }
}
