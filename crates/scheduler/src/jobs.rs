//! Cron-style lifecycle scans: activation, expiration, and cleanup.
//!
//! Each scan is a read-then-conditional-write pass over the store. Rows are
//! updated independently; one row's failure is logged and the scan moves on.
//! A scan error at the top level is logged and swallowed — the next tick
//! rescans from scratch. Each job carries a single-flight guard so a slow
//! tick is skipped rather than run concurrently with itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Months, Utc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use vendora_ads::store::AdStore;
use vendora_core::config::SchedulerConfig;
use vendora_core::error::AdResult;
use vendora_core::types::{ExternalAdStatus, ServiceAdStatus};

/// Guard against overlapping runs of the same job.
pub struct SingleFlight {
    in_flight: AtomicBool,
}

pub struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self {
            in_flight: AtomicBool::new(false),
        }
    }

    /// Returns a guard when no run is in flight; `None` means skip this tick.
    pub fn try_begin(&self) -> Option<FlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard {
                flag: &self.in_flight,
            })
    }
}

impl Default for SingleFlight {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupOutcome {
    pub purged_requests: usize,
    /// Expired ads past retention — counted for a future archival pass.
    pub stale_expired_ads: usize,
}

pub struct AdScans {
    store: Arc<AdStore>,
    config: SchedulerConfig,
}

impl AdScans {
    pub fn new(store: Arc<AdStore>, config: SchedulerConfig) -> Self {
        Self { store, config }
    }

    /// Guarded per-row activation. Re-checks under the entry lock; another
    /// path may have moved the row since the scan query. Returns whether the
    /// row actually flipped.
    fn activate_if_due(&self, id: Uuid, now: DateTime<Utc>) -> AdResult<bool> {
        let mut flipped = false;
        self.store.try_update_service_ad(id, |ad| {
            if ad.status == ServiceAdStatus::Scheduled && ad.admin_start_date <= now {
                ad.status = ServiceAdStatus::Active;
                ad.actual_start_date = Some(now);
                flipped = true;
            }
            Ok(())
        })?;
        Ok(flipped)
    }

    fn expire_service_if_due(&self, id: Uuid, now: DateTime<Utc>) -> AdResult<bool> {
        let mut flipped = false;
        self.store.try_update_service_ad(id, |ad| {
            if matches!(ad.status, ServiceAdStatus::Active | ServiceAdStatus::Paused)
                && ad.admin_end_date <= now
            {
                ad.status = ServiceAdStatus::Expired;
                ad.actual_end_date = Some(now);
                flipped = true;
            }
            Ok(())
        })?;
        Ok(flipped)
    }

    fn expire_external_if_due(&self, id: Uuid, now: DateTime<Utc>) -> AdResult<bool> {
        let mut flipped = false;
        self.store.try_update_external_ad(id, |ad| {
            if ad.status == ExternalAdStatus::Active && ad.end_date <= now {
                ad.status = ExternalAdStatus::Expired;
                flipped = true;
            }
            Ok(())
        })?;
        Ok(flipped)
    }

    /// Scheduled ads whose admin start date has passed become Active.
    /// Rows the re-check skips are not counted or logged.
    pub fn run_activation_scan(&self, now: DateTime<Utc>) -> AdResult<usize> {
        let mut activated = 0;
        for ad in self.store.ads_due_for_activation(now) {
            match self.activate_if_due(ad.id, now) {
                Ok(true) => {
                    activated += 1;
                    info!(ad_id = %ad.id, "service ad activated");
                }
                Ok(false) => {}
                Err(e) => error!(ad_id = %ad.id, error = %e, "activation update failed"),
            }
        }
        metrics::counter!("scheduler.ads_activated").increment(activated as u64);
        Ok(activated)
    }

    /// Active/paused service ads and active external ads past their end date
    /// become Expired.
    pub fn run_expiration_scan(&self, now: DateTime<Utc>) -> AdResult<usize> {
        let mut expired = 0;
        for ad in self.store.ads_due_for_expiration(now) {
            match self.expire_service_if_due(ad.id, now) {
                Ok(true) => {
                    expired += 1;
                    info!(ad_id = %ad.id, "service ad expired");
                }
                Ok(false) => {}
                Err(e) => error!(ad_id = %ad.id, error = %e, "expiration update failed"),
            }
        }

        for ad in self.store.external_ads_due_for_expiration(now) {
            match self.expire_external_if_due(ad.id, now) {
                Ok(true) => {
                    expired += 1;
                    info!(ad_id = %ad.id, "external ad expired");
                }
                Ok(false) => {}
                Err(e) => error!(ad_id = %ad.id, error = %e, "expiration update failed"),
            }
        }
        metrics::counter!("scheduler.ads_expired").increment(expired as u64);
        Ok(expired)
    }

    /// Purges rejected requests past retention; counts (but does not yet
    /// archive) expired ads past the same retention window.
    pub fn run_cleanup_scan(&self, now: DateTime<Utc>) -> AdResult<CleanupOutcome> {
        let cutoff = now
            .checked_sub_months(Months::new(self.config.rejected_retention_months))
            .unwrap_or(now);
        let purged_requests = self.store.purge_rejected_before(cutoff);
        let stale_expired_ads = self.store.count_expired_before(cutoff);
        info!(
            purged_requests,
            stale_expired_ads,
            cutoff = %cutoff,
            "cleanup scan finished"
        );
        metrics::counter!("scheduler.requests_purged").increment(purged_requests as u64);
        Ok(CleanupOutcome {
            purged_requests,
            stale_expired_ads,
        })
    }
}

fn spawn_scan_loop(
    name: &'static str,
    interval_secs: u64,
    run: impl Fn() -> AdResult<usize> + Send + 'static,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let flight = SingleFlight::new();
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so startup doesn't race
        // store seeding.
        interval.tick().await;
        loop {
            interval.tick().await;
            let Some(_guard) = flight.try_begin() else {
                warn!(job = name, "previous run still in flight, skipping tick");
                continue;
            };
            match run() {
                Ok(touched) if touched > 0 => info!(job = name, touched, "scan tick"),
                Ok(_) => {}
                Err(e) => error!(job = name, error = %e, "scan failed, will retry next tick"),
            }
        }
    })
}

/// Spawns the three scan loops on the current tokio runtime.
pub fn spawn_scans(scans: Arc<AdScans>, config: &SchedulerConfig) -> Vec<JoinHandle<()>> {
    let activation = {
        let scans = scans.clone();
        spawn_scan_loop("activation", config.activation_interval_secs, move || {
            scans.run_activation_scan(Utc::now())
        })
    };
    let expiration = {
        let scans = scans.clone();
        spawn_scan_loop("expiration", config.expiration_interval_secs, move || {
            scans.run_expiration_scan(Utc::now())
        })
    };
    let cleanup = {
        let scans = scans.clone();
        spawn_scan_loop("cleanup", config.cleanup_interval_secs, move || {
            scans
                .run_cleanup_scan(Utc::now())
                .map(|outcome| outcome.purged_requests)
        })
    };
    vec![activation, expiration, cleanup]
}
