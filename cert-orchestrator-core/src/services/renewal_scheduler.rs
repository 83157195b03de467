//! Periodic renewal of certificates nearing expiry.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::error::CoreResult;
use crate::services::{ChallengeEngine, ServiceContext};
use crate::types::{DomainRecord, ExpiringDomain};

/// Counters from one completed renewal scan.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    /// Auto-renew domains examined.
    pub scanned: usize,
    /// Domains inside their renewal window.
    pub due: usize,
    /// Renewals that succeeded and were persisted.
    pub renewed: usize,
    /// Renewals that failed. Failures are logged per domain and never stop
    /// the rest of the batch.
    pub failed: usize,
}

/// Scans domain records on a fixed period and renews expiring certificates.
///
/// Scans are single-flight: a trigger that arrives while a scan is still
/// running is dropped, not queued.
pub struct RenewalScheduler {
    ctx: Arc<ServiceContext>,
    engine: Arc<ChallengeEngine>,
    scan_lock: Mutex<()>,
}

impl RenewalScheduler {
    /// Creates the scheduler.
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>, engine: Arc<ChallengeEngine>) -> Self {
        Self {
            ctx,
            engine,
            scan_lock: Mutex::new(()),
        }
    }

    /// Runs the scan loop until the shutdown signal flips to `true`.
    ///
    /// The embedding application owns the task; spawn this future at startup
    /// and flip the watch channel to stop it.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let period = StdDuration::from_secs(self.ctx.config.renew_check_interval_secs);
        log::info!(
            "Renewal scheduler started (every {}s)",
            period.as_secs()
        );

        let mut timer = tokio::time::interval(period);
        timer.tick().await; // consume the immediate first tick

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    if let Err(e) = self.scan_once().await {
                        log::error!("Renewal scan failed: {e}");
                    }
                }
                changed = shutdown.changed() => {
                    // a dropped sender also means the application is going away
                    if changed.is_err() || *shutdown.borrow() {
                        log::info!("Renewal scheduler stopping");
                        return;
                    }
                }
            }
        }
    }

    /// Performs one scan. Returns `None` when a previous scan is still
    /// running and this trigger was dropped.
    pub async fn scan_once(&self) -> CoreResult<Option<ScanSummary>> {
        let Ok(_guard) = self.scan_lock.try_lock() else {
            log::debug!("Renewal scan already in flight, dropping trigger");
            return Ok(None);
        };

        let now = Utc::now();
        let candidates = self.ctx.domain_repository.find_auto_renew().await?;

        let mut due: Vec<DomainRecord> = candidates
            .iter()
            .filter(|r| Self::needs_renewal(r, now))
            .cloned()
            .collect();
        // soonest expiry first
        due.sort_by_key(|r| r.cert_valid_to);

        let mut summary = ScanSummary {
            scanned: candidates.len(),
            due: due.len(),
            ..ScanSummary::default()
        };

        if due.is_empty() {
            log::info!("All certificates healthy, nothing to renew");
            return Ok(Some(summary));
        }
        log::info!("{} domain(s) due for renewal", due.len());

        for record in due {
            match self.renew_one(&record.domain).await {
                Ok(true) => summary.renewed += 1,
                // record vanished between scan and action
                Ok(false) => {}
                Err(e) => {
                    summary.failed += 1;
                    if e.is_expected() {
                        log::warn!("Renewal of {} skipped: {e}", record.domain);
                    } else {
                        log::error!("Renewal of {} failed: {e}", record.domain);
                    }
                }
            }
        }

        log::info!(
            "Renewal scan finished: {} renewed, {} failed of {} due",
            summary.renewed,
            summary.failed,
            summary.due
        );
        Ok(Some(summary))
    }

    /// Whether a domain sits inside its renewal window.
    ///
    /// Already-expired certificates are excluded from the routine pass —
    /// they need more urgent handling than a background renewal.
    #[must_use]
    pub fn needs_renewal(record: &DomainRecord, now: DateTime<Utc>) -> bool {
        if !record.auto_renew {
            return false;
        }
        match record.cert_valid_to {
            Some(to) => now < to && to <= now + Duration::days(i64::from(record.renew_before_days)),
            None => false,
        }
    }

    /// Renews one domain and persists the new validity window.
    /// `Ok(false)` means the record no longer exists.
    async fn renew_one(&self, domain: &str) -> CoreResult<bool> {
        let Some(mut record) = self.ctx.domain_repository.find_by_name(domain).await? else {
            log::debug!("Domain {domain} disappeared before renewal, skipping");
            return Ok(false);
        };

        let issued = self
            .engine
            .renew(&record.domain, record.provider, &record.credentials)
            .await?;

        record.apply_issuance(&issued, Utc::now());
        self.ctx.domain_repository.save(&record).await?;
        log::info!(
            "Certificate for {} renewed, valid until {}",
            record.domain,
            issued.valid_to
        );
        Ok(true)
    }

    /// Domains whose certificate expires within the window, soonest first.
    pub async fn list_expiring(&self, within_days: u32) -> CoreResult<Vec<ExpiringDomain>> {
        let now = Utc::now();
        let horizon = now + Duration::days(i64::from(within_days));

        let mut expiring: Vec<ExpiringDomain> = self
            .ctx
            .domain_repository
            .find_all()
            .await?
            .into_iter()
            .filter_map(|r| r.cert_valid_to.map(|to| (r.domain, to)))
            .filter(|(_, to)| *to > now && *to <= horizon)
            .map(|(domain, to)| ExpiringDomain {
                domain,
                cert_valid_to: to,
                days_remaining: (to - now).num_days(),
            })
            .collect();
        expiring.sort_by_key(|e| e.cert_valid_to);
        Ok(expiring)
    }
}
