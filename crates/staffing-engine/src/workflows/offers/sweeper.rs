use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::domain::OfferId;
use super::service::OfferManager;
use crate::error::EngineError;

/// What one sweep pass looked at and changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub swept_at: Option<DateTime<Utc>>,
    pub scanned: usize,
    pub expired: Vec<OfferId>,
}

impl SweepReport {
    pub fn expired_count(&self) -> usize {
        self.expired.len()
    }
}

/// Expires overdue pending offers. Holds no lock across the scan; each offer is locked only
/// while its own expiry is applied.
#[derive(Clone)]
pub struct ExpirySweeper {
    offers: Arc<OfferManager>,
}

impl ExpirySweeper {
    pub fn new(offers: Arc<OfferManager>) -> Self {
        Self { offers }
    }

    pub fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, EngineError> {
        let pending = self.offers.pending_offers()?;
        let mut report = SweepReport {
            swept_at: Some(now),
            scanned: pending.len(),
            expired: Vec::new(),
        };

        for offer in pending.into_iter().filter(|offer| offer.is_expired_at(now)) {
            // Resolved between the scan and here: `expire` reports false.
            if self.offers.expire(&offer.id, now)? {
                report.expired.push(offer.id);
            }
        }

        if report.expired.is_empty() {
            debug!(scanned = report.scanned, "sweep found nothing to expire");
        } else {
            info!(
                scanned = report.scanned,
                expired = report.expired_count(),
                "sweep expired offers"
            );
        }
        Ok(report)
    }

    /// Sweep against the manager's own clock.
    pub fn sweep_now(&self) -> Result<SweepReport, EngineError> {
        let now = self.offers.clock().now();
        self.sweep(now)
    }
}
