use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    ActiveEngagement, EngagementId, EngagementStage, LocationTracking, LocationUpdate, Party,
};
use super::payment::{CodeGenerator, PaymentHandshake};
use super::repository::EngagementRepository;
use super::timer::{BillingTimer, TimerReading};
use super::view::EngagementView;
use crate::clock::Clock;
use crate::error::{EngineError, EntityKind};
use crate::workflows::matching::JobCatalog;
use crate::workflows::notifications::{LifecycleEvent, NotificationSink};
use crate::workflows::offers::{Offer, OfferId, OfferStatus};
use crate::workflows::store::RepositoryError;

static ENGAGEMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_engagement_id() -> EngagementId {
    let id = ENGAGEMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EngagementId(format!("eng-{id:06}"))
}

/// Code handed back to the requesting party; the counterpart enters it to release payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCodeIssue {
    pub engagement_id: EngagementId,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Owns active engagements and drives their location, payment and billing sub-machines.
pub struct EngagementManager {
    engagements: Arc<dyn EngagementRepository>,
    jobs: Arc<dyn JobCatalog>,
    codes: Arc<dyn CodeGenerator>,
    notifications: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    code_ttl: Duration,
}

impl EngagementManager {
    pub fn new(
        engagements: Arc<dyn EngagementRepository>,
        jobs: Arc<dyn JobCatalog>,
        codes: Arc<dyn CodeGenerator>,
        notifications: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        code_ttl: Duration,
    ) -> Self {
        Self {
            engagements,
            jobs,
            codes,
            notifications,
            clock,
            code_ttl,
        }
    }

    /// Open the engagement for an accepted offer. Called once per offer by the offer manager.
    pub fn create(&self, offer: &Offer) -> Result<ActiveEngagement, EngineError> {
        if offer.status != OfferStatus::Accepted {
            return Err(EngineError::invalid_state(format!(
                "offer {} is {}, not accepted",
                offer.id,
                offer.status.label()
            )));
        }
        let job = self
            .jobs
            .find_job(&offer.job_id)?
            .ok_or_else(|| EngineError::not_found(EntityKind::Job, offer.job_id.0.clone()))?;

        let now = self.clock.now();
        let engagement = ActiveEngagement {
            id: next_engagement_id(),
            offer_id: offer.id.clone(),
            job_id: offer.job_id.clone(),
            candidate_id: offer.candidate_id.clone(),
            stage: EngagementStage::Accepted,
            location: LocationTracking::idle(),
            payment: PaymentHandshake::default(),
            timer: BillingTimer::idle(job.salary.min),
            created_at: now,
            updated_at: now,
            completed_at: None,
            completed_by: None,
        };

        let stored = self
            .engagements
            .insert(engagement)
            .map_err(|err| match err {
                RepositoryError::Conflict => EngineError::invalid_state(format!(
                    "offer {} already has an engagement",
                    offer.id
                )),
                other => EngineError::Repository(other),
            })?;

        info!(
            engagement_id = %stored.id,
            offer_id = %stored.offer_id,
            hourly_rate = stored.timer.hourly_rate,
            "engagement opened"
        );
        Ok(stored)
    }

    /// Active or completed engagement by id.
    pub fn get(&self, id: &EngagementId) -> Result<ActiveEngagement, EngineError> {
        if let Some(engagement) = self.engagements.fetch_active(id)? {
            return Ok(engagement);
        }
        self.engagements
            .fetch_completed(id)?
            .ok_or_else(|| EngineError::not_found(EntityKind::Engagement, id.0.clone()))
    }

    /// Engagement as served to either party, read at the current clock instant.
    pub fn view(&self, id: &EngagementId) -> Result<EngagementView, EngineError> {
        let engagement = self.get(id)?;
        Ok(EngagementView::at(&engagement, self.clock.now()))
    }

    pub fn present(&self, engagement: &ActiveEngagement) -> EngagementView {
        EngagementView::at(engagement, self.clock.now())
    }

    pub fn find_by_offer(
        &self,
        offer_id: &OfferId,
    ) -> Result<Option<ActiveEngagement>, EngineError> {
        match self.engagements.find_by_offer(offer_id)? {
            Some(id) => self.get(&id).map(Some),
            None => Ok(None),
        }
    }

    pub fn update_location(
        &self,
        id: &EngagementId,
        update: LocationUpdate,
    ) -> Result<ActiveEngagement, EngineError> {
        let now = self.clock.now();
        let mut previous = EngagementStage::Accepted;
        let engagement = self.mutate(id, &mut |engagement| {
            previous = engagement.apply_location(&update, now)?;
            Ok(())
        })?;

        if previous != engagement.stage {
            info!(
                engagement_id = %engagement.id,
                from = %previous,
                to = %engagement.stage,
                "engagement stage advanced"
            );
            self.publish(LifecycleEvent::EngagementStageChanged {
                engagement_id: engagement.id.clone(),
                from: previous,
                to: engagement.stage,
            });
        }
        Ok(engagement)
    }

    pub fn request_payment(
        &self,
        id: &EngagementId,
        requested_by: Party,
    ) -> Result<PaymentCodeIssue, EngineError> {
        let now = self.clock.now();
        let code = self.codes.generate();
        let mut expires_at = now;
        self.mutate(id, &mut |engagement| {
            expires_at = engagement
                .payment
                .issue(code.clone(), requested_by, now, self.code_ttl)?;
            engagement.updated_at = now;
            Ok(())
        })?;

        info!(engagement_id = %id, ?requested_by, %expires_at, "payment code issued");
        self.publish(LifecycleEvent::PaymentCodeIssued {
            engagement_id: id.clone(),
            expires_at,
        });
        Ok(PaymentCodeIssue {
            engagement_id: id.clone(),
            code,
            expires_at,
        })
    }

    pub fn select_direct_payment(
        &self,
        id: &EngagementId,
        requested_by: Party,
    ) -> Result<ActiveEngagement, EngineError> {
        let now = self.clock.now();
        self.mutate(id, &mut |engagement| {
            engagement.payment.choose_direct(requested_by)?;
            engagement.updated_at = now;
            Ok(())
        })
    }

    /// `Ok(false)` for a wrong or lapsed code; only a missing or closed engagement is an error.
    pub fn verify_payment(&self, id: &EngagementId, supplied: &str) -> Result<bool, EngineError> {
        let now = self.clock.now();
        let mut verified = false;
        self.mutate(id, &mut |engagement| {
            verified = engagement.payment.verify(supplied, now);
            if verified {
                engagement.updated_at = now;
            }
            Ok(())
        })?;
        if verified {
            info!(engagement_id = %id, "payment code verified");
        }
        Ok(verified)
    }

    pub fn start_timer(
        &self,
        id: &EngagementId,
        hourly_rate: Option<f64>,
        expected_hours: Option<f64>,
    ) -> Result<TimerReading, EngineError> {
        let now = self.clock.now();
        let engagement = self.mutate(id, &mut |engagement| {
            engagement.timer.start(now, hourly_rate, expected_hours)?;
            engagement.updated_at = now;
            Ok(())
        })?;
        info!(engagement_id = %id, hourly_rate = engagement.timer.hourly_rate, "timer started");
        Ok(engagement.timer.reading(now))
    }

    pub fn resume_timer(
        &self,
        id: &EngagementId,
        hourly_rate: Option<f64>,
        requires_code: bool,
    ) -> Result<TimerReading, EngineError> {
        let now = self.clock.now();
        let engagement = self.mutate(id, &mut |engagement| {
            require_verified_code(engagement, requires_code, "resume")?;
            engagement.timer.resume(now, hourly_rate)?;
            engagement.updated_at = now;
            Ok(())
        })?;
        info!(
            engagement_id = %id,
            accrued = engagement.timer.elapsed_seconds,
            "timer resumed"
        );
        Ok(engagement.timer.reading(now))
    }

    pub fn stop_timer(
        &self,
        id: &EngagementId,
        stopped_by: Party,
        requires_code: bool,
    ) -> Result<TimerReading, EngineError> {
        let now = self.clock.now();
        let engagement = self.mutate(id, &mut |engagement| {
            require_verified_code(engagement, requires_code, "stop")?;
            engagement.timer.stop(stopped_by, now)?;
            engagement.updated_at = now;
            Ok(())
        })?;
        info!(
            engagement_id = %id,
            ?stopped_by,
            elapsed_seconds = engagement.timer.elapsed_seconds,
            "timer stopped"
        );
        Ok(engagement.timer.reading(now))
    }

    /// Live accrual for an engagement, recomputed from the clock on every call.
    pub fn timer_status(&self, id: &EngagementId) -> Result<TimerReading, EngineError> {
        let engagement = self.get(id)?;
        Ok(engagement.timer.reading(self.clock.now()))
    }

    pub fn complete(
        &self,
        id: &EngagementId,
        completed_by: Party,
    ) -> Result<ActiveEngagement, EngineError> {
        let now = self.clock.now();
        let mut previous = EngagementStage::Accepted;
        self.mutate(id, &mut |engagement| {
            previous = engagement.stage;
            engagement.finish(completed_by, now);
            Ok(())
        })?;
        let archived = self.engagements.archive(id)?;

        let reading = archived.timer.reading(now);
        info!(
            engagement_id = %id,
            ?completed_by,
            elapsed_seconds = reading.elapsed_seconds,
            total_cost = reading.total_cost,
            "engagement completed"
        );
        self.publish(LifecycleEvent::EngagementStageChanged {
            engagement_id: id.clone(),
            from: previous,
            to: EngagementStage::Completed,
        });
        self.publish(LifecycleEvent::TimerCompleted {
            engagement_id: id.clone(),
            elapsed_seconds: reading.elapsed_seconds,
            total_cost: reading.total_cost,
        });
        Ok(archived)
    }

    fn mutate(
        &self,
        id: &EngagementId,
        apply: &mut dyn FnMut(&mut ActiveEngagement) -> Result<(), EngineError>,
    ) -> Result<ActiveEngagement, EngineError> {
        let result = self.engagements.modify(id, &mut |engagement| {
            if engagement.is_completed() {
                return Err(completed_error(&engagement.id));
            }
            apply(engagement)
        });

        if let Err(EngineError::NotFound { .. }) = &result {
            if self.engagements.fetch_completed(id)?.is_some() {
                return Err(completed_error(id));
            }
        }
        result
    }

    fn publish(&self, event: LifecycleEvent) {
        let name = event.name();
        if let Err(err) = self.notifications.publish(event) {
            warn!(event = name, error = %err, "failed to publish lifecycle event");
        }
    }
}

fn completed_error(id: &EngagementId) -> EngineError {
    EngineError::invalid_state(format!("engagement {id} is already completed"))
}

fn require_verified_code(
    engagement: &ActiveEngagement,
    requires_code: bool,
    action: &str,
) -> Result<(), EngineError> {
    if requires_code && !engagement.payment.code_verified {
        return Err(EngineError::invalid_state(format!(
            "a verified payment code is required to {action} the timer"
        )));
    }
    Ok(())
}
