use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    DeclineReason, Offer, OfferId, OfferResponse, OfferStatus, ResolveOutcome, ResponseDetails,
    SendOffer,
};
use super::policy::OfferPolicy;
use super::repository::OfferRepository;
use crate::clock::Clock;
use crate::error::{EngineError, EntityKind};
use crate::workflows::engagement::{ActiveEngagement, EngagementManager};
use crate::workflows::matching::{
    CandidateDirectory, CandidateId, JobCatalog, JobId, MatchRanker, RankingMode,
};
use crate::workflows::notifications::{LifecycleEvent, NotificationSink};
use crate::workflows::reputation::{ReputationChange, ReputationStore};

static OFFER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_offer_id() -> OfferId {
    let id = OFFER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    OfferId(format!("offer-{id:06}"))
}

const EXPIRED_MESSAGE: &str = "Offer expired without a response";

/// Everything the offer manager reads from or writes to.
pub struct OfferCollaborators {
    pub offers: Arc<dyn OfferRepository>,
    pub jobs: Arc<dyn JobCatalog>,
    pub candidates: Arc<dyn CandidateDirectory>,
    pub ranker: Arc<MatchRanker>,
    pub reputation: Arc<dyn ReputationStore>,
    pub engagements: Arc<EngagementManager>,
    pub notifications: Arc<dyn NotificationSink>,
    pub clock: Arc<dyn Clock>,
}

/// Outcome of resolving an offer: the settled offer plus whatever it caused downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub offer: Offer,
    pub engagement: Option<ActiveEngagement>,
    pub reputation: Option<ReputationChange>,
}

/// Owns offers and their pending → terminal state machine.
pub struct OfferManager {
    offers: Arc<dyn OfferRepository>,
    jobs: Arc<dyn JobCatalog>,
    candidates: Arc<dyn CandidateDirectory>,
    ranker: Arc<MatchRanker>,
    reputation: Arc<dyn ReputationStore>,
    engagements: Arc<EngagementManager>,
    notifications: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    policy: OfferPolicy,
}

impl OfferManager {
    pub fn new(collaborators: OfferCollaborators, policy: OfferPolicy) -> Self {
        let OfferCollaborators {
            offers,
            jobs,
            candidates,
            ranker,
            reputation,
            engagements,
            notifications,
            clock,
        } = collaborators;
        Self {
            offers,
            jobs,
            candidates,
            ranker,
            reputation,
            engagements,
            notifications,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &OfferPolicy {
        &self.policy
    }

    /// Create a pending offer. Candidates missing from the job's ranking are scored on the spot
    /// and merged into it.
    pub fn send(&self, request: SendOffer) -> Result<Offer, EngineError> {
        let job = self
            .jobs
            .find_job(&request.job_id)?
            .ok_or_else(|| EngineError::not_found(EntityKind::Job, request.job_id.0.clone()))?;
        let candidate = self
            .candidates
            .find_by_id(&request.candidate_id)?
            .ok_or_else(|| {
                EngineError::not_found(EntityKind::Candidate, request.candidate_id.0.clone())
            })?;

        let now = self.clock.now();
        let expires_at = request.expires_at.unwrap_or(now + self.policy.offer_ttl());
        if expires_at <= now {
            return Err(EngineError::invalid_state(format!(
                "offer expiry {expires_at} is not in the future"
            )));
        }

        let snapshot = self.ranker.snapshot(&job.id)?;
        let ranked = snapshot
            .as_ref()
            .and_then(|snapshot| snapshot.entry_for(&candidate.id).cloned());
        let entry = match ranked {
            Some(entry) => entry,
            None => {
                let mode = snapshot
                    .as_ref()
                    .map_or(RankingMode::ManualSearch, |snapshot| snapshot.mode);
                let entry = self.ranker.score_candidate(&job, &candidate, mode)?;
                self.ranker.merge(&job.id, entry.clone())?;
                info!(
                    job_id = %job.id,
                    candidate_id = %candidate.id,
                    match_percentage = entry.match_percentage,
                    "scored unranked candidate for direct offer"
                );
                entry
            }
        };

        let offer = Offer {
            id: next_offer_id(),
            job_id: job.id.clone(),
            candidate_id: candidate.id.clone(),
            status: OfferStatus::Pending,
            match_percentage: entry.match_percentage,
            expires_at,
            message: request.message,
            auto_sent: request.auto_sent,
            response: None,
            created_at: now,
            updated_at: now,
        };
        let stored = self.offers.insert(offer)?;

        info!(
            offer_id = %stored.id,
            job_id = %stored.job_id,
            candidate_id = %stored.candidate_id,
            match_percentage = stored.match_percentage,
            auto_sent = stored.auto_sent,
            "offer sent"
        );
        self.publish(LifecycleEvent::OfferSent {
            offer_id: stored.id.clone(),
            job_id: stored.job_id.clone(),
            candidate_id: stored.candidate_id.clone(),
            expires_at: stored.expires_at,
            auto_sent: stored.auto_sent,
        });
        Ok(stored)
    }

    /// Accept or decline a pending offer. Accepting opens the engagement in the same step.
    pub fn resolve(
        &self,
        id: &OfferId,
        outcome: ResolveOutcome,
        details: ResponseDetails,
    ) -> Result<Resolution, EngineError> {
        let now = self.clock.now();
        let mut engagement = None;
        let offer = self.offers.modify(id, &mut |offer| {
            let response = match outcome {
                ResolveOutcome::Accepted => OfferResponse::Accepted {
                    accepted_at: now,
                    note: details.note.clone(),
                },
                ResolveOutcome::Declined => OfferResponse::Declined {
                    reason: details
                        .reason
                        .clone()
                        .unwrap_or_else(DeclineReason::unspecified),
                    declined_at: now,
                },
            };
            offer.settle(response, now)?;
            if outcome == ResolveOutcome::Accepted {
                engagement = Some(self.engagements.create(offer)?);
            }
            Ok(())
        })?;

        let reputation = match &offer.response {
            Some(OfferResponse::Accepted { .. }) => self.adjust_reputation(
                &offer.candidate_id,
                self.policy.accept_reward,
                true,
            ),
            Some(OfferResponse::Declined { reason, .. })
                if self.policy.penalizes_decline(offer.match_percentage, reason) =>
            {
                self.adjust_reputation(&offer.candidate_id, -self.policy.decline_penalty, false)
            }
            _ => None,
        };

        info!(
            offer_id = %offer.id,
            status = offer.status.label(),
            reputation_delta = reputation.as_ref().map_or(0, ReputationChange::delta),
            "offer resolved"
        );
        self.publish(LifecycleEvent::OfferResolved {
            offer_id: offer.id.clone(),
            candidate_id: offer.candidate_id.clone(),
            status: offer.status,
        });

        Ok(Resolution {
            offer,
            engagement,
            reputation,
        })
    }

    /// Withdraw a pending offer. No reputation effect.
    pub fn cancel(&self, id: &OfferId) -> Result<Offer, EngineError> {
        let now = self.clock.now();
        let offer = self.offers.modify(id, &mut |offer| {
            offer.settle(OfferResponse::Cancelled { cancelled_at: now }, now)
        })?;
        info!(offer_id = %offer.id, "offer cancelled");
        self.publish(LifecycleEvent::OfferResolved {
            offer_id: offer.id.clone(),
            candidate_id: offer.candidate_id.clone(),
            status: offer.status,
        });
        Ok(offer)
    }

    /// Expire one offer if it is still pending and `now` is past its expiry.
    /// Returns `false`, leaving the offer untouched, in every other case.
    pub fn expire(&self, id: &OfferId, now: DateTime<Utc>) -> Result<bool, EngineError> {
        let mut expired = false;
        let offer = self.offers.modify(id, &mut |offer| {
            expired = offer.is_pending() && offer.is_expired_at(now);
            if expired {
                offer.settle(
                    OfferResponse::Expired {
                        message: EXPIRED_MESSAGE.to_string(),
                        expired_at: now,
                    },
                    now,
                )?;
            }
            Ok(())
        })?;

        if expired {
            info!(offer_id = %offer.id, expires_at = %offer.expires_at, "offer expired");
            self.publish(LifecycleEvent::OfferExpired {
                offer_id: offer.id.clone(),
                candidate_id: offer.candidate_id.clone(),
            });
        }
        Ok(expired)
    }

    pub fn get(&self, id: &OfferId) -> Result<Offer, EngineError> {
        self.offers
            .fetch(id)?
            .ok_or_else(|| EngineError::not_found(EntityKind::Offer, id.0.clone()))
    }

    pub fn offers_for_job(&self, job_id: &JobId) -> Result<Vec<Offer>, EngineError> {
        Ok(self.offers.for_job(job_id)?)
    }

    pub fn offers_for_candidate(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<Offer>, EngineError> {
        Ok(self.offers.for_candidate(candidate_id)?)
    }

    pub fn pending_offers(&self) -> Result<Vec<Offer>, EngineError> {
        Ok(self.offers.pending()?)
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The offer is already committed when this runs, so a store failure is logged, not returned.
    fn adjust_reputation(
        &self,
        candidate_id: &CandidateId,
        delta: i16,
        reward: bool,
    ) -> Option<ReputationChange> {
        let bounds = if reward {
            self.policy.accept_bounds()
        } else {
            self.policy.decline_bounds()
        };
        match self.reputation.adjust(candidate_id, delta, bounds) {
            Ok(change) => Some(change),
            Err(err) => {
                warn!(candidate_id = %candidate_id, delta, error = %err, "reputation update failed");
                None
            }
        }
    }

    fn publish(&self, event: LifecycleEvent) {
        let name = event.name();
        if let Err(err) = self.notifications.publish(event) {
            warn!(event = name, error = %err, "failed to publish lifecycle event");
        }
    }
}
