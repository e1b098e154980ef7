use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::payment::PaymentHandshake;
use super::timer::BillingTimer;
use crate::error::EngineError;
use crate::workflows::matching::{CandidateId, JobId};
use crate::workflows::offers::OfferId;

/// Identifier wrapper for active engagements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngagementId(pub String);

impl fmt::Display for EngagementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Phases of an engagement. Declaration order is the only legal direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementStage {
    Accepted,
    Preparing,
    EnRoute,
    Approaching,
    Arrived,
    InProgress,
    Completed,
}

impl EngagementStage {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Accepted,
            Self::Preparing,
            Self::EnRoute,
            Self::Approaching,
            Self::Arrived,
            Self::InProgress,
            Self::Completed,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Preparing => "preparing",
            Self::EnRoute => "en_route",
            Self::Approaching => "approaching",
            Self::Arrived => "arrived",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Forward moves and same-stage refreshes are allowed; nothing reaches `Completed` this way.
    pub fn check_transition(self, next: Self) -> Result<(), EngineError> {
        if next < self || next == Self::Completed {
            return Err(EngineError::InvalidTransition {
                from: self,
                to: next,
            });
        }
        Ok(())
    }
}

impl fmt::Display for EngagementStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Opaque position reported by the device; the engine stores it without interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Side of the engagement acting on the payment handshake or timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Jobseeker,
    Recruiter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationTracking {
    pub enabled: bool,
    pub stage: EngagementStage,
    pub current_location: Option<Coordinate>,
    pub distance_from_home_km: Option<f64>,
    pub distance_from_workplace_km: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl LocationTracking {
    pub fn idle() -> Self {
        Self {
            enabled: false,
            stage: EngagementStage::Accepted,
            current_location: None,
            distance_from_home_km: None,
            distance_from_workplace_km: None,
            last_updated: None,
        }
    }
}

/// Caller-derived location sample; stage inference from coordinates happens upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub location: Coordinate,
    pub stage: EngagementStage,
    pub distance_from_home_km: f64,
    pub distance_from_workplace_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEngagement {
    pub id: EngagementId,
    pub offer_id: OfferId,
    pub job_id: JobId,
    pub candidate_id: CandidateId,
    pub stage: EngagementStage,
    pub location: LocationTracking,
    pub payment: PaymentHandshake,
    pub timer: BillingTimer,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<Party>,
}

impl ActiveEngagement {
    pub fn is_completed(&self) -> bool {
        self.stage == EngagementStage::Completed
    }

    /// Record a location sample and move the stage forward. Returns the previous stage.
    pub fn apply_location(
        &mut self,
        update: &LocationUpdate,
        now: DateTime<Utc>,
    ) -> Result<EngagementStage, EngineError> {
        let previous = self.stage;
        previous.check_transition(update.stage)?;

        self.stage = update.stage;
        self.location = LocationTracking {
            enabled: true,
            stage: update.stage,
            current_location: Some(update.location),
            distance_from_home_km: Some(update.distance_from_home_km),
            distance_from_workplace_km: Some(update.distance_from_workplace_km),
            last_updated: Some(now),
        };
        self.updated_at = now;
        Ok(previous)
    }

    /// Accrue any running segment, close the engagement and release location tracking.
    pub fn finish(&mut self, completed_by: Party, now: DateTime<Utc>) {
        if self.timer.is_running {
            self.timer.accrue_and_halt(completed_by, now);
        }
        self.stage = EngagementStage::Completed;
        self.location.enabled = false;
        self.location.stage = EngagementStage::Completed;
        self.completed_at = Some(now);
        self.completed_by = Some(completed_by);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backward_moves_are_rejected() {
        match EngagementStage::Approaching.check_transition(EngagementStage::Preparing) {
            Err(EngineError::InvalidTransition { from, to }) => {
                assert_eq!(from, EngagementStage::Approaching);
                assert_eq!(to, EngagementStage::Preparing);
            }
            other => panic!("expected invalid transition, got {other:?}"),
        }
    }

    #[test]
    fn forward_skips_and_refreshes_are_allowed() {
        assert!(EngagementStage::Approaching
            .check_transition(EngagementStage::Arrived)
            .is_ok());
        assert!(EngagementStage::Accepted
            .check_transition(EngagementStage::Arrived)
            .is_ok());
        assert!(EngagementStage::EnRoute
            .check_transition(EngagementStage::EnRoute)
            .is_ok());
    }

    #[test]
    fn completion_is_not_reachable_through_location() {
        assert!(EngagementStage::InProgress
            .check_transition(EngagementStage::Completed)
            .is_err());
    }

    #[test]
    fn ordered_matches_declaration_order() {
        let stages = EngagementStage::ordered();
        assert!(stages.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(stages[2].label(), "en_route");
    }
}
