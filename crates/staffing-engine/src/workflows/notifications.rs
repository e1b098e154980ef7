use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::engagement::{EngagementId, EngagementStage};
use super::matching::{CandidateId, JobId};
use super::offers::{OfferId, OfferStatus};

/// Transitions surfaced to the notification collaborator. The engine never delivers them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    OfferSent {
        offer_id: OfferId,
        job_id: JobId,
        candidate_id: CandidateId,
        expires_at: DateTime<Utc>,
        auto_sent: bool,
    },
    OfferResolved {
        offer_id: OfferId,
        candidate_id: CandidateId,
        status: OfferStatus,
    },
    OfferExpired {
        offer_id: OfferId,
        candidate_id: CandidateId,
    },
    EngagementStageChanged {
        engagement_id: EngagementId,
        from: EngagementStage,
        to: EngagementStage,
    },
    PaymentCodeIssued {
        engagement_id: EngagementId,
        expires_at: DateTime<Utc>,
    },
    TimerCompleted {
        engagement_id: EngagementId,
        elapsed_seconds: u64,
        total_cost: f64,
    },
}

impl LifecycleEvent {
    pub const fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::OfferSent { .. } => "offer_sent",
            LifecycleEvent::OfferResolved { .. } => "offer_resolved",
            LifecycleEvent::OfferExpired { .. } => "offer_expired",
            LifecycleEvent::EngagementStageChanged { .. } => "engagement_stage_changed",
            LifecycleEvent::PaymentCodeIssued { .. } => "payment_code_issued",
            LifecycleEvent::TimerCompleted { .. } => "timer_completed",
        }
    }
}

/// Outbound hook for push/toast adapters.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: LifecycleEvent) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Sink that only writes events to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn publish(&self, event: LifecycleEvent) -> Result<(), NotificationError> {
        info!(event = event.name(), payload = ?event, "lifecycle event");
        Ok(())
    }
}

/// Sink that keeps every event in memory, for demos and assertions.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<LifecycleEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(LifecycleEvent::name).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn publish(&self, event: LifecycleEvent) -> Result<(), NotificationError> {
        self.events
            .lock()
            .map_err(|_| NotificationError::Transport("recording sink poisoned".to_string()))?
            .push(event);
        Ok(())
    }
}
