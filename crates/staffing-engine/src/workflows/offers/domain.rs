use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::workflows::matching::{CandidateId, JobId};

/// Identifier wrapper for offers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OfferId(pub String);

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Offer lifecycle. Everything except `Pending` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
    Cancelled,
}

impl OfferStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Declined => "declined",
            OfferStatus::Expired => "expired",
            OfferStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, OfferStatus::Pending)
    }
}

/// Candidate-side answer to a pending offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveOutcome {
    Accepted,
    Declined,
}

/// Why a candidate declined. `is_valid` is decided by the caller; the engine never reads `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclineReason {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub text: String,
    pub is_valid: bool,
}

impl DeclineReason {
    pub fn unspecified() -> Self {
        Self {
            code: None,
            text: String::new(),
            is_valid: false,
        }
    }
}

/// Free-form payload attached to a resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDetails {
    #[serde(default)]
    pub reason: Option<DeclineReason>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Frozen response recorded when an offer leaves `Pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OfferResponse {
    Accepted {
        accepted_at: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    Declined {
        reason: DeclineReason,
        declined_at: DateTime<Utc>,
    },
    Expired {
        message: String,
        expired_at: DateTime<Utc>,
    },
    Cancelled {
        cancelled_at: DateTime<Utc>,
    },
}

impl OfferResponse {
    pub const fn status(&self) -> OfferStatus {
        match self {
            OfferResponse::Accepted { .. } => OfferStatus::Accepted,
            OfferResponse::Declined { .. } => OfferStatus::Declined,
            OfferResponse::Expired { .. } => OfferStatus::Expired,
            OfferResponse::Cancelled { .. } => OfferStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub job_id: JobId,
    pub candidate_id: CandidateId,
    pub status: OfferStatus,
    pub match_percentage: u8,
    pub expires_at: DateTime<Utc>,
    pub message: Option<String>,
    pub auto_sent: bool,
    pub response: Option<OfferResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    pub fn is_pending(&self) -> bool {
        self.status == OfferStatus::Pending
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn ensure_pending(&self, action: &str) -> Result<(), EngineError> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(EngineError::invalid_state(format!(
                "cannot {action} offer {}: already {}",
                self.id,
                self.status.label()
            )))
        }
    }

    /// Move a pending offer to the terminal status implied by `response`.
    pub fn settle(&mut self, response: OfferResponse, now: DateTime<Utc>) -> Result<(), EngineError> {
        if !self.is_pending() {
            return Err(EngineError::invalid_state(format!(
                "offer {} is already {} and cannot become {}",
                self.id,
                self.status.label(),
                response.status().label()
            )));
        }
        self.status = response.status();
        self.response = Some(response);
        self.updated_at = now;
        Ok(())
    }
}

/// Request to send an offer for a job to a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOffer {
    pub job_id: JobId,
    pub candidate_id: CandidateId,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub auto_sent: bool,
}

impl SendOffer {
    pub fn new(job_id: JobId, candidate_id: CandidateId) -> Self {
        Self {
            job_id,
            candidate_id,
            expires_at: None,
            message: None,
            auto_sent: false,
        }
    }
}
