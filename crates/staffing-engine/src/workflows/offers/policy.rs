use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::domain::DeclineReason;
use crate::config::EngineConfig;
use crate::workflows::reputation::ScoreBounds;

/// Reputation and expiry dials applied when offers are sent and resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferPolicy {
    pub offer_ttl_days: i64,
    pub accept_reward: i16,
    pub decline_penalty: i16,
    pub penalty_match_threshold: u8,
    pub penalty_floor: u8,
}

impl Default for OfferPolicy {
    fn default() -> Self {
        Self {
            offer_ttl_days: 30,
            accept_reward: 2,
            decline_penalty: 5,
            penalty_match_threshold: 70,
            penalty_floor: 40,
        }
    }
}

impl From<&EngineConfig> for OfferPolicy {
    fn from(config: &EngineConfig) -> Self {
        Self {
            offer_ttl_days: config.offer_ttl_days,
            ..Self::default()
        }
    }
}

impl OfferPolicy {
    pub fn offer_ttl(&self) -> Duration {
        Duration::days(self.offer_ttl_days)
    }

    pub fn accept_bounds(&self) -> ScoreBounds {
        ScoreBounds::FULL
    }

    pub fn decline_bounds(&self) -> ScoreBounds {
        ScoreBounds::new(self.penalty_floor, ScoreBounds::FULL.ceiling)
    }

    /// Strong matches declined without a recognised reason cost reputation; nothing else does.
    pub fn penalizes_decline(&self, match_percentage: u8, reason: &DeclineReason) -> bool {
        match_percentage >= self.penalty_match_threshold && !reason.is_valid
    }
}
