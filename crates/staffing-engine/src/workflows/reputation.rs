//! Per-candidate acceptance reputation (0–100).

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::matching::CandidateId;
use super::store::RepositoryError;

pub const REPUTATION_MAX: u8 = 100;

/// Inclusive clamp applied to an adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBounds {
    pub floor: u8,
    pub ceiling: u8,
}

impl ScoreBounds {
    pub const FULL: ScoreBounds = ScoreBounds {
        floor: 0,
        ceiling: REPUTATION_MAX,
    };

    pub const fn new(floor: u8, ceiling: u8) -> Self {
        Self { floor, ceiling }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationChange {
    pub candidate_id: CandidateId,
    pub previous: u8,
    pub current: u8,
}

impl ReputationChange {
    pub fn delta(&self) -> i16 {
        i16::from(self.current) - i16::from(self.previous)
    }
}

pub trait ReputationStore: Send + Sync {
    fn score(&self, candidate_id: &CandidateId) -> Result<u8, RepositoryError>;

    /// Read-modify-write in one step for the candidate.
    fn adjust(
        &self,
        candidate_id: &CandidateId,
        delta: i16,
        bounds: ScoreBounds,
    ) -> Result<ReputationChange, RepositoryError>;

    fn seed(&self, candidate_id: &CandidateId, score: u8) -> Result<(), RepositoryError>;
}

/// Clamp `previous + delta` into `bounds`. A penalty never raises a score that already sits
/// below the floor, and a reward never lowers one above the ceiling.
pub fn apply_delta(previous: u8, delta: i16, bounds: ScoreBounds) -> u8 {
    let target = (i16::from(previous) + delta)
        .clamp(i16::from(bounds.floor), i16::from(bounds.ceiling));
    let target = target.clamp(0, i16::from(REPUTATION_MAX)) as u8;
    match delta.signum() {
        -1 => target.min(previous),
        1 => target.max(previous.min(bounds.ceiling)),
        _ => previous,
    }
}

#[derive(Debug)]
pub struct InMemoryReputationStore {
    default_score: u8,
    scores: Mutex<HashMap<CandidateId, u8>>,
}

impl InMemoryReputationStore {
    pub fn new(default_score: u8) -> Self {
        Self {
            default_score: default_score.min(REPUTATION_MAX),
            scores: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<CandidateId, u8>>, RepositoryError> {
        self.scores
            .lock()
            .map_err(|_| RepositoryError::Unavailable("reputation lock poisoned".to_string()))
    }
}

impl Default for InMemoryReputationStore {
    fn default() -> Self {
        Self::new(REPUTATION_MAX)
    }
}

impl ReputationStore for InMemoryReputationStore {
    fn score(&self, candidate_id: &CandidateId) -> Result<u8, RepositoryError> {
        Ok(self
            .lock()?
            .get(candidate_id)
            .copied()
            .unwrap_or(self.default_score))
    }

    fn adjust(
        &self,
        candidate_id: &CandidateId,
        delta: i16,
        bounds: ScoreBounds,
    ) -> Result<ReputationChange, RepositoryError> {
        let mut scores = self.lock()?;
        let previous = scores
            .get(candidate_id)
            .copied()
            .unwrap_or(self.default_score);
        let current = apply_delta(previous, delta, bounds);
        scores.insert(candidate_id.clone(), current);
        Ok(ReputationChange {
            candidate_id: candidate_id.clone(),
            previous,
            current,
        })
    }

    fn seed(&self, candidate_id: &CandidateId, score: u8) -> Result<(), RepositoryError> {
        self.lock()?
            .insert(candidate_id.clone(), score.min(REPUTATION_MAX));
        Ok(())
    }
}
