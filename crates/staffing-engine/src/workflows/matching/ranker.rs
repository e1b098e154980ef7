use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::domain::{
    CandidateProfile, JobId, JobPosting, MatchSnapshot, RankFilters, RankedSnapshot, RankingMode,
};
use super::scorer::MatchScorer;
use crate::clock::Clock;
use crate::workflows::reputation::ReputationStore;
use crate::workflows::store::RepositoryError;

/// Storage for the latest ranked snapshot of each job.
pub trait RankingRepository: Send + Sync {
    fn fetch(&self, job_id: &JobId) -> Result<Option<RankedSnapshot>, RepositoryError>;

    /// Replace the job's snapshot with `build(previous)` atomically.
    fn replace(
        &self,
        job_id: &JobId,
        build: &mut dyn FnMut(Option<&RankedSnapshot>) -> RankedSnapshot,
    ) -> Result<RankedSnapshot, RepositoryError>;
}

#[derive(Debug, Default)]
pub struct InMemoryRankingRepository {
    snapshots: Mutex<HashMap<JobId, RankedSnapshot>>,
}

impl RankingRepository for InMemoryRankingRepository {
    fn fetch(&self, job_id: &JobId) -> Result<Option<RankedSnapshot>, RepositoryError> {
        let snapshots = self
            .snapshots
            .lock()
            .map_err(|_| RepositoryError::Unavailable("ranking lock poisoned".to_string()))?;
        Ok(snapshots.get(job_id).cloned())
    }

    fn replace(
        &self,
        job_id: &JobId,
        build: &mut dyn FnMut(Option<&RankedSnapshot>) -> RankedSnapshot,
    ) -> Result<RankedSnapshot, RepositoryError> {
        let mut snapshots = self
            .snapshots
            .lock()
            .map_err(|_| RepositoryError::Unavailable("ranking lock poisoned".to_string()))?;
        let next = build(snapshots.get(job_id));
        snapshots.insert(job_id.clone(), next.clone());
        Ok(next)
    }
}

/// Result caps per ranking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankLimits {
    pub quick_search: usize,
    pub manual_search: usize,
}

impl Default for RankLimits {
    fn default() -> Self {
        Self {
            quick_search: 20,
            manual_search: 10,
        }
    }
}

impl RankLimits {
    pub fn for_mode(&self, mode: RankingMode) -> usize {
        match mode {
            RankingMode::QuickSearch => self.quick_search,
            RankingMode::ManualSearch => self.manual_search,
        }
    }
}

fn by_rank(left: &MatchSnapshot, right: &MatchSnapshot) -> Ordering {
    right
        .combined_score
        .partial_cmp(&left.combined_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| left.candidate_id.cmp(&right.candidate_id))
}

/// Scores a candidate pool against a job and freezes the ordering per job.
pub struct MatchRanker {
    scorer: MatchScorer,
    reputation: Arc<dyn ReputationStore>,
    snapshots: Arc<dyn RankingRepository>,
    clock: Arc<dyn Clock>,
    limits: RankLimits,
}

impl MatchRanker {
    pub fn new(
        scorer: MatchScorer,
        reputation: Arc<dyn ReputationStore>,
        snapshots: Arc<dyn RankingRepository>,
        clock: Arc<dyn Clock>,
        limits: RankLimits,
    ) -> Self {
        Self {
            scorer,
            reputation,
            snapshots,
            clock,
            limits,
        }
    }

    pub fn scorer(&self) -> &MatchScorer {
        &self.scorer
    }

    /// Rank `pool` for `job`, storing the result as the job's current snapshot.
    pub fn rank(
        &self,
        job: &JobPosting,
        pool: &[CandidateProfile],
        filters: &RankFilters,
        mode: RankingMode,
    ) -> Result<RankedSnapshot, RepositoryError> {
        let mut entries = pool
            .iter()
            .filter(|candidate| filters.admits(candidate))
            .map(|candidate| self.snapshot_for(job, candidate, mode))
            .collect::<Result<Vec<_>, _>>()?;

        entries.sort_by(by_rank);
        entries.truncate(self.limits.for_mode(mode));

        let ranked = RankedSnapshot {
            job_id: job.id.clone(),
            mode,
            generated_at: self.clock.now(),
            entries,
        };

        debug!(
            job_id = %job.id,
            ?mode,
            pool = pool.len(),
            ranked = ranked.entries.len(),
            "ranked candidate pool"
        );

        self.snapshots.replace(&job.id, &mut |_| ranked.clone())
    }

    pub fn snapshot(&self, job_id: &JobId) -> Result<Option<RankedSnapshot>, RepositoryError> {
        self.snapshots.fetch(job_id)
    }

    /// Score one candidate outside of a ranking pass.
    pub fn score_candidate(
        &self,
        job: &JobPosting,
        candidate: &CandidateProfile,
        mode: RankingMode,
    ) -> Result<MatchSnapshot, RepositoryError> {
        self.snapshot_for(job, candidate, mode)
    }

    /// Fold an ad hoc entry into the job's stored ranking, producing a new snapshot.
    pub fn merge(
        &self,
        job_id: &JobId,
        entry: MatchSnapshot,
    ) -> Result<RankedSnapshot, RepositoryError> {
        let now = self.clock.now();
        self.snapshots.replace(job_id, &mut |previous| {
            let (mode, mut entries) = match previous {
                Some(snapshot) => (snapshot.mode, snapshot.entries.clone()),
                None => (RankingMode::ManualSearch, Vec::new()),
            };
            entries.retain(|existing| existing.candidate_id != entry.candidate_id);
            entries.push(entry.clone());
            entries.sort_by(by_rank);
            RankedSnapshot {
                job_id: job_id.clone(),
                mode,
                generated_at: now,
                entries,
            }
        })
    }

    fn snapshot_for(
        &self,
        job: &JobPosting,
        candidate: &CandidateProfile,
        mode: RankingMode,
    ) -> Result<MatchSnapshot, RepositoryError> {
        let match_percentage = self.scorer.score(job, candidate);
        let reputation_score = self.reputation.score(&candidate.id)?;
        Ok(MatchSnapshot {
            candidate_id: candidate.id.clone(),
            match_percentage,
            reputation_score,
            combined_score: mode.combined_score(match_percentage, reputation_score),
        })
    }
}
