use std::collections::BTreeMap;
use std::sync::RwLock;

use super::domain::{CandidateId, CandidateProfile, JobId, JobPosting};
use crate::workflows::store::RepositoryError;

/// Read access to published job postings.
pub trait JobCatalog: Send + Sync {
    fn find_job(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError>;
}

/// Single lookup capability over every candidate pool the marketplace aggregates.
pub trait CandidateDirectory: Send + Sync {
    fn find_by_id(&self, id: &CandidateId) -> Result<Option<CandidateProfile>, RepositoryError>;
    fn candidates(&self) -> Result<Vec<CandidateProfile>, RepositoryError>;
}

/// Catalog + directory backed by in-process maps; pools are merged into one keyspace.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    jobs: RwLock<BTreeMap<JobId, JobPosting>>,
    candidates: RwLock<BTreeMap<CandidateId, CandidateProfile>>,
}

impl InMemoryDirectory {
    pub fn new(jobs: Vec<JobPosting>, pools: Vec<Vec<CandidateProfile>>) -> Self {
        let directory = Self::default();
        for job in jobs {
            directory.publish_job(job);
        }
        for pool in pools {
            for candidate in pool {
                directory.register_candidate(candidate);
            }
        }
        directory
    }

    pub fn publish_job(&self, job: JobPosting) {
        let mut jobs = self
            .jobs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        jobs.insert(job.id.clone(), job);
    }

    pub fn register_candidate(&self, candidate: CandidateProfile) {
        let mut candidates = self
            .candidates
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        candidates.insert(candidate.id.clone(), candidate);
    }
}

impl JobCatalog for InMemoryDirectory {
    fn find_job(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError> {
        let jobs = self
            .jobs
            .read()
            .map_err(|_| RepositoryError::Unavailable("job catalog lock poisoned".to_string()))?;
        Ok(jobs.get(id).cloned())
    }
}

impl CandidateDirectory for InMemoryDirectory {
    fn find_by_id(&self, id: &CandidateId) -> Result<Option<CandidateProfile>, RepositoryError> {
        let candidates = self.candidates.read().map_err(|_| {
            RepositoryError::Unavailable("candidate directory lock poisoned".to_string())
        })?;
        Ok(candidates.get(id).cloned())
    }

    fn candidates(&self) -> Result<Vec<CandidateProfile>, RepositoryError> {
        let candidates = self.candidates.read().map_err(|_| {
            RepositoryError::Unavailable("candidate directory lock poisoned".to_string())
        })?;
        Ok(candidates.values().cloned().collect())
    }
}
