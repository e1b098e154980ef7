use std::sync::Arc;

use tracing::debug;

use super::engagement::{
    CodeGenerator, EngagementManager, EngagementRepository, InMemoryEngagementRepository,
    OsCodeGenerator,
};
use super::matching::{
    CandidateDirectory, InMemoryDirectory, InMemoryRankingRepository, JitterSource, JobCatalog,
    JobId, MatchRanker, MatchScorer, RankFilters, RankLimits, RankedSnapshot, RankingMode,
    RankingRepository, SeededJitter,
};
use super::notifications::{NotificationSink, TracingSink};
use super::offers::{
    ExpirySweeper, InMemoryOfferRepository, OfferCollaborators, OfferManager, OfferPolicy,
    OfferRepository,
};
use super::reputation::{InMemoryReputationStore, ReputationStore};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{EngineError, EntityKind};

/// Fully wired engine: matching, offers, engagements and the expiry sweeper sharing one set of
/// collaborators.
pub struct StaffingEngine {
    jobs: Arc<dyn JobCatalog>,
    candidates: Arc<dyn CandidateDirectory>,
    reputation: Arc<dyn ReputationStore>,
    ranker: Arc<MatchRanker>,
    offers: Arc<OfferManager>,
    engagements: Arc<EngagementManager>,
    sweeper: ExpirySweeper,
    clock: Arc<dyn Clock>,
}

impl StaffingEngine {
    pub fn builder(config: EngineConfig) -> StaffingEngineBuilder {
        StaffingEngineBuilder::new(config)
    }

    /// Rank the whole candidate directory for a job and store the snapshot.
    pub fn rank_job(
        &self,
        job_id: &JobId,
        filters: &RankFilters,
        mode: RankingMode,
    ) -> Result<RankedSnapshot, EngineError> {
        let job = self
            .jobs
            .find_job(job_id)?
            .ok_or_else(|| EngineError::not_found(EntityKind::Job, job_id.0.clone()))?;
        let pool = self.candidates.candidates()?;
        Ok(self.ranker.rank(&job, &pool, filters, mode)?)
    }

    pub fn ranker(&self) -> &MatchRanker {
        &self.ranker
    }

    pub fn offers(&self) -> &OfferManager {
        &self.offers
    }

    pub fn engagements(&self) -> &EngagementManager {
        &self.engagements
    }

    pub fn sweeper(&self) -> &ExpirySweeper {
        &self.sweeper
    }

    pub fn reputation(&self) -> &dyn ReputationStore {
        self.reputation.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

/// Builder defaulting every collaborator to its in-memory or system implementation.
pub struct StaffingEngineBuilder {
    config: EngineConfig,
    jobs: Option<Arc<dyn JobCatalog>>,
    candidates: Option<Arc<dyn CandidateDirectory>>,
    clock: Option<Arc<dyn Clock>>,
    jitter: Option<Arc<dyn JitterSource>>,
    codes: Option<Arc<dyn CodeGenerator>>,
    notifications: Option<Arc<dyn NotificationSink>>,
    reputation: Option<Arc<dyn ReputationStore>>,
}

impl StaffingEngineBuilder {
    fn new(config: EngineConfig) -> Self {
        Self {
            config,
            jobs: None,
            candidates: None,
            clock: None,
            jitter: None,
            codes: None,
            notifications: None,
            reputation: None,
        }
    }

    /// Use one in-memory directory as both the job catalog and the candidate directory.
    pub fn directory(mut self, directory: Arc<InMemoryDirectory>) -> Self {
        self.jobs = Some(directory.clone());
        self.candidates = Some(directory);
        self
    }

    pub fn job_catalog(mut self, jobs: Arc<dyn JobCatalog>) -> Self {
        self.jobs = Some(jobs);
        self
    }

    pub fn candidate_directory(mut self, candidates: Arc<dyn CandidateDirectory>) -> Self {
        self.candidates = Some(candidates);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn jitter(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.jitter = Some(jitter);
        self
    }

    pub fn code_generator(mut self, codes: Arc<dyn CodeGenerator>) -> Self {
        self.codes = Some(codes);
        self
    }

    pub fn notifications(mut self, notifications: Arc<dyn NotificationSink>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    pub fn reputation(mut self, reputation: Arc<dyn ReputationStore>) -> Self {
        self.reputation = Some(reputation);
        self
    }

    pub fn build(self) -> StaffingEngine {
        let config = self.config;
        let directory = Arc::new(InMemoryDirectory::default());
        let jobs = self
            .jobs
            .unwrap_or_else(|| directory.clone() as Arc<dyn JobCatalog>);
        let candidates = self
            .candidates
            .unwrap_or_else(|| directory as Arc<dyn CandidateDirectory>);
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let jitter = self.jitter.unwrap_or_else(|| match config.jitter_seed {
            Some(seed) => Arc::new(SeededJitter::from_seed(seed)) as Arc<dyn JitterSource>,
            None => Arc::new(SeededJitter::from_entropy()) as Arc<dyn JitterSource>,
        });
        let codes = self
            .codes
            .unwrap_or_else(|| Arc::new(OsCodeGenerator) as Arc<dyn CodeGenerator>);
        let notifications = self
            .notifications
            .unwrap_or_else(|| Arc::new(TracingSink) as Arc<dyn NotificationSink>);
        let reputation = self.reputation.unwrap_or_else(|| {
            Arc::new(InMemoryReputationStore::new(config.default_reputation))
                as Arc<dyn ReputationStore>
        });

        let limits = RankLimits {
            quick_search: config.quick_search_limit,
            manual_search: config.manual_search_limit,
        };
        let snapshots: Arc<dyn RankingRepository> = Arc::new(InMemoryRankingRepository::default());
        let ranker = Arc::new(MatchRanker::new(
            MatchScorer::new(jitter),
            reputation.clone(),
            snapshots,
            clock.clone(),
            limits,
        ));

        let engagement_store: Arc<dyn EngagementRepository> =
            Arc::new(InMemoryEngagementRepository::default());
        let engagements = Arc::new(EngagementManager::new(
            engagement_store,
            jobs.clone(),
            codes,
            notifications.clone(),
            clock.clone(),
            config.payment_code_ttl(),
        ));

        let offer_store: Arc<dyn OfferRepository> = Arc::new(InMemoryOfferRepository::default());
        let offers = Arc::new(OfferManager::new(
            OfferCollaborators {
                offers: offer_store,
                jobs: jobs.clone(),
                candidates: candidates.clone(),
                ranker: ranker.clone(),
                reputation: reputation.clone(),
                engagements: engagements.clone(),
                notifications,
                clock: clock.clone(),
            },
            OfferPolicy::from(&config),
        ));
        let sweeper = ExpirySweeper::new(offers.clone());

        debug!(
            offer_ttl_days = config.offer_ttl_days,
            payment_code_ttl_minutes = config.payment_code_ttl_minutes,
            quick_search_limit = limits.quick_search,
            manual_search_limit = limits.manual_search,
            "staffing engine assembled"
        );

        StaffingEngine {
            jobs,
            candidates,
            reputation,
            ranker,
            offers,
            engagements,
            sweeper,
            clock,
        }
    }
}
