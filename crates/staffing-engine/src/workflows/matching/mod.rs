//! Job/candidate fit scoring and per-job ranking snapshots.

pub mod directory;
pub mod domain;
pub mod ranker;
pub mod scorer;

pub use directory::{CandidateDirectory, InMemoryDirectory, JobCatalog};
pub use domain::{
    BadgeTier, CandidateId, CandidateProfile, JobId, JobPosting, MatchSnapshot, PayRange,
    RankFilters, RankedSnapshot, RankingMode, TaxType,
};
pub use ranker::{InMemoryRankingRepository, MatchRanker, RankLimits, RankingRepository};
pub use scorer::{
    JitterSource, MatchBreakdown, MatchComponent, MatchFactor, MatchScorer, NoJitter,
    SeededJitter,
};
