use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for job postings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Identifier wrapper for candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tax arrangement a shift is paid under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxType {
    #[serde(rename = "ABN")]
    Abn,
    #[serde(rename = "TFN")]
    Tfn,
}

/// Hourly pay band, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayRange {
    pub min: f64,
    pub max: f64,
}

impl PayRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn overlaps(&self, other: &PayRange) -> bool {
        self.min <= other.max && self.max >= other.min
    }
}

/// Candidate badge tiers. `Pro` is the distinguished tier and orders above `Platinum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Pro,
}

impl BadgeTier {
    pub const fn label(self) -> &'static str {
        match self {
            BadgeTier::Bronze => "Bronze",
            BadgeTier::Silver => "Silver",
            BadgeTier::Gold => "Gold",
            BadgeTier::Platinum => "Platinum",
            BadgeTier::Pro => "PRO",
        }
    }
}

/// Job posting as published by the recruiter workflow. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,
    pub industry: String,
    pub title: String,
    pub tax_type: TaxType,
    pub search_radius_km: f64,
    pub salary: PayRange,
    pub required_experience_years: u8,
    pub staff_required: u16,
}

/// Job-seeker profile supplied by the candidate directory. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: CandidateId,
    pub industries: Vec<String>,
    pub preferred_roles: Vec<String>,
    pub tax_types: Vec<TaxType>,
    pub service_radius_km: f64,
    pub pay_preference: PayRange,
    pub experience_years: u8,
    pub badge: BadgeTier,
}

/// One ranked candidate, frozen at ranking time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub candidate_id: CandidateId,
    pub match_percentage: u8,
    pub reputation_score: u8,
    pub combined_score: f64,
}

/// Which ranking formula produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
    /// Blends match quality with reputation.
    QuickSearch,
    /// Match quality alone.
    ManualSearch,
}

impl RankingMode {
    pub fn combined_score(self, match_percentage: u8, reputation_score: u8) -> f64 {
        match self {
            RankingMode::QuickSearch => {
                0.7 * f64::from(match_percentage) + 0.3 * f64::from(reputation_score)
            }
            RankingMode::ManualSearch => f64::from(match_percentage),
        }
    }
}

/// Optional filters applied before ranking. All present filters must pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankFilters {
    #[serde(default)]
    pub minimum_badge: Option<BadgeTier>,
    #[serde(default)]
    pub pro_only: bool,
}

impl RankFilters {
    pub fn admits(&self, candidate: &CandidateProfile) -> bool {
        if self.pro_only && candidate.badge != BadgeTier::Pro {
            return false;
        }
        match self.minimum_badge {
            Some(minimum) => candidate.badge >= minimum,
            None => true,
        }
    }
}

/// Ranked list stored per job. Replaced wholesale by the next ranking or merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSnapshot {
    pub job_id: JobId,
    pub mode: RankingMode,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<MatchSnapshot>,
}

impl RankedSnapshot {
    pub fn entry_for(&self, candidate_id: &CandidateId) -> Option<&MatchSnapshot> {
        self.entries
            .iter()
            .find(|entry| &entry.candidate_id == candidate_id)
    }

    pub fn candidate_ids(&self) -> Vec<CandidateId> {
        self.entries
            .iter()
            .map(|entry| entry.candidate_id.clone())
            .collect()
    }
}
